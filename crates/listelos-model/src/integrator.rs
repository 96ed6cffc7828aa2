// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Fixed-step classical Runge-Kutta integration.
//!
//! The derivative takes `&mut self`: systems with discrete side state (the
//! saccade controller) see every stage evaluation, in order
//! `t, t + h/2, t + h/2, t + h`.

use ndarray::Array2;

use crate::types::{ModelError, Result};

/// A first-order system `dy/dt = f(t, y)`
pub trait OdeSystem {
    /// Length of the state vector
    fn dimension(&self) -> usize;

    /// Write `f(t, y)` into `dy`
    fn derivative(&mut self, t: f64, y: &[f64], dy: &mut [f64]);
}

/// RK4 stepper with reusable stage buffers
#[derive(Debug, Clone)]
pub struct Rk4 {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    stage: Vec<f64>,
}

impl Rk4 {
    pub fn new(dimension: usize) -> Self {
        Self {
            k1: vec![0.0; dimension],
            k2: vec![0.0; dimension],
            k3: vec![0.0; dimension],
            k4: vec![0.0; dimension],
            stage: vec![0.0; dimension],
        }
    }

    /// Advance `y` from `t` to `t + h` in place
    pub fn step<S: OdeSystem + ?Sized>(&mut self, system: &mut S, t: f64, h: f64, y: &mut [f64]) {
        let half = 0.5 * h;

        system.derivative(t, y, &mut self.k1);
        for ((s, &yi), &k) in self.stage.iter_mut().zip(y.iter()).zip(&self.k1) {
            *s = yi + half * k;
        }

        system.derivative(t + half, &self.stage, &mut self.k2);
        for ((s, &yi), &k) in self.stage.iter_mut().zip(y.iter()).zip(&self.k2) {
            *s = yi + half * k;
        }

        system.derivative(t + half, &self.stage, &mut self.k3);
        for ((s, &yi), &k) in self.stage.iter_mut().zip(y.iter()).zip(&self.k3) {
            *s = yi + h * k;
        }

        system.derivative(t + h, &self.stage, &mut self.k4);
        for i in 0..y.len() {
            y[i] += h / 6.0 * (self.k1[i] + 2.0 * self.k2[i] + 2.0 * self.k3[i] + self.k4[i]);
        }
    }
}

/// Integrate `steps` steps of size `h` from `t = 0`
///
/// Row `n` of the result is the state at `t = n·h`; row 0 is `initial`.
///
/// # Errors
/// - `ShapeMismatch` if `initial` does not match the system dimension
/// - `InvalidParameters` if `h` is not positive and finite
pub fn integrate<S: OdeSystem + ?Sized>(
    system: &mut S,
    initial: &[f64],
    h: f64,
    steps: usize,
) -> Result<Array2<f64>> {
    let dim = system.dimension();
    if initial.len() != dim {
        return Err(ModelError::ShapeMismatch {
            expected: dim,
            actual: initial.len(),
        });
    }
    if !(h.is_finite() && h > 0.0) {
        return Err(ModelError::InvalidParameters(format!(
            "integration step must be positive and finite, got {}",
            h
        )));
    }

    let mut trajectory = Array2::zeros((steps + 1, dim));
    let mut y = initial.to_vec();
    trajectory
        .row_mut(0)
        .iter_mut()
        .zip(&y)
        .for_each(|(dst, &v)| *dst = v);

    let mut rk4 = Rk4::new(dim);
    for n in 0..steps {
        // Recomputed from the index so long runs do not accumulate drift
        let t = n as f64 * h;
        rk4.step(system, t, h, &mut y);
        trajectory
            .row_mut(n + 1)
            .iter_mut()
            .zip(&y)
            .for_each(|(dst, &v)| *dst = v);
    }

    Ok(trajectory)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Decay {
        rate: f64,
        evaluations: Vec<f64>,
    }

    impl OdeSystem for Decay {
        fn dimension(&self) -> usize {
            1
        }

        fn derivative(&mut self, t: f64, y: &[f64], dy: &mut [f64]) {
            self.evaluations.push(t);
            dy[0] = -self.rate * y[0];
        }
    }

    struct Oscillator;

    impl OdeSystem for Oscillator {
        fn dimension(&self) -> usize {
            2
        }

        fn derivative(&mut self, _t: f64, y: &[f64], dy: &mut [f64]) {
            dy[0] = y[1];
            dy[1] = -y[0];
        }
    }

    #[test]
    fn test_exponential_decay_accuracy() {
        let mut system = Decay {
            rate: 2.0,
            evaluations: Vec::new(),
        };
        let trajectory = integrate(&mut system, &[1.0], 0.01, 100).unwrap();
        assert_eq!(trajectory.nrows(), 101);
        assert_eq!(trajectory[[0, 0]], 1.0);
        let exact = (-2.0_f64).exp();
        assert!((trajectory[[100, 0]] - exact).abs() < 1e-9);
    }

    #[test]
    fn test_stage_times() {
        let mut system = Decay {
            rate: 1.0,
            evaluations: Vec::new(),
        };
        integrate(&mut system, &[1.0], 0.1, 2).unwrap();
        let expected = [0.0, 0.05, 0.05, 0.1, 0.1, 0.15, 0.15, 0.2];
        assert_eq!(system.evaluations.len(), expected.len());
        for (got, want) in system.evaluations.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_harmonic_oscillator_period() {
        let steps = 1000;
        let h = 2.0 * std::f64::consts::PI / steps as f64;
        let trajectory = integrate(&mut Oscillator, &[1.0, 0.0], h, steps).unwrap();
        assert!((trajectory[[steps, 0]] - 1.0).abs() < 1e-8);
        assert!(trajectory[[steps, 1]].abs() < 1e-8);
    }

    #[test]
    fn test_zero_steps_returns_initial() {
        let trajectory = integrate(&mut Oscillator, &[0.3, -0.2], 0.1, 0).unwrap();
        assert_eq!(trajectory.shape(), &[1, 2]);
        assert_eq!(trajectory[[0, 1]], -0.2);
    }

    #[test]
    fn test_dimension_mismatch() {
        let result = integrate(&mut Oscillator, &[1.0], 0.1, 10);
        assert!(matches!(
            result,
            Err(ModelError::ShapeMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_invalid_step() {
        assert!(integrate(&mut Oscillator, &[1.0, 0.0], 0.0, 10).is_err());
        assert!(integrate(&mut Oscillator, &[1.0, 0.0], f64::NAN, 10).is_err());
    }
}
