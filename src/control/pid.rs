use num_traits::Float;

/// Gains of one [`BalanceController`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BalanceGains<T> {
    pub kp: T,
    pub ki: T,
    pub kd: T,

    /// Constant added to every output, e.g. the hover throttle of the height axis
    pub bias: T,

    /// Symmetric bound on the accumulated integral error.
    /// `None` accumulates without bound.
    pub integral_limit: Option<T>,
}

impl<T: Float> BalanceGains<T> {
    pub fn new(kp: T, ki: T, kd: T) -> Self {
        Self {
            kp,
            ki,
            kd,
            bias: T::zero(),
            integral_limit: None,
        }
    }

    pub fn with_bias(mut self, bias: T) -> Self {
        self.bias = bias;
        self
    }

    pub fn with_integral_limit(mut self, limit: T) -> Self {
        self.integral_limit = Some(limit.abs());
        self
    }
}

/// How the derivative term turns an error difference into a rate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DerivativeMode<T> {
    /// Divide by the `dt` of the current tick.
    /// The effective gain depends on the step size.
    #[default]
    StepDt,

    /// Divide by a fixed reference interval in seconds.
    Fixed(T),
}

impl<T: Float> DerivativeMode<T> {
    /// Rate of change of the error between two ticks.
    pub fn derivative(self, error: T, previous_error: T, dt: T) -> T {
        let interval = match self {
            Self::StepDt => dt,
            Self::Fixed(interval) => interval,
        };
        (error - previous_error) / interval
    }
}

/// PID controller correcting one axis.
///
/// The derivative uses only the previous tick's error, unfiltered. Unless an
/// integral limit is configured the integral error winds up without bound.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BalanceController<T = f32> {
    gains: BalanceGains<T>,
    derivative: DerivativeMode<T>,
    integral_error: T,
    previous_error: T,
}

impl<T: Float> BalanceController<T> {
    pub fn new(gains: BalanceGains<T>) -> Self {
        Self::with_derivative(gains, DerivativeMode::StepDt)
    }

    pub fn with_derivative(gains: BalanceGains<T>, derivative: DerivativeMode<T>) -> Self {
        Self {
            gains,
            derivative,
            integral_error: T::zero(),
            previous_error: T::zero(),
        }
    }

    /// Calculate the correction for one tick of length `dt`.
    ///
    /// `dt` must be non-zero when the derivative divides by the step.
    pub fn update(&mut self, dt: T, measured: T, setpoint: T) -> T {
        // 1. Calculate the error between the setpoint and the measurement
        let error = setpoint - measured;

        // 2. Add the error to the integration
        self.integral_error = self.integral_error + error * dt;
        if let Some(limit) = self.gains.integral_limit {
            self.integral_error = self.integral_error.max(-limit).min(limit);
        }

        // 3. Differentiate against the previous tick only
        let derivative = self
            .derivative
            .derivative(error, self.previous_error, dt);
        self.previous_error = error;

        self.gains.kp * error
            + self.gains.ki * self.integral_error
            + self.gains.kd * derivative
            + self.gains.bias
    }

    /// Clear the integral and derivative memory.
    pub fn reset(&mut self) {
        self.integral_error = T::zero();
        self.previous_error = T::zero();
    }

    pub fn gains(&self) -> &BalanceGains<T> {
        &self.gains
    }

    pub fn integral_error(&self) -> T {
        self.integral_error
    }

    pub fn previous_error(&self) -> T {
        self.previous_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn proportional_only() {
        let mut pid = BalanceController::new(BalanceGains::new(2., 0., 0.));
        assert_abs_diff_eq!(pid.update(0.02, 1., 1.5), 1.0);
    }

    #[test]
    fn integral_accumulates_error_times_dt() {
        let mut pid = BalanceController::new(BalanceGains::new(0., 3., 0.));
        pid.update(0.5, 0., 1.);
        let output = pid.update(0.25, 0., 2.);
        assert_abs_diff_eq!(pid.integral_error(), 1.0);
        assert_abs_diff_eq!(output, 3.0);
    }

    #[test]
    fn derivative_divides_by_current_dt() {
        let mut pid = BalanceController::new(BalanceGains::new(0., 0., 1.));
        let first = pid.update(0.1, 0., 1.);
        assert_abs_diff_eq!(first, 10., epsilon = 1e-4);
        // Same change over half the step doubles the derivative
        let second = pid.update(0.05, 0., 3.);
        assert_abs_diff_eq!(second, 40., epsilon = 1e-3);
        assert_abs_diff_eq!(pid.previous_error(), 3.);
    }

    #[test]
    fn fixed_interval_derivative_ignores_step() {
        let gains = BalanceGains::new(0., 0., 1.);
        let mut pid = BalanceController::with_derivative(gains, DerivativeMode::Fixed(0.1));
        assert_abs_diff_eq!(pid.update(0.001, 0., 1.), 10., epsilon = 1e-4);
        assert_abs_diff_eq!(pid.update(0.5, 0., 2.), 10., epsilon = 1e-4);
    }

    #[test]
    fn zero_error_holds_integral() {
        let gains = BalanceGains::new(1.5, 0.7, 0.2).with_bias(0.3);
        let mut pid = BalanceController::new(gains);
        pid.update(0.02, 0., 1.);
        pid.update(0.02, 0., 1.);
        let integral = pid.integral_error();

        // The first matched tick still sees the derivative of the error drop
        pid.update(0.02, 4., 4.);
        for _ in 0..100 {
            let output = pid.update(0.02, 4., 4.);
            assert_eq!(pid.integral_error(), integral);
            assert_abs_diff_eq!(output, 0.7 * integral + 0.3, epsilon = 1e-6);
        }
    }

    #[test]
    fn winds_up_without_limit() {
        let mut pid = BalanceController::new(BalanceGains::new(0., 1., 0.));
        for _ in 0..1000 {
            pid.update(0.1, 0., 1.);
        }
        assert_abs_diff_eq!(pid.integral_error(), 100., epsilon = 0.05);
    }

    #[test]
    fn integral_limit_clamps() {
        let gains = BalanceGains::new(0., 1., 0.).with_integral_limit(2.);
        let mut pid = BalanceController::new(gains);
        for _ in 0..1000 {
            pid.update(0.1, 0., -1.);
        }
        assert_eq!(pid.integral_error(), -2.);
    }

    #[test]
    fn reset_clears_memory() {
        let mut pid = BalanceController::new(BalanceGains::new(1., 1., 1.));
        pid.update(0.1, 0., 1.);
        pid.reset();
        assert_eq!(pid.integral_error(), 0.);
        assert_eq!(pid.previous_error(), 0.);
    }

    #[test]
    fn works_with_f64() {
        let mut pid = BalanceController::<f64>::new(BalanceGains::new(1., 0., 0.));
        assert_abs_diff_eq!(pid.update(0.01, 0.25, 1.), 0.75);
    }
}
