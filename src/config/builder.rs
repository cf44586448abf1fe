use super::{BodyConfig, PolicyKind, RotorConfig, SensorConfig, SimConfig};
use crate::control::{BalanceGains, DerivativeMode, HeightMode};
use embedded_time::duration::Milliseconds;

/// Builder for a validated [`SimConfig`].
///
/// ```
/// use quadcopter_sim::config::{Builder, PolicyKind};
///
/// let config = Builder::default()
///     .policy(PolicyKind::DirectControl)
///     .seed(7)
///     .build()
///     .unwrap();
/// assert_eq!(config.seed, Some(7));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Builder {
    config: SimConfig,
}

impl Builder {
    pub fn rotor(mut self, rotor: RotorConfig) -> Self {
        self.config.rotor = rotor;
        self
    }

    pub fn body(mut self, body: BodyConfig) -> Self {
        self.config.body = body;
        self
    }

    pub fn sensors(mut self, sensors: SensorConfig) -> Self {
        self.config.sensors = sensors;
        self
    }

    /// Disable sensor noise entirely.
    pub fn noiseless(mut self) -> Self {
        self.config.sensors = SensorConfig {
            gyro_noise: 0.,
            accel_noise: 0.,
        };
        self
    }

    pub fn roll_gains(mut self, gains: BalanceGains<f32>) -> Self {
        self.config.roll = gains;
        self
    }

    pub fn pitch_gains(mut self, gains: BalanceGains<f32>) -> Self {
        self.config.pitch = gains;
        self
    }

    pub fn height_gains(mut self, gains: BalanceGains<f32>) -> Self {
        self.config.height = gains;
        self
    }

    pub fn height_mode(mut self, mode: HeightMode) -> Self {
        self.config.height_mode = mode;
        self
    }

    pub fn derivative(mut self, mode: DerivativeMode<f32>) -> Self {
        self.config.derivative = mode;
        self
    }

    pub fn max_body_rate(mut self, rate: f32) -> Self {
        self.config.max_body_rate = rate;
        self
    }

    pub fn policy(mut self, policy: PolicyKind) -> Self {
        self.config.policy = policy;
        self
    }

    pub fn control_period(mut self, period: Milliseconds<u32>) -> Self {
        self.config.control_period = period;
        self
    }

    pub fn telemetry_period(mut self, period: Milliseconds<u32>) -> Self {
        self.config.telemetry_period = period;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn build(self) -> crate::Result<SimConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
