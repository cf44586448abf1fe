//! Tuned constants for the airframe, rotors, sensors and controllers.
//!
//! Every value has a default matching the reference airframe. Use [`Builder`]
//! to override fields and validate the result.

use crate::control::{BalanceGains, DerivativeMode, HeightMode};
use crate::motor::ThrustCurve;
use embedded_time::duration::Milliseconds;
use nalgebra::Vector3;

mod builder;
pub use builder::Builder;

/// Convert a millisecond duration into seconds.
pub fn seconds(duration: Milliseconds<u32>) -> f32 {
    duration.0 as f32 * 1.0e-3
}

/// Physical parameters shared by the four rotors.
#[derive(Clone, Copy, Debug)]
pub struct RotorConfig {
    /// Nominal maximum speed at full throttle (in rpm).
    pub max_rpm: f32,

    /// Bound of the persistent per-rotor offset applied to `max_rpm` (in rpm).
    pub max_rpm_jitter: f32,

    /// Bound of the periodically resampled RPM error (in rpm).
    pub rpm_error: f32,

    /// How often the RPM error is resampled.
    pub rpm_error_period: Milliseconds<u32>,

    /// Largest RPM change per second.
    pub max_slew: f32,

    /// Smallest RPM change per second while the target is not reached.
    pub min_slew: f32,

    /// Proportional response of the speed controller (in 1/s). Each second
    /// the rotor closes this many times its distance to the target, within
    /// the slew bounds.
    pub response: f32,

    /// Motor controller update period.
    pub pwm_period: Milliseconds<u32>,

    /// Distance from the vehicle center to each rotor hub (in meters).
    pub arm_length: f32,

    pub thrust_curve: ThrustCurve,

    /// Reaction torque per rpm (in N*m).
    pub torque_per_rpm: f32,
}

impl Default for RotorConfig {
    fn default() -> Self {
        Self {
            max_rpm: 10_000.,
            max_rpm_jitter: 100.,
            rpm_error: 50.,
            rpm_error_period: Milliseconds::new(1000),
            max_slew: 40_000.,
            min_slew: 500.,
            response: 20.,
            pwm_period: Milliseconds::new(22),
            arm_length: 0.25,
            thrust_curve: ThrustCurve::default(),
            torque_per_rpm: 2.0e-6,
        }
    }
}

/// Rigid body parameters of the airframe.
#[derive(Clone, Copy, Debug)]
pub struct BodyConfig {
    /// Mass in kg
    pub mass: f32,

    /// Principal moments of inertia in kg*m^2
    pub inertia: Vector3<f32>,

    /// Quadratic air friction coefficient
    pub drag_coefficient: f32,

    /// Gravitational acceleration in m/s^2, acting along -Y
    pub gravity: f32,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            mass: 1.0,
            inertia: Vector3::new(0.01, 0.02, 0.01),
            drag_coefficient: 0.1,
            gravity: 9.81,
        }
    }
}

/// Peak-to-peak noise amplitudes of the onboard sensors.
#[derive(Clone, Copy, Debug)]
pub struct SensorConfig {
    /// Gyroscope noise in rad/s
    pub gyro_noise: f32,

    /// Accelerometer noise in m/s^2
    pub accel_noise: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            gyro_noise: 0.01,
            accel_noise: 0.05,
        }
    }
}

/// Control policy installed at construction.
///
/// A delegated controller is supplied as a value through
/// [`VehicleState::with_controller`](crate::VehicleState::with_controller) instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PolicyKind {
    #[default]
    PidBalance,
    DirectControl,
}

#[derive(Clone, Debug)]
pub struct SimConfig {
    pub rotor: RotorConfig,
    pub body: BodyConfig,
    pub sensors: SensorConfig,

    pub roll: BalanceGains<f32>,
    pub pitch: BalanceGains<f32>,
    pub height: BalanceGains<f32>,
    pub height_mode: HeightMode,
    pub derivative: DerivativeMode<f32>,

    /// Body rate commanded by a full roll or pitch input (in rad/s).
    pub max_body_rate: f32,

    pub policy: PolicyKind,

    /// Period of the flight control loop.
    pub control_period: Milliseconds<u32>,

    /// Period of the telemetry stream.
    pub telemetry_period: Milliseconds<u32>,

    /// Seed for every random source; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        let attitude = BalanceGains::new(0.05, 0.05, 0.001);

        Self {
            rotor: RotorConfig::default(),
            body: BodyConfig::default(),
            sensors: SensorConfig::default(),
            roll: attitude,
            pitch: attitude,
            height: BalanceGains::new(0.1, 0.05, 0.).with_bias(0.665),
            height_mode: HeightMode::PassThrough,
            derivative: DerivativeMode::StepDt,
            max_body_rate: 2.,
            policy: PolicyKind::PidBalance,
            control_period: Milliseconds::new(22),
            telemetry_period: Milliseconds::new(20),
            seed: None,
        }
    }
}

impl SimConfig {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Check every value against its physical range.
    pub fn validate(&self) -> crate::Result<()> {
        let rotor = &self.rotor;
        positive("rotor.max_rpm", rotor.max_rpm)?;
        non_negative("rotor.max_rpm_jitter", rotor.max_rpm_jitter)?;
        if rotor.max_rpm_jitter >= rotor.max_rpm {
            return Err(invalid("rotor.max_rpm_jitter must be below rotor.max_rpm"));
        }
        non_negative("rotor.rpm_error", rotor.rpm_error)?;
        positive("rotor.max_slew", rotor.max_slew)?;
        non_negative("rotor.min_slew", rotor.min_slew)?;
        if rotor.min_slew > rotor.max_slew {
            return Err(invalid("rotor.min_slew must not exceed rotor.max_slew"));
        }
        positive("rotor.response", rotor.response)?;
        positive("rotor.arm_length", rotor.arm_length)?;
        non_negative("rotor.torque_per_rpm", rotor.torque_per_rpm)?;
        positive("rotor.thrust_curve.scale", rotor.thrust_curve.scale)?;
        non_negative("rotor.thrust_curve.knee", rotor.thrust_curve.knee)?;
        non_negative("rotor.thrust_curve.offset", rotor.thrust_curve.offset)?;
        period("rotor.pwm_period", rotor.pwm_period)?;
        period("rotor.rpm_error_period", rotor.rpm_error_period)?;

        positive("body.mass", self.body.mass)?;
        for (i, moment) in self.body.inertia.iter().enumerate() {
            positive(&format!("body.inertia[{i}]"), *moment)?;
        }
        non_negative("body.drag_coefficient", self.body.drag_coefficient)?;
        non_negative("body.gravity", self.body.gravity)?;

        non_negative("sensors.gyro_noise", self.sensors.gyro_noise)?;
        non_negative("sensors.accel_noise", self.sensors.accel_noise)?;

        gains("roll", &self.roll)?;
        gains("pitch", &self.pitch)?;
        gains("height", &self.height)?;
        if let HeightMode::ClimbRate { max_rate } = self.height_mode {
            positive("height_mode.max_rate", max_rate)?;
        }
        if let DerivativeMode::Fixed(interval) = self.derivative {
            positive("derivative interval", interval)?;
        }
        non_negative("max_body_rate", self.max_body_rate)?;

        period("control_period", self.control_period)?;
        period("telemetry_period", self.telemetry_period)?;

        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> crate::Error {
    crate::Error::InvalidConfig(msg.into())
}

fn positive(name: &str, value: f32) -> crate::Result<()> {
    if value.is_finite() && value > 0. {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be positive, got {value}")))
    }
}

fn non_negative(name: &str, value: f32) -> crate::Result<()> {
    if value.is_finite() && value >= 0. {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be non-negative, got {value}")))
    }
}

fn period(name: &str, duration: Milliseconds<u32>) -> crate::Result<()> {
    if duration.0 == 0 {
        Err(invalid(format!("{name} must be at least 1 ms")))
    } else {
        Ok(())
    }
}

fn gains(axis: &str, gains: &BalanceGains<f32>) -> crate::Result<()> {
    let values = [gains.kp, gains.ki, gains.kd, gains.bias];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(invalid(format!("{axis} gains must be finite")));
    }
    if let Some(limit) = gains.integral_limit {
        non_negative(&format!("{axis}.integral_limit"), limit)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn converts_milliseconds() {
        approx::assert_abs_diff_eq!(seconds(Milliseconds::new(22)), 0.022);
        approx::assert_abs_diff_eq!(seconds(Milliseconds::new(1000)), 1.0);
    }

    #[test]
    fn rejects_zero_control_period() {
        let mut config = SimConfig::default();
        config.control_period = Milliseconds::new(0);
        assert!(matches!(
            config.validate(),
            Err(crate::Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_jitter_above_max_rpm() {
        let mut config = SimConfig::default();
        config.rotor.max_rpm_jitter = 20_000.;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_finite_gains() {
        let mut config = SimConfig::default();
        config.roll.kd = f32::NAN;
        assert!(config.validate().is_err());
    }
}
