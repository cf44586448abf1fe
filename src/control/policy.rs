use super::{BalanceController, ControlInput};
use crate::config::{PolicyKind, SimConfig};
use crate::sensor::SensorSnapshot;
use core::fmt;

/// Base throttle and roll, pitch, yaw commands, mixed per rotor as
/// `base ± roll ± pitch ± yaw`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlOutput {
    pub base: f32,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

/// A control law run once per control tick.
pub trait FlightController {
    /// Calculate the output for a tick `dt` seconds after the previous one.
    fn control(&mut self, dt: f32, input: &ControlInput, sensors: &SensorSnapshot) -> ControlOutput;
}

impl<F> FlightController for F
where
    F: FnMut(f32, &ControlInput, &SensorSnapshot) -> ControlOutput,
{
    fn control(&mut self, dt: f32, input: &ControlInput, sensors: &SensorSnapshot) -> ControlOutput {
        self(dt, input, sensors)
    }
}

/// Source of the base throttle in the PID policy.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum HeightMode {
    /// Use the throttle input directly.
    #[default]
    PassThrough,

    /// Treat the throttle input as a climb rate command: 0.5 holds the current
    /// height, 0 and 1 descend or climb at `max_rate` (in m/s).
    ClimbRate { max_rate: f32 },
}

/// Rate-stabilizing PID policy.
///
/// Roll and pitch inputs become body rate setpoints tracked against the
/// gyroscope; yaw is passed through.
#[derive(Clone, Copy, Debug)]
pub struct PidBalance {
    pub roll: BalanceController<f32>,
    pub pitch: BalanceController<f32>,
    pub height: BalanceController<f32>,
    pub height_mode: HeightMode,

    /// Body rate for a full roll or pitch input (in rad/s)
    pub max_body_rate: f32,
}

impl PidBalance {
    pub fn from_config(config: &SimConfig) -> Self {
        let controller = |gains| BalanceController::with_derivative(gains, config.derivative);
        Self {
            roll: controller(config.roll),
            pitch: controller(config.pitch),
            height: controller(config.height),
            height_mode: config.height_mode,
            max_body_rate: config.max_body_rate,
        }
    }
}

impl FlightController for PidBalance {
    fn control(&mut self, dt: f32, input: &ControlInput, sensors: &SensorSnapshot) -> ControlOutput {
        // Roll is measured about body X, pitch about body Z
        let roll = self
            .roll
            .update(dt, sensors.gyro.x, input.roll * self.max_body_rate);
        let pitch = self
            .pitch
            .update(dt, sensors.gyro.z, input.pitch * self.max_body_rate);

        let base = match self.height_mode {
            HeightMode::PassThrough => input.throttle,
            HeightMode::ClimbRate { max_rate } => {
                let climb_rate = (input.throttle - 0.5) * 2. * max_rate;
                self.height.update(dt, sensors.velocity.y, climb_rate)
            }
        };

        ControlOutput {
            base,
            roll,
            pitch,
            yaw: input.yaw,
        }
    }
}

/// Maps the raw input straight onto the mixer, bypassing every controller.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectControl;

impl FlightController for DirectControl {
    fn control(&mut self, _dt: f32, input: &ControlInput, _sensors: &SensorSnapshot) -> ControlOutput {
        ControlOutput {
            base: input.throttle,
            roll: input.roll,
            pitch: input.pitch,
            yaw: input.yaw,
        }
    }
}

/// The control law selected when the vehicle is built.
pub enum ControlPolicy {
    PidBalance(PidBalance),
    DirectControl(DirectControl),
    Delegated(Box<dyn FlightController + Send>),
}

impl ControlPolicy {
    pub fn from_config(config: &SimConfig) -> Self {
        match config.policy {
            PolicyKind::PidBalance => Self::PidBalance(PidBalance::from_config(config)),
            PolicyKind::DirectControl => Self::DirectControl(DirectControl),
        }
    }

    pub fn delegated<C>(controller: C) -> Self
    where
        C: FlightController + Send + 'static,
    {
        Self::Delegated(Box::new(controller))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PidBalance(_) => "pid-balance",
            Self::DirectControl(_) => "direct-control",
            Self::Delegated(_) => "delegated",
        }
    }
}

impl FlightController for ControlPolicy {
    fn control(&mut self, dt: f32, input: &ControlInput, sensors: &SensorSnapshot) -> ControlOutput {
        match self {
            Self::PidBalance(pid) => pid.control(dt, input, sensors),
            Self::DirectControl(direct) => direct.control(dt, input, sensors),
            Self::Delegated(controller) => controller.control(dt, input, sensors),
        }
    }
}

impl fmt::Debug for ControlPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PidBalance(pid) => f.debug_tuple("PidBalance").field(pid).finish(),
            Self::DirectControl(_) => f.write_str("DirectControl"),
            Self::Delegated(_) => f.write_str("Delegated(..)"),
        }
    }
}
