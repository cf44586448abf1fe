//! Rotor actuator dynamics: throttle quantization, PWM latching,
//! slew-limited RPM and the resulting thrust and reaction torque.

use crate::config::{seconds, RotorConfig};
use crate::physics::{BodyHandle, PhysicsWorld};
use crate::scheduler::Interval;
use nalgebra::Vector3;
use rand::{rngs::StdRng, Rng};

mod mixer;
pub use mixer::{QuadMixer, RotorCommand};

mod thrust;
pub use thrust::ThrustCurve;

/// Number of discrete throttle steps of the motor controller.
pub const THROTTLE_LEVELS: u16 = 256;

/// Distance in levels below which a value counts as sitting on that level.
const LEVEL_EPSILON: f32 = 1.0e-4;

/// Clamp `value` to [0, 1] and round it down to one of the 256 throttle levels.
///
/// A value already on a level maps to itself even when `level / 255 * 255`
/// lands a hair below the level in `f32`.
pub fn quantize_throttle(value: f32) -> f32 {
    let top = (THROTTLE_LEVELS - 1) as f32;
    let value = if value.is_nan() { 0. } else { value.clamp(0., 1.) };
    let scaled = value * top;
    let nearest = scaled.round();
    let level = if (scaled - nearest).abs() < LEVEL_EPSILON {
        nearest
    } else {
        scaled.floor()
    };
    level / top
}

/// Rotor mounting position on the "plus" frame.
///
/// `X`/`Z` name the body axis the arm lies on, `m`/`p` its sign.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RotorPosition {
    Xm,
    Xp,
    Zm,
    Zp,
}

impl RotorPosition {
    pub const ALL: [Self; 4] = [Self::Xm, Self::Xp, Self::Zm, Self::Zp];

    pub fn index(self) -> usize {
        match self {
            Self::Xm => 0,
            Self::Xp => 1,
            Self::Zm => 2,
            Self::Zp => 3,
        }
    }

    /// Telemetry key suffix.
    pub fn name(self) -> &'static str {
        match self {
            Self::Xm => "Xm",
            Self::Xp => "Xp",
            Self::Zm => "Zm",
            Self::Zp => "Zp",
        }
    }

    /// Hub position relative to the vehicle center for an arm of `arm_length`.
    pub fn offset(self, arm_length: f32) -> Vector3<f32> {
        match self {
            Self::Xm => Vector3::new(-arm_length, 0., 0.),
            Self::Xp => Vector3::new(arm_length, 0., 0.),
            Self::Zm => Vector3::new(0., 0., -arm_length),
            Self::Zp => Vector3::new(0., 0., arm_length),
        }
    }

    /// +1 or -1, alternating around the frame so reaction torques cancel.
    pub fn spin_direction(self) -> f32 {
        match self {
            Self::Xm | Self::Xp => 1.,
            Self::Zm | Self::Zp => -1.,
        }
    }

    /// Roll (body X), pitch (body Z) and yaw (body Y) factors of this rotor.
    pub fn mix_factor(self) -> Vector3<f32> {
        match self {
            Self::Xm => Vector3::new(0., -1., 1.),
            Self::Xp => Vector3::new(0., 1., 1.),
            Self::Zm => Vector3::new(1., 0., -1.),
            Self::Zp => Vector3::new(-1., 0., -1.),
        }
    }
}

/// One rotor and its speed controller.
#[derive(Clone, Debug)]
pub struct RotorActuator {
    position: RotorPosition,
    config: RotorConfig,

    /// Commanded throttle, quantized
    throttle: f32,

    /// Throttle latched by the motor controller every PWM period
    pwm_throttle: f32,
    pwm_timer: Interval,

    rpm: f32,

    /// Rate of RPM change applied during the last update (in rpm/s)
    rpm_acceleration: f32,

    /// Nominal maximum plus this rotor's persistent offset
    max_rpm: f32,

    /// Resampled speed error (in rpm)
    rpm_error: f32,
    error_timer: Interval,

    rng: StdRng,
}

impl RotorActuator {
    pub fn new(position: RotorPosition, config: &RotorConfig, mut rng: StdRng) -> Self {
        let max_rpm = config.max_rpm + symmetric(&mut rng, config.max_rpm_jitter);
        let rpm_error = symmetric(&mut rng, config.rpm_error);

        Self {
            position,
            config: *config,
            throttle: 0.,
            pwm_throttle: 0.,
            pwm_timer: Interval::resetting(seconds(config.pwm_period)),
            rpm: 0.,
            rpm_acceleration: 0.,
            max_rpm,
            rpm_error,
            error_timer: Interval::resetting(seconds(config.rpm_error_period)),
            rng,
        }
    }

    /// Command a new throttle in [0, 1]. Takes effect on the next [`update`](Self::update).
    pub fn set_throttle(&mut self, value: f32) {
        self.throttle = quantize_throttle(value);
    }

    /// Advance the rotor by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if dt <= 0. {
            return;
        }

        if self.pwm_timer.advance(dt).is_some() {
            self.pwm_throttle = self.throttle;
        }

        if self.error_timer.advance(dt).is_some() {
            self.rpm_error = symmetric(&mut self.rng, self.config.rpm_error);
            log::debug!(
                "rotor {} rpm error resampled to {:.1}",
                self.position.name(),
                self.rpm_error
            );
        }

        self.approach(self.target_rpm(), dt);
    }

    /// Move towards `target` at a rate proportional to the remaining distance,
    /// bounded by the slew rates of the motor.
    fn approach(&mut self, target: f32, dt: f32) {
        let delta = target - self.rpm;
        let max_step = self.config.max_slew * dt;
        let min_step = self.config.min_slew * dt;

        let mut step = (delta * self.config.response * dt).clamp(-max_step, max_step);
        if step.abs() < min_step {
            // The proportional step vanishes near the target
            step = min_step.copysign(delta);
        }

        if step.abs() >= delta.abs() {
            // Snap to the target rather than hunting around it
            self.rpm = target;
            self.rpm_acceleration = 0.;
        } else {
            self.rpm += step;
            self.rpm_acceleration = step / dt;
        }
        self.rpm = self.rpm.max(0.);
    }

    /// Speed the rotor is heading for at the current throttle.
    pub fn target_rpm(&self) -> f32 {
        (self.throttle * self.max_rpm + self.rpm_error).max(0.)
    }

    /// Thrust along the body +Y axis (in N).
    pub fn current_force(&self) -> f32 {
        self.config.thrust_curve.force(self.rpm)
    }

    /// Reaction torque about the body +Y axis (in N*m).
    pub fn reaction_torque(&self) -> f32 {
        self.position.spin_direction() * self.config.torque_per_rpm * self.rpm
    }

    /// Push this rotor's thrust and reaction torque into the physics world.
    pub fn apply<P: PhysicsWorld + ?Sized>(&self, world: &mut P, body: BodyHandle) {
        world.apply_local_force(
            body,
            Vector3::new(0., self.current_force(), 0.),
            self.offset(),
        );
        world.apply_local_torque(body, Vector3::new(0., self.reaction_torque(), 0.));
    }

    pub fn position(&self) -> RotorPosition {
        self.position
    }

    pub fn offset(&self) -> Vector3<f32> {
        self.position.offset(self.config.arm_length)
    }

    pub fn rpm(&self) -> f32 {
        self.rpm
    }

    pub fn throttle(&self) -> f32 {
        self.throttle
    }

    pub fn pwm_throttle(&self) -> f32 {
        self.pwm_throttle
    }

    pub fn rpm_acceleration(&self) -> f32 {
        self.rpm_acceleration
    }

    pub fn max_rpm(&self) -> f32 {
        self.max_rpm
    }

    pub fn rpm_error(&self) -> f32 {
        self.rpm_error
    }
}

fn symmetric(rng: &mut StdRng, bound: f32) -> f32 {
    if bound > 0. {
        rng.gen_range(-bound..=bound)
    } else {
        0.
    }
}
