//! The simulated quadcopter: rotors, sensors and the control loop bolted to a
//! rigid body.

use crate::config::SimConfig;
use crate::control::{Command, ControlInput, ControlPolicy, FlightController};
use crate::motor::{RotorActuator, RotorPosition};
use crate::physics::{BodyHandle, PhysicsWorld, RapierWorld};
use crate::scheduler::FlightControlLoop;
use crate::sensor::FlightSensors;
use crate::telemetry::{self, TelemetryFrame};
use nalgebra::{UnitQuaternion, Vector3};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// One quadcopter flying in a [`PhysicsWorld`].
///
/// Each [`update`](Self::update) runs a full simulation step in this order:
/// 1. Integrate the gyroscope rates into the attitude accumulators
/// 2. Advance the control loop, which may write new rotor throttles
/// 3. Apply the rotor loads, step the physics world and feed the resulting
///    motion back into the sensors
/// 4. Advance the rotor dynamics
///
/// The control loop therefore always acts on the sensors of the previous step,
/// and the throttles it writes reach the physics world on the next step.
#[derive(Debug)]
pub struct VehicleState<P = RapierWorld> {
    world: P,
    body: BodyHandle,
    rotors: [RotorActuator; 4],
    sensors: FlightSensors,
    control: FlightControlLoop,
    input: ControlInput,

    /// Rectangular integral of the noisy gyroscope rates (in rad)
    gyro_integral: Vector3<f32>,

    last_velocity: Vector3<f32>,

    /// World frame acceleration derived from the last step (in m/s^2)
    acceleration: Vector3<f32>,

    /// Simulated time (in seconds)
    time: f64,
}

impl VehicleState<RapierWorld> {
    /// Build a vehicle running the policy selected by `config.policy` in a
    /// fresh [`RapierWorld`].
    pub fn new(config: &SimConfig) -> crate::Result<Self> {
        Self::with_policy(config, ControlPolicy::from_config(config))
    }

    /// Build a vehicle flown by an external `controller`.
    pub fn with_controller<C>(config: &SimConfig, controller: C) -> crate::Result<Self>
    where
        C: FlightController + Send + 'static,
    {
        Self::with_policy(config, ControlPolicy::delegated(controller))
    }

    pub fn with_policy(config: &SimConfig, policy: ControlPolicy) -> crate::Result<Self> {
        let mut world = RapierWorld::from_config(&config.body);
        let body = world.add_body(&config.body);
        Self::with_world(config, world, body, policy)
    }
}

impl<P: PhysicsWorld> VehicleState<P> {
    /// Attach a vehicle to `body` in an existing physics `world`.
    ///
    /// The world's mass and inertia for `body` are used as they are; only the
    /// rotor, sensor and control parts of `config` apply.
    pub fn with_world(
        config: &SimConfig,
        world: P,
        body: BodyHandle,
        policy: ControlPolicy,
    ) -> crate::Result<Self> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // Every part draws from its own stream so adding noise to one
        // does not shift the others
        let rotors = RotorPosition::ALL.map(|position| {
            RotorActuator::new(position, &config.rotor, StdRng::seed_from_u64(rng.gen()))
        });
        let sensors = FlightSensors::new(&config.sensors, StdRng::seed_from_u64(rng.gen()));

        log::info!(
            "vehicle ready: policy={} control period={} ms seed={:?}",
            policy.name(),
            config.control_period.0,
            config.seed
        );
        for rotor in &rotors {
            log::debug!(
                "rotor {} max rpm {:.1}",
                rotor.position().name(),
                rotor.max_rpm()
            );
        }

        let last_velocity = world.linear_velocity(body);
        Ok(Self {
            world,
            body,
            rotors,
            sensors,
            control: FlightControlLoop::new(config.control_period, policy),
            input: ControlInput::default(),
            gyro_integral: Vector3::zeros(),
            last_velocity,
            acceleration: Vector3::zeros(),
            time: 0.,
        })
    }

    /// Advance the simulation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if dt <= 0. {
            return;
        }

        // 1. Integrate the attitude from the gyroscope
        let rates = self.sensors.gyro();
        self.gyro_integral += rates * dt;

        // 2. Run the control loop on the sensors of the previous step
        self.control
            .update(dt, &self.input, &mut self.sensors, &mut self.rotors);

        // 3. Step the rigid body under the current rotor loads
        for rotor in &self.rotors {
            rotor.apply(&mut self.world, self.body);
        }
        self.world.step(dt);
        self.read_back(dt);

        // 4. Advance the rotors towards their new targets
        for rotor in &mut self.rotors {
            rotor.update(dt);
        }

        self.time += f64::from(dt);
    }

    /// Feed the motion of the last physics step into the sensors.
    fn read_back(&mut self, dt: f32) {
        let velocity = self.world.linear_velocity(self.body);
        let angular_velocity = self.world.angular_velocity(self.body);
        let world_to_body = self.world.orientation(self.body).inverse();

        self.acceleration = (velocity - self.last_velocity) / dt;
        self.last_velocity = velocity;

        // An accelerometer senses everything but gravity
        let specific_force = self.acceleration - self.world.gravity();

        self.sensors.set_gyro(world_to_body * angular_velocity);
        self.sensors.set_accel(world_to_body * specific_force);
        self.sensors
            .set_kinematics(self.world.position(self.body), velocity);
    }

    pub fn input(&self) -> &ControlInput {
        &self.input
    }

    pub fn set_input(&mut self, input: ControlInput) {
        self.input = input;
    }

    pub fn apply_command(&mut self, command: Command) {
        self.input.apply(command);
    }

    /// Apply every recognized command line of a telemetry payload.
    pub fn apply_commands(&mut self, payload: &str) {
        for command in telemetry::parse_commands(payload) {
            self.input.apply(command);
        }
    }

    pub fn rotors(&self) -> &[RotorActuator; 4] {
        &self.rotors
    }

    pub fn rotor(&self, position: RotorPosition) -> &RotorActuator {
        &self.rotors[position.index()]
    }

    /// Sum of the four rotor thrusts (in N).
    pub fn total_thrust(&self) -> f32 {
        self.rotors.iter().map(RotorActuator::current_force).sum()
    }

    pub fn sensors(&self) -> &FlightSensors {
        &self.sensors
    }

    pub fn control_loop(&self) -> &FlightControlLoop {
        &self.control
    }

    pub fn control_loop_mut(&mut self) -> &mut FlightControlLoop {
        &mut self.control
    }

    pub fn gyro_integral(&self) -> Vector3<f32> {
        self.gyro_integral
    }

    pub fn acceleration(&self) -> Vector3<f32> {
        self.acceleration
    }

    pub fn position(&self) -> Vector3<f32> {
        self.world.position(self.body)
    }

    pub fn velocity(&self) -> Vector3<f32> {
        self.world.linear_velocity(self.body)
    }

    pub fn orientation(&self) -> UnitQuaternion<f32> {
        self.world.orientation(self.body)
    }

    /// True tilt about world X and Z, from the direction of the body up axis.
    pub fn tilt(&self) -> (f32, f32) {
        let up = self.orientation() * Vector3::y();
        (up.z.atan2(up.y), (-up.x).atan2(up.y))
    }

    /// Simulated time (in seconds).
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn world(&self) -> &P {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut P {
        &mut self.world
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    /// Snapshot the vehicle state for the telemetry stream.
    pub fn telemetry(&self) -> TelemetryFrame {
        let (angle_x_real, angle_z_real) = self.tilt();
        TelemetryFrame {
            gyro: self.sensors.true_gyro(),
            gyro_integral: self.gyro_integral,
            accel: self.sensors.true_accel(),
            position: self.sensors.position(),
            speed: self.sensors.velocity(),
            throttle: core::array::from_fn(|i| self.rotors[i].throttle()),
            pwm_throttle: core::array::from_fn(|i| self.rotors[i].pwm_throttle()),
            rpm: core::array::from_fn(|i| self.rotors[i].rpm()),
            pitch: self.input.pitch,
            yaw: self.input.yaw,
            roll: self.input.roll,
            angle_x: self.gyro_integral.x,
            angle_z: self.gyro_integral.z,
            angle_x_real,
            angle_z_real,
            time: self.time,
        }
    }
}
