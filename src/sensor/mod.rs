//! Noisy onboard sensors.
//!
//! True values are written by the vehicle after each physics step.
//! Readers only ever see `true value + uniform noise`.

use crate::config::SensorConfig;
use nalgebra::Vector3;
use rand::{rngs::StdRng, Rng};

/// A scalar physical quantity read back with additive uniform noise.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sensor {
    value: f32,
    amplitude: f32,
}

impl Sensor {
    /// Create a sensor reading zero with a peak-to-peak noise `amplitude`.
    pub fn new(amplitude: f32) -> Self {
        Self {
            value: 0.,
            amplitude: amplitude.abs(),
        }
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// The noise-free value.
    pub fn true_value(&self) -> f32 {
        self.value
    }

    pub(crate) fn set(&mut self, value: f32) {
        self.value = value;
    }

    /// Read the value with noise drawn from `[-amplitude / 2, amplitude / 2]`.
    pub fn read<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.amplitude == 0. {
            return self.value;
        }
        let half = self.amplitude / 2.;
        self.value + rng.gen_range(-half..=half)
    }
}

/// One sample of everything the flight controller may look at.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SensorSnapshot {
    /// Body rates (in rad/s)
    pub gyro: Vector3<f32>,

    /// Specific force in the body frame (in m/s^2)
    pub accel: Vector3<f32>,

    /// World frame velocity (in m/s)
    pub velocity: Vector3<f32>,

    /// World frame position (in m)
    pub position: Vector3<f32>,
}

/// The gyroscope and accelerometer triples plus the kinematic state.
#[derive(Clone, Debug)]
pub struct FlightSensors {
    gyro: [Sensor; 3],
    accel: [Sensor; 3],
    velocity: Vector3<f32>,
    position: Vector3<f32>,
    rng: StdRng,
}

impl FlightSensors {
    pub fn new(config: &SensorConfig, rng: StdRng) -> Self {
        Self {
            gyro: [Sensor::new(config.gyro_noise); 3],
            accel: [Sensor::new(config.accel_noise); 3],
            velocity: Vector3::zeros(),
            position: Vector3::zeros(),
            rng,
        }
    }

    /// Noisy body rates.
    pub fn gyro(&mut self) -> Vector3<f32> {
        let rng = &mut self.rng;
        Vector3::from_iterator(self.gyro.iter().map(|sensor| sensor.read(rng)))
    }

    /// Noisy specific force.
    pub fn accel(&mut self) -> Vector3<f32> {
        let rng = &mut self.rng;
        Vector3::from_iterator(self.accel.iter().map(|sensor| sensor.read(rng)))
    }

    pub fn true_gyro(&self) -> Vector3<f32> {
        Vector3::from_iterator(self.gyro.iter().map(Sensor::true_value))
    }

    pub fn true_accel(&self) -> Vector3<f32> {
        Vector3::from_iterator(self.accel.iter().map(Sensor::true_value))
    }

    pub fn velocity(&self) -> Vector3<f32> {
        self.velocity
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    /// Sample every sensor once.
    pub fn sample(&mut self) -> SensorSnapshot {
        SensorSnapshot {
            gyro: self.gyro(),
            accel: self.accel(),
            velocity: self.velocity,
            position: self.position,
        }
    }

    pub(crate) fn set_gyro(&mut self, rates: Vector3<f32>) {
        for (sensor, rate) in self.gyro.iter_mut().zip(rates.iter()) {
            sensor.set(*rate);
        }
    }

    pub(crate) fn set_accel(&mut self, accel: Vector3<f32>) {
        for (sensor, value) in self.accel.iter_mut().zip(accel.iter()) {
            sensor.set(*value);
        }
    }

    pub(crate) fn set_kinematics(&mut self, position: Vector3<f32>, velocity: Vector3<f32>) {
        self.position = position;
        self.velocity = velocity;
    }
}
