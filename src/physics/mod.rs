//! Rigid body physics seen by the vehicle.
//!
//! The vehicle only needs to push forces and torques into a body, advance the
//! world and read the motion back. [`PhysicsWorld`] is that seam; any engine
//! can sit behind it. [`RapierWorld`] runs free-flying bodies on the rapier
//! pipeline.

use nalgebra::{UnitQuaternion, Vector3};

mod rapier;
pub use self::rapier::RapierWorld;

/// Reference to a body owned by a [`PhysicsWorld`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub(crate) usize);

pub trait PhysicsWorld {
    /// Apply a body frame `force` (in N) at `local_position` (in m) from the center of mass.
    /// Forces accumulate until the next [`step`](Self::step).
    fn apply_local_force(
        &mut self,
        body: BodyHandle,
        force: Vector3<f32>,
        local_position: Vector3<f32>,
    );

    /// Apply a body frame `torque` (in N*m) until the next step.
    fn apply_local_torque(&mut self, body: BodyHandle, torque: Vector3<f32>);

    /// Integrate every body by `dt` seconds and clear the applied loads.
    fn step(&mut self, dt: f32);

    /// World frame velocity (in m/s).
    fn linear_velocity(&self, body: BodyHandle) -> Vector3<f32>;

    /// World frame angular velocity (in rad/s).
    fn angular_velocity(&self, body: BodyHandle) -> Vector3<f32>;

    fn position(&self, body: BodyHandle) -> Vector3<f32>;

    fn orientation(&self, body: BodyHandle) -> UnitQuaternion<f32>;

    /// Gravitational acceleration in the world frame (in m/s^2).
    fn gravity(&self) -> Vector3<f32>;
}
