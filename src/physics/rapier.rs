use super::{BodyHandle, PhysicsWorld};
use crate::config::BodyConfig;
use core::fmt;
use ::nalgebra::{Quaternion, UnitQuaternion, Vector3};
use rapier3d::prelude::*;

fn to_rapier(v: Vector3<f32>) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

fn from_rapier(v: &Vector<Real>) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

#[derive(Clone, Copy, Debug)]
struct Body {
    handle: RigidBodyHandle,

    /// Quadratic air friction coefficient
    drag_coefficient: f32,
}

/// Free-flying rigid bodies simulated by rapier, without a floor.
///
/// Quadratic air friction is applied as a world force before each step.
pub struct RapierWorld {
    gravity: Vector<Real>,
    bodies: Vec<Body>,
    rigid_bodies: RigidBodySet,
    colliders: ColliderSet,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new(Vector3::new(0., -9.81, 0.))
    }
}

impl RapierWorld {
    pub fn new(gravity: Vector3<f32>) -> Self {
        Self {
            gravity: to_rapier(gravity),
            bodies: Vec::new(),
            rigid_bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::default(),
            narrow_phase: NarrowPhase::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    /// A world with gravity of `config.gravity` along -Y.
    pub fn from_config(config: &BodyConfig) -> Self {
        Self::new(Vector3::new(0., -config.gravity, 0.))
    }

    /// Add a body at rest at the origin with the mass, inertia and drag of `config`.
    pub fn add_body(&mut self, config: &BodyConfig) -> BodyHandle {
        let rigid_body = RigidBodyBuilder::dynamic().can_sleep(false).build();

        // The collider only carries the mass properties
        let collider = ColliderBuilder::ball(0.1)
            .mass_properties(MassProperties::new(
                point![0., 0., 0.],
                config.mass,
                to_rapier(config.inertia),
            ))
            .build();

        let handle = self.rigid_bodies.insert(rigid_body);
        self.colliders
            .insert_with_parent(collider, handle, &mut self.rigid_bodies);

        self.bodies.push(Body {
            handle,
            drag_coefficient: config.drag_coefficient,
        });
        BodyHandle(self.bodies.len() - 1)
    }

    fn rigid_body(&self, body: BodyHandle) -> &RigidBody {
        &self.rigid_bodies[self.bodies[body.0].handle]
    }

    fn rigid_body_mut(&mut self, body: BodyHandle) -> &mut RigidBody {
        &mut self.rigid_bodies[self.bodies[body.0].handle]
    }
}

impl fmt::Debug for RapierWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RapierWorld")
            .field("gravity", &from_rapier(&self.gravity))
            .field("bodies", &self.bodies.len())
            .finish()
    }
}

/// # Panics
/// Every method panics if `body` was not returned by this world's [`RapierWorld::add_body`].
impl PhysicsWorld for RapierWorld {
    fn apply_local_force(
        &mut self,
        body: BodyHandle,
        force: Vector3<f32>,
        local_position: Vector3<f32>,
    ) {
        let rb = self.rigid_body_mut(body);
        let world_force = rb.rotation() * to_rapier(force);
        let world_point = rb.position() * Point::from(to_rapier(local_position));
        rb.add_force_at_point(world_force, world_point, true);
    }

    fn apply_local_torque(&mut self, body: BodyHandle, torque: Vector3<f32>) {
        let rb = self.rigid_body_mut(body);
        let world_torque = rb.rotation() * to_rapier(torque);
        rb.add_torque(world_torque, true);
    }

    fn step(&mut self, dt: f32) {
        for body in &self.bodies {
            let rb = &mut self.rigid_bodies[body.handle];
            let velocity = *rb.linvel();
            rb.add_force(-body.drag_coefficient * velocity.norm() * velocity, true);
        }

        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );

        // User loads persist in rapier until reset
        for body in &self.bodies {
            let rb = &mut self.rigid_bodies[body.handle];
            rb.reset_forces(false);
            rb.reset_torques(false);
        }
    }

    fn linear_velocity(&self, body: BodyHandle) -> Vector3<f32> {
        from_rapier(self.rigid_body(body).linvel())
    }

    fn angular_velocity(&self, body: BodyHandle) -> Vector3<f32> {
        from_rapier(self.rigid_body(body).angvel())
    }

    fn position(&self, body: BodyHandle) -> Vector3<f32> {
        from_rapier(self.rigid_body(body).translation())
    }

    fn orientation(&self, body: BodyHandle) -> UnitQuaternion<f32> {
        let q = self.rigid_body(body).rotation().quaternion();
        UnitQuaternion::new_unchecked(Quaternion::new(q.w, q.i, q.j, q.k))
    }

    fn gravity(&self) -> Vector3<f32> {
        from_rapier(&self.gravity)
    }
}
