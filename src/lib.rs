//! # quadcopter-sim
//! Flight dynamics and control loop simulation of a four rotor "plus" frame
//! quadcopter.
//!
//! # Vehicle
//! [`VehicleState`] ties everything together and advances the simulation one
//! physics step at a time.
//!
//! [`motor`] contains the rotor dynamics: throttle quantization, slew limited
//! RPM tracking and the thrust curve.
//!
//! [`control`] contains the PID [`BalanceController`](control::BalanceController)
//! and the control policies run by the [`FlightControlLoop`](scheduler::FlightControlLoop).
//!
//! # Environment
//! [`physics`] is the rigid body seam (see [`RapierWorld`] for the rapier backed
//! world).
//!
//! [`sensor`] models the noisy gyroscope and accelerometer.
//!
//! [`telemetry`] encodes the key/value telemetry stream and parses inbound
//! commands.
//!
//! ```
//! use quadcopter_sim::{ControlInput, SimConfig, VehicleState};
//!
//! let config = SimConfig::builder().seed(1).build().unwrap();
//! let mut vehicle = VehicleState::new(&config).unwrap();
//! vehicle.set_input(ControlInput::hover(0.5));
//!
//! for _ in 0..500 {
//!     vehicle.update(0.002);
//! }
//! assert!(vehicle.total_thrust() > 0.);
//! ```

pub mod config;
pub use config::SimConfig;

pub mod control;
pub use control::{ControlInput, ControlPolicy, FlightController};

mod error;
pub use error::{Error, Result};

pub mod motor;
pub use motor::{RotorActuator, RotorPosition};

pub mod physics;
pub use physics::{PhysicsWorld, RapierWorld};

pub mod scheduler;

pub mod sensor;

pub mod telemetry;
pub use telemetry::TelemetryFrame;

pub mod vehicle;
pub use vehicle::VehicleState;
