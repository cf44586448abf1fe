//! Flight control laws.
//!
//! [`BalanceController`] is the PID used for every axis.
//! [`ControlPolicy`] selects how a control tick turns pilot input and sensor
//! readings into a [`ControlOutput`] for the mixer.

mod input;
pub use input::{Command, ControlInput};

mod pid;
pub use pid::{BalanceController, BalanceGains, DerivativeMode};

mod policy;
pub use policy::{
    ControlOutput, ControlPolicy, DirectControl, FlightController, HeightMode, PidBalance,
};
