/// Errors raised while building a simulation or talking to the telemetry peer.
///
/// The per-step update path never fails; inputs are clamped instead.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A configuration value is out of its physical range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Telemetry transport failure
    #[error("telemetry io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
