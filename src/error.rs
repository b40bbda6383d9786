use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors the core can produce. Per the design, `UnknownHandle` is not
/// surfaced through this type: a `gc` call on an unrecognized handle is a
/// deliberate no-op (see [`crate::gset::GcOutcome`]), not a failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("ROT bucket size must be >= 2, got {0}")]
    CapacityViolation(u32),
    #[error("id {id} is not greater than the last id emitted by this replica ({last})")]
    NonMonotonicId { id: u64, last: u64 },
}
