use thiserror::Error;

/// Errors raised by `IntervalSet` operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An interval's namespace differs from the namespace already held by the set
    #[error("all intervals in a set must share one namespace")]
    MixedNamespace,

    /// Empty intervals cannot be stored
    #[error("cannot store an empty interval")]
    EmptyInterval,

    /// The same payload is already stored at identical bounds
    #[error("payload already stored at these bounds")]
    DuplicateKey,

    #[error("payload not found")]
    NotFound,

    /// Complement bounds do not cover the stored data
    #[error("complement bounds must enclose the stored intervals")]
    Bounds,

    #[error("`{0}` is not supported on interval sets")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
