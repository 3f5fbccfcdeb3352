use std::fmt;

use hayloft_codec::CodecError;
use hayloft_query::FilterError;
use hayloft_store::StoreError;

#[derive(Debug)]
pub enum Error {
    /// Malformed schema, filter, projection or argument. Raised at the
    /// call that introduced the bad input, never deferred to execution.
    Validation(String),
    /// Decode or coercion failure against the stored byte form.
    Type(CodecError),
    /// Feature the underlying store cannot honor; callers may choose to
    /// degrade instead of failing.
    NotSupported(String),
    /// Store/transport failure, passed through unmodified.
    Store(StoreError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation(msg) => write!(f, "invalid argument: {msg}"),
            Error::Type(e) => write!(f, "type error: {e}"),
            Error::NotSupported(msg) => write!(f, "not supported: {msg}"),
            Error::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Error::Type(e)
    }
}

impl From<FilterError> for Error {
    fn from(e: FilterError) -> Self {
        Error::Validation(e.0)
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unsupported(msg) => Error::NotSupported(msg),
            other => Error::Store(other),
        }
    }
}
