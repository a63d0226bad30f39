//! The public error type.
//!
//! Internally the crate works with `anyhow` and attaches context as it goes. At the public
//! boundary errors are tagged with an `ErrorType` so that callers can tell a missing id apart from
//! a malformed partition file without matching on message text.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of an `Error`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The operation is not supported by this store, e.g. `disconnect`.
    Unsupported,
    /// An id did not match any row.
    NotFound,
    /// A column name is not part of the transaction schema, or may not be used in this position.
    UnknownColumn,
    /// A mandatory column was not supplied.
    MissingColumn,
    /// A value could not be converted to its column's type.
    Coercion,
    /// A record with the same id already exists.
    DuplicateId,
    /// A partition file could not be read, decoded or written.
    Storage,
    /// The configuration directory or file is missing or invalid.
    Config,
    /// Anything else.
    Internal,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// An error returned from the public API.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub(crate) fn new(error_type: ErrorType, message: impl Display) -> Self {
        Self {
            error_type,
            inner: anyhow::anyhow!("{message}"),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.inner)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl From<anyhow::Error> for Error {
    fn from(inner: anyhow::Error) -> Self {
        Self {
            error_type: ErrorType::Internal,
            inner,
        }
    }
}

/// Converts an internal result into a public `Result` tagged with an `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error {
            error_type,
            inner: e.into(),
        })
    }
}

/// Returns early with an `Error` of the given type, formatted like `anyhow::bail!`.
macro_rules! fail {
    ($error_type:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::new($error_type, format!($($arg)*)))
    };
}

pub(crate) use fail;
