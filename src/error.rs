//! Unified error type.

use std::fmt;

/// The error type returned by gatehouse's fallible operations.
///
/// Handler failures are HTTP [`Response`](crate::Response) values, not
/// `Error`s, and the decorators add no failure modes of their own. This type
/// surfaces infrastructure failures: binding to a port or accepting a
/// connection.
#[derive(Debug)]
pub struct Error(std::io::Error);

impl Error {
    pub fn kind(&self) -> std::io::ErrorKind {
        self.0.kind()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "io: {}", self.0)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self(e)
    }
}
