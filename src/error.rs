//! Error types for the profiling session lifecycle.
//!
//! [`SessionError`] is the low-level cause reported by the profiler wire
//! layer. [`ProfileError`] is the plugin-level taxonomy the coordinator works
//! in: everything that can go wrong between attachment and the written
//! artifact maps onto exactly one of its variants, and everything that
//! happens after the completion handoff is logged rather than propagated.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Failure of a single profiler wire operation.
#[derive(Debug)]
pub enum SessionError {
    /// Transport-level I/O failure.
    Io(io::Error),
    /// The profiler endpoint answered with an error response.
    Remote { code: i64, message: String },
    /// Traffic that does not parse as inspector protocol.
    Protocol(String),
    /// The transport closed before a response arrived.
    Closed,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Io(err) => write!(f, "i/o error: {err}"),
            SessionError::Remote { code, message } => {
                write!(f, "profiler error {code}: {message}")
            }
            SessionError::Protocol(message) => write!(f, "protocol error: {message}"),
            SessionError::Closed => f.write_str("profiler connection closed"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for SessionError {
    fn from(err: io::Error) -> Self {
        SessionError::Io(err)
    }
}

/// Everything the plugin can fail with.
///
/// `Configuration` and `Connection` surface synchronously from attachment and
/// are allowed to fail the host's setup; the remaining variants occur during
/// the completion handoff and are only ever logged.
#[derive(Debug)]
pub enum ProfileError {
    /// Neither an explicit output path nor a derivable pipeline output
    /// directory was available at attachment.
    Configuration(String),
    /// The native profiling facility could not be reached or failed while
    /// ending the session.
    Connection(SessionError),
    /// The enable/start chain rejected before the pipeline completed.
    Sequencing(SessionError),
    /// `stop` resolved without profile data.
    EmptyProfile,
    /// Persisting the artifact failed.
    Write { path: PathBuf, source: io::Error },
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileError::Configuration(message) => {
                write!(f, "configuration error: {message}")
            }
            ProfileError::Connection(err) => write!(f, "profiler connection failed: {err}"),
            ProfileError::Sequencing(err) => {
                write!(f, "profiler enable/start sequence failed: {err}")
            }
            ProfileError::EmptyProfile => {
                f.write_str("profiler stop returned no profile information")
            }
            ProfileError::Write { path, source } => {
                write!(f, "failed to write profile to {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ProfileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProfileError::Connection(err) | ProfileError::Sequencing(err) => Some(err),
            ProfileError::Write { source, .. } => Some(source),
            _ => None,
        }
    }
}
