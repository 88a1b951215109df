//! The profiler session port driven by the coordinator.

use crate::error::{ProfileError, SessionError};
use futures_util::future::BoxFuture;
use serde_json::value::RawValue;

/// Captured sampling data returned by [`ProfilerSession::stop`].
///
/// The payload is opaque to this crate: it is carried as the raw JSON text
/// the profiler produced (for V8-style profilers, the `.cpuprofile` document
/// of timestamped call-stack samples) and written out byte for byte. Nothing
/// here interprets its contents.
#[derive(Debug)]
pub struct ProfilePayload {
    json: Box<RawValue>,
}

impl ProfilePayload {
    /// Wrap a raw JSON document. Fails if `json` is not valid JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            json: RawValue::from_string(json.to_owned())?,
        })
    }

    pub(crate) fn from_raw(json: Box<RawValue>) -> Self {
        Self { json }
    }

    /// The serialized profile, exactly as the profiler produced it.
    pub fn as_bytes(&self) -> &[u8] {
        self.json.get().as_bytes()
    }

    pub fn as_str(&self) -> &str {
        self.json.get()
    }

    /// True when the profiler answered but the answer carries no data.
    pub fn is_empty(&self) -> bool {
        self.json.get().trim() == "null"
    }
}

/// One connection to a sampling profiler.
///
/// The three operations are independent asynchronous calls; ordering is the
/// caller's job. `enable` must resolve before `start` is issued, and once
/// sampling has begun the only way to end it is `stop`; there is no
/// cancellation primitive.
pub trait ProfilerSession: Send {
    /// Arm the profiler. Must complete before [`start`](Self::start).
    fn enable(&mut self) -> BoxFuture<'_, Result<(), SessionError>>;

    /// Begin sample collection.
    fn start(&mut self) -> BoxFuture<'_, Result<(), SessionError>>;

    /// End sampling and return the accumulated payload. `None` means the
    /// session produced no data (stopped before `start` took effect, or
    /// already stopped); the native layer reports this rather than failing.
    fn stop(&mut self) -> BoxFuture<'_, Result<Option<ProfilePayload>, SessionError>>;
}

/// Opens profiler sessions.
///
/// Separate from [`ProfilerSession`] so that an unavailable profiling
/// facility fails attachment immediately instead of surfacing at the end of
/// the build.
pub trait ProfilerConnector: Send + Sync {
    fn open(&self) -> Result<Box<dyn ProfilerSession>, ProfileError>;
}
