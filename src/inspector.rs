//! DevTools-protocol profiler client.
//!
//! Speaks the `Profiler.*` domain as newline-delimited JSON-RPC over any
//! byte stream the host supplies, the same way the host supplies the output
//! filesystem. Requests carry a monotonically increasing `id`; responses are
//! matched on that id and unsolicited notifications are skipped. The
//! coordinator never issues two calls concurrently, so a plain
//! request/response loop is all the dispatching this client needs.

use crate::error::{ProfileError, SessionError};
use crate::session::{ProfilePayload, ProfilerConnector, ProfilerSession};
use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};

#[derive(Serialize)]
struct Request<'a> {
    id: u64,
    method: &'a str,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    result: Option<Box<RawValue>>,
    #[serde(default)]
    error: Option<RemoteError>,
}

#[derive(Deserialize)]
struct RemoteError {
    code: i64,
    message: String,
}

/// `Profiler.stop` result shape. Everything inside `profile` stays opaque.
#[derive(Deserialize)]
struct StopResult {
    #[serde(default)]
    profile: Option<Box<RawValue>>,
}

/// A profiler session over an inspector byte stream.
pub struct InspectorSession<S> {
    transport: Framed<S, LinesCodec>,
    next_id: u64,
}

impl<S: AsyncRead + AsyncWrite + Unpin> InspectorSession<S> {
    pub fn new(stream: S) -> Self {
        Self {
            transport: Framed::new(stream, LinesCodec::new()),
            next_id: 1,
        }
    }

    /// Issue one method call and wait for its response.
    async fn post(&mut self, method: &str) -> Result<Option<Box<RawValue>>, SessionError> {
        let id = self.next_id;
        self.next_id += 1;
        let request = serde_json::to_string(&Request { id, method })
            .map_err(|err| SessionError::Protocol(err.to_string()))?;
        self.transport.send(request).await.map_err(codec_error)?;

        loop {
            let line = match self.transport.next().await {
                Some(line) => line.map_err(codec_error)?,
                None => return Err(SessionError::Closed),
            };
            let response: Response = serde_json::from_str(&line)
                .map_err(|err| SessionError::Protocol(format!("bad inspector message: {err}")))?;
            // Notifications and responses to other calls are not ours.
            if response.id != Some(id) {
                continue;
            }
            if let Some(error) = response.error {
                return Err(SessionError::Remote {
                    code: error.code,
                    message: error.message,
                });
            }
            return Ok(response.result);
        }
    }
}

fn codec_error(err: LinesCodecError) -> SessionError {
    match err {
        LinesCodecError::Io(io) => SessionError::Io(io),
        other => SessionError::Protocol(other.to_string()),
    }
}

impl<S> ProfilerSession for InspectorSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn enable(&mut self) -> BoxFuture<'_, Result<(), SessionError>> {
        Box::pin(async move { self.post("Profiler.enable").await.map(|_| ()) })
    }

    fn start(&mut self) -> BoxFuture<'_, Result<(), SessionError>> {
        Box::pin(async move { self.post("Profiler.start").await.map(|_| ()) })
    }

    fn stop(&mut self) -> BoxFuture<'_, Result<Option<ProfilePayload>, SessionError>> {
        Box::pin(async move {
            let Some(result) = self.post("Profiler.stop").await? else {
                return Ok(None);
            };
            let stop: StopResult = serde_json::from_str(result.get()).map_err(|err| {
                SessionError::Protocol(format!("bad Profiler.stop result: {err}"))
            })?;
            Ok(stop.profile.map(ProfilePayload::from_raw))
        })
    }
}

/// Connector for a profiler reachable over TCP, e.g. a runtime started with
/// its inspector listening on a local port.
///
/// `open` must be called from within a tokio runtime; the connect itself is
/// a blocking local-socket connect so attachment can fail fast.
pub struct InspectorEndpoint {
    addr: SocketAddr,
}

impl InspectorEndpoint {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }
}

impl ProfilerConnector for InspectorEndpoint {
    fn open(&self) -> Result<Box<dyn ProfilerSession>, ProfileError> {
        let stream = std::net::TcpStream::connect(self.addr)
            .and_then(|stream| {
                stream.set_nonblocking(true)?;
                tokio::net::TcpStream::from_std(stream)
            })
            .map_err(|err| ProfileError::Connection(SessionError::Io(err)))?;
        Ok(Box::new(InspectorSession::new(stream)))
    }
}
