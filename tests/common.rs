//! Shared fakes for the integration tests: a scriptable profiler, a
//! capturing logger, a failing filesystem, and a fake pipeline that owns the
//! registered hooks.

#![allow(dead_code)]

use cpuprofile_plugin::{
    ConfiguredHook, DoneHook, Logger, OutputFileSystem, PipelineContext, PipelineHooks,
    ProfileError, ProfilePayload, ProfilerConnector, ProfilerSession, SessionError,
};
use futures_util::future::BoxFuture;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A small but structurally valid `.cpuprofile` document.
pub const PROFILE_JSON: &str = r#"{"nodes":[{"id":1,"callFrame":{"functionName":"(root)"}}],"startTime":0,"endTime":1200,"samples":[1,1],"timeDeltas":[0,600]}"#;

/// How the scripted profiler answers `stop`.
#[derive(Clone, Copy, Default)]
pub enum StopBehavior {
    #[default]
    Profile,
    Empty,
    Fail,
}

/// Scriptable stand-in for the platform profiler. Cloning shares the
/// recorded state, so tests keep a handle and inspect it afterwards.
#[derive(Clone, Default)]
pub struct FakeProfiler {
    opens: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<&'static str>>>,
    stop_behavior: StopBehavior,
}

impl FakeProfiler {
    pub fn new(stop_behavior: StopBehavior) -> Self {
        Self {
            stop_behavior,
            ..Self::default()
        }
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProfilerConnector for FakeProfiler {
    fn open(&self) -> Result<Box<dyn ProfilerSession>, ProfileError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            profiler: self.clone(),
        }))
    }
}

struct FakeSession {
    profiler: FakeProfiler,
}

impl ProfilerSession for FakeSession {
    fn enable(&mut self) -> BoxFuture<'_, Result<(), SessionError>> {
        let profiler = self.profiler.clone();
        Box::pin(async move {
            tokio::task::yield_now().await;
            profiler.calls.lock().unwrap().push("enable");
            Ok(())
        })
    }

    fn start(&mut self) -> BoxFuture<'_, Result<(), SessionError>> {
        let profiler = self.profiler.clone();
        Box::pin(async move {
            profiler.calls.lock().unwrap().push("start");
            Ok(())
        })
    }

    fn stop(&mut self) -> BoxFuture<'_, Result<Option<ProfilePayload>, SessionError>> {
        let profiler = self.profiler.clone();
        Box::pin(async move {
            profiler.calls.lock().unwrap().push("stop");
            match profiler.stop_behavior {
                StopBehavior::Profile => {
                    Ok(Some(ProfilePayload::from_json(PROFILE_JSON).unwrap()))
                }
                StopBehavior::Empty => Ok(None),
                StopBehavior::Fail => Err(SessionError::Remote {
                    code: -32000,
                    message: "platform profiler went away".into(),
                }),
            }
        })
    }
}

/// Connector that hands out one pre-built session, then reports the
/// profiling facility as unavailable.
pub struct PreparedConnector {
    session: Mutex<Option<Box<dyn ProfilerSession>>>,
}

impl PreparedConnector {
    pub fn new(session: Box<dyn ProfilerSession>) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl ProfilerConnector for PreparedConnector {
    fn open(&self) -> Result<Box<dyn ProfilerSession>, ProfileError> {
        self.session
            .lock()
            .unwrap()
            .take()
            .ok_or(ProfileError::Connection(SessionError::Closed))
    }
}

/// [`Logger`] that records everything, shared across clones.
#[derive(Clone, Default)]
pub struct CapturingLogger {
    infos: Arc<Mutex<Vec<String>>>,
    errors: Arc<Mutex<Vec<String>>>,
}

impl CapturingLogger {
    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl Logger for CapturingLogger {
    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_owned());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_owned());
    }
}

/// Filesystem whose writes always fail, as a read-only output target would.
pub struct FailingFileSystem;

impl OutputFileSystem for FailingFileSystem {
    fn write_file<'a>(
        &'a self,
        _path: &'a Path,
        _contents: &'a [u8],
    ) -> BoxFuture<'a, io::Result<()>> {
        Box::pin(async {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "read-only output filesystem",
            ))
        })
    }
}

/// Owns the hooks a plugin registers and fires them the way a host pipeline
/// would.
#[derive(Default)]
pub struct FakePipeline {
    configured: Vec<(&'static str, ConfiguredHook)>,
    done: Vec<(&'static str, DoneHook)>,
}

impl FakePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names the hooks were registered under, configured hooks first.
    pub fn tapped(&self) -> Vec<&'static str> {
        self.configured
            .iter()
            .map(|(name, _)| *name)
            .chain(self.done.iter().map(|(name, _)| *name))
            .collect()
    }

    pub fn fire_configured(&mut self, context: &PipelineContext) -> Result<(), ProfileError> {
        for (_, hook) in self.configured.iter_mut() {
            hook(context)?;
        }
        Ok(())
    }

    pub async fn fire_done(&mut self) {
        for (_, hook) in self.done.iter_mut() {
            hook().await;
        }
    }
}

impl PipelineHooks for FakePipeline {
    fn tap_configured(&mut self, plugin: &'static str, hook: ConfiguredHook) {
        self.configured.push((plugin, hook));
    }

    fn tap_done(&mut self, plugin: &'static str, hook: DoneHook) {
        self.done.push((plugin, hook));
    }
}
