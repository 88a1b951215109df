//! The profiling session coordinator.
//!
//! One coordinator owns exactly one session: it sequences enable→start when
//! the pipeline attaches it, and stop→serialize→write when the pipeline
//! completes. The enable/start chain is spawned fire-and-forget so the
//! pipeline's own startup is never blocked, but the pending chain is kept as
//! coordinator state and awaited in full before `stop` is issued: the build
//! can finish faster than profiler setup, and `stop` before `start` has
//! resolved yields garbage.

use crate::error::{ProfileError, SessionError};
use crate::output::{self, OutputFileSystem};
use crate::pipeline::{Logger, PipelineContext};
use crate::plugin::CpuProfileOptions;
use crate::session::{ProfilerConnector, ProfilerSession};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Lifecycle of a single profiling attempt.
///
/// There is no transition back to [`Idle`](SessionState::Idle): once
/// `Completed` or `Failed`, the coordinator is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Enabling,
    Sampling,
    Stopping,
    Completed,
    Failed,
}

type BoxedSession = Box<dyn ProfilerSession>;

pub struct SessionCoordinator {
    profile_name: String,
    output_path: PathBuf,
    filesystem: Arc<dyn OutputFileSystem>,
    logger: Arc<dyn Logger>,
    /// Held across awaits by the spawned chain, hence the async mutex.
    session: Arc<Mutex<BoxedSession>>,
    /// The pending enable+start chain; consumed by the first completion.
    start_sequence: StdMutex<Option<JoinHandle<Result<(), SessionError>>>>,
    state: StdMutex<SessionState>,
}

impl std::fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("profile_name", &self.profile_name)
            .field("output_path", &self.output_path)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SessionCoordinator {
    /// Resolve the output target, open the profiler, and begin the
    /// enable→start chain.
    ///
    /// Returns without awaiting the chain; [`complete`](Self::complete)
    /// awaits it later. Configuration and connection failures surface here,
    /// synchronously, where they may fail the host's setup; they indicate
    /// misuse, unlike anything that happens after attachment.
    ///
    /// Must be called from within a tokio runtime.
    pub fn attach(
        options: &CpuProfileOptions,
        context: &PipelineContext,
        connector: &dyn ProfilerConnector,
    ) -> Result<Arc<Self>, ProfileError> {
        let output_path =
            output::resolve_output_path(options.output_path(), context.output_dir())?;
        let logger = context.logger();
        let session = connector.open()?;
        let profile_name = options.profile_name().to_owned();

        logger.info(&format!("starting CPU profile: {profile_name}"));

        let coordinator = Arc::new(Self {
            profile_name,
            output_path,
            filesystem: context.filesystem(),
            logger,
            session: Arc::new(Mutex::new(session)),
            start_sequence: StdMutex::new(None),
            state: StdMutex::new(SessionState::Idle),
        });

        coordinator.set_state(SessionState::Enabling);
        let chain = {
            let session = coordinator.session.clone();
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                let mut session = session.lock().await;
                session.enable().await?;
                session.start().await?;
                coordinator.set_state(SessionState::Sampling);
                Ok(())
            })
        };
        *coordinator.start_sequence.lock().unwrap() = Some(chain);

        Ok(coordinator)
    }

    /// Hook body for the pipeline's completion point.
    ///
    /// Never fails the host: every error from here on is logged through the
    /// session's logger and swallowed. This is the one boundary allowed to
    /// discard a [`ProfileError`].
    pub async fn complete(&self) {
        let chain = self.start_sequence.lock().unwrap().take();
        let Some(chain) = chain else {
            self.logger.error("CPU profile session already completed");
            return;
        };
        if let Err(err) = self.finish(chain).await {
            self.set_state(SessionState::Failed);
            self.logger
                .error(&format!("CPU profile session failed: {err}"));
        }
    }

    async fn finish(&self, chain: JoinHandle<Result<(), SessionError>>) -> Result<(), ProfileError> {
        chain
            .await
            .map_err(|err| {
                ProfileError::Sequencing(SessionError::Protocol(format!(
                    "start sequence task failed: {err}"
                )))
            })?
            .map_err(ProfileError::Sequencing)?;

        self.set_state(SessionState::Stopping);
        let payload = {
            let mut session = self.session.lock().await;
            session.stop().await.map_err(ProfileError::Connection)?
        };
        let payload = match payload {
            Some(payload) if !payload.is_empty() => payload,
            _ => return Err(ProfileError::EmptyProfile),
        };

        output::write_profile(self.filesystem.as_ref(), &self.output_path, &payload).await?;
        self.logger.info(&format!(
            "CPU profile written to: {}",
            self.output_path.display()
        ));
        self.set_state(SessionState::Completed);
        Ok(())
    }

    /// Current lifecycle state. Transitions are driven internally; this is
    /// observation only.
    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    fn set_state(&self, next: SessionState) {
        *self.state.lock().unwrap() = next;
    }
}
