//! Ports onto the host pipeline: lifecycle hooks, the attachment context,
//! and the logging sink.
//!
//! The coordinator never sees a concrete pipeline API. An adapter around the
//! host implements [`PipelineHooks`] and builds a [`PipelineContext`] for the
//! attach point; everything else the plugin needs from the host is reached
//! through the traits here, which keeps the whole session testable against
//! fakes.

use crate::error::ProfileError;
use crate::output::OutputFileSystem;
use futures_util::future::BoxFuture;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Structured info/error sink. Hosts hand one out per plugin, namespaced
/// under the plugin's identity.
pub trait Logger: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// [`Logger`] that forwards to the `tracing` ecosystem, carrying the channel
/// name as a structured field.
pub struct TracingLogger {
    channel: String,
}

impl TracingLogger {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }
}

impl Logger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(channel = %self.channel, "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(channel = %self.channel, "{message}");
    }
}

/// What the host hands the attach handler: its configured output directory
/// (if any), the filesystem its outputs go through, and a logger already
/// namespaced for the requesting plugin.
#[derive(Clone)]
pub struct PipelineContext {
    output_dir: Option<PathBuf>,
    filesystem: Arc<dyn OutputFileSystem>,
    logger: Arc<dyn Logger>,
}

impl PipelineContext {
    pub fn new(filesystem: Arc<dyn OutputFileSystem>, logger: Arc<dyn Logger>) -> Self {
        Self {
            output_dir: None,
            filesystem,
            logger,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    pub fn filesystem(&self) -> Arc<dyn OutputFileSystem> {
        self.filesystem.clone()
    }

    pub fn logger(&self) -> Arc<dyn Logger> {
        self.logger.clone()
    }
}

/// Handler invoked at the synchronous "pipeline configured" attach point.
/// Some host integrations fire this more than once.
pub type ConfiguredHook = Box<dyn FnMut(&PipelineContext) -> Result<(), ProfileError> + Send>;

/// Handler invoked once at the asynchronous "pipeline completed" point. The
/// host awaits the returned future before reporting completion.
pub type DoneHook = Box<dyn FnMut() -> BoxFuture<'static, ()> + Send>;

/// The two lifecycle attachment points a host pipeline exposes. `plugin` is
/// the registering plugin's identity, also used as its logging channel name.
pub trait PipelineHooks {
    fn tap_configured(&mut self, plugin: &'static str, hook: ConfiguredHook);
    fn tap_done(&mut self, plugin: &'static str, hook: DoneHook);
}
