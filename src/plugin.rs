//! Host-facing plugin: configuration options and hook registration.

use crate::coordinator::SessionCoordinator;
use crate::pipeline::{PipelineContext, PipelineHooks};
use crate::session::ProfilerConnector;
use futures_util::future::BoxFuture;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Name the plugin registers its hooks under, also its logging channel.
pub const PLUGIN_NAME: &str = "CpuProfilePlugin";

/// Profile name used when the options leave it unset.
pub const DEFAULT_PROFILE_NAME: &str = "webpack";

/// Plugin configuration.
///
/// Field names follow the host pipeline's config convention
/// (`profileName` / `outputPath`), so the struct deserializes straight out
/// of a pipeline config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CpuProfileOptions {
    profile_name: Option<String>,
    output_path: Option<PathBuf>,
}

impl CpuProfileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile_name(mut self, name: impl Into<String>) -> Self {
        self.profile_name = Some(name.into());
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Effective profile name.
    pub fn profile_name(&self) -> &str {
        self.profile_name.as_deref().unwrap_or(DEFAULT_PROFILE_NAME)
    }

    /// Explicit artifact path, if one was configured.
    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }
}

struct PluginShared {
    options: CpuProfileOptions,
    connector: Box<dyn ProfilerConnector>,
    attached: AtomicBool,
    coordinator: Mutex<Option<Arc<SessionCoordinator>>>,
}

/// The CPU profile plugin.
///
/// Construct with a [`ProfilerConnector`] to the platform profiler, then
/// hand it to the host pipeline adapter via [`apply`](Self::apply).
pub struct CpuProfilePlugin {
    options: CpuProfileOptions,
    connector: Box<dyn ProfilerConnector>,
}

impl CpuProfilePlugin {
    pub fn new(connector: Box<dyn ProfilerConnector>) -> Self {
        Self::with_options(CpuProfileOptions::default(), connector)
    }

    pub fn with_options(options: CpuProfileOptions, connector: Box<dyn ProfilerConnector>) -> Self {
        Self { options, connector }
    }

    /// Register this plugin's two lifecycle handlers under [`PLUGIN_NAME`].
    ///
    /// Attachment happens when the host fires its configured hook: the
    /// profiler is opened and armed there, and stopped after the done hook
    /// fires. The configured hook may fire more than once per host run; only
    /// the first firing starts a session.
    pub fn apply(self, hooks: &mut dyn PipelineHooks) {
        let shared = Arc::new(PluginShared {
            options: self.options,
            connector: self.connector,
            attached: AtomicBool::new(false),
            coordinator: Mutex::new(None),
        });

        let attach_shared = shared.clone();
        hooks.tap_configured(
            PLUGIN_NAME,
            Box::new(move |context: &PipelineContext| {
                if attach_shared.attached.swap(true, Ordering::SeqCst) {
                    return Ok(());
                }
                let coordinator = SessionCoordinator::attach(
                    &attach_shared.options,
                    context,
                    attach_shared.connector.as_ref(),
                )?;
                *attach_shared.coordinator.lock().unwrap() = Some(coordinator);
                Ok(())
            }),
        );

        hooks.tap_done(
            PLUGIN_NAME,
            Box::new(move || {
                let coordinator = shared.coordinator.lock().unwrap().clone();
                let done: BoxFuture<'static, ()> = Box::pin(async move {
                    if let Some(coordinator) = coordinator {
                        coordinator.complete().await;
                    }
                });
                done
            }),
        );
    }
}
