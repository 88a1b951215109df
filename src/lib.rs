#![doc = include_str!("../README.md")]

mod coordinator;
mod error;
mod inspector;
mod output;
mod pipeline;
mod plugin;
mod session;

pub use coordinator::{SessionCoordinator, SessionState};
pub use error::{ProfileError, SessionError};
pub use inspector::{InspectorEndpoint, InspectorSession};
pub use output::{
    MemoryFileSystem, NativeFileSystem, OutputFileSystem, PROFILE_FILE_NAME, resolve_output_path,
};
pub use pipeline::{ConfiguredHook, DoneHook, Logger, PipelineContext, PipelineHooks, TracingLogger};
pub use plugin::{CpuProfileOptions, CpuProfilePlugin, DEFAULT_PROFILE_NAME, PLUGIN_NAME};
pub use session::{ProfilePayload, ProfilerConnector, ProfilerSession};
