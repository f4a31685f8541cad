// fn-switcher Platform Backends
// OS integration behind the core's provider and event-source seams

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "macos")]
pub use macos::{run_event_tap, PlatformError, TisInputSource};
