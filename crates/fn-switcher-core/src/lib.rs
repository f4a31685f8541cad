// fn-switcher Core Library
// Fn key press classification and input source switching policy

pub mod config;
pub mod engine;
pub mod layout;
pub mod modifier;
pub mod platform;
pub mod source;
pub mod switch;
pub mod timer;
pub mod trigger;

pub use config::{
    ConfigError, ConfigFile, ConfigLayer, ConfigResolver, ConfigWarning, EffectiveConfig,
    FileStatus,
};
pub use engine::SwitcherEngine;
pub use layout::{normalize_layouts, parse_layout_list, Layout, LayoutList, KEYLAYOUT_PREFIX};
pub use modifier::{Edge, ModifierFlags, ModifierStateTracker};
pub use source::{InputSourceProvider, MemoryInputSource, SourceError};
pub use switch::{SwitchError, SwitchMode, SwitchOutcome, SwitchPolicyEngine};
pub use timer::{PressTimer, LONG_PRESS_DURATION};
pub use trigger::Trigger;

#[cfg(target_os = "macos")]
pub use platform::{run_event_tap, PlatformError, TisInputSource};
