// fn-switcher Configuration
// Layered settings: CLI flags > environment > config file > defaults

pub mod file;
pub mod resolve;

use std::path::PathBuf;

use crate::layout::Layout;

pub use file::ConfigFile;
pub use resolve::{
    parse_bool, ConfigLayer, ConfigResolver, ConfigWarning, EffectiveConfig, FileStatus,
    ENV_CYCLE, ENV_LAYOUTS, ENV_SHORTCUT,
};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML encode error: {0}")]
    TomlEncode(String),

    #[error("invalid config file {}: {message}", path.display())]
    InvalidFile { path: PathBuf, message: String },

    #[error("cannot determine home directory")]
    NoHomeDir,

    #[error("need at least 2 keyboard layouts to switch between, resolved {resolved}")]
    TooFew {
        resolved: usize,
        /// Every selectable layout, for the user to pick from
        available: Vec<Layout>,
    },
}
