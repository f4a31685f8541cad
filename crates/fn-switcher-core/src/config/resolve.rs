// fn-switcher Config Resolution
// Merges CLI, environment, file and default layers field by field

use std::fmt;

use super::{ConfigError, ConfigFile};
use crate::layout::{normalize_layouts, parse_layout_list, Layout, LayoutList};
use crate::source::InputSourceProvider;
use crate::switch::SwitchMode;
use crate::trigger::Trigger;

/// Comma-separated layout short names
pub const ENV_LAYOUTS: &str = "FN_SWITCHER_LAYOUTS";
/// `true`/`1` or `false`/`0`
pub const ENV_CYCLE: &str = "FN_SWITCHER_CYCLE";
/// Extra trigger name, e.g. `shift+option`
pub const ENV_SHORTCUT: &str = "FN_SWITCHER_SHORTCUT";

/// Parse the textual boolean forms accepted from the environment.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// One configuration source. `None` means the source does not set the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub layouts: Option<Vec<Layout>>,
    pub cycle: Option<bool>,
    pub shortcut: Option<String>,
}

impl ConfigLayer {
    /// Read the `FN_SWITCHER_*` variables from the process environment
    pub fn from_env() -> Self {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Build the environment layer from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset, and so are unrecognized booleans.
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let layouts = lookup(ENV_LAYOUTS)
            .map(|value| parse_layout_list(&value))
            .filter(|layouts| !layouts.is_empty());

        let cycle = lookup(ENV_CYCLE)
            .filter(|value| !value.is_empty())
            .and_then(|value| {
                let parsed = parse_bool(&value);
                if parsed.is_none() {
                    log::debug!("Ignoring {}={:?}: not a boolean", ENV_CYCLE, value);
                }
                parsed
            });

        let shortcut = lookup(ENV_SHORTCUT)
            .map(|value| value.trim().to_lowercase())
            .filter(|value| !value.is_empty());

        Self {
            layouts,
            cycle,
            shortcut,
        }
    }

    /// Layer for a loaded config file
    pub fn from_file(file: &ConfigFile) -> Self {
        let layouts = Some(normalize_layouts(&file.layouts)).filter(|l| !l.is_empty());
        let shortcut = file
            .shortcut
            .as_ref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        Self {
            layouts,
            cycle: file.cycle,
            shortcut,
        }
    }
}

/// State of the config file when configuration was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileStatus {
    /// No file exists; a default one should be written
    #[default]
    Missing,
    /// The file was read and contributes a layer
    Loaded,
    /// The file could not be located, read or parsed; it is left untouched
    Invalid,
}

/// Non-fatal problems found while resolving configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    UnknownShortcut(String),
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::UnknownShortcut(name) => {
                write!(f, "unknown shortcut {:?} (supported: \"shift+option\")", name)
            }
        }
    }
}

/// Settings the switcher runs with. Built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub layouts: LayoutList,
    pub mode: SwitchMode,
    /// Enabled triggers; always starts with [`Trigger::Fn`]
    pub triggers: Vec<Trigger>,
    pub warnings: Vec<ConfigWarning>,
    pub file_status: FileStatus,
}

impl EffectiveConfig {
    pub fn is_enabled(&self, trigger: Trigger) -> bool {
        self.triggers.contains(&trigger)
    }

    /// Whether a default config file should be written for these settings
    pub fn should_write_default_file(&self) -> bool {
        self.file_status == FileStatus::Missing
    }

    /// Whether a config file was read and contributed a layer
    pub fn file_loaded(&self) -> bool {
        self.file_status == FileStatus::Loaded
    }

    /// The config file record for these settings
    pub fn to_file(&self) -> ConfigFile {
        ConfigFile {
            layouts: self
                .layouts
                .iter()
                .map(|l| l.short_name().to_string())
                .collect(),
            cycle: Some(self.mode.is_cycle()),
            shortcut: None,
        }
    }
}

/// Resolves [`EffectiveConfig`] from up to three layers plus defaults.
///
/// Each field is taken from the highest-priority layer that sets it:
/// CLI, then environment, then config file. Layouts default to every
/// selectable layout the input source provider reports.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli: ConfigLayer,
    env: ConfigLayer,
    file: ConfigLayer,
    file_status: FileStatus,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values from explicitly passed command-line flags
    pub fn with_cli(mut self, layer: ConfigLayer) -> Self {
        self.cli = layer;
        self
    }

    pub fn with_env(mut self, layer: ConfigLayer) -> Self {
        self.env = layer;
        self
    }

    /// Config file contents, or `None` when no file exists
    pub fn with_file(mut self, file: Option<&ConfigFile>) -> Self {
        match file {
            Some(file) => {
                self.file = ConfigLayer::from_file(file);
                self.file_status = FileStatus::Loaded;
            }
            None => {
                self.file = ConfigLayer::default();
                self.file_status = FileStatus::Missing;
            }
        }
        self
    }

    /// Record that the config file could not be used
    pub fn with_invalid_file(mut self) -> Self {
        self.file = ConfigLayer::default();
        self.file_status = FileStatus::Invalid;
        self
    }

    fn layers(&self) -> [&ConfigLayer; 3] {
        [&self.cli, &self.env, &self.file]
    }

    pub fn resolve<P: InputSourceProvider>(
        &self,
        provider: &P,
    ) -> Result<EffectiveConfig, ConfigError> {
        let mode = SwitchMode::from_cycle(
            self.layers()
                .iter()
                .find_map(|layer| layer.cycle)
                .unwrap_or(false),
        );

        let mut warnings = Vec::new();
        let mut triggers = vec![Trigger::Fn];
        let shortcut = self
            .layers()
            .iter()
            .find_map(|layer| layer.shortcut.as_ref())
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default();
        if !shortcut.is_empty() {
            match Trigger::from_shortcut_name(&shortcut) {
                Some(trigger) => triggers.push(trigger),
                None => {
                    let warning = ConfigWarning::UnknownShortcut(shortcut);
                    log::warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        let layouts = match self.layers().iter().find_map(|layer| layer.layouts.clone()) {
            Some(layouts) => layouts,
            None => provider.selectable_layouts().unwrap_or_else(|e| {
                log::warn!("Could not list keyboard layouts: {}", e);
                Vec::new()
            }),
        };

        let layouts = LayoutList::new(layouts).map_err(|too_few| ConfigError::TooFew {
            resolved: too_few.0,
            available: provider.selectable_layouts().unwrap_or_default(),
        })?;

        Ok(EffectiveConfig {
            layouts,
            mode,
            triggers,
            warnings,
            file_status: self.file_status,
        })
    }
}
