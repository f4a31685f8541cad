// fn-switcher Config File
// TOML record of default settings at ~/.config/fn-switcher/config.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::ConfigError;

/// On-disk settings.
///
/// Layouts are stored as short names (without the keylayout prefix):
///
/// ```toml
/// layouts = ["ABC", "Russian"]
/// cycle = false
/// shortcut = "shift+option"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub layouts: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<String>,
}

impl ConfigFile {
    /// Default location: `~/.config/fn-switcher/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("fn-switcher").join("config.toml"))
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::TomlEncode(e.to_string()))
    }

    /// Load the file at `path`, or `None` if it does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>, ConfigError> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&content)
            .map(Some)
            .map_err(|e| ConfigError::InvalidFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    /// Write the file, creating parent directories as needed.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_from_toml() {
        let file = ConfigFile::from_toml(
            r#"
layouts = ["ABC", "Russian"]
cycle = true
shortcut = "shift+option"
"#,
        )
        .unwrap();
        assert_eq!(file.layouts, vec!["ABC", "Russian"]);
        assert_eq!(file.cycle, Some(true));
        assert_eq!(file.shortcut.as_deref(), Some("shift+option"));
    }

    #[test]
    fn test_config_file_fields_optional() {
        let file = ConfigFile::from_toml("").unwrap();
        assert_eq!(file, ConfigFile::default());
    }

    #[test]
    fn test_config_file_rejects_wrong_types() {
        assert!(matches!(
            ConfigFile::from_toml("layouts = \"ABC\""),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_config_file_skips_unset_fields() {
        let file = ConfigFile {
            layouts: vec!["ABC".into(), "Russian".into()],
            cycle: Some(false),
            shortcut: None,
        };
        let text = file.to_toml().unwrap();
        assert!(text.contains("cycle = false"));
        assert!(!text.contains("shortcut"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ConfigFile::load(dir.path().join("config.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let file = ConfigFile {
            layouts: vec!["ABC".into(), "German".into()],
            cycle: Some(true),
            shortcut: None,
        };
        file.write(&path).unwrap();
        assert_eq!(ConfigFile::load(&path).unwrap(), Some(file));
    }

    #[test]
    fn test_load_malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "layouts = [").unwrap();
        let err = ConfigFile::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFile { .. }));
        assert!(err.to_string().contains("config.toml"));
    }
}
