// src/config/loader.rs
//! Layered TOML configuration loading
//!
//! Defaults are overlaid by each existing configuration file in order, then by
//! `NINA_EMG_`-prefixed environment variables (`NINA_EMG_WINDOWING__WIN_LEN=200`).

use crate::config::{constants::paths, PipelineConfig};
use crate::error::{EmgError, EmgErrorBuilder, EmgResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Configuration loader merging files and environment overrides over defaults
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    use_environment: bool,
}

impl ConfigLoader {
    /// Loader for `nina_emg.toml` then `nina_emg.local.toml` in the working directory
    pub fn new() -> Self {
        Self::with_paths(vec![
            PathBuf::from(paths::DEFAULT_CONFIG_FILE),
            PathBuf::from(paths::LOCAL_CONFIG_FILE),
        ])
    }

    /// Create loader with custom paths, later paths take precedence
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            use_environment: true,
        }
    }

    /// Disable environment variable overrides
    pub fn without_environment(mut self) -> Self {
        self.use_environment = false;
        self
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    /// Merge defaults, existing files and environment into a validated configuration
    pub fn load(&self) -> EmgResult<PipelineConfig> {
        let overrides = if self.use_environment {
            std::env::vars().collect()
        } else {
            Vec::new()
        };
        self.load_with_overrides(overrides)
    }

    /// Same as [`ConfigLoader::load`] with explicit `(KEY, value)` overrides instead of the process environment
    pub fn load_with_overrides(&self, overrides: Vec<(String, String)>) -> EmgResult<PipelineConfig> {
        let mut merged = toml::Value::try_from(PipelineConfig::default()).map_err(|e| {
            EmgErrorBuilder::new("config_loader", "load").configuration(&e.to_string())
        })?;

        for path in &self.config_paths {
            if path.exists() {
                let file_config = read_toml(path)?;
                merge_toml_values(&mut merged, file_config);
                debug!(path = %path.display(), "Merged configuration file");
            }
        }

        apply_overrides(&mut merged, overrides);

        let config: PipelineConfig = merged.try_into().map_err(|e: toml::de::Error| {
            EmgErrorBuilder::new("config_loader", "load")
                .configuration(&format!("Failed to deserialize config: {}", e))
        })?;
        config.validate()?;

        info!(
            sampling_rate_hz = config.signal.sampling_rate_hz,
            win_len = config.windowing.win_len,
            win_stride = config.windowing.win_stride,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load a single file over defaults, without environment overrides
    pub fn load_file(path: impl AsRef<Path>) -> EmgResult<PipelineConfig> {
        Self::with_paths(vec![path.as_ref().to_path_buf()])
            .without_environment()
            .require_existing()?
            .load()
    }

    /// Validate a configuration file without keeping it
    pub fn validate_file(path: impl AsRef<Path>) -> EmgResult<()> {
        Self::load_file(path).map(|_| ())
    }

    /// Write `config` as pretty TOML
    pub fn export(config: &PipelineConfig, path: impl AsRef<Path>) -> EmgResult<()> {
        let path = path.as_ref();
        let content = config.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| EmgError::io(path, e))?;
        debug!(path = %path.display(), "Exported configuration");
        Ok(())
    }

    fn require_existing(self) -> EmgResult<Self> {
        for path in &self.config_paths {
            if !path.exists() {
                return Err(EmgError::io(
                    path,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "configuration file not found"),
                ));
            }
        }
        Ok(self)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_toml(path: &Path) -> EmgResult<toml::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| EmgError::io(path, e))?;
    toml::from_str(&content).map_err(|e| {
        EmgErrorBuilder::new("config_loader", "read_toml")
            .configuration(&format!("{}: {}", path.display(), e))
    })
}

fn merge_toml_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(&key) {
                    merge_toml_values(base_value, value);
                } else {
                    base_table.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

fn apply_overrides(config: &mut toml::Value, vars: Vec<(String, String)>) {
    for (key, value) in vars {
        if let Some(stripped) = key.strip_prefix(paths::ENV_PREFIX) {
            let path: Vec<String> = stripped
                .split(paths::ENV_SEPARATOR)
                .map(|part| part.to_lowercase())
                .collect();
            debug!(key = %key, "Applying environment override");
            set_nested_value(config, &path, parse_env_value(&value));
        }
    }
}

fn parse_env_value(value: &str) -> toml::Value {
    if let Ok(int_val) = value.parse::<i64>() {
        toml::Value::Integer(int_val)
    } else if let Ok(float_val) = value.parse::<f64>() {
        toml::Value::Float(float_val)
    } else if let Ok(bool_val) = value.parse::<bool>() {
        toml::Value::Boolean(bool_val)
    } else if value.trim_start().starts_with('[') {
        // Lists such as `[1, 2, 3]`
        match format!("v = {}", value).parse::<toml::Table>() {
            Ok(mut table) => table
                .remove("v")
                .unwrap_or_else(|| toml::Value::String(value.to_string())),
            Err(_) => toml::Value::String(value.to_string()),
        }
    } else {
        toml::Value::String(value.to_string())
    }
}

fn set_nested_value(config: &mut toml::Value, path: &[String], value: toml::Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = config;
    for part in parents {
        let toml::Value::Table(table) = current else {
            return;
        };
        current = table
            .entry(part.clone())
            .or_insert_with(|| toml::Value::Table(toml::value::Table::new()));
    }

    if let toml::Value::Table(table) = current {
        table.insert(last.clone(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_default_config() {
        let loader = ConfigLoader::with_paths(vec![]).without_environment();
        let config = loader.load().unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_later_files_take_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_config(dir.path(), "base.toml", "[windowing]\nwin_len = 100\nwin_stride = 10\n");
        let local = write_config(dir.path(), "local.toml", "[windowing]\nwin_stride = 5\n");
        let missing = dir.path().join("missing.toml");

        let config = ConfigLoader::with_paths(vec![base, missing, local])
            .without_environment()
            .load()
            .unwrap();
        assert_eq!(config.windowing.win_len, 100);
        assert_eq!(config.windowing.win_stride, 5);
    }

    #[test]
    fn test_environment_overrides() {
        let loader = ConfigLoader::with_paths(vec![]);
        let config = loader
            .load_with_overrides(vec![
                ("NINA_EMG_WINDOWING__WIN_LEN".to_string(), "64".to_string()),
                ("NINA_EMG_WINDOWING__GESTURES".to_string(), "[1, 2]".to_string()),
                ("NINA_EMG_SIGNAL__SAMPLING_RATE_HZ".to_string(), "1000.5".to_string()),
                ("NINA_EMG_RECTIFY".to_string(), "true".to_string()),
                ("UNRELATED".to_string(), "1".to_string()),
            ])
            .unwrap();
        assert_eq!(config.windowing.win_len, 64);
        assert_eq!(config.windowing.gestures, Some(vec![1, 2]));
        assert_eq!(config.signal.sampling_rate_hz, 1000.5);
        assert!(config.rectify);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write_config(dir.path(), "bad.toml", "[windowing]\nwin_len = 0\n");
        assert!(ConfigLoader::validate_file(&bad).is_err());

        let garbage = write_config(dir.path(), "garbage.toml", "not = [valid");
        assert!(ConfigLoader::load_file(&garbage).is_err());

        assert!(ConfigLoader::load_file(dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_export_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exported.toml");

        let mut config = PipelineConfig::default();
        config.rectify = true;
        config.pca.components = Some(8);
        ConfigLoader::export(&config, &path).unwrap();

        assert_eq!(ConfigLoader::load_file(&path).unwrap(), config);
    }
}
