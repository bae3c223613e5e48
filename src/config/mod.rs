use crate::models::PickerConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// File name of the picker configuration inside the config directory
pub const CONFIG_FILE_NAME: &str = "fpicker.yaml";

/// Configuration manager for loading and saving the picker configuration.
///
/// Manages a single file, `fpicker.yaml`, holding the transport choice, the
/// dialog backend, where to find the helper and the timing knobs.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    picker_config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing `fpicker.yaml`; created if missing
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            picker_config_path: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
        })
    }

    /// Load the picker configuration.
    ///
    /// # Returns
    /// The loaded PickerConfig, or defaults if the file doesn't exist
    pub fn load_picker_config(&self) -> Result<PickerConfig> {
        if !self.picker_config_path.exists() {
            tracing::warn!(
                "Picker config file not found at {}, using defaults",
                self.picker_config_path
            );
            return Ok(PickerConfig::default());
        }

        let file_contents = fs::read_to_string(&self.picker_config_path).with_context(|| {
            format!("Failed to read picker config: {}", self.picker_config_path)
        })?;

        let config: PickerConfig = serde_yaml_ng::from_str(&file_contents).with_context(|| {
            format!("Failed to parse picker config: {}", self.picker_config_path)
        })?;

        tracing::info!("Loaded picker config from {}", self.picker_config_path);
        Ok(config)
    }

    /// Save the picker configuration.
    pub fn save_picker_config(&self, config: &PickerConfig) -> Result<()> {
        let yaml_string = serde_yaml_ng::to_string(config)
            .context("Failed to serialize picker config to YAML")?;

        fs::write(&self.picker_config_path, yaml_string).with_context(|| {
            format!("Failed to write picker config: {}", self.picker_config_path)
        })?;

        tracing::info!("Saved picker config to {}", self.picker_config_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn picker_config_path(&self) -> &Utf8Path {
        &self.picker_config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Transport;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_path).unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let (manager, _temp_dir) = create_test_config_manager();
        let config = manager.load_picker_config().unwrap();
        assert_eq!(config, PickerConfig::default());
    }

    #[test]
    fn test_load_save_picker_config() {
        let (manager, _temp_dir) = create_test_config_manager();

        let mut config = PickerConfig::default();
        config.transport = Transport::InProcess;
        config.quit_grace_ms = 250;
        manager.save_picker_config(&config).unwrap();

        let loaded = manager.load_picker_config().unwrap();
        assert_eq!(loaded.transport, Transport::InProcess);
        assert_eq!(loaded.quit_grace_ms, 250);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(manager.picker_config_path(), "transport: [not, a, transport").unwrap();
        assert!(manager.load_picker_config().is_err());
    }
}
