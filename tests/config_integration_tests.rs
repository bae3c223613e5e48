//! Integration tests for ConfigManager and fpicker.yaml handling
//!
//! These tests verify:
//! - Configuration loading and saving
//! - Default configuration when the file is missing or partial
//! - Rejection of malformed files
//! - Integration with picker construction

use camino::Utf8PathBuf;
use fpicker_bridge::config::CONFIG_FILE_NAME;
use fpicker_bridge::metrics::Metrics;
use fpicker_bridge::models::DialogBackendKind;
use fpicker_bridge::ui::{NoopPump, new_ui_lock};
use fpicker_bridge::{
    ConfigManager, DialogResult, InitArgument, PickerConfig, Transport, create_file_picker,
};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

#[test]
fn test_create_config_manager() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    assert_eq!(manager.config_dir(), &config_path);
    assert_eq!(
        manager.picker_config_path(),
        &config_path.join(CONFIG_FILE_NAME)
    );
}

#[test]
fn test_load_default_picker_config() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    // Config file doesn't exist, should return defaults
    let config = manager.load_picker_config().unwrap();

    assert_eq!(config.transport, Transport::OutOfProcess);
    assert_eq!(config.dialog_backend, DialogBackendKind::Native);
    assert_eq!(config.helper.name, "fpicker-helper");
    assert!(config.block_parent_window);
    assert!(!config.debug_mode);
}

#[test]
fn test_save_and_load_picker_config() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let mut config = PickerConfig::default();
    config.transport = Transport::InProcess;
    config.dialog_backend = DialogBackendKind::Headless;
    config.helper.path = Some(Utf8PathBuf::from("/opt/fpicker/fpicker-helper"));
    config.helper.args = vec!["--execute-delay-ms".to_string(), "5".to_string()];
    config.poll_interval_ms = 4;
    config.block_parent_window = false;

    manager.save_picker_config(&config).unwrap();
    let loaded = manager.load_picker_config().unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn test_hand_written_yaml() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(
        config_path.join(CONFIG_FILE_NAME),
        "transport: in_process\n\
         dialog_backend: headless\n\
         helper:\n  path: /opt/fpicker/bin/fpicker-helper\n  args: [\"--debug\"]\n\
         quit_grace_ms: 75\n",
    )
    .unwrap();

    let config = manager.load_picker_config().unwrap();
    assert_eq!(config.transport, Transport::InProcess);
    assert_eq!(config.dialog_backend, DialogBackendKind::Headless);
    assert_eq!(
        config.helper.path,
        Some(Utf8PathBuf::from("/opt/fpicker/bin/fpicker-helper"))
    );
    assert_eq!(config.helper.args, vec!["--debug"]);
    assert_eq!(config.helper.name, "fpicker-helper");
    assert_eq!(config.quit_grace_ms, 75);
    assert_eq!(config.poll_interval_ms, 1);
}

#[test]
fn test_config_directory_creation() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf())
        .unwrap()
        .join("nonexistent_dir");

    // Directory doesn't exist yet
    assert!(!config_path.exists());

    // Creating ConfigManager should create the directory
    let _manager = ConfigManager::new(&config_path).unwrap();

    assert!(config_path.exists());
}

#[test]
fn test_invalid_yaml_handling() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(
        config_path.join(CONFIG_FILE_NAME),
        "invalid: yaml: content: {{",
    )
    .unwrap();

    let result = manager.load_picker_config();
    assert!(result.is_err(), "Should fail to parse invalid YAML");
}

#[test]
fn test_unknown_transport_is_rejected() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(config_path.join(CONFIG_FILE_NAME), "transport: carrier_pigeon\n").unwrap();

    assert!(manager.load_picker_config().is_err());
}

#[test]
fn test_loaded_config_builds_in_process_picker() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();
    fs::write(
        config_path.join(CONFIG_FILE_NAME),
        "transport: in_process\ndialog_backend: headless\n",
    )
    .unwrap();

    let config = manager.load_picker_config().unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut picker = create_file_picker(
        &config,
        rt.handle().clone(),
        Box::new(NoopPump),
        new_ui_lock(),
        Arc::new(Metrics::new()),
    )
    .unwrap();

    assert_eq!(picker.implementation_name(), "fpicker.LocalFilePicker");
    picker.initialize(&[InitArgument::Int16(1)]).unwrap();
    // The default headless dialog cancels
    assert_eq!(picker.execute(), DialogResult::Cancel);
}

#[test]
fn test_concurrent_config_access() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = Arc::new(ConfigManager::new(&config_path).unwrap());
    manager.save_picker_config(&PickerConfig::default()).unwrap();

    let mut handles = vec![];

    for _ in 0..10 {
        let manager_clone = manager.clone();
        let handle = std::thread::spawn(move || {
            let _config = manager_clone.load_picker_config().unwrap();
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}
