pub mod error;
pub mod settings;

pub use error::*;
pub use settings::{AzureConfig, Images, Manifests, Readiness, Settings};

use std::path::{Path, PathBuf};

const CONFIG_ENV: &str = "NBCTL_CONFIG";
const CANDIDATES: [&str; 2] = ["nbctl.yaml", ".nbctl.yaml"];

/// Find the settings file
///
/// Search order:
/// 1. `NBCTL_CONFIG` environment variable (direct path)
/// 2. current directory: nbctl.yaml, .nbctl.yaml
/// 3. ./.nbctl/ directory: same order
/// 4. ~/.config/nbctl/config.yaml (global settings)
///
/// Returns `Ok(None)` when no file exists anywhere.
pub fn find_config_file() -> Result<Option<PathBuf>> {
    if let Ok(config_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(ConfigError::ConfigFileMissing(path));
    }

    let current_dir = std::env::current_dir()?;

    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    let local_dir = current_dir.join(".nbctl");
    if local_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = local_dir.join(filename);
            if path.exists() {
                return Ok(Some(path));
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("nbctl").join("config.yaml");
        if global_config.exists() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}

/// Load settings from an explicit path, or discover them
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file()?,
    };

    match path {
        Some(path) => {
            tracing::debug!("loading settings from {}", path.display());
            Settings::from_file(&path)
        }
        None => {
            tracing::debug!("no settings file found, using defaults");
            Ok(Settings::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    #[serial]
    fn test_find_config_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("nbctl.yaml"), "namespace: a").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file().unwrap();
        assert!(result.unwrap().ends_with("nbctl.yaml"));

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_visible_file_wins_over_hidden() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("nbctl.yaml"), "namespace: visible").unwrap();
        fs::write(temp_dir.path().join(".nbctl.yaml"), "namespace: hidden").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let settings = load_settings(None).unwrap();
        assert_eq!(settings.namespace, "visible");

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_local_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        let local_dir = temp_dir.path().join(".nbctl");
        fs::create_dir(&local_dir).unwrap();
        fs::write(local_dir.join("nbctl.yaml"), "namespace: local").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file().unwrap().unwrap();
        assert!(result.ends_with(".nbctl/nbctl.yaml"));

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_env_var_points_at_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yaml");
        fs::write(&config_path, "namespace: custom").unwrap();

        unsafe {
            std::env::set_var(CONFIG_ENV, config_path.to_str().unwrap());
        }

        let settings = load_settings(None).unwrap();
        assert_eq!(settings.namespace, "custom");

        unsafe {
            std::env::remove_var(CONFIG_ENV);
        }
    }

    #[test]
    #[serial]
    fn test_env_var_missing_file_is_error() {
        unsafe {
            std::env::set_var(CONFIG_ENV, "/nonexistent/nbctl.yaml");
        }

        let result = find_config_file();
        assert!(matches!(result, Err(ConfigError::ConfigFileMissing(_))));

        unsafe {
            std::env::remove_var(CONFIG_ENV);
        }
    }

    #[test]
    #[serial]
    fn test_discovery_without_file_uses_defaults_and_creates_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        let original_home = std::env::var_os("HOME");
        let original_xdg = std::env::var_os("XDG_CONFIG_HOME");

        std::env::set_current_dir(&temp_dir).unwrap();
        unsafe {
            std::env::remove_var(CONFIG_ENV);
            std::env::set_var("HOME", home.path());
            std::env::set_var("XDG_CONFIG_HOME", home.path().join(".config"));
        }

        let settings = load_settings(None).unwrap();

        std::env::set_current_dir(original_dir).unwrap();
        unsafe {
            match original_home {
                Some(value) => std::env::set_var("HOME", value),
                None => std::env::remove_var("HOME"),
            }
            match original_xdg {
                Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
                None => std::env::remove_var("XDG_CONFIG_HOME"),
            }
        }

        assert_eq!(settings, Settings::default());
        assert_eq!(std::fs::read_dir(home.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_explicit_path_is_used() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("explicit.yaml");
        fs::write(&config_path, "system_name: lab").unwrap();

        let settings = load_settings(Some(&config_path)).unwrap();
        assert_eq!(settings.system_name, "lab");
        assert_eq!(settings.namespace, "noobaa");
    }
}
