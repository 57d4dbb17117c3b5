use directories::ProjectDirs;

const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");

/// Name of the bucket task attachments are uploaded into.
pub const ATTACHMENTS_BUCKET: &str = "task-attachments";

/// Root directory for everything the server persists.
///
/// Respects `TB_ASSET_DIR`. Debug builds default to `dev_assets/` at the workspace
/// root, release builds to the platform data directory.
pub fn asset_dir() -> std::path::PathBuf {
    let path = if let Ok(custom) = std::env::var("TB_ASSET_DIR") {
        crate::path::expand_tilde(&custom)
    } else if cfg!(debug_assertions) {
        std::path::PathBuf::from(PROJECT_ROOT).join("../../dev_assets")
    } else {
        ProjectDirs::from("dev", "taskboard", "taskboard")
            .expect("OS didn't give us a home directory")
            .data_dir()
            .to_path_buf()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).expect("Failed to create asset directory");
    }

    path
}

/// Get the configuration directory path.
///
/// Respects the `TB_CONFIG_DIR` environment variable for custom locations.
/// Default: `{asset_dir}`
pub fn config_dir() -> std::path::PathBuf {
    if let Ok(path) = std::env::var("TB_CONFIG_DIR") {
        let expanded = crate::path::expand_tilde(&path);
        if !expanded.exists() {
            std::fs::create_dir_all(&expanded).expect("Failed to create config directory");
        }
        return expanded;
    }
    asset_dir()
}

pub fn config_path() -> std::path::PathBuf {
    config_dir().join("config.json")
}

/// Get the database file path.
///
/// Respects the `TB_DATABASE_PATH` environment variable for custom locations.
/// Default: `{asset_dir}/db.sqlite`
pub fn database_path() -> std::path::PathBuf {
    if let Ok(path) = std::env::var("TB_DATABASE_PATH") {
        return crate::path::expand_tilde(&path);
    }
    asset_dir().join("db.sqlite")
}

/// Root of the object storage buckets.
///
/// Respects `TB_STORAGE_DIR`. Default: `{asset_dir}/storage`
pub fn storage_dir() -> std::path::PathBuf {
    if let Ok(path) = std::env::var("TB_STORAGE_DIR") {
        return crate::path::expand_tilde(&path);
    }
    asset_dir().join("storage")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_database_path_default() {
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe { env::remove_var("TB_DATABASE_PATH") };
        let path = database_path();
        assert!(path.ends_with("db.sqlite"));
    }

    #[test]
    #[serial]
    fn test_database_path_env_override() {
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe { env::set_var("TB_DATABASE_PATH", "/custom/path/test.db") };
        let path = database_path();
        unsafe { env::remove_var("TB_DATABASE_PATH") };
        assert_eq!(path, std::path::PathBuf::from("/custom/path/test.db"));
    }

    #[test]
    #[serial]
    fn test_database_path_tilde_expansion() {
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe { env::set_var("TB_DATABASE_PATH", "~/taskboard/db.sqlite") };
        let path = database_path();
        unsafe { env::remove_var("TB_DATABASE_PATH") };
        assert!(!path.to_string_lossy().contains('~'));
    }

    #[test]
    #[serial]
    fn test_storage_dir_env_override() {
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe { env::set_var("TB_STORAGE_DIR", "/custom/storage") };
        let dir = storage_dir();
        unsafe { env::remove_var("TB_STORAGE_DIR") };
        assert_eq!(dir, std::path::PathBuf::from("/custom/storage"));
    }

    #[test]
    #[serial]
    fn test_config_dir_env_override() {
        let temp = tempfile::tempdir().unwrap();
        let custom_path = temp.path().join("custom-config");
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe { env::set_var("TB_CONFIG_DIR", custom_path.to_str().unwrap()) };
        let dir = config_dir();
        let config = config_path();
        unsafe { env::remove_var("TB_CONFIG_DIR") };
        assert_eq!(dir, custom_path);
        assert_eq!(config, custom_path.join("config.json"));
        assert!(custom_path.exists());
    }

    #[test]
    #[serial]
    fn test_asset_dir_env_override() {
        let temp = tempfile::tempdir().unwrap();
        let custom_path = temp.path().join("assets");
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe { env::set_var("TB_ASSET_DIR", custom_path.to_str().unwrap()) };
        let dir = asset_dir();
        unsafe { env::remove_var("TB_ASSET_DIR") };
        assert_eq!(dir, custom_path);
        assert!(custom_path.exists());
    }
}
