use std::path::PathBuf;

pub const DESK_DIR: &str = ".deltadesk";

/// Returns the root deltadesk directory path.
///
/// Resolution order:
/// 1. `DELTADESK_ROOT` environment variable (if set)
/// 2. Current working directory + `.deltadesk`
pub fn desk_root() -> PathBuf {
    if let Ok(root) = std::env::var("DELTADESK_ROOT") {
        PathBuf::from(root)
    } else {
        PathBuf::from(DESK_DIR)
    }
}

/// Returns the path to the configuration file.
pub fn config_path() -> PathBuf {
    desk_root().join("config.yaml")
}

/// Returns the path to the stored session.
pub fn session_path() -> PathBuf {
    desk_root().join("session.yaml")
}

/// Returns the path the TUI writes its log to.
pub fn log_path() -> PathBuf {
    desk_root().join("deltadesk.log")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_desk_root_default() {
        // SAFETY: We use #[serial] to ensure single-threaded access
        unsafe { std::env::remove_var("DELTADESK_ROOT") };
        assert_eq!(desk_root(), PathBuf::from(".deltadesk"));
        assert_eq!(session_path(), PathBuf::from(".deltadesk/session.yaml"));
    }

    #[test]
    #[serial]
    fn test_desk_root_with_env_var() {
        // SAFETY: We use #[serial] to ensure single-threaded access
        unsafe { std::env::set_var("DELTADESK_ROOT", "/custom/path/.deltadesk") };
        assert_eq!(desk_root(), PathBuf::from("/custom/path/.deltadesk"));
        assert_eq!(
            config_path(),
            PathBuf::from("/custom/path/.deltadesk/config.yaml")
        );
        unsafe { std::env::remove_var("DELTADESK_ROOT") };
    }
}
