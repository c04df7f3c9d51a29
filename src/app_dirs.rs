use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/stint`, falling back to the platform data dir
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join("stint"))
        } else {
            ProjectDirs::from("", "", "stint").map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("sessions.db"))
    }

    pub fn log_dir() -> Option<PathBuf> {
        Self::state_dir()
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "stint").map(|pd| pd.config_dir().join("config.json"))
    }
}
