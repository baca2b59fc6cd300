use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/kwiz`, falling back to the platform data dir
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join("kwiz"))
        } else {
            ProjectDirs::from("", "", "kwiz").map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn outbox_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("outbox.db"))
    }

    pub fn history_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("history.csv"))
    }

    pub fn log_dir() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("logs"))
    }
}
