use directories::{ProjectDirs, UserDirs};
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Where session exports go: `~/Documents/tapzone`, else the app data dir, else `.`
    pub fn export_dir() -> PathBuf {
        UserDirs::new()
            .and_then(|dirs| dirs.document_dir().map(|d| d.join("tapzone")))
            .or_else(|| {
                ProjectDirs::from("", "", "tapzone")
                    .map(|proj_dirs| proj_dirs.data_local_dir().join("exports"))
            })
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// `$HOME/.local/state/tapzone/tapzone.log`, or the app data dir when `HOME` is unset
    pub fn log_path() -> Option<PathBuf> {
        Self::log_path_in(std::env::var_os("HOME").map(PathBuf::from))
    }

    fn log_path_in(home: Option<PathBuf>) -> Option<PathBuf> {
        if let Some(home) = home {
            let state_dir = home.join(".local").join("state").join("tapzone");
            Some(state_dir.join("tapzone.log"))
        } else {
            ProjectDirs::from("", "", "tapzone")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("tapzone.log"))
        }
    }
}
