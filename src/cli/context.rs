use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static HSMCTL_HOME: OnceLock<PathBuf> = OnceLock::new();

/// Initialize the global hsmctl home directory (config and session file).
/// If `custom` is provided, uses that path; otherwise the platform config
/// directory, or `.hsmctl` when there is none.
pub fn init(custom: Option<&str>) {
    let dir = custom.map(PathBuf::from).unwrap_or_else(|| {
        dirs::config_dir()
            .map(|d| d.join("hsmctl"))
            .unwrap_or_else(|| PathBuf::from(".hsmctl"))
    });
    let _ = HSMCTL_HOME.set(dir);
}

/// Get the current hsmctl home directory.
pub fn home_dir() -> &'static Path {
    HSMCTL_HOME
        .get()
        .map(|p| p.as_path())
        .unwrap_or(Path::new(".hsmctl"))
}
