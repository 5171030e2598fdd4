//! Conventional per-user locations for persisted tickets and masterkeys.
//!
//! - Windows: `%LocalAppData%\lsassy\`
//! - elsewhere: `~/.config/lsassy/`
//!
//! Both hold a `tickets/` directory and an append-only `masterkeys.txt`.
//! Directories are created lazily by the writer.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "lsassy";
pub const TICKETS_DIR_NAME: &str = "tickets";
pub const MASTERKEYS_FILE_NAME: &str = "masterkeys.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    Other,
}

impl HostOs {
    pub fn current() -> Self {
        if cfg!(windows) {
            HostOs::Windows
        } else {
            HostOs::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    root: PathBuf,
}

impl AppDirs {
    /// Use `root` as the application directory.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Conventional directory for `os`, or `None` when the user's home or
    /// local data directory cannot be determined.
    pub fn for_os(os: HostOs) -> Option<Self> {
        let root = match os {
            HostOs::Windows => dirs::data_local_dir()?.join(APP_DIR_NAME),
            HostOs::Other => dirs::home_dir()?.join(".config").join(APP_DIR_NAME),
        };
        Some(Self::new(root))
    }

    pub fn detect() -> Option<Self> {
        Self::for_os(HostOs::current())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tickets_dir(&self) -> PathBuf {
        self.root.join(TICKETS_DIR_NAME)
    }

    pub fn masterkeys_file(&self) -> PathBuf {
        self.root.join(MASTERKEYS_FILE_NAME)
    }

    /// Create the root directory if it is missing.
    pub fn ensure_root(&self) -> io::Result<()> {
        if self.root.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(&self.root)
    }
}
