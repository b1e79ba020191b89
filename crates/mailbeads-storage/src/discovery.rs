// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Locating the store and project root on disk.

use std::io::Write;
use std::path::{Path, PathBuf};

use mailbeads_core::MailbeadsError;
use tracing::{debug, info};

/// Directory that marks a mailbeads project.
pub const MARKER_DIR: &str = ".mailbeads";

/// Store file name inside [`MARKER_DIR`].
pub const DB_FILE: &str = "mail.db";

/// Walk up from `start` to the first directory containing `.mailbeads/mail.db`.
pub fn discover_store(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(MARKER_DIR).join(DB_FILE))
        .find(|candidate| candidate.is_file())
}

/// Walk up from `start` to the first directory containing a `.git` directory.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").is_dir())
        .map(Path::to_path_buf)
}

/// Directory holding `.mailbeads/` for a store path, if laid out conventionally.
pub fn project_dir_for_store(store: &Path) -> Option<&Path> {
    let marker = store.parent()?;
    if marker.file_name()? == MARKER_DIR {
        marker.parent()
    } else {
        None
    }
}

/// Store path inside a project root.
pub fn store_path(root: &Path) -> PathBuf {
    root.join(MARKER_DIR).join(DB_FILE)
}

/// Create the marker directory under `root` and make git ignore it.
///
/// Returns the store path. The store file itself is created by
/// [`Database::open`](crate::Database::open).
pub fn init_project(root: &Path) -> Result<PathBuf, MailbeadsError> {
    let marker = root.join(MARKER_DIR);
    std::fs::create_dir_all(&marker).map_err(io_err)?;
    ensure_gitignored(root)?;
    info!(root = %root.display(), "initialized mailbeads project");
    Ok(marker.join(DB_FILE))
}

/// Append `.mailbeads/` to `<root>/.gitignore` unless an equivalent line exists.
pub fn ensure_gitignored(root: &Path) -> Result<bool, MailbeadsError> {
    let path = root.join(".gitignore");
    let existing = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(io_err(e)),
    };

    let already = existing.lines().map(str::trim).any(|line| {
        matches!(
            line,
            ".mailbeads" | ".mailbeads/" | "/.mailbeads" | "/.mailbeads/"
        )
    });
    if already {
        debug!(path = %path.display(), "gitignore already covers .mailbeads");
        return Ok(false);
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(io_err)?;
    let prefix = if existing.is_empty() || existing.ends_with('\n') {
        ""
    } else {
        "\n"
    };
    writeln!(file, "{prefix}{MARKER_DIR}/").map_err(io_err)?;
    Ok(true)
}

fn io_err(e: std::io::Error) -> MailbeadsError {
    MailbeadsError::Storage {
        source: Box::new(e),
    }
}
