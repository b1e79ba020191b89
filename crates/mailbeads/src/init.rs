// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mb init`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use mailbeads_core::MailbeadsError;
use mailbeads_storage::{Database, discovery};
use serde::Serialize;

use crate::context::CommandContext;

#[derive(Serialize)]
struct InitOutput {
    path: PathBuf,
    schema: String,
}

/// Create (or reopen) the store.
///
/// An explicit path from `--db` or `storage.database_path` is used as is.
/// Otherwise the store goes under the git project root, falling back to the
/// working directory.
pub async fn run(ctx: &CommandContext) -> Result<ExitCode, MailbeadsError> {
    let explicit = ctx.db_override().map(Path::to_path_buf).or_else(|| {
        ctx.config
            .storage
            .database_path
            .as_ref()
            .map(PathBuf::from)
    });

    let path = match explicit {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    MailbeadsError::Internal(format!(
                        "failed to create {}: {e}",
                        parent.display()
                    ))
                })?;
            }
            path
        }
        None => {
            let root = discovery::find_project_root(ctx.cwd())
                .unwrap_or_else(|| ctx.cwd().to_path_buf());
            discovery::init_project(&root)?
        }
    };

    let db = Database::open(&path, ctx.generation()).await?;
    let schema = db.generation().to_string();
    db.close().await?;

    if ctx.out.json {
        ctx.out.print_json(&InitOutput { path, schema })?;
    } else {
        ctx.out
            .success(&format!("Initialized mailbeads at {}", path.display()));
        ctx.out.info(&format!("  schema: {schema}"));
    }
    Ok(ExitCode::SUCCESS)
}
