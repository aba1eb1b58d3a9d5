use crate::output::{CliError, OutputMode, fail, render};
use anyhow::{Context as _, Result};
use clap::Args;
use ease_core::config::{self, EASE_DIR};
use ease_core::db;
use ease_core::error::ErrorCode;
use serde::Serialize;
use std::path::Path;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Re-run initialization on an existing journal (keeps its data).
    #[arg(long)]
    pub force: bool,
}

const GITIGNORE: &str = "ease.db\nease.db-*\nlock\n";

#[derive(Debug, Serialize)]
struct InitOutput {
    ok: bool,
    journal: String,
    config_created: bool,
    schema_version: u32,
}

/// Execute `ease init`. Creates the journal skeleton:
///
/// ```text
/// .ease/
///   ease.db       (SQLite journal, migrated to the latest schema)
///   config.toml   (commented defaults)
///   .gitignore    (ease.db, WAL files, lock)
/// ```
///
/// # Errors
///
/// Returns an error if `.ease/` already exists and `--force` is not set,
/// or if any filesystem or database operation fails.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let ease_dir = project_root.join(EASE_DIR);

    if ease_dir.exists() && !args.force {
        return Err(fail(
            output,
            &CliError::with_details(
                ".ease/ already exists",
                "Use `ease init --force` to re-run initialization; data is kept.",
                ErrorCode::InvalidInput.code(),
            ),
        ));
    }

    std::fs::create_dir_all(&ease_dir)
        .with_context(|| format!("Failed to create {}", ease_dir.display()))?;

    let config_created = config::write_default_project_config(project_root)?;

    let gitignore_path = ease_dir.join(".gitignore");
    std::fs::write(&gitignore_path, GITIGNORE)
        .with_context(|| format!("Failed to write {}", gitignore_path.display()))?;

    let conn = db::open_store(&db::db_path(project_root))?;
    let schema_version = db::migrations::current_schema_version(&conn)?;
    tracing::info!(journal = %ease_dir.display(), schema_version, "journal initialized");

    let result = InitOutput {
        ok: true,
        journal: ease_dir.display().to_string(),
        config_created,
        schema_version,
    };

    render(output, &result, |r, w| {
        writeln!(w, "✓ Initialized journal in {}", r.journal)?;
        writeln!(w)?;
        writeln!(w, "Next steps:")?;
        writeln!(w, "  Capture a worry:")?;
        writeln!(
            w,
            "    ease worry add \"Interview\" --description \"I might fail\""
        )?;
        writeln!(w, "  Sync with the web app (optional):")?;
        writeln!(w, "    set [remote].base_url in .ease/config.toml")?;
        writeln!(w, "    export EASE_SESSION=<session token>")
    })
}
