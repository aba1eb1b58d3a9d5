//! `ease settings`: view and change preferences, optionally synced with
//! the web app.

use crate::context::{Access, Context};
use crate::output::{CliError, fail, pretty_kv, pretty_section, render, report_sync};
use anyhow::Result;
use clap::{Args, Subcommand};
use ease_core::effects::ApplyReport;
use ease_core::error::ErrorCode;
use ease_core::model::{Settings, SettingsPatch};
use ease_core::store::Effect;
use ease_core::sync::RemoteSync;
use serde::Serialize;
use std::io::Write;

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    #[command(about = "Show current settings")]
    Show,

    #[command(
        about = "Change settings",
        after_help = "EXAMPLES:\n    # Twenty minutes of worry time, reminder at 18:30\n    ease settings set --worry-time 20 --reflection-time 18:30\n\n    # Replace custom categories\n    ease settings set --category Garden --category Pets"
    )]
    Set(SetArgs),

    #[command(
        about = "Replace local settings with the ones saved on the web app",
        after_help = "EXAMPLES:\n    # Requires [remote].base_url and a session\n    EASE_SESSION=... ease settings pull"
    )]
    Pull,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Minutes of worry time per day (5-60).
    #[arg(long, value_name = "MINUTES")]
    pub worry_time: Option<u32>,

    /// Turn reminders on or off.
    #[arg(long, value_name = "BOOL")]
    pub notifications: Option<bool>,

    /// Daily reflection reminder, `HH:MM`.
    #[arg(long, value_name = "HH:MM")]
    pub reflection_time: Option<String>,

    /// Custom category; repeat for several. Replaces the current list.
    #[arg(long = "category", value_name = "NAME", conflicts_with = "clear_categories")]
    pub categories: Vec<String>,

    /// Remove every custom category.
    #[arg(long)]
    pub clear_categories: bool,
}

impl SetArgs {
    fn patch(&self) -> SettingsPatch {
        let custom_categories = if self.clear_categories {
            Some(Vec::new())
        } else if self.categories.is_empty() {
            None
        } else {
            Some(self.categories.clone())
        };
        SettingsPatch {
            daily_worry_time: self.worry_time,
            notifications: self.notifications,
            reflection_time: self.reflection_time.clone(),
            custom_categories,
        }
    }
}

#[derive(Debug, Serialize)]
struct SettingsOutput<'a> {
    settings: &'a Settings,
    #[serde(skip_serializing_if = "Option::is_none")]
    sync: Option<ApplyReport>,
}

pub fn run(command: &SettingsCommand, ctx: &Context) -> Result<()> {
    match command {
        SettingsCommand::Show => run_show(ctx),
        SettingsCommand::Set(args) => run_set(args, ctx),
        SettingsCommand::Pull => run_pull(ctx),
    }
}

fn run_show(ctx: &Context) -> Result<()> {
    let journal = ctx.open_journal(Access::Read)?;
    let state = journal.state()?;
    let result = SettingsOutput {
        settings: &state.settings,
        sync: None,
    };
    render(ctx.output, &result, |r, w| write_settings(w, r.settings))
}

fn run_set(args: &SetArgs, ctx: &Context) -> Result<()> {
    let patch = args.patch();
    if patch.is_empty() {
        return Err(fail(
            ctx.output,
            &CliError::with_details(
                "nothing to change",
                "Pass at least one option, see `ease settings set --help`.",
                ErrorCode::InvalidInput.code(),
            ),
        ));
    }
    let patch = patch
        .validate()
        .map_err(|err| fail(ctx.output, &CliError::from(&err)))?;

    let mut journal = ctx.open_journal(Access::Write)?;
    let update = journal.state()?.update_settings(patch);
    let remote = ctx.remote();
    let report = journal.apply(update.effects, remote.as_ref())?;
    tracing::info!("settings updated");

    let result = SettingsOutput {
        settings: &update.output,
        sync: Some(report),
    };
    render(ctx.output, &result, |r, w| {
        writeln!(w, "✓ Settings saved")?;
        writeln!(w)?;
        write_settings(w, r.settings)
    })?;
    if let Some(report) = &result.sync {
        report_sync(ctx.output, report)?;
    }
    Ok(())
}

fn run_pull(ctx: &Context) -> Result<()> {
    let remote = ctx.require_remote()?;
    let pulled = remote
        .load_settings()
        .map_err(|err| fail(ctx.output, &CliError::from(&err)))?;

    let mut journal = ctx.open_journal(Access::Write)?;
    let state = journal.state()?;
    let settings = match pulled {
        Some(remote_settings) => {
            remote_settings
                .validate()
                .map_err(|err| fail(ctx.output, &CliError::from(&err)))?;
            let patch = remote_settings
                .into_patch()
                .validate()
                .map_err(|err| fail(ctx.output, &CliError::from(&err)))?;
            let update = state.update_settings(patch);
            // Pulled values came from the service; only the local write is applied.
            let local: Vec<Effect> = update
                .effects
                .into_iter()
                .filter(|effect| !matches!(effect, Effect::Remote(_)))
                .collect();
            journal.apply(local, None)?;
            tracing::info!("settings pulled from remote");
            update.output
        }
        None => {
            tracing::info!("remote has no settings; keeping local values");
            state.settings
        }
    };

    let result = SettingsOutput {
        settings: &settings,
        sync: None,
    };
    render(ctx.output, &result, |r, w| {
        writeln!(w, "✓ Settings pulled")?;
        writeln!(w)?;
        write_settings(w, r.settings)
    })
}

fn write_settings(w: &mut dyn Write, settings: &Settings) -> std::io::Result<()> {
    pretty_section(w, "Settings")?;
    pretty_kv(w, "Worry time", format!("{} min/day", settings.daily_worry_time))?;
    pretty_kv(
        w,
        "Reminders",
        if settings.notifications { "on" } else { "off" },
    )?;
    pretty_kv(w, "Reflection", &settings.reflection_time)?;
    let categories = if settings.custom_categories.is_empty() {
        "none".to_string()
    } else {
        settings.custom_categories.join(", ")
    };
    pretty_kv(w, "Categories", categories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(subcommand)]
        command: SettingsCommand,
    }

    fn set_args(argv: &[&str]) -> SetArgs {
        let mut full = vec!["test", "set"];
        full.extend_from_slice(argv);
        match Wrapper::parse_from(full).command {
            SettingsCommand::Set(args) => args,
            other => panic!("expected set, got {other:?}"),
        }
    }

    #[test]
    fn no_flags_is_an_empty_patch() {
        assert!(set_args(&[]).patch().is_empty());
    }

    #[test]
    fn flags_map_to_patch_fields() {
        let patch = set_args(&[
            "--worry-time",
            "20",
            "--notifications",
            "false",
            "--reflection-time",
            "18:30",
            "--category",
            "Garden",
            "--category",
            "Pets",
        ])
        .patch();
        assert_eq!(patch.daily_worry_time, Some(20));
        assert_eq!(patch.notifications, Some(false));
        assert_eq!(patch.reflection_time.as_deref(), Some("18:30"));
        assert_eq!(
            patch.custom_categories,
            Some(vec!["Garden".to_string(), "Pets".to_string()])
        );
    }

    #[test]
    fn clear_categories_sets_empty_list() {
        let patch = set_args(&["--clear-categories"]).patch();
        assert_eq!(patch.custom_categories, Some(Vec::new()));
        assert!(
            Wrapper::try_parse_from(["test", "set", "--clear-categories", "--category", "X"])
                .is_err()
        );
    }

    #[test]
    fn settings_render_lists_categories() {
        let mut buf = Vec::new();
        write_settings(&mut buf, &Settings::default()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("15 min/day"));
        assert!(text.contains("17:00"));
        assert!(text.contains("none"));
    }
}
