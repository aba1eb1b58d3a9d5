//! `ease worry`: capture, list, inspect, release and clear worries.

use crate::context::{Access, Context};
use crate::output::{
    CliError, OutputMode, fail, local_time, pretty_kv, pretty_rule, pretty_section, render,
    render_mode, report_sync,
};
use anyhow::Result;
use chrono::Utc;
use clap::{Args, Subcommand};
use ease_core::effects::ApplyReport;
use ease_core::error::ErrorCode;
use ease_core::model::{Category, CognitiveChallenge, NewWorry, Worry};
use serde::Serialize;

#[derive(Subcommand, Debug)]
pub enum WorryCommand {
    #[command(
        about = "Capture a new worry",
        after_help = "EXAMPLES:\n    # Capture a worry with a body response\n    ease worry add \"Interview\" -d \"I might fail\" --body \"Racing heartbeat\" -i 7\n\n    # Use a custom category\n    ease worry add \"Garden\" -d \"The frost\" --category Garden"
    )]
    Add(AddArgs),

    #[command(
        about = "List worries",
        after_help = "EXAMPLES:\n    # Active worries (default)\n    ease worry list\n\n    # Everything, newest last\n    ease worry list --all --json"
    )]
    List(ListArgs),

    #[command(about = "Show one worry and its challenges")]
    Show(IdArg),

    #[command(
        about = "Let go of a worry",
        after_help = "EXAMPLES:\n    # Release a worry\n    ease worry release 3f2c9a1e-..."
    )]
    Release(IdArg),

    #[command(about = "Delete every worry (challenges are kept)")]
    Clear(ClearArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Short label for the worry.
    pub name: String,

    /// Why it is on your mind.
    #[arg(short, long)]
    pub description: String,

    /// Preset category or a custom name. Defaults to `[worries].default_category`.
    #[arg(short, long)]
    pub category: Option<String>,

    /// Physical sensation; repeat for several.
    #[arg(long = "body", value_name = "RESPONSE")]
    pub body_responses: Vec<String>,

    /// Intensity from 1 to 10. Defaults to `[worries].default_intensity`.
    #[arg(short, long)]
    pub intensity: Option<u8>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Include released worries.
    #[arg(long, conflicts_with = "released")]
    pub all: bool,

    /// Only released worries.
    #[arg(long)]
    pub released: bool,
}

#[derive(Args, Debug)]
pub struct IdArg {
    /// Worry ID.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Confirm the deletion.
    #[arg(long)]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
struct WorryOutput<'a> {
    worry: &'a Worry,
    sync: ApplyReport,
}

#[derive(Debug, Serialize)]
struct ShowOutput<'a> {
    worry: &'a Worry,
    challenges: Vec<&'a CognitiveChallenge>,
}

#[derive(Debug, Serialize)]
struct ClearOutput {
    ok: bool,
    removed: usize,
}

pub fn run(command: &WorryCommand, ctx: &Context) -> Result<()> {
    match command {
        WorryCommand::Add(args) => run_add(args, ctx),
        WorryCommand::List(args) => run_list(args, ctx),
        WorryCommand::Show(args) => run_show(&args.id, ctx),
        WorryCommand::Release(args) => run_release(&args.id, ctx),
        WorryCommand::Clear(args) => run_clear(args, ctx),
    }
}

pub fn worry_not_found(output: OutputMode, id: &str) -> anyhow::Error {
    fail(
        output,
        &CliError::coded(ErrorCode::WorryNotFound, format!("worry '{id}' not found")),
    )
}

fn run_add(args: &AddArgs, ctx: &Context) -> Result<()> {
    let output = ctx.output;
    let defaults = &ctx.config.project.worries;

    let category = match args.category.as_deref() {
        Some(raw) => raw
            .parse::<Category>()
            .map_err(|err| fail(output, &CliError::coded(ErrorCode::InvalidEnumValue, err.to_string())))?,
        None => defaults.default_category.clone(),
    };

    let input = NewWorry {
        name: args.name.clone(),
        description: args.description.clone(),
        category,
        body_responses: args.body_responses.clone(),
        intensity: args.intensity.unwrap_or(defaults.default_intensity),
    }
    .validate()
    .map_err(|err| fail(output, &CliError::from(&err)))?;

    let mut journal = ctx.open_journal(Access::Write)?;
    let state = journal.state()?;
    let update = state.add_worry(input, Utc::now());
    let remote = ctx.remote();
    let report = journal.apply(update.effects, remote.as_ref())?;

    let Some(worry) = update.state.worry(&update.output) else {
        anyhow::bail!("{}: added worry missing from state", ErrorCode::InternalUnexpected);
    };
    tracing::info!(worry = %worry.id, "worry captured");

    let result = WorryOutput {
        worry,
        sync: report,
    };
    render(output, &result, |r, w| {
        writeln!(w, "✓ Captured worry {}: {}", r.worry.id, r.worry.name)
    })?;
    report_sync(output, &result.sync)
}

fn run_list(args: &ListArgs, ctx: &Context) -> Result<()> {
    let journal = ctx.open_journal(Access::Read)?;
    let state = journal.state()?;

    let worries: Vec<&Worry> = if args.all {
        state.worries.iter().collect()
    } else if args.released {
        state.released_worries()
    } else {
        state.active_worries()
    };

    render_mode(
        ctx.output,
        &worries,
        |worries, w| {
            for worry in worries {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}\t{}",
                    worry.id,
                    status_label(worry),
                    worry.category,
                    worry.intensity,
                    worry.name
                )?;
            }
            Ok(())
        },
        |worries, w| {
            if worries.is_empty() {
                writeln!(w, "No worries here. Capture one with `ease worry add`.")?;
                return Ok(());
            }
            for worry in worries {
                writeln!(
                    w,
                    "{} [{}] {} ({}/10, {})",
                    worry.id,
                    status_label(worry),
                    worry.name,
                    worry.intensity,
                    worry.category
                )?;
            }
            Ok(())
        },
    )
}

fn run_show(id: &str, ctx: &Context) -> Result<()> {
    let journal = ctx.open_journal(Access::Read)?;
    let state = journal.state()?;
    let Some(worry) = state.worry(id) else {
        return Err(worry_not_found(ctx.output, id));
    };

    let result = ShowOutput {
        worry,
        challenges: state.worry_challenges(id),
    };

    render(ctx.output, &result, |r, w| {
        pretty_section(w, &r.worry.name)?;
        pretty_kv(w, "ID", &r.worry.id)?;
        pretty_kv(w, "Status", status_label(r.worry))?;
        pretty_kv(w, "Category", r.worry.category.as_str())?;
        pretty_kv(w, "Intensity", format!("{}/10", r.worry.intensity))?;
        if !r.worry.body_responses.is_empty() {
            pretty_kv(w, "Body", r.worry.body_responses.join(", "))?;
        }
        pretty_kv(w, "Captured", local_time(r.worry.created_at))?;
        if let Some(released_at) = r.worry.released_at {
            pretty_kv(w, "Released", local_time(released_at))?;
        }
        writeln!(w)?;
        writeln!(w, "{}", r.worry.description)?;

        if !r.challenges.is_empty() {
            writeln!(w)?;
            pretty_rule(w)?;
            for challenge in &r.challenges {
                let state = if challenge.is_completed {
                    "completed"
                } else {
                    "in progress"
                };
                writeln!(w, "challenge {} ({state})", challenge.id)?;
                if challenge.is_completed {
                    writeln!(w, "  balanced thought: {}", challenge.reframed_thought)?;
                }
            }
        }
        Ok(())
    })
}

fn run_release(id: &str, ctx: &Context) -> Result<()> {
    let mut journal = ctx.open_journal(Access::Write)?;
    let state = journal.state()?;
    let update = state.release_worry(id, Utc::now());
    if !update.output {
        return Err(worry_not_found(ctx.output, id));
    }

    let remote = ctx.remote();
    let report = journal.apply(update.effects, remote.as_ref())?;
    let Some(worry) = update.state.worry(id) else {
        return Err(worry_not_found(ctx.output, id));
    };

    let result = WorryOutput {
        worry,
        sync: report,
    };
    render(ctx.output, &result, |r, w| {
        writeln!(w, "✓ Released {}: {}", r.worry.id, r.worry.name)
    })?;
    report_sync(ctx.output, &result.sync)
}

fn run_clear(args: &ClearArgs, ctx: &Context) -> Result<()> {
    if !args.yes {
        return Err(fail(
            ctx.output,
            &CliError::with_details(
                "refusing to delete every worry without confirmation",
                "Re-run with `ease worry clear --yes`.",
                ErrorCode::InvalidInput.code(),
            ),
        ));
    }

    let mut journal = ctx.open_journal(Access::Write)?;
    let state = journal.state()?;
    let update = state.clear_worries();
    journal.apply(update.effects, None)?;
    tracing::info!(removed = update.output, "worries cleared");

    let result = ClearOutput {
        ok: true,
        removed: update.output,
    };
    render(ctx.output, &result, |r, w| {
        writeln!(w, "✓ Removed {} worries", r.removed)
    })
}

const fn status_label(worry: &Worry) -> &'static str {
    if worry.is_released {
        "released"
    } else {
        "active"
    }
}
