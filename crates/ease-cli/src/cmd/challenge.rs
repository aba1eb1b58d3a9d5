//! `ease challenge`: walk a worry through the six challenge steps.
//!
//! The wizard lives in the journal as a single draft between invocations.
//! Every command loads it, applies one edit, and saves it back. Answers
//! reach the challenge record on `next` and `complete`.

use crate::cmd::worry::worry_not_found;
use crate::context::{Access, Context, Journal};
use crate::output::{
    CliError, OutputMode, fail, local_time, pretty_kv, pretty_rule, pretty_section, render,
    render_mode, report_sync,
};
use anyhow::Result;
use chrono::Utc;
use clap::{Args, Subcommand};
use ease_core::effects::ApplyReport;
use ease_core::error::ErrorCode;
use ease_core::model::{CognitiveChallenge, Distortion, EvidenceKind};
use ease_core::wizard::{Answers, STEP_COUNT, Step, Wizard};
use serde::Serialize;
use std::io::Write;

#[derive(Subcommand, Debug)]
pub enum ChallengeCommand {
    #[command(
        about = "Start challenging a worry",
        after_help = "EXAMPLES:\n    # Challenge a captured worry\n    ease challenge start 3f2c9a1e-...\n\n    # Put the thought in your own words\n    ease challenge start 3f2c9a1e-... --thought \"I will freeze in the interview\""
    )]
    Start(StartArgs),

    #[command(about = "Show the current step and answers")]
    Status,

    #[command(subcommand, about = "Edit evidence on the evidence steps")]
    Evidence(EvidenceCommand),

    #[command(about = "Save answers and move to the next step")]
    Next,

    #[command(about = "Move back one step (answers are kept)")]
    Back,

    #[command(about = "Rate how likely the worry is to happen (0-100)")]
    Probability(RatingArgs),

    #[command(about = "Rate how helpful the worry is (1-10)")]
    Helpfulness(RatingArgs),

    #[command(
        about = "Toggle a thinking pattern",
        after_help = "EXAMPLES:\n    # Select catastrophizing (run again to deselect)\n    ease challenge distortion catastrophizing\n\n    # See every pattern\n    ease distortions"
    )]
    Distortion(DistortionArgs),

    #[command(about = "Write the balanced thought")]
    Reframe(ReframeArgs),

    #[command(
        about = "Complete the challenge from the final step",
        after_help = "EXAMPLES:\n    # Finish and sync the reflection\n    ease challenge complete"
    )]
    Complete,

    #[command(about = "Drop the challenge in progress")]
    Abandon(AbandonArgs),

    #[command(about = "List challenges")]
    List(ListArgs),

    #[command(about = "Show one challenge")]
    Show(IdArg),

    #[command(about = "Delete a challenge")]
    Delete(IdArg),
}

#[derive(Subcommand, Debug)]
pub enum EvidenceCommand {
    /// Add an item to the list for the current step.
    Add {
        /// Evidence text.
        text: String,
    },
    /// Remove an item by its 1-based position.
    Remove {
        /// Position shown by `ease challenge status`.
        index: usize,
    },
}

#[derive(Args, Debug)]
pub struct StartArgs {
    /// Worry to challenge.
    pub worry_id: String,

    /// The anxious thought. Defaults to the worry's description.
    #[arg(long)]
    pub thought: Option<String>,

    /// Replace a challenge that is already in progress.
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct RatingArgs {
    /// Rating; out-of-range values are clamped.
    #[arg(allow_negative_numbers = true)]
    pub value: i64,
}

#[derive(Args, Debug)]
pub struct DistortionArgs {
    /// Pattern tag, e.g. `catastrophizing` or `all-or-nothing`.
    pub tag: String,
}

#[derive(Args, Debug)]
pub struct ReframeArgs {
    /// The balanced thought (more than 10 characters).
    pub text: String,
}

#[derive(Args, Debug)]
pub struct AbandonArgs {
    /// Also delete the unfinished challenge record.
    #[arg(long)]
    pub delete: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only challenges for this worry.
    #[arg(long)]
    pub worry: Option<String>,
}

#[derive(Args, Debug)]
pub struct IdArg {
    /// Challenge ID.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct StatusOutput<'a> {
    challenge_id: &'a str,
    worry_id: &'a str,
    worry_text: &'a str,
    step: Step,
    step_number: usize,
    step_count: usize,
    progress_percent: usize,
    title: &'static str,
    question: &'static str,
    description: &'static str,
    can_proceed: bool,
    answers: &'a Answers,
    #[serde(skip_serializing_if = "Option::is_none")]
    sync: Option<ApplyReport>,
}

impl<'a> StatusOutput<'a> {
    fn new(wizard: &'a Wizard, sync: Option<ApplyReport>) -> Self {
        let step = wizard.step();
        let info = step.info();
        Self {
            challenge_id: &wizard.challenge_id,
            worry_id: &wizard.worry_id,
            worry_text: &wizard.worry_text,
            step,
            step_number: step.index() + 1,
            step_count: STEP_COUNT,
            progress_percent: wizard.progress_percent(),
            title: info.title,
            question: info.question,
            description: info.description,
            can_proceed: wizard.can_proceed(),
            answers: wizard.answers(),
            sync,
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletedOutput {
    challenge: CognitiveChallenge,
    sync: ApplyReport,
}

#[derive(Debug, Serialize)]
struct AbandonOutput {
    ok: bool,
    challenge_id: String,
    deleted: bool,
}

#[derive(Debug, Serialize)]
struct DeleteOutput {
    ok: bool,
    challenge_id: String,
}

pub fn run(command: &ChallengeCommand, ctx: &Context) -> Result<()> {
    match command {
        ChallengeCommand::Start(args) => run_start(args, ctx),
        ChallengeCommand::Status => run_status(ctx),
        ChallengeCommand::Evidence(EvidenceCommand::Add { text }) => {
            edit_draft(ctx, |wizard| add_evidence(wizard, text))
        }
        ChallengeCommand::Evidence(EvidenceCommand::Remove { index }) => {
            edit_draft(ctx, |wizard| remove_evidence(wizard, *index))
        }
        ChallengeCommand::Next => run_next(ctx),
        ChallengeCommand::Back => edit_draft(ctx, |wizard| {
            wizard
                .back()
                .map(|_| ())
                .map_err(|err| CliError::from(&err))
        }),
        ChallengeCommand::Probability(args) => edit_draft(ctx, |wizard| {
            require_step(wizard, Step::Probability)?;
            wizard.set_probability(args.value);
            Ok(())
        }),
        ChallengeCommand::Helpfulness(args) => edit_draft(ctx, |wizard| {
            require_step(wizard, Step::Helpfulness)?;
            wizard.set_helpfulness(args.value);
            Ok(())
        }),
        ChallengeCommand::Distortion(args) => {
            edit_draft(ctx, |wizard| toggle_distortion(wizard, &args.tag))
        }
        ChallengeCommand::Reframe(args) => edit_draft(ctx, |wizard| {
            require_step(wizard, Step::Reframe)?;
            wizard.set_reframe(&args.text);
            Ok(())
        }),
        ChallengeCommand::Complete => run_complete(ctx),
        ChallengeCommand::Abandon(args) => run_abandon(args, ctx),
        ChallengeCommand::List(args) => run_list(args, ctx),
        ChallengeCommand::Show(args) => run_show(&args.id, ctx),
        ChallengeCommand::Delete(args) => run_delete(&args.id, ctx),
    }
}

fn load_draft(journal: &Journal, output: OutputMode) -> Result<Wizard> {
    journal.store.load_draft()?.ok_or_else(|| {
        fail(
            output,
            &CliError::coded(ErrorCode::NoActiveChallenge, "no challenge in progress"),
        )
    })
}

/// Load the draft, apply `edit`, save it back and show the result.
fn edit_draft(
    ctx: &Context,
    edit: impl FnOnce(&mut Wizard) -> Result<(), CliError>,
) -> Result<()> {
    let journal = ctx.open_journal(Access::Write)?;
    let mut wizard = load_draft(&journal, ctx.output)?;
    edit(&mut wizard).map_err(|err| fail(ctx.output, &err))?;
    journal.store.save_draft(&wizard, Utc::now())?;
    render_status(ctx.output, &StatusOutput::new(&wizard, None))
}

fn require_step(wizard: &Wizard, expected: Step) -> Result<(), CliError> {
    if wizard.step() == expected {
        return Ok(());
    }
    Err(CliError::with_details(
        format!(
            "this answer belongs to the {expected} step (currently at {})",
            wizard.step()
        ),
        "Use `ease challenge next` or `ease challenge back` to get there.",
        ErrorCode::WizardStepBlocked.code(),
    ))
}

fn evidence_step(wizard: &Wizard) -> Result<EvidenceKind, CliError> {
    wizard.step().evidence_kind().ok_or_else(|| {
        CliError::with_details(
            format!("evidence is edited on the evidence steps (currently at {})", wizard.step()),
            "Use `ease challenge back` to return to an evidence step.",
            ErrorCode::WizardStepBlocked.code(),
        )
    })
}

fn add_evidence(wizard: &mut Wizard, text: &str) -> Result<(), CliError> {
    let kind = evidence_step(wizard)?;
    wizard.set_input(text);
    if wizard.add_evidence(kind) {
        Ok(())
    } else {
        Err(CliError::coded(ErrorCode::InvalidInput, "evidence is empty"))
    }
}

fn remove_evidence(wizard: &mut Wizard, position: usize) -> Result<(), CliError> {
    let kind = evidence_step(wizard)?;
    let removed = position
        .checked_sub(1)
        .and_then(|index| wizard.remove_evidence(kind, index));
    match removed {
        Some(_) => Ok(()),
        None => Err(CliError::coded(
            ErrorCode::InvalidInput,
            format!("no evidence item #{position}"),
        )),
    }
}

fn toggle_distortion(wizard: &mut Wizard, raw: &str) -> Result<(), CliError> {
    require_step(wizard, Step::Distortions)?;
    let distortion = raw
        .parse::<Distortion>()
        .map_err(|err| CliError::coded(ErrorCode::InvalidEnumValue, err.to_string()))?;
    let selected = wizard.toggle_distortion(distortion);
    tracing::debug!(%distortion, selected, "distortion toggled");
    Ok(())
}

fn run_start(args: &StartArgs, ctx: &Context) -> Result<()> {
    let mut journal = ctx.open_journal(Access::Write)?;
    if let Some(existing) = journal.store.load_draft()? {
        if !args.force {
            return Err(fail(
                ctx.output,
                &CliError::with_details(
                    format!("challenge {} is already in progress", existing.challenge_id),
                    "Finish it with `ease challenge complete`, drop it with `ease challenge abandon`, or pass --force.",
                    ErrorCode::InvalidInput.code(),
                ),
            ));
        }
        tracing::info!(challenge = %existing.challenge_id, "replacing challenge in progress");
    }

    let state = journal.state()?;
    let Some(worry) = state.worry(&args.worry_id) else {
        return Err(worry_not_found(ctx.output, &args.worry_id));
    };
    let worry_text = args.thought.as_deref().unwrap_or(&worry.description);

    let now = Utc::now();
    let (wizard, update) = Wizard::begin(&state, Some(worry.id.as_str()), Some(worry_text), now)
        .map_err(|err| fail(ctx.output, &CliError::from(&err)))?;
    journal.apply(update.effects, None)?;
    journal.store.save_draft(&wizard, now)?;

    render_status(ctx.output, &StatusOutput::new(&wizard, None))
}

fn run_status(ctx: &Context) -> Result<()> {
    let journal = ctx.open_journal(Access::Read)?;
    let wizard = load_draft(&journal, ctx.output)?;
    render_status(ctx.output, &StatusOutput::new(&wizard, None))
}

fn run_next(ctx: &Context) -> Result<()> {
    let mut journal = ctx.open_journal(Access::Write)?;
    let mut wizard = load_draft(&journal, ctx.output)?;
    let state = journal.state()?;
    let now = Utc::now();

    let update = wizard
        .next(&state, now)
        .map_err(|err| fail(ctx.output, &CliError::from(&err)))?;
    let report = journal.apply(update.effects, None)?;
    journal.store.save_draft(&wizard, now)?;

    render_status(ctx.output, &StatusOutput::new(&wizard, Some(report)))
}

fn run_complete(ctx: &Context) -> Result<()> {
    let mut journal = ctx.open_journal(Access::Write)?;
    let wizard = load_draft(&journal, ctx.output)?;
    let state = journal.state()?;

    let update = wizard
        .complete(&state, Utc::now())
        .map_err(|err| fail(ctx.output, &CliError::from(&err)))?;
    let remote = ctx.remote();
    let report = journal.apply(update.effects, remote.as_ref())?;
    journal.store.clear_draft()?;

    let result = CompletedOutput {
        challenge: update.output,
        sync: report,
    };
    render(ctx.output, &result, |r, w| {
        writeln!(w, "✓ Challenge {} completed", r.challenge.id)?;
        writeln!(w)?;
        writeln!(w, "Balanced thought: {}", r.challenge.reframed_thought)?;
        writeln!(w, "Take a moment to notice how you feel now.")
    })?;
    report_sync(ctx.output, &result.sync)
}

fn run_abandon(args: &AbandonArgs, ctx: &Context) -> Result<()> {
    let mut journal = ctx.open_journal(Access::Write)?;
    let wizard = load_draft(&journal, ctx.output)?;

    let mut deleted = false;
    if args.delete {
        let update = journal.state()?.delete_challenge(&wizard.challenge_id);
        deleted = update.output;
        journal.apply(update.effects, None)?;
    }
    journal.store.clear_draft()?;
    tracing::info!(challenge = %wizard.challenge_id, deleted, "challenge abandoned");

    let result = AbandonOutput {
        ok: true,
        challenge_id: wizard.challenge_id,
        deleted,
    };
    render(ctx.output, &result, |r, w| {
        if r.deleted {
            writeln!(w, "✓ Abandoned and deleted challenge {}", r.challenge_id)
        } else {
            writeln!(w, "✓ Abandoned challenge {}", r.challenge_id)
        }
    })
}

fn run_list(args: &ListArgs, ctx: &Context) -> Result<()> {
    let journal = ctx.open_journal(Access::Read)?;
    let state = journal.state()?;

    let challenges: Vec<&CognitiveChallenge> = match args.worry.as_deref() {
        Some(worry_id) => state.worry_challenges(worry_id),
        None => state.challenges.iter().collect(),
    };

    render_mode(
        ctx.output,
        &challenges,
        |challenges, w| {
            for c in challenges {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}",
                    c.id,
                    c.worry_id,
                    completion_label(c),
                    c.original_thought
                )?;
            }
            Ok(())
        },
        |challenges, w| {
            if challenges.is_empty() {
                writeln!(w, "No challenges yet. Start one with `ease challenge start <worry-id>`.")?;
                return Ok(());
            }
            for c in challenges {
                writeln!(w, "{} [{}] {}", c.id, completion_label(c), c.original_thought)?;
            }
            Ok(())
        },
    )
}

fn run_show(id: &str, ctx: &Context) -> Result<()> {
    let journal = ctx.open_journal(Access::Read)?;
    let state = journal.state()?;
    let Some(challenge) = state.challenge(id) else {
        return Err(challenge_not_found(ctx.output, id));
    };

    render(ctx.output, challenge, |c, w| {
        pretty_section(w, &format!("Challenge {}", c.id))?;
        pretty_kv(w, "Worry", &c.worry_id)?;
        pretty_kv(w, "Thought", &c.original_thought)?;
        pretty_kv(w, "Status", completion_label(c))?;
        pretty_kv(w, "Probability", format!("{}%", c.probability_rating))?;
        pretty_kv(w, "Helpfulness", format!("{}/10", c.helpfulness_rating))?;
        pretty_kv(w, "Distortions", distortion_list(&c.cognitive_distortions))?;
        pretty_kv(w, "Started", local_time(c.created_at))?;
        if let Some(completed_at) = c.completed_at {
            pretty_kv(w, "Completed", local_time(completed_at))?;
        }
        write_list(w, "Evidence for", &c.evidence_for)?;
        write_list(w, "Evidence against", &c.evidence_against)?;
        if c.is_completed {
            writeln!(w)?;
            writeln!(w, "Balanced thought: {}", c.reframed_thought)?;
        }
        Ok(())
    })
}

fn run_delete(id: &str, ctx: &Context) -> Result<()> {
    let mut journal = ctx.open_journal(Access::Write)?;
    let update = journal.state()?.delete_challenge(id);
    if !update.output {
        return Err(challenge_not_found(ctx.output, id));
    }
    journal.apply(update.effects, None)?;

    if let Some(draft) = journal.store.load_draft()? {
        if draft.challenge_id == id {
            journal.store.clear_draft()?;
        }
    }

    let result = DeleteOutput {
        ok: true,
        challenge_id: id.to_string(),
    };
    render(ctx.output, &result, |r, w| {
        writeln!(w, "✓ Deleted challenge {}", r.challenge_id)
    })
}

fn challenge_not_found(output: OutputMode, id: &str) -> anyhow::Error {
    fail(
        output,
        &CliError::coded(
            ErrorCode::ChallengeNotFound,
            format!("challenge '{id}' not found"),
        ),
    )
}

fn render_status(output: OutputMode, status: &StatusOutput<'_>) -> Result<()> {
    render_mode(
        output,
        status,
        |s, w| {
            writeln!(w, "challenge\t{}", s.challenge_id)?;
            writeln!(w, "step\t{}\t{}/{}", s.step, s.step_number, s.step_count)?;
            writeln!(w, "progress\t{}", s.progress_percent)?;
            writeln!(w, "can_proceed\t{}", s.can_proceed)
        },
        |s, w| {
            writeln!(
                w,
                "Step {}/{}: {} ({}%)",
                s.step_number, s.step_count, s.title, s.progress_percent
            )?;
            pretty_rule(w)?;
            writeln!(w, "Worry: \"{}\"", s.worry_text)?;
            writeln!(w)?;
            writeln!(w, "{}", s.question)?;
            writeln!(w, "{}", s.description)?;
            writeln!(w)?;
            write_answers(w, s.answers)?;
            writeln!(w)?;
            match s.step {
                Step::Reframe if s.can_proceed => {
                    writeln!(w, "Ready: `ease challenge complete`")
                }
                Step::Reframe => writeln!(
                    w,
                    "Write a balanced thought with `ease challenge reframe \"...\"`"
                ),
                _ => writeln!(w, "Continue: `ease challenge next`"),
            }
        },
    )
}

fn write_answers(w: &mut dyn Write, answers: &Answers) -> std::io::Result<()> {
    write_list(w, "Evidence for", &answers.evidence_for)?;
    write_list(w, "Evidence against", &answers.evidence_against)?;
    pretty_kv(w, "Probability", format!("{}%", answers.probability_rating))?;
    pretty_kv(w, "Distortions", distortion_list(&answers.cognitive_distortions))?;
    pretty_kv(w, "Helpfulness", format!("{}/10", answers.helpfulness_rating))?;
    if !answers.reframed_thought.trim().is_empty() {
        pretty_kv(w, "Reframe", &answers.reframed_thought)?;
    }
    Ok(())
}

fn write_list(w: &mut dyn Write, heading: &str, items: &[String]) -> std::io::Result<()> {
    writeln!(w, "{heading}:")?;
    if items.is_empty() {
        return writeln!(w, "  (none yet)");
    }
    for (i, item) in items.iter().enumerate() {
        writeln!(w, "  {}. {item}", i + 1)?;
    }
    Ok(())
}

fn distortion_list(tags: &[Distortion]) -> String {
    if tags.is_empty() {
        return "none".to_string();
    }
    tags.iter()
        .map(|tag| tag.info().name)
        .collect::<Vec<_>>()
        .join(", ")
}

const fn completion_label(challenge: &CognitiveChallenge) -> &'static str {
    if challenge.is_completed {
        "completed"
    } else {
        "in progress"
    }
}
