use crate::context::{Access, Context};
use crate::output::{local_time, pretty_kv, pretty_section, render_mode};
use anyhow::Result;
use ease_core::store::{ChallengeStats, WorryStats};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct StatsOutput {
    worries: WorryStats,
    challenges: ChallengeStats,
}

/// Execute `ease stats`: release progress and challenge insights.
pub fn run_stats(ctx: &Context) -> Result<()> {
    let journal = ctx.open_journal(Access::Read)?;
    let state = journal.state()?;
    let stats = StatsOutput {
        worries: state.worry_stats(),
        challenges: state.challenge_stats(),
    };

    render_mode(
        ctx.output,
        &stats,
        |s, w| {
            writeln!(w, "total_worries\t{}", s.worries.total_worries)?;
            writeln!(w, "active_worries\t{}", s.worries.active_worries)?;
            writeln!(w, "released_worries\t{}", s.worries.released_worries)?;
            writeln!(w, "release_rate\t{:.1}", s.worries.release_rate)?;
            writeln!(w, "total_challenges\t{}", s.challenges.total_challenges)?;
            writeln!(w, "completed_challenges\t{}", s.challenges.completed_challenges)?;
            writeln!(w, "average_probability\t{:.1}", s.challenges.average_probability)?;
            writeln!(w, "average_helpfulness\t{:.1}", s.challenges.average_helpfulness)
        },
        |s, w| {
            let worries = &s.worries;
            pretty_section(w, "Worries")?;
            pretty_kv(w, "Total", worries.total_worries.to_string())?;
            pretty_kv(w, "Active", worries.active_worries.to_string())?;
            pretty_kv(w, "Released", worries.released_worries.to_string())?;
            pretty_kv(w, "Release rate", format!("{:.0}%", worries.release_rate))?;
            if let Some(category) = &worries.top_category {
                pretty_kv(w, "Top category", category.as_str())?;
            }
            if let Some(body) = &worries.top_body_response {
                pretty_kv(w, "Top body cue", body)?;
            }
            pretty_kv(w, "Categories", worries.categories_used.to_string())?;
            writeln!(w)?;
            writeln!(w, "{}", worries.trend.message())?;

            if !worries.recent.is_empty() {
                writeln!(w)?;
                pretty_section(w, "Recent")?;
                for worry in &worries.recent {
                    writeln!(w, "{}  {}", local_time(worry.created_at), worry.name)?;
                }
            }

            let challenges = &s.challenges;
            writeln!(w)?;
            pretty_section(w, "Challenges")?;
            pretty_kv(w, "Total", challenges.total_challenges.to_string())?;
            pretty_kv(w, "Completed", challenges.completed_challenges.to_string())?;
            if challenges.completed_challenges > 0 {
                pretty_kv(
                    w,
                    "Probability",
                    format!("{:.0}% on average", challenges.average_probability),
                )?;
                pretty_kv(
                    w,
                    "Helpfulness",
                    format!("{:.1}/10 on average", challenges.average_helpfulness),
                )?;
            }
            for (rank, entry) in challenges.most_common_distortions.iter().enumerate() {
                writeln!(
                    w,
                    "  {}. {} ({}x)",
                    rank + 1,
                    entry.distortion.info().name,
                    entry.count
                )?;
            }
            Ok(())
        },
    )
}
