//! Aggregate insight statistics over the journal.

use serde::Serialize;

use super::AppState;
use crate::model::{Category, Distortion, Worry};

/// How many most-common distortions are reported.
pub const TOP_DISTORTIONS: usize = 3;

/// How many worries the recent-activity list holds.
pub const RECENT_WORRIES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DistortionCount {
    pub distortion: Distortion,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeStats {
    pub total_challenges: usize,
    pub completed_challenges: usize,
    /// Tallied over completed challenges, highest count first.
    pub most_common_distortions: Vec<DistortionCount>,
    pub average_helpfulness: f64,
    pub average_probability: f64,
}

/// Coarse reading of the release rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Trend {
    NoData,
    Building,
    MakingProgress,
    Great,
}

impl Trend {
    #[must_use]
    pub fn from_counts(released: usize, total: usize) -> Self {
        if total == 0 {
            return Self::NoData;
        }
        let rate = release_rate(released, total);
        if rate > 70.0 {
            Self::Great
        } else if rate > 40.0 {
            Self::MakingProgress
        } else {
            Self::Building
        }
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NoData => "Start by capturing your first worry.",
            Self::Building => "You're building awareness. Keep noticing your worries.",
            Self::MakingProgress => "You're making progress letting worries go.",
            Self::Great => "Great work! You're releasing most of your worries.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorryStats {
    pub total_worries: usize,
    pub active_worries: usize,
    pub released_worries: usize,
    /// Percentage of worries released, 0 when there are none.
    pub release_rate: f64,
    pub top_category: Option<Category>,
    pub top_body_response: Option<String>,
    pub categories_used: usize,
    pub trend: Trend,
    /// Newest first.
    pub recent: Vec<Worry>,
}

/// `released / total * 100`, or 0 for an empty journal.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn release_rate(released: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    released as f64 / total as f64 * 100.0
}

impl AppState {
    #[must_use]
    pub fn challenge_stats(&self) -> ChallengeStats {
        let completed: Vec<_> = self.challenges.iter().filter(|c| c.is_completed).collect();

        let tally = tally_first_seen(
            completed
                .iter()
                .flat_map(|c| c.cognitive_distortions.iter().copied()),
        );
        let most_common_distortions = tally
            .into_iter()
            .take(TOP_DISTORTIONS)
            .map(|(distortion, count)| DistortionCount { distortion, count })
            .collect();

        ChallengeStats {
            total_challenges: self.challenges.len(),
            completed_challenges: completed.len(),
            most_common_distortions,
            average_helpfulness: mean(completed.iter().map(|c| c.helpfulness_rating)),
            average_probability: mean(completed.iter().map(|c| c.probability_rating)),
        }
    }

    #[must_use]
    pub fn worry_stats(&self) -> WorryStats {
        let total = self.worries.len();
        let released = self.worries.iter().filter(|w| w.is_released).count();

        let categories = tally_first_seen(self.worries.iter().map(|w| w.category.clone()));
        let bodies = tally_first_seen(
            self.worries
                .iter()
                .flat_map(|w| w.body_responses.iter().cloned()),
        );

        let mut recent: Vec<Worry> = self.worries.iter().rev().cloned().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(RECENT_WORRIES);

        WorryStats {
            total_worries: total,
            active_worries: total - released,
            released_worries: released,
            release_rate: release_rate(released, total),
            categories_used: categories.len(),
            top_category: categories.into_iter().next().map(|(category, _)| category),
            top_body_response: bodies.into_iter().next().map(|(body, _)| body),
            trend: Trend::from_counts(released, total),
            recent,
        }
    }
}

/// Count occurrences and order by descending count. Equal counts keep the
/// order in which each value was first seen.
fn tally_first_seen<T: PartialEq>(values: impl Iterator<Item = T>) -> Vec<(T, usize)> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn mean(values: impl Iterator<Item = u8>) -> f64 {
    let (sum, count) = values.fold((0_u32, 0_u32), |(sum, count), v| {
        (sum + u32::from(v), count + 1)
    });
    if count == 0 {
        0.0
    } else {
        f64::from(sum) / f64::from(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChallengePatch, NewWorry};
    use chrono::{Duration, Utc};

    fn worry(name: &str, category: Category, body: &[&str]) -> NewWorry {
        NewWorry {
            name: name.into(),
            description: format!("{name} worry"),
            category,
            body_responses: body.iter().map(ToString::to_string).collect(),
            intensity: 5,
        }
    }

    fn completed_with(
        state: &AppState,
        distortions: Vec<Distortion>,
        probability: u8,
        helpfulness: u8,
    ) -> AppState {
        let now = Utc::now();
        let started = state.start_challenge("w", "thought", now);
        let id = started.output.clone();
        let updated = started.state.update_challenge(
            &id,
            ChallengePatch {
                cognitive_distortions: Some(distortions),
                probability_rating: Some(probability),
                helpfulness_rating: Some(helpfulness),
                ..ChallengePatch::default()
            },
            now,
        );
        updated
            .state
            .complete_challenge(&id, "A balanced view of it", now)
            .state
    }

    #[test]
    fn empty_challenge_stats_are_zero() {
        let stats = AppState::default().challenge_stats();
        assert_eq!(stats.total_challenges, 0);
        assert_eq!(stats.completed_challenges, 0);
        assert!(stats.most_common_distortions.is_empty());
        assert!(stats.average_helpfulness.abs() < f64::EPSILON);
        assert!(stats.average_probability.abs() < f64::EPSILON);
    }

    #[test]
    fn incomplete_challenges_do_not_count_toward_insights() {
        let now = Utc::now();
        let started = AppState::default().start_challenge("w", "thought", now);
        let state = started
            .state
            .update_challenge(
                &started.output,
                ChallengePatch {
                    cognitive_distortions: Some(vec![Distortion::Labeling]),
                    ..ChallengePatch::default()
                },
                now,
            )
            .state;
        let stats = state.challenge_stats();
        assert_eq!(stats.total_challenges, 1);
        assert_eq!(stats.completed_challenges, 0);
        assert!(stats.most_common_distortions.is_empty());
    }

    #[test]
    fn top_three_distortions_with_first_seen_tie_break() {
        let state = AppState::default();
        let state = completed_with(
            &state,
            vec![Distortion::Labeling, Distortion::Catastrophizing],
            20,
            2,
        );
        let state = completed_with(
            &state,
            vec![Distortion::MentalFilter, Distortion::Catastrophizing],
            40,
            4,
        );
        let state = completed_with(&state, vec![Distortion::Personalization], 60, 9);

        let stats = state.challenge_stats();
        let top: Vec<_> = stats
            .most_common_distortions
            .iter()
            .map(|d| (d.distortion, d.count))
            .collect();
        assert_eq!(
            top,
            vec![
                (Distortion::Catastrophizing, 2),
                (Distortion::Labeling, 1),
                (Distortion::MentalFilter, 1),
            ]
        );
        assert!((stats.average_probability - 40.0).abs() < f64::EPSILON);
        assert!((stats.average_helpfulness - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn release_rate_guards() {
        assert!(release_rate(0, 0).abs() < f64::EPSILON);
        assert!((release_rate(3, 3) - 100.0).abs() < f64::EPSILON);
        assert!((release_rate(1, 4) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn trend_thresholds() {
        assert_eq!(Trend::from_counts(0, 0), Trend::NoData);
        assert_eq!(Trend::from_counts(4, 10), Trend::Building);
        assert_eq!(Trend::from_counts(5, 10), Trend::MakingProgress);
        assert_eq!(Trend::from_counts(7, 10), Trend::MakingProgress);
        assert_eq!(Trend::from_counts(8, 10), Trend::Great);
    }

    #[test]
    fn empty_worry_stats() {
        let stats = AppState::default().worry_stats();
        assert_eq!(stats.total_worries, 0);
        assert!(stats.release_rate.abs() < f64::EPSILON);
        assert_eq!(stats.top_category, None);
        assert_eq!(stats.top_body_response, None);
        assert_eq!(stats.trend, Trend::NoData);
        assert!(stats.recent.is_empty());
    }

    #[test]
    fn worry_stats_summarize_journal() {
        let start = Utc::now();
        let mut state = AppState::default();
        let inputs = [
            worry("a", Category::Family, &["Jaw tightness"]),
            worry("b", Category::Work, &["Racing heartbeat", "Jaw tightness"]),
            worry("c", Category::Work, &["Racing heartbeat"]),
            worry("d", Category::Family, &[]),
            worry("e", Category::Custom("Garden".into()), &[]),
            worry("f", Category::School, &[]),
        ];
        let mut ids = Vec::new();
        for (offset, input) in (0_i64..).zip(inputs) {
            let update = state.add_worry(input, start + Duration::minutes(offset));
            ids.push(update.output);
            state = update.state;
        }
        for id in &ids[..4] {
            state = state.release_worry(id, start).state;
        }

        let stats = state.worry_stats();
        assert_eq!(stats.total_worries, 6);
        assert_eq!(stats.released_worries, 4);
        assert_eq!(stats.active_worries, 2);
        assert_eq!(stats.top_category, Some(Category::Family));
        assert_eq!(stats.top_body_response.as_deref(), Some("Jaw tightness"));
        assert_eq!(stats.categories_used, 4);
        assert_eq!(stats.trend, Trend::MakingProgress);

        let recent: Vec<_> = stats.recent.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(recent, vec!["f", "e", "d", "c", "b"]);
    }

    #[test]
    fn all_released_is_exactly_one_hundred_percent() {
        let now = Utc::now();
        let mut state = AppState::default();
        for name in ["x", "y", "z"] {
            let update = state.add_worry(worry(name, Category::Other, &[]), now);
            state = update.state.release_worry(&update.output, now).state;
        }
        let stats = state.worry_stats();
        assert!((stats.release_rate - 100.0).abs() < f64::EPSILON);
        assert_eq!(stats.trend, Trend::Great);
    }
}
