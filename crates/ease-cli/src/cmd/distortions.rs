use crate::output::{CliError, OutputMode, fail, pretty_rule, render_mode};
use anyhow::Result;
use clap::Args;
use ease_core::error::ErrorCode;
use ease_core::model::{Distortion, DistortionInfo};
use serde::Serialize;

#[derive(Args, Debug)]
pub struct DistortionsArgs {
    /// Show a single pattern, e.g. `catastrophizing`.
    pub tag: Option<String>,
}

#[derive(Debug, Serialize)]
struct Card {
    tag: Distortion,
    #[serde(flatten)]
    info: &'static DistortionInfo,
}

impl Card {
    const fn new(tag: Distortion) -> Self {
        Self {
            tag,
            info: tag.info(),
        }
    }
}

/// Execute `ease distortions`: the reference cards for every thinking
/// pattern, or just one.
pub fn run_distortions(args: &DistortionsArgs, output: OutputMode) -> Result<()> {
    let cards: Vec<Card> = match args.tag.as_deref() {
        Some(raw) => {
            let tag = raw.parse::<Distortion>().map_err(|err| {
                fail(
                    output,
                    &CliError::coded(ErrorCode::InvalidEnumValue, err.to_string()),
                )
            })?;
            vec![Card::new(tag)]
        }
        None => Distortion::ALL.into_iter().map(Card::new).collect(),
    };

    render_mode(
        output,
        &cards,
        |cards, w| {
            for card in cards {
                writeln!(w, "{}\t{}\t{}", card.tag, card.info.name, card.info.description)?;
            }
            Ok(())
        },
        |cards, w| {
            for (i, card) in cards.iter().enumerate() {
                if i > 0 {
                    writeln!(w)?;
                }
                writeln!(w, "{} ({})", card.info.name, card.tag)?;
                pretty_rule(w)?;
                writeln!(w, "{}", card.info.description)?;
                writeln!(w, "  e.g. {}", card.info.example)?;
                writeln!(w, "  try: {}", card.info.reframe)?;
            }
            Ok(())
        },
    )
}
