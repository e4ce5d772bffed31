//! Conversion probability scoring.

use super::{FunnelStage, Personality};

/// Upper bound on any conversion probability.
pub const MAX_CONVERSION_PROBABILITY: f64 = 0.95;

/// Multiplier applied when a stage label is not recognised.
pub const UNKNOWN_STAGE_MULTIPLIER: f64 = 0.5;

impl Personality {
    /// Baseline likelihood that this personality converts.
    pub fn base_score(&self) -> f64 {
        match self {
            Personality::HighlyEngaged => 0.85,
            Personality::Curious => 0.65,
            Personality::Hesitant => 0.45,
            Personality::Skeptical => 0.35,
            Personality::QuickTempered => 0.40,
        }
    }
}

impl FunnelStage {
    /// How far along the funnel weighs the personality baseline.
    pub fn multiplier(&self) -> f64 {
        match self {
            FunnelStage::Awareness => 0.3,
            FunnelStage::Interest => 0.6,
            FunnelStage::Consideration => 0.75,
            FunnelStage::Intent => 0.9,
            FunnelStage::Purchase => 1.0,
        }
    }
}

/// Score a client's conversion probability, capped at [`MAX_CONVERSION_PROBABILITY`].
pub fn score(
    personality: Personality,
    stage: FunnelStage,
    total_interactions: u32,
    link_clicks: u32,
) -> f64 {
    score_with_multiplier(
        personality,
        stage.multiplier(),
        total_interactions,
        link_clicks,
    )
}

/// Same as [`score`] for a free-form stage label; unknown labels weigh 0.5.
pub fn score_for_stage_label(
    personality: Personality,
    stage: &str,
    total_interactions: u32,
    link_clicks: u32,
) -> f64 {
    let multiplier = stage
        .parse::<FunnelStage>()
        .map(|s| s.multiplier())
        .unwrap_or(UNKNOWN_STAGE_MULTIPLIER);
    score_with_multiplier(personality, multiplier, total_interactions, link_clicks)
}

fn score_with_multiplier(
    personality: Personality,
    multiplier: f64,
    total_interactions: u32,
    link_clicks: u32,
) -> f64 {
    let mut value = personality.base_score() * multiplier;

    if total_interactions > 5 {
        value += 0.1;
    }
    if total_interactions > 10 {
        value += 0.1;
    }

    if link_clicks > 0 {
        value += 0.15;
    }
    if link_clicks > 2 {
        value += 0.1;
    }

    value.min(MAX_CONVERSION_PROBABILITY)
}
