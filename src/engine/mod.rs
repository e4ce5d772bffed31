//! Rule engine for sales conversations.
//!
//! Everything in here is pure and synchronous:
//! - [`classify`]: personality category from message text
//! - [`generate`]: canned response, trigger tags and follow-up action
//! - [`score`]: bounded conversion probability
//! - [`assess_risk`]: hourly/daily outreach volume check
//!
//! The strategy and keyword tables are `static` data and never change at runtime.

mod classifier;
mod responder;
mod risk;
mod scoring;
mod strategy;

pub use classifier::*;
pub use responder::*;
pub use risk::*;
pub use scoring::*;
pub use strategy::*;

use serde::{Deserialize, Serialize};

/// Communication style of a client, recomputed on every inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum Personality {
    /// Asks questions, wants to know more.
    Curious,
    /// Unsure, needs reassurance.
    Hesitant,
    /// Short on time or patience.
    QuickTempered,
    /// Doubts legitimacy, wants evidence.
    Skeptical,
    /// Enthusiastic and ready to act.
    HighlyEngaged,
}

impl Personality {
    /// All categories in classification precedence order, default last.
    pub const ALL: [Personality; 5] = [
        Personality::QuickTempered,
        Personality::Skeptical,
        Personality::Hesitant,
        Personality::HighlyEngaged,
        Personality::Curious,
    ];

    /// Wire label of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Personality::Curious => "curious",
            Personality::Hesitant => "hesitant",
            Personality::QuickTempered => "quick-tempered",
            Personality::Skeptical => "skeptical",
            Personality::HighlyEngaged => "highly-engaged",
        }
    }
}

impl std::fmt::Display for Personality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Personality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "curious" => Ok(Personality::Curious),
            "hesitant" => Ok(Personality::Hesitant),
            "quick-tempered" => Ok(Personality::QuickTempered),
            "skeptical" => Ok(Personality::Skeptical),
            "highly-engaged" => Ok(Personality::HighlyEngaged),
            _ => Err(format!("Unknown personality: {}", s)),
        }
    }
}

impl TryFrom<String> for Personality {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Position of a client in the sales funnel. Set externally, never advanced by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum FunnelStage {
    /// First contact.
    #[default]
    Awareness,
    /// Engaging with content.
    Interest,
    /// Weighing the offer.
    Consideration,
    /// Signalled intent to buy.
    Intent,
    /// Bought.
    Purchase,
}

impl FunnelStage {
    /// Wire label of this stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            FunnelStage::Awareness => "awareness",
            FunnelStage::Interest => "interest",
            FunnelStage::Consideration => "consideration",
            FunnelStage::Intent => "intent",
            FunnelStage::Purchase => "purchase",
        }
    }
}

impl std::fmt::Display for FunnelStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FunnelStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "awareness" => Ok(FunnelStage::Awareness),
            "interest" => Ok(FunnelStage::Interest),
            "consideration" => Ok(FunnelStage::Consideration),
            "intent" => Ok(FunnelStage::Intent),
            "purchase" => Ok(FunnelStage::Purchase),
            _ => Err(format!("Unknown funnel stage: {}", s)),
        }
    }
}

impl TryFrom<String> for FunnelStage {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Compliance risk of an inbound message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Nothing flagged.
    #[default]
    Low,
    /// Reserved; no rule currently produces it.
    Medium,
    /// Message mentions a risky money-making scheme.
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// Instruction to the caller about delivering a purchase link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpAction {
    /// Send the purchase link by DM.
    SendLinkDm,
    /// Send the purchase link by DM with scarcity framing.
    SendLinkDmUrgent,
}

impl FollowUpAction {
    /// Whether this action delivers a link. Both current actions do.
    pub fn sends_link(&self) -> bool {
        matches!(
            self,
            FollowUpAction::SendLinkDm | FollowUpAction::SendLinkDmUrgent
        )
    }
}

impl std::fmt::Display for FollowUpAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FollowUpAction::SendLinkDm => write!(f, "send_link_dm"),
            FollowUpAction::SendLinkDmUrgent => write!(f, "send_link_dm_urgent"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_personality_round_trips_through_labels() {
        for p in Personality::ALL {
            assert_eq!(p.as_str().parse::<Personality>().unwrap(), p);
        }
        assert_eq!(
            "Quick-Tempered".parse::<Personality>().unwrap(),
            Personality::QuickTempered
        );
        assert!("angry".parse::<Personality>().is_err());
    }

    #[test]
    fn test_personality_serde_uses_kebab_case() {
        let json = serde_json::to_string(&Personality::HighlyEngaged).unwrap();
        assert_eq!(json, "\"highly-engaged\"");
    }

    #[test]
    fn test_labels_deserialize_case_insensitively() {
        let stage: FunnelStage = serde_json::from_str("\"Intent\"").unwrap();
        assert_eq!(stage, FunnelStage::Intent);
        let p: Personality = serde_json::from_str("\"Highly-Engaged\"").unwrap();
        assert_eq!(p, Personality::HighlyEngaged);

        let err = serde_json::from_str::<FunnelStage>("\"done\"").unwrap_err();
        assert!(err.to_string().contains("Unknown funnel stage"));
    }

    #[test]
    fn test_funnel_stage_ordering() {
        assert!(FunnelStage::Awareness < FunnelStage::Interest);
        assert!(FunnelStage::Intent < FunnelStage::Purchase);
        assert_eq!(FunnelStage::default(), FunnelStage::Awareness);
    }

    #[test]
    fn test_follow_up_action_labels() {
        assert_eq!(FollowUpAction::SendLinkDm.to_string(), "send_link_dm");
        assert_eq!(
            serde_json::to_string(&FollowUpAction::SendLinkDmUrgent).unwrap(),
            "\"send_link_dm_urgent\""
        );
        assert!(FollowUpAction::SendLinkDmUrgent.sends_link());
    }

    #[test]
    fn test_risk_level_default_is_low() {
        assert_eq!(RiskLevel::default(), RiskLevel::Low);
        assert_eq!(RiskLevel::Medium.to_string(), "medium");
    }
}
