//! Canned response generation.

use serde::{Deserialize, Serialize};

use super::classifier::contains_any;
use super::{strategy_for, FollowUpAction, FunnelStage, Personality, RiskLevel};

/// Phrases that count as asking for the purchase link outright.
const LINK_REQUEST_PHRASES: &[&str] = &[
    "link",
    "send me",
    "where can i",
    "how do i buy",
    "price",
    "cost",
];

/// Phrases that flag a message as a compliance risk.
const RISKY_PHRASES: &[&str] = &[
    "guarantee money",
    "get rich",
    "make millions",
    "investment opportunity",
    "crypto",
    "forex",
    "pyramid",
    "mlm",
];

const CURIOUS_LINK: &str = "I love your curiosity! I've prepared something special that answers all your questions in detail. Let me send you exclusive access via DM - you're going to love this! \u{1F4AB}";
const CURIOUS_ANSWER: &str = "Great question! The magic happens when you combine [specific strategy] with [unique approach]. But here's the thing most people miss... What's your biggest challenge with [their interest] right now?";
const CURIOUS_PROBE: &str = "I can tell you're thinking deeply about this! There's a powerful insight I discovered that changed everything. Before I share it, what draws you to [topic]?";

const HESITANT_LINK: &str = "I totally understand wanting to make the right decision. That's exactly why 847+ people have trusted this system and seen real results. I've prepared a detailed breakdown with testimonials and guarantees - let me send it to your DM so you can see everything clearly.";
const HESITANT_PROBE: &str = "I completely get your hesitation - it's smart to be thoughtful. Here's what's different: we have verified results from real students, a complete satisfaction guarantee, and a proven step-by-step system. What specific concerns can I address for you?";

const QUICK_TEMPERED_LINK: &str = "Got it. Bottom line: proven system, real results, 847+ success stories. Link coming to your DM now. 2 minutes to review.";
const QUICK_TEMPERED_PROBE: &str = "Understood. Quick version: [Problem solved] \u{2192} [Specific results] \u{2192} [Timeframe]. No fluff. Want proof?";

const SKEPTICAL_LINK: &str = "I appreciate your due diligence - that's smart. I've compiled verified testimonials, case studies with real numbers, and our complete methodology for you. Let me send this detailed proof package to your DM so you can review everything.";
const SKEPTICAL_PROBE: &str = "Healthy skepticism is good - there's a lot of noise out there. Here's the transparency you deserve: verifiable results from 847+ students, concrete metrics, and our exact process. What specific evidence would help you feel confident?";

const HIGHLY_ENGAGED_URGENT: &str = "Yes! I absolutely love your energy \u{1F525} You're clearly ready for this. I'm sending you exclusive early access right now via DM. Just a heads up - only 12 spots left at this investment level, and they're filling fast. Check your messages!";

/// A reply ready to post, plus the labels that explain it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedResponse {
    /// Reply text.
    pub text: String,
    /// Approach label of the strategy used.
    pub strategy: String,
    /// Persuasion trigger tags of the strategy used.
    pub triggers: Vec<String>,
    /// Link delivery instruction, if the reply promises a link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_action: Option<FollowUpAction>,
    /// Compliance risk of the inbound message.
    pub risk_level: RiskLevel,
}

/// Decide whether the client should get the purchase link now.
pub fn ready_for_link(message: &str, history: &[String], personality: Personality) -> bool {
    let lower = message.to_lowercase();

    if contains_any(&lower, LINK_REQUEST_PHRASES) {
        return true;
    }

    if personality == Personality::HighlyEngaged && !history.is_empty() {
        return true;
    }

    history.len() >= 2 && lower.contains('?')
}

/// Whether the message mentions a get-rich scheme the account must not engage with.
pub fn contains_risky_content(message: &str) -> bool {
    contains_any(&message.to_lowercase(), RISKY_PHRASES)
}

/// Build the reply for one inbound message.
///
/// `history` holds the client's earlier message texts, oldest first.
/// `_stage` is accepted for callers that track it; no branch reads it yet.
pub fn generate(
    message: &str,
    personality: Personality,
    history: &[String],
    _stage: FunnelStage,
) -> GeneratedResponse {
    let strategy = strategy_for(personality);
    let ready = ready_for_link(message, history, personality);
    let lower = message.to_lowercase();

    let (text, follow_up_action) = match personality {
        Personality::Curious => {
            if ready {
                (CURIOUS_LINK, Some(FollowUpAction::SendLinkDm))
            } else if lower.contains("how") || lower.contains("what") {
                (CURIOUS_ANSWER, None)
            } else {
                (CURIOUS_PROBE, None)
            }
        }
        Personality::Hesitant => link_or_probe(ready, HESITANT_LINK, HESITANT_PROBE),
        Personality::QuickTempered => {
            link_or_probe(ready, QUICK_TEMPERED_LINK, QUICK_TEMPERED_PROBE)
        }
        Personality::Skeptical => link_or_probe(ready, SKEPTICAL_LINK, SKEPTICAL_PROBE),
        Personality::HighlyEngaged => {
            (HIGHLY_ENGAGED_URGENT, Some(FollowUpAction::SendLinkDmUrgent))
        }
    };

    let risk_level = if contains_risky_content(message) {
        RiskLevel::High
    } else {
        RiskLevel::Low
    };

    GeneratedResponse {
        text: text.to_string(),
        strategy: strategy.approach.to_string(),
        triggers: strategy.triggers.iter().map(|t| t.to_string()).collect(),
        follow_up_action,
        risk_level,
    }
}

fn link_or_probe(
    ready: bool,
    link: &'static str,
    probe: &'static str,
) -> (&'static str, Option<FollowUpAction>) {
    if ready {
        (link, Some(FollowUpAction::SendLinkDm))
    } else {
        (probe, None)
    }
}
