//! Static response strategies, one per personality.

use serde::Serialize;

use super::Personality;

/// How to talk to one personality category.
///
/// Used for labelling and display; example lines are never picked at random.
#[derive(Debug, Clone, Serialize)]
pub struct Strategy {
    /// Category this strategy targets.
    pub personality: Personality,
    /// Persuasion techniques attached to responses.
    pub triggers: &'static [&'static str],
    /// Voice to write in.
    pub tone: &'static str,
    /// What the responder tries to achieve.
    pub approach: &'static str,
    /// Sample openers for a human operator.
    pub examples: &'static [&'static str],
}

static CURIOUS: Strategy = Strategy {
    personality: Personality::Curious,
    triggers: &["FOMO", "Curiosity Gap", "Exclusive Info"],
    tone: "Engaging, question-based, spark interest",
    approach: "Ask open-ended questions, tease valuable information, create mystery",
    examples: &[
        "That's a great question! Before I answer, what's your biggest challenge with [topic]?",
        "I love your curiosity! There's something powerful I discovered that changed everything - want to know what it is?",
        "Interesting you ask that... most people don't realize the real secret is [tease]. Let me explain more in DM!",
    ],
};

static HESITANT: Strategy = Strategy {
    personality: Personality::Hesitant,
    triggers: &["Social Proof", "Authority", "Risk Reversal"],
    tone: "Reassuring, data-driven, testimonial-heavy",
    approach: "Provide concrete proof, share success stories, address concerns directly",
    examples: &[
        "I totally understand your hesitation. That's why 847+ students have already seen results - here's what they say...",
        "It's smart to be thoughtful. Let me share exactly what you get and how others in your position transformed their results.",
        "I get it - investing in yourself is a big decision. What specific concerns can I address for you?",
    ],
};

static QUICK_TEMPERED: Strategy = Strategy {
    personality: Personality::QuickTempered,
    triggers: &["Respect", "Brevity", "Value"],
    tone: "Direct, concise, respectful",
    approach: "Acknowledge frustration, get to the point quickly, show value immediately",
    examples: &[
        "I hear you. Bottom line: [specific benefit] in [timeframe]. No fluff. Want the details?",
        "Fair point. Here's the deal - [concrete value proposition]. That's it. Interested?",
        "Understood. Quick version: [problem] \u{2192} [solution] \u{2192} [result]. Should I send more info?",
    ],
};

static SKEPTICAL: Strategy = Strategy {
    personality: Personality::Skeptical,
    triggers: &["Transparency", "Evidence", "Logic"],
    tone: "Honest, detailed, fact-based",
    approach: "Welcome skepticism, provide verifiable evidence, be transparent about limitations",
    examples: &[
        "I appreciate the healthy skepticism. Here are the actual numbers and verifiable results...",
        "Great question - there's a lot of noise out there. Let me show you the proof: [specific evidence]",
        "I'd be skeptical too. That's why I can share case studies, testimonials, and our exact methodology. What would convince you?",
    ],
};

static HIGHLY_ENGAGED: Strategy = Strategy {
    personality: Personality::HighlyEngaged,
    triggers: &["Urgency", "Exclusivity", "FOMO"],
    tone: "Energetic, action-oriented, urgent",
    approach: "Match their energy, create urgency, fast-track to conversion",
    examples: &[
        "Yes! I love your energy \u{1F525} Let's get you started right now - only 12 spots left at this price!",
        "Perfect timing! You're clearly ready for this. Sending you exclusive early access right now!",
        "Amazing! I can tell you're serious about this. Let me get you the special link before these spots fill up!",
    ],
};

/// Look up the strategy for a personality.
pub fn strategy_for(personality: Personality) -> &'static Strategy {
    match personality {
        Personality::Curious => &CURIOUS,
        Personality::Hesitant => &HESITANT,
        Personality::QuickTempered => &QUICK_TEMPERED,
        Personality::Skeptical => &SKEPTICAL,
        Personality::HighlyEngaged => &HIGHLY_ENGAGED,
    }
}

/// Every strategy, in classification precedence order.
pub fn all_strategies() -> Vec<&'static Strategy> {
    Personality::ALL.iter().map(|p| strategy_for(*p)).collect()
}
