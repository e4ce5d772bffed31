//! Personality classification by ordered keyword rules.

use super::Personality;

/// Messages shorter than this are treated as curt.
pub const SHORT_MESSAGE_CHARS: usize = 30;

/// Messages longer than this from a returning client count as engaged.
pub const LONG_MESSAGE_CHARS: usize = 50;

/// Prior interactions needed before long messages count as engaged.
pub const ENGAGED_HISTORY_THRESHOLD: usize = 5;

const QUICK_TEMPERED_KEYWORDS: &[&str] = &["waste", "busy", "no time", "annoying"];

const SKEPTICAL_KEYWORDS: &[&str] = &["scam", "proof", "trust", "legit", "real", "fake"];

const HESITANT_KEYWORDS: &[&str] = &[
    "not sure",
    "maybe",
    "hesitant",
    "thinking about",
    "concern",
];

const HIGHLY_ENGAGED_KEYWORDS: &[&str] = &[
    "yes",
    "link",
    "sign up",
    "interested",
    "ready",
    "!!",
    "\u{1F525}",
];

/// Classify a message into a personality category.
///
/// Rules run in fixed precedence and the first match wins:
/// quick-tempered, skeptical, hesitant, highly-engaged, then curious.
/// A short message is quick-tempered even if it also says "yes".
pub fn classify(content: &str, prior_interactions: usize) -> Personality {
    let lower = content.to_lowercase();
    let length = content.chars().count();

    if contains_any(&lower, QUICK_TEMPERED_KEYWORDS) || length < SHORT_MESSAGE_CHARS {
        return Personality::QuickTempered;
    }

    if contains_any(&lower, SKEPTICAL_KEYWORDS) {
        return Personality::Skeptical;
    }

    if contains_any(&lower, HESITANT_KEYWORDS) {
        return Personality::Hesitant;
    }

    if contains_any(&lower, HIGHLY_ENGAGED_KEYWORDS)
        || (prior_interactions > ENGAGED_HISTORY_THRESHOLD && length > LONG_MESSAGE_CHARS)
    {
        return Personality::HighlyEngaged;
    }

    Personality::Curious
}

/// Case-sensitive substring test against a keyword list. Callers lowercase first.
pub(crate) fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| haystack.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_is_quick_tempered() {
        assert_eq!(classify("yes!! send the link", 0), Personality::QuickTempered);
        assert_eq!(classify("is this a scam?", 10), Personality::QuickTempered);
        assert_eq!(classify("", 0), Personality::QuickTempered);
    }

    #[test]
    fn test_impatience_keywords_win_on_long_messages() {
        let msg = "Honestly I am way too busy to read all of this, just tell me the price";
        assert_eq!(classify(msg, 0), Personality::QuickTempered);
    }

    #[test]
    fn test_skeptical_precedes_hesitant() {
        let msg = "I'm not sure, this honestly looks like a scam to me";
        assert_eq!(classify(msg, 0), Personality::Skeptical);
    }

    #[test]
    fn test_hesitant_keywords() {
        let msg = "I'm not sure if this would work for someone like me";
        assert_eq!(classify(msg, 0), Personality::Hesitant);
        let msg = "Maybe later, I have a few questions about the course first";
        assert_eq!(classify(msg, 0), Personality::Hesitant);
    }

    #[test]
    fn test_engaged_keywords_case_insensitive() {
        let msg = "YES I want to sign up for this program today please";
        assert_eq!(classify(msg, 0), Personality::HighlyEngaged);
        let msg = "This looks amazing \u{1F525} tell me everything about it";
        assert_eq!(classify(msg, 0), Personality::HighlyEngaged);
    }

    #[test]
    fn test_long_message_from_returning_client_is_engaged() {
        let msg = "Tell me about the modules and how the coaching calls are scheduled each week";
        assert!(msg.chars().count() > LONG_MESSAGE_CHARS);
        assert_eq!(classify(msg, 6), Personality::HighlyEngaged);
        assert_eq!(classify(msg, 5), Personality::Curious);
    }

    #[test]
    fn test_defaults_to_curious() {
        let msg = "What does the course cover in the first couple of weeks?";
        assert_eq!(classify(msg, 0), Personality::Curious);
    }

    #[test]
    fn test_real_matches_inside_words() {
        // substring match, so "really" reads as skeptical
        let msg = "I really like the content you post every morning";
        assert_eq!(classify(msg, 0), Personality::Skeptical);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 29 multi-byte characters stays under the short threshold
        let msg: String = std::iter::repeat('é').take(29).collect();
        assert!(msg.len() > SHORT_MESSAGE_CHARS);
        assert_eq!(classify(&msg, 0), Personality::QuickTempered);
    }
}
