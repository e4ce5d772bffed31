//! Outreach volume risk check.
//!
//! Only two windows are checked: one hour and twenty-four hours. Any other
//! window reports safe; this is not a general rate limiter.

use serde::{Deserialize, Serialize};

/// Replies allowed in a one-hour window before the account risks a spam flag.
pub const HOURLY_LIMIT: usize = 30;

/// Replies allowed in a twenty-four-hour window.
pub const DAILY_LIMIT: usize = 200;

/// Outcome of a volume check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// False when a limit was exceeded.
    pub safe: bool,
    /// Operator-facing alert, present only when unsafe.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RiskAssessment {
    fn safe() -> Self {
        Self {
            safe: true,
            message: None,
        }
    }

    fn alert(message: String) -> Self {
        Self {
            safe: false,
            message: Some(message),
        }
    }
}

/// Compare the number of replies sent in a window against the fixed limits.
pub fn assess_risk(count_in_window: usize, window_hours: u32) -> RiskAssessment {
    if window_hours == 1 && count_in_window > HOURLY_LIMIT {
        return RiskAssessment::alert(format!(
            "\u{26A0}\u{FE0F} RISK ALERT: Exceeded hourly limit ({}/{}). Instagram may flag this as spam. Recommend pausing for 1 hour.",
            count_in_window, HOURLY_LIMIT
        ));
    }

    if window_hours == 24 && count_in_window > DAILY_LIMIT {
        return RiskAssessment::alert(format!(
            "\u{26A0}\u{FE0F} RISK ALERT: Exceeded daily limit ({}/{}). High risk of account restriction. Recommend pausing until tomorrow.",
            count_in_window, DAILY_LIMIT
        ));
    }

    RiskAssessment::safe()
}
