use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Fixed reason catalog captured on cancellation, kept as a closed enum so
/// analytics sees a stable vocabulary instead of free text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CancellationReason {
    NotUsingPlatform,
    TooExpensive,
    FoundAlternative,
    TechnicalIssue,
    TemporaryPause,
    ClosingBusiness,
    PaymentIssue,
    Other,
}

impl CancellationReason {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "not-using-platform" => Some(CancellationReason::NotUsingPlatform),
            "too-expensive" => Some(CancellationReason::TooExpensive),
            "found-alternative" => Some(CancellationReason::FoundAlternative),
            "technical-issue" => Some(CancellationReason::TechnicalIssue),
            "temporary-pause" => Some(CancellationReason::TemporaryPause),
            "closing-business" => Some(CancellationReason::ClosingBusiness),
            "payment-issue" => Some(CancellationReason::PaymentIssue),
            "other" => Some(CancellationReason::Other),
            _ => None,
        }
    }

    /// Catalog description stored for every code except `other`, which keeps
    /// the professional's own words instead.
    pub fn description(&self) -> &'static str {
        match self {
            CancellationReason::NotUsingPlatform => "Not using the platform",
            CancellationReason::TooExpensive => "Too expensive",
            CancellationReason::FoundAlternative => "Found an alternative",
            CancellationReason::TechnicalIssue => "Technical issues",
            CancellationReason::TemporaryPause => "Temporary pause",
            CancellationReason::ClosingBusiness => "Closing the business",
            CancellationReason::PaymentIssue => "Payment issues",
            CancellationReason::Other => "Other",
        }
    }
}

impl Display for CancellationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            CancellationReason::NotUsingPlatform => "not-using-platform",
            CancellationReason::TooExpensive => "too-expensive",
            CancellationReason::FoundAlternative => "found-alternative",
            CancellationReason::TechnicalIssue => "technical-issue",
            CancellationReason::TemporaryPause => "temporary-pause",
            CancellationReason::ClosingBusiness => "closing-business",
            CancellationReason::PaymentIssue => "payment-issue",
            CancellationReason::Other => "other",
        };
        write!(f, "{}", code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_display() {
        let codes = [
            CancellationReason::NotUsingPlatform,
            CancellationReason::TooExpensive,
            CancellationReason::FoundAlternative,
            CancellationReason::TechnicalIssue,
            CancellationReason::TemporaryPause,
            CancellationReason::ClosingBusiness,
            CancellationReason::PaymentIssue,
            CancellationReason::Other,
        ];

        for code in codes {
            assert_eq!(CancellationReason::from_str(&code.to_string()), Some(code));
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert_eq!(CancellationReason::from_str("rage-quit"), None);
    }
}
