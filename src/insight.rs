//! Threshold classification of aggregated scores into qualitative
//! labels. Pure functions over [`crate::score`] outputs; thresholds are
//! inclusive lower bounds evaluated highest-first.
//!
//! These labels are screening signals reproduced from heuristic
//! formulas with no cited clinical basis. They are not a diagnosis.

use std::fmt;

/// Qualitative band for a 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    #[strum(serialize = "Needs Improvement")]
    NeedsImprovement,
}

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            ScoreBand::Excellent
        } else if score >= 60.0 {
            ScoreBand::Good
        } else if score >= 40.0 {
            ScoreBand::Fair
        } else {
            ScoreBand::NeedsImprovement
        }
    }
}

/// Screening risk tier derived from the number of triggered concern
/// conditions in a game's analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum_macros::Display)]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

impl RiskTier {
    /// Raise the tier to at least `floor`, never lower it.
    pub fn at_least(self, floor: RiskTier) -> Self {
        self.max(floor)
    }
}

impl std::str::FromStr for RiskTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(RiskTier::Low),
            "Moderate" => Ok(RiskTier::Moderate),
            "High" => Ok(RiskTier::High),
            other => Err(format!("unknown risk tier: {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Strength,
    Concern,
    Note,
}

/// One human-readable qualitative finding.
#[derive(Debug, Clone, PartialEq)]
pub struct Insight {
    pub severity: Severity,
    pub text: String,
}

impl Insight {
    pub fn strength(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Strength,
            text: text.into(),
        }
    }

    pub fn concern(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Concern,
            text: text.into(),
        }
    }

    pub fn note(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Note,
            text: text.into(),
        }
    }
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.severity {
            Severity::Strength => "+",
            Severity::Concern => "!",
            Severity::Note => "=",
        };
        write!(f, "[{marker}] {}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_thresholds_are_inclusive_lower_bounds() {
        assert_eq!(ScoreBand::from_score(100.0), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(80.0), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(79.9), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(60.0), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(59.9), ScoreBand::Fair);
        assert_eq!(ScoreBand::from_score(40.0), ScoreBand::Fair);
        assert_eq!(ScoreBand::from_score(39.9), ScoreBand::NeedsImprovement);
        assert_eq!(ScoreBand::from_score(0.0), ScoreBand::NeedsImprovement);
    }

    #[test]
    fn test_band_display() {
        assert_eq!(ScoreBand::Excellent.to_string(), "Excellent");
        assert_eq!(
            ScoreBand::NeedsImprovement.to_string(),
            "Needs Improvement"
        );
    }

    #[test]
    fn test_band_classification_is_idempotent() {
        for score in [0.0, 39.9, 40.0, 55.0, 60.0, 79.9, 80.0, 100.0] {
            assert_eq!(ScoreBand::from_score(score), ScoreBand::from_score(score));
        }
    }

    #[test]
    fn test_risk_tier_ordering() {
        assert!(RiskTier::Low < RiskTier::Moderate);
        assert!(RiskTier::Moderate < RiskTier::High);
    }

    #[test]
    fn test_risk_tier_at_least_never_lowers() {
        assert_eq!(RiskTier::Low.at_least(RiskTier::Moderate), RiskTier::Moderate);
        assert_eq!(RiskTier::High.at_least(RiskTier::Moderate), RiskTier::High);
        assert_eq!(RiskTier::Moderate.at_least(RiskTier::Low), RiskTier::Moderate);
    }

    #[test]
    fn test_risk_tier_roundtrips_through_display() {
        for tier in [RiskTier::Low, RiskTier::Moderate, RiskTier::High] {
            assert_eq!(tier.to_string().parse::<RiskTier>(), Ok(tier));
        }
        assert!("bogus".parse::<RiskTier>().is_err());
    }

    #[test]
    fn test_insight_display_markers() {
        assert_eq!(Insight::strength("good").to_string(), "[+] good");
        assert_eq!(Insight::concern("slow").to_string(), "[!] slow");
        assert_eq!(Insight::note("typical").to_string(), "[=] typical");
    }
}
