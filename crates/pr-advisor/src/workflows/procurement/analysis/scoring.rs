use std::fmt;

use serde::{Deserialize, Serialize};

use super::super::domain::{ClientType, PrInput};
use super::super::error::AnalysisError;
use super::utilization::Utilization;

pub const MAX_RISK_SCORE: u8 = 90;

/// Ordinal risk tier derived from the summed score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Inclusive lower bounds, highest tier first.
    pub const fn from_score(score: u8) -> Self {
        if score >= 70 {
            Self::Critical
        } else if score >= 50 {
            Self::High
        } else if score >= 30 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBucket {
    Utilization,
    ClientNovelty,
    WinConfidence,
    PrSizeRatio,
}

/// Points contributed by one bucket, kept for audit trails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub bucket: ScoreBucket,
    pub points: u8,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskAssessment {
    pub score: u8,
    pub level: RiskLevel,
    pub components: Vec<ScoreComponent>,
}

/// Sums the four buckets. Each bucket reads the raw input only.
pub fn assess(input: &PrInput) -> Result<RiskAssessment, AnalysisError> {
    if !input.project_size.is_positive() {
        return Err(AnalysisError::invalid(
            "project_size",
            "must be greater than zero",
        ));
    }

    let committed = input
        .spent_till_date
        .checked_add(input.new_pr_value)
        .ok_or(AnalysisError::Internal("committed amount overflowed"))?;
    let utilization = Utilization::of(committed, input.project_budget)?;

    let components = vec![
        utilization_bucket(utilization),
        client_bucket(input.client_type),
        win_confidence_bucket(input),
        pr_ratio_bucket(input),
    ];

    let score: u8 = components.iter().map(|component| component.points).sum();
    debug_assert!(score <= MAX_RISK_SCORE);

    Ok(RiskAssessment {
        score,
        level: RiskLevel::from_score(score),
        components,
    })
}

fn utilization_bucket(utilization: Utilization) -> ScoreComponent {
    let (points, band) = if utilization.at_least_percent(100) {
        (40, "at or over budget")
    } else if utilization.at_least_percent(85) {
        (30, "at least 85% of budget")
    } else if utilization.at_least_percent(70) {
        (20, "at least 70% of budget")
    } else {
        (10, "below 70% of budget")
    };

    ScoreComponent {
        bucket: ScoreBucket::Utilization,
        points,
        note: format!(
            "post-PR utilization {:.1}% is {band}",
            utilization.percent()
        ),
    }
}

fn client_bucket(client_type: ClientType) -> ScoreComponent {
    let (points, note) = match client_type {
        ClientType::New => (15, "new client with no delivery history"),
        ClientType::Repeat => (0, "repeat client"),
    };

    ScoreComponent {
        bucket: ScoreBucket::ClientNovelty,
        points,
        note: note.to_string(),
    }
}

fn win_confidence_bucket(input: &PrInput) -> ScoreComponent {
    let points = match input.historical_win_probability.basis_points() {
        bp if bp < 4_000 => 25,
        bp if bp < 6_000 => 15,
        bp if bp < 7_500 => 5,
        _ => 0,
    };

    ScoreComponent {
        bucket: ScoreBucket::WinConfidence,
        points,
        note: format!(
            "historical win probability {}",
            input.historical_win_probability.percent_label()
        ),
    }
}

fn pr_ratio_bucket(input: &PrInput) -> ScoreComponent {
    let pr = i128::from(input.new_pr_value.minor_units());
    let size = i128::from(input.project_size.minor_units());

    // Strictly greater: a PR of exactly 30% lands in the 5 point band.
    let points = if pr * 100 > size * 30 {
        10
    } else if pr * 100 > size * 15 {
        5
    } else {
        0
    };

    ScoreComponent {
        bucket: ScoreBucket::PrSizeRatio,
        points,
        note: format!(
            "PR of {} against project size {}",
            input.new_pr_value, input.project_size
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::procurement::domain::WinProbability;
    use crate::workflows::procurement::money::Money;

    fn input(spent: i64, pr: i64, client_type: ClientType, win_bp: u16) -> PrInput {
        PrInput {
            project_name: "Scoring".to_string(),
            client_type,
            project_size: Money::from_major(1_000),
            project_budget: Money::from_major(100),
            spent_till_date: Money::from_major(spent),
            new_pr_value: Money::from_major(pr),
            historical_win_probability: WinProbability::from_basis_points(win_bp)
                .expect("valid probability"),
        }
    }

    fn bucket_points(assessment: &RiskAssessment, bucket: ScoreBucket) -> u8 {
        assessment
            .components
            .iter()
            .find(|component| component.bucket == bucket)
            .map(|component| component.points)
            .expect("bucket present")
    }

    #[test]
    fn utilization_boundaries_belong_to_higher_bucket() {
        let cases = [(85, 0, 30), (84, 0, 20), (70, 0, 20), (69, 0, 10), (100, 0, 40), (60, 40, 40)];
        for (spent, pr, expected) in cases {
            let assessment =
                assess(&input(spent, pr, ClientType::Repeat, 9_000)).expect("valid input");
            assert_eq!(
                bucket_points(&assessment, ScoreBucket::Utilization),
                expected,
                "spent {spent} + pr {pr}"
            );
        }
    }

    #[test]
    fn win_confidence_boundaries_are_inclusive_lower_bounds() {
        let cases = [(3_999, 25), (4_000, 15), (5_999, 15), (6_000, 5), (7_499, 5), (7_500, 0)];
        for (bp, expected) in cases {
            let assessment = assess(&input(10, 0, ClientType::Repeat, bp)).expect("valid input");
            assert_eq!(
                bucket_points(&assessment, ScoreBucket::WinConfidence),
                expected,
                "{bp} basis points"
            );
        }
    }

    #[test]
    fn ratio_threshold_itself_stays_in_lower_band() {
        // project size 1000: PR of 300 is exactly 30%, 150 exactly 15%.
        let exact_thirty = assess(&input(0, 300, ClientType::Repeat, 9_000)).expect("valid");
        assert_eq!(bucket_points(&exact_thirty, ScoreBucket::PrSizeRatio), 5);

        let exact_fifteen = assess(&input(0, 150, ClientType::Repeat, 9_000)).expect("valid");
        assert_eq!(bucket_points(&exact_fifteen, ScoreBucket::PrSizeRatio), 0);

        let mut above = input(0, 0, ClientType::Repeat, 9_000);
        above.new_pr_value = Money::from_minor(30_001);
        let above = assess(&above).expect("valid");
        assert_eq!(bucket_points(&above, ScoreBucket::PrSizeRatio), 10);
    }

    #[test]
    fn maximum_score_is_ninety_and_critical() {
        let assessment = assess(&input(90, 400, ClientType::New, 1_000)).expect("valid input");
        assert_eq!(assessment.score, MAX_RISK_SCORE);
        assert_eq!(assessment.level, RiskLevel::Critical);
    }

    #[test]
    fn minimum_score_is_ten_and_low() {
        let assessment = assess(&input(0, 0, ClientType::Repeat, 10_000)).expect("valid input");
        assert_eq!(assessment.score, 10);
        assert_eq!(assessment.level, RiskLevel::Low);
    }

    #[test]
    fn tier_mapping_is_monotonic() {
        let mut previous = RiskLevel::Low;
        for score in 0..=MAX_RISK_SCORE {
            let level = RiskLevel::from_score(score);
            assert!(level >= previous, "score {score} dropped a tier");
            previous = level;
        }
        assert_eq!(RiskLevel::from_score(29), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(30), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(50), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(70), RiskLevel::Critical);
    }

    #[test]
    fn zero_project_size_is_invalid_input() {
        let mut bad = input(10, 10, ClientType::New, 5_000);
        bad.project_size = Money::ZERO;
        let err = assess(&bad).expect_err("undefined ratio");
        assert!(matches!(
            err,
            AnalysisError::InvalidInput {
                field: "project_size",
                ..
            }
        ));
    }
}
