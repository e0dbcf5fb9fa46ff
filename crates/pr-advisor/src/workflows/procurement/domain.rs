use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::AnalysisError;
use super::money::{exact_scaled, Money};

/// Whether the purchase request is for a first-time or returning client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientType {
    New,
    Repeat,
}

impl ClientType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Repeat => "Repeat",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "new" => Some(Self::New),
            "repeat" => Some(Self::Repeat),
            _ => None,
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Historical win rate held in basis points so threshold checks are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WinProbability(u16);

impl WinProbability {
    pub const MAX_BASIS_POINTS: u16 = 10_000;

    pub const fn from_basis_points(points: u16) -> Option<Self> {
        if points <= Self::MAX_BASIS_POINTS {
            Some(Self(points))
        } else {
            None
        }
    }

    /// Accepts a fraction in `[0, 1]` with at most four decimal places.
    /// Finer values are refused rather than rounded across a threshold.
    pub fn from_fraction(value: f64) -> Option<Self> {
        if !(0.0..=1.0).contains(&value) {
            return None;
        }
        exact_scaled(value, f64::from(Self::MAX_BASIS_POINTS))
            .and_then(|points| u16::try_from(points).ok())
            .map(Self)
    }

    pub const fn basis_points(self) -> u16 {
        self.0
    }

    pub fn as_fraction(self) -> f64 {
        f64::from(self.0) / f64::from(Self::MAX_BASIS_POINTS)
    }

    /// Whole-percent label, rounded half up (7250 bp -> `73%`).
    pub fn percent_label(self) -> String {
        format!("{}%", (u32::from(self.0) + 50) / 100)
    }
}

impl Serialize for WinProbability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_fraction())
    }
}

impl<'de> Deserialize<'de> for WinProbability {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        WinProbability::from_fraction(raw).ok_or_else(|| {
            serde::de::Error::custom(format!("win probability {raw} is outside [0, 1]"))
        })
    }
}

/// Raw purchase-request payload as posted by the form. Nothing here is trusted yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrSubmission {
    pub project_name: Option<String>,
    pub client_type: Option<String>,
    pub project_size: Option<f64>,
    pub project_budget: Option<f64>,
    pub spent_till_date: Option<f64>,
    pub new_pr_value: Option<f64>,
    pub historical_win_probability: Option<f64>,
}

/// Validated purchase request. Only constructed through [`PrSubmission::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrInput {
    pub project_name: String,
    pub client_type: ClientType,
    pub project_size: Money,
    pub project_budget: Money,
    pub spent_till_date: Money,
    pub new_pr_value: Money,
    pub historical_win_probability: WinProbability,
}

impl PrSubmission {
    /// Checks every field in declaration order and stops at the first problem.
    pub fn validate(self) -> Result<PrInput, AnalysisError> {
        let project_name = self
            .project_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AnalysisError::invalid("project_name", "is required"))?;

        let client_type = match self.client_type.as_deref() {
            None => return Err(AnalysisError::invalid("client_type", "is required")),
            Some(raw) => ClientType::parse(raw).ok_or_else(|| {
                AnalysisError::invalid("client_type", format!("must be New or Repeat, got '{raw}'"))
            })?,
        };

        let project_size = amount("project_size", self.project_size)?;
        if !project_size.is_positive() {
            return Err(AnalysisError::invalid("project_size", "must be greater than zero"));
        }

        let project_budget = amount("project_budget", self.project_budget)?;
        if !project_budget.is_positive() {
            return Err(AnalysisError::invalid("project_budget", "must be greater than zero"));
        }

        let spent_till_date = amount("spent_till_date", self.spent_till_date)?;
        if spent_till_date.is_negative() {
            return Err(AnalysisError::invalid("spent_till_date", "must not be negative"));
        }

        let new_pr_value = amount("new_pr_value", self.new_pr_value)?;
        if new_pr_value.is_negative() {
            return Err(AnalysisError::invalid("new_pr_value", "must not be negative"));
        }

        let historical_win_probability = match self.historical_win_probability {
            None => {
                return Err(AnalysisError::invalid(
                    "historical_win_probability",
                    "is required",
                ))
            }
            Some(raw) if !(0.0..=1.0).contains(&raw) => {
                return Err(AnalysisError::invalid(
                    "historical_win_probability",
                    format!("must be between 0 and 1, got {raw}"),
                ))
            }
            Some(raw) => WinProbability::from_fraction(raw).ok_or_else(|| {
                AnalysisError::invalid(
                    "historical_win_probability",
                    format!("must have at most four decimal places, got {raw}"),
                )
            })?,
        };

        Ok(PrInput {
            project_name,
            client_type,
            project_size,
            project_budget,
            spent_till_date,
            new_pr_value,
            historical_win_probability,
        })
    }
}

fn amount(field: &'static str, value: Option<f64>) -> Result<Money, AnalysisError> {
    let raw = value.ok_or_else(|| AnalysisError::invalid(field, "is required"))?;
    Money::from_decimal(raw).ok_or_else(|| {
        AnalysisError::invalid(
            field,
            format!("must be an amount with at most two decimal places, got {raw}"),
        )
    })
}
