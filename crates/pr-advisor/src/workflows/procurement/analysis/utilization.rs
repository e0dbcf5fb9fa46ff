use super::super::error::AnalysisError;
use super::super::money::Money;

/// Committed amount over budget, kept as an exact ratio of minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utilization {
    committed: i128,
    budget: i128,
}

impl Utilization {
    /// Fails when `budget` is not strictly positive.
    pub fn of(committed: Money, budget: Money) -> Result<Self, AnalysisError> {
        if !budget.is_positive() {
            return Err(AnalysisError::invalid(
                "project_budget",
                "must be greater than zero",
            ));
        }
        Ok(Self {
            committed: i128::from(committed.minor_units()),
            budget: i128::from(budget.minor_units()),
        })
    }

    /// `committed / budget >= percent / 100`, evaluated without division.
    pub fn at_least_percent(self, percent: i64) -> bool {
        self.committed * 100 >= self.budget * i128::from(percent)
    }

    pub fn below_percent(self, percent: i64) -> bool {
        !self.at_least_percent(percent)
    }

    /// Percentage rounded half away from zero to one decimal. Not clamped.
    pub fn percent(self) -> f64 {
        let tenths = div_round(self.committed * 1000, self.budget);
        tenths as f64 / 10.0
    }
}

fn div_round(numerator: i128, denominator: i128) -> i128 {
    if numerator >= 0 {
        (2 * numerator + denominator) / (2 * denominator)
    } else {
        -((-2 * numerator + denominator) / (2 * denominator))
    }
}

/// Calculator output: what is left and how much of the budget is committed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtilizationSnapshot {
    /// Negative when the PR overruns the budget.
    pub remaining_budget: Money,
    pub before: Utilization,
    pub after: Utilization,
}

impl UtilizationSnapshot {
    pub fn before_percent(&self) -> f64 {
        self.before.percent()
    }

    pub fn after_percent(&self) -> f64 {
        self.after.percent()
    }
}

pub fn calculate(
    project_budget: Money,
    spent_till_date: Money,
    new_pr_value: Money,
) -> Result<UtilizationSnapshot, AnalysisError> {
    let before = Utilization::of(spent_till_date, project_budget)?;

    let committed = spent_till_date
        .checked_add(new_pr_value)
        .ok_or(AnalysisError::Internal("committed amount overflowed"))?;
    let after = Utilization::of(committed, project_budget)?;

    let remaining_budget = project_budget
        .checked_sub(committed)
        .ok_or(AnalysisError::Internal("remaining budget overflowed"))?;

    Ok(UtilizationSnapshot {
        remaining_budget,
        before,
        after,
    })
}
