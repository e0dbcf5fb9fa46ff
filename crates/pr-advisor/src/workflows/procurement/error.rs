/// Failures raised while turning a submission into an analysis.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("invalid input: {field} {problem}")]
    InvalidInput {
        field: &'static str,
        problem: String,
    },
    #[error("internal analysis fault: {0}")]
    Internal(&'static str),
}

impl AnalysisError {
    pub(crate) fn invalid(field: &'static str, problem: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            problem: problem.into(),
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}
