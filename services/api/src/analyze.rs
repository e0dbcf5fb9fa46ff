use chrono::Utc;
use clap::Args;
use pr_advisor::error::AppError;
use pr_advisor::workflows::procurement::{assemble, AnalysisResult, AnalysisView, PrSubmission};

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// Project the purchase request belongs to
    #[arg(long)]
    pub(crate) project_name: String,
    /// Client relationship: New or Repeat
    #[arg(long)]
    pub(crate) client_type: String,
    /// Total contract value in rupees
    #[arg(long)]
    pub(crate) project_size: f64,
    /// Procurement budget in rupees
    #[arg(long)]
    pub(crate) project_budget: f64,
    /// Amount already spent against the budget, in rupees
    #[arg(long)]
    pub(crate) spent: f64,
    /// Value of the purchase request under review, in rupees
    #[arg(long)]
    pub(crate) pr_value: f64,
    /// Historical win probability as a fraction between 0 and 1
    #[arg(long)]
    pub(crate) win_probability: f64,
    /// Print the analysis as JSON instead of a text report
    #[arg(long)]
    pub(crate) json: bool,
}

impl AnalyzeArgs {
    fn submission(&self) -> PrSubmission {
        PrSubmission {
            project_name: Some(self.project_name.clone()),
            client_type: Some(self.client_type.clone()),
            project_size: Some(self.project_size),
            project_budget: Some(self.project_budget),
            spent_till_date: Some(self.spent),
            new_pr_value: Some(self.pr_value),
            historical_win_probability: Some(self.win_probability),
        }
    }
}

pub(crate) fn run_analysis(args: AnalyzeArgs) -> Result<(), AppError> {
    let input = args.submission().validate()?;
    let result = assemble(&input, Utc::now())?;

    if args.json {
        let json = serde_json::to_string_pretty(&AnalysisView::new(&result, None))
            .map_err(|err| AppError::Io(err.into()))?;
        println!("{json}");
    } else {
        print!("{}", render_report(&result));
    }
    Ok(())
}

pub(crate) fn render_report(result: &AnalysisResult) -> String {
    let input = &result.input;
    let metrics = &result.metrics;

    let mut lines = vec![
        format!("Purchase request analysis: {}", input.project_name),
        format!(
            "  Client: {} | Win probability: {}",
            input.client_type,
            input.historical_win_probability.percent_label()
        ),
        format!(
            "  Budget {} | Spent {} | PR {}",
            input.project_budget, input.spent_till_date, input.new_pr_value
        ),
        format!("  Remaining after PR: {}", metrics.remaining_budget),
        format!(
            "  Utilization: {:.1}% before, {:.1}% after",
            metrics.budget_utilization_before, metrics.budget_utilization_after
        ),
        format!("  Expected value: {}", metrics.expected_value),
    ];
    if metrics.is_overrun {
        lines.push(format!("  Overrun: {}", metrics.overrun_amount));
    }

    lines.push(String::new());
    lines.push(format!(
        "Risk: {} ({}/90)",
        result.risk_level, result.risk_score
    ));
    lines.extend(
        result
            .score_components
            .iter()
            .map(|component| format!("  +{:>2}  {}", component.points, component.note)),
    );

    lines.push(String::new());
    lines.push(format!("Effort: {}", result.effort_level));
    lines.push(format!("  {}", result.ai_recommendation));

    let mut report = lines.join("\n");
    report.push('\n');
    report
}
