mod analyze;
mod cli;
mod infra;
mod routes;
mod server;

use pr_advisor::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
