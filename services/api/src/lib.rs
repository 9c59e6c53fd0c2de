mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use anna_rental::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
