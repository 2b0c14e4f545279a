use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    tally_cli::run().await
}
