use clap::Parser;
use medaka_dispatch::app::{handle_fatal_error, init_logging, AppConfig};
use medaka_dispatch::cli::{execute_command, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let app_config = AppConfig::new(cli.log_verbosity());
    init_logging(&app_config);

    if let Err(e) = execute_command(cli.command, cli.config).await {
        handle_fatal_error(e, cli.verbose);
    }
}
