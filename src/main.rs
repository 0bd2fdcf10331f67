use clap::Parser;
use stacknav::cli::{self, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Config is read before logging starts so its `log_level` can apply.
    let config = match cli::load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("stacknav: error: {e:#}");
            std::process::exit(1);
        }
    };
    stacknav::debug::init_log_bridge(cli.log_level, config.log_level.to_level_filter());
    log::info!("Starting stacknav v{}", stacknav::VERSION);

    if let Err(e) = cli::run(cli, &config).await {
        log::error!("Command failed: {e:#}");
        eprintln!("stacknav: error: {e:#}");
        std::process::exit(1);
    }
}
