use clap::Parser;
use edgelord_arb::app::{health_check, Config};
use edgelord_arb::cli::{banner, CheckTarget, Cli, Commands};
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Check { target: CheckTarget::Config } => check_config(),
        Commands::Status => {
            println!("edgelord-arb: live status is reported via logs and the opportunity log in this version.");
            println!("run with RUST_LOG=info (or LOG_FORMAT=json) and tail the process output.");
        }
    }
}

async fn run(args: edgelord_arb::cli::RunArgs) {
    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(2);
        }
    };

    if let Some(format) = args.log_format {
        config.logging.format = format;
    }
    config.dry_run = args.dry_run;

    config.init_logging();

    if !args.no_banner {
        banner::print_banner();
    }

    let report = health_check(&config);
    if !report.is_healthy() {
        for check in report.checks().iter().filter(|c| !c.is_healthy() && c.critical()) {
            error!(check = check.name(), "critical health check failed");
        }
        std::process::exit(3);
    }

    info!("edgelord-arb starting");

    let exit_code = tokio::select! {
        result = edgelord_arb::app::run(config) => {
            match result {
                Ok(()) => 0,
                Err(e) => {
                    error!(error = %e, "fatal error");
                    1
                }
            }
        }
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
            0
        }
    };

    info!("edgelord-arb stopped");
    std::process::exit(exit_code);
}

fn check_config() {
    match Config::load() {
        Ok(config) => {
            println!("configuration OK");
            println!("  active venues: {:?}", config.active_venues());
            println!("  min_spread_bps: {}", config.min_spread_bps);
            println!("  min_tri_gain_bps: {}", config.min_tri_gain_bps);
            println!("  tri_bases: {:?}", config.tri_bases);
            println!("  database_url: {}", config.database_url);

            let report = health_check(&config);
            for check in report.checks() {
                let mark = if check.is_healthy() { "ok" } else { "warn" };
                println!("  [{mark}] {}", check.name());
            }
            if !report.is_healthy() {
                std::process::exit(3);
            }
        }
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(2);
        }
    }
}
