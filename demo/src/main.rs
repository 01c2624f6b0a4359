use clap::{Arg, ArgAction, Command};
use std::process;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let matches = Command::new("Lakehouse Seeding Demo")
        .version("1.0")
        .about("Seeds the MinIO lakehouse with synthetic e-commerce data")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Sets a custom config file"),
        )
        .arg(
            Arg::new("scale")
                .short('s')
                .long("scale")
                .value_name("SCALE")
                .help("Data scale: small, medium or large"),
        )
        .arg(
            Arg::new("setup-only")
                .long("setup-only")
                .action(ArgAction::SetTrue)
                .help("Only create buckets and folders, no data generation"),
        )
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map(|s| s.as_str())
        .unwrap_or("config/lakehouse.toml");

    let result = if matches.get_flag("setup-only") {
        demo::run_setup_only(config_path).await
    } else {
        let scale = matches.get_one::<String>("scale").map(|s| s.as_str());
        demo::run_demo_pipeline(config_path, scale).await
    };

    if let Err(e) = result {
        eprintln!("Demo pipeline error: {}", e);
        process::exit(1);
    }
}
