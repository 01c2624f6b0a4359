use chrono::NaiveDate;
use clap::{Arg, Command};
use ingest::driver::RunOutcome;
use std::process;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let matches = Command::new("Retail Ingestion Pipeline")
        .version("1.0")
        .about("Ingests Online Retail II data into the bronze bucket one day at a time")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Sets a custom config file"),
        )
        .arg(
            Arg::new("date")
                .short('d')
                .long("date")
                .value_name("YYYY-MM-DD")
                .help("Process this date instead of the next cursor date"),
        )
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map(|s| s.as_str())
        .unwrap_or("config/lakehouse.toml");

    let explicit_date = match matches.get_one::<String>("date") {
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(e) => {
                eprintln!("Invalid --date '{}': {}", raw, e);
                process::exit(1);
            }
        },
        None => None,
    };

    match ingest::run_ingest_pipeline(config_path, explicit_date).await {
        Ok(RunOutcome::Ingested(report)) => {
            println!("Ingestion for {} completed successfully", report.date);
            for upload in &report.uploads {
                println!("  {} rows from '{}' -> {}", upload.rows, upload.sheet, upload.key);
            }
            if !report.cursor_advanced {
                println!("  (explicit date run, cursor untouched)");
            }
        }
        Ok(RunOutcome::Empty { date }) => {
            println!("No data found for {}, cursor left unchanged", date);
        }
        Err(e) => {
            eprintln!("Ingestion pipeline error: {}", e);
            process::exit(1);
        }
    }
}
