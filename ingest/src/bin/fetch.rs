use std::path::Path;
use std::process;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Get data directory from command line args or use default
    let data_dir = std::env::args().nth(1).unwrap_or_else(|| "data".to_string());

    println!("Fetching Online Retail II dataset into {}", data_dir);

    match ingest::fetch::fetch_dataset(Path::new(&data_dir)).await {
        Ok(path) => println!("Dataset ready at {}", path.display()),
        Err(e) => {
            eprintln!("Dataset fetch error: {}", e);
            process::exit(1);
        }
    }
}
