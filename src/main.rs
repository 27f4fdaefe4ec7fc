use clap::Parser;
use log::{error, info};

use csv2manifest::{process_dataset, Args};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("Starting the manifest conversion process...");

    match process_dataset(&args) {
        Ok(stats) => {
            stats.print_summary();
            info!(
                "Manifest written to {}",
                args.manifest_file.display()
            );
        }
        Err(e) => {
            error!("Failed to create manifest: {}", e);
            std::process::exit(1);
        }
    }
}
