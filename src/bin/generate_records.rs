//! Fills the store with random study records for one user.

use std::process::ExitCode;

use clap::Parser;
use study_tracker::config::Config;
use study_tracker::constants::DEFAULT_SEED_RECORDS;
use study_tracker::logging::{init_tracing, LogConfig};
use study_tracker::services::seed::generate_records;
use study_tracker::services::ServiceError;
use study_tracker::store::Store;

#[derive(Debug, Parser)]
#[command(name = "generate_records")]
#[command(about = "Generate synthetic study records for an existing user")]
struct Args {
    /// Id of the user that owns the generated records
    #[arg(long)]
    user_id: String,

    /// Number of records to generate
    #[arg(long, default_value_t = DEFAULT_SEED_RECORDS)]
    num_records: usize,

    /// Delete the user's existing records first
    #[arg(long)]
    clear_existing: bool,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let config = Config::from_env();
    init_tracing(&LogConfig::from(&config).with_file_prefix("generate_records"));

    let store = match Store::open(&config.sled_path) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, path = %config.sled_path, "Failed to open sled database");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = store.run_migrations() {
        tracing::error!(error = %e, "Failed to run migrations");
        return ExitCode::FAILURE;
    }

    let result = generate_records(
        &store,
        &args.user_id,
        args.num_records,
        args.clear_existing,
        chrono::Utc::now(),
        &mut rand::thread_rng(),
    );

    let code = match result {
        Ok(report) => {
            if args.clear_existing {
                println!("Cleared {} existing records", report.cleared);
            }
            println!(
                "Generated {} records for user {}",
                report.created, args.user_id
            );
            ExitCode::SUCCESS
        }
        Err(ServiceError::NotFound { .. }) => {
            eprintln!("User with ID {} does not exist", args.user_id);
            match store.list_users() {
                Ok(users) if users.is_empty() => eprintln!("No users found in the database"),
                Ok(users) => {
                    eprintln!("Available users:");
                    for user in users {
                        eprintln!("  {} ({})", user.id, user.email);
                    }
                }
                Err(e) => tracing::error!(error = %e, "Failed to list users"),
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "Record generation failed");
            ExitCode::FAILURE
        }
    };

    if let Err(e) = store.flush() {
        tracing::error!(error = %e, "Failed to flush store");
    }
    code
}
