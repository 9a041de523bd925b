use tourbook_db::{DemoBookingDataset, SeedResult};

use crate::commands::{
    connect, load_catalog, load_config, migrate, runtime, CommandResult, StepFailure,
    EXIT_MIGRATION,
};

const COMMAND: &str = "seed";

/// Applies migrations, then books the demo travellers against the configured catalog.
pub fn run() -> CommandResult {
    match load() {
        Ok(result) => CommandResult::success(COMMAND, summarize(&result)),
        Err(failure) => failure.into_result(COMMAND),
    }
}

fn load() -> Result<SeedResult, StepFailure> {
    let config = load_config()?;
    let catalog = load_catalog(&config)?;

    runtime()?.block_on(async {
        let pool = connect(&config).await?;
        let outcome = match migrate(&pool).await {
            Ok(()) => DemoBookingDataset::load(&pool, &catalog).await.map_err(|error| {
                StepFailure {
                    error_class: "seed",
                    message: format!("demo bookings could not be written: {error}"),
                    exit_code: EXIT_MIGRATION,
                }
            }),
            Err(failure) => Err(failure),
        };
        pool.close().await;
        outcome
    })
}

fn summarize(result: &SeedResult) -> String {
    let mut lines = vec![format!(
        "seeded {} of {} demo bookings ({} users in store)",
        result.bookings_created,
        DemoBookingDataset::len(),
        result.users_total
    )];
    lines.extend(result.skipped.iter().map(|reason| format!("  - skipped {reason}")));
    lines.join("\n")
}
