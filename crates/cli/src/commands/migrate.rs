use crate::commands::{connect, load_config, migrate, runtime, CommandResult, StepFailure};

const COMMAND: &str = "migrate";

pub fn run() -> CommandResult {
    match apply() {
        Ok(()) => CommandResult::success(COMMAND, "applied pending migrations"),
        Err(failure) => failure.into_result(COMMAND),
    }
}

fn apply() -> Result<(), StepFailure> {
    let config = load_config()?;
    runtime()?.block_on(async {
        let pool = connect(&config).await?;
        let outcome = migrate(&pool).await;
        pool.close().await;
        outcome
    })
}
