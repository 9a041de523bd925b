use std::process::ExitCode;

fn main() -> ExitCode {
    tourbook_cli::run()
}
