use std::process::ExitCode;

fn main() -> ExitCode {
    freightrate_cli::run()
}
