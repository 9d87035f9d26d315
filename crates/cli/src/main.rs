use std::process::ExitCode;

fn main() -> ExitCode {
    bunamo_cli::run()
}
