use std::process::ExitCode;

fn main() -> ExitCode {
    dappazon_cli::run()
}
