//! Binary entrypoint for the assistant server.

use std::process::ExitCode;

use ai_assistant::startup;

fn main() -> ExitCode {
    startup::run()
}
