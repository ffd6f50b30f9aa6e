//! propedit - Layout-preserving `.properties` editor

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = propedit::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
