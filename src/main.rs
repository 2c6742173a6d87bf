use std::process::ExitCode;

fn main() -> ExitCode {
    match poolproxy_cli::CLI::parse_and_run() {
        Ok(message) => {
            println!("{message}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{error:?}");
            ExitCode::FAILURE
        }
    }
}
