use std::process::ExitCode;

fn main() -> ExitCode {
    let code = morpheus_cli::cli::run();
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
