use std::process::ExitCode;

use volprobe::Options;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = match std::env::args_os().nth(1) {
        Some(path) => match Options::load(&path) {
            Ok(options) => options,
            Err(e) => {
                log::error!("failed to load options: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => Options::default(),
    };

    match volprobe::run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
