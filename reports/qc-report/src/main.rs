//! 为数据集中的每个受试者生成质量控制图.
//!
//! 通过环境变量配置, 参见 [`config::Config::from_env`].

mod config;
mod result;
mod runner;

use std::process::ExitCode;

fn main() -> ExitCode {
    let config = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::from(2);
        }
    };

    if let Err(e) = simple_logger::SimpleLogger::new()
        .with_level(config.log_level)
        .init()
    {
        eprintln!("cannot initialize logger: {e}");
    }

    println!("Generating QC reports into {}...", config.output_dir.display());
    let result = match runner::run(&config) {
        Ok(r) => r,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = result.analyze() {
        log::error!("cannot print summary: {e}");
    }
    if result.failures() > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
