use anyhow::{Context, Result};
use clap::Parser;
use cosmic_shader::config::Config;
use std::fs::OpenOptions;

fn main() -> Result<()> {
    let cfg = Config::parse();
    init_logging(&cfg)?;
    cosmic_shader::app::run(cfg)
}

/// The terminal is busy with the image, so stderr logging is off unless
/// `RUST_LOG` asks for it; `--log-file` gets `info` and up by default.
fn init_logging(cfg: &Config) -> Result<()> {
    let default_filter = if cfg.log_file.is_some() { "info" } else { "off" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));
    if let Some(path) = &cfg.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}
