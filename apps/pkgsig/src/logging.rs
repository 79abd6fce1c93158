//! Tracing subscriber setup

use pkgsig_config::{ColorChoice, Config};
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber writing to stderr
///
/// `RUST_LOG` wins over the configured level; `--debug` wins over both.
pub fn init_tracing(config: &Config, debug: bool, json: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.logging.level))
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter);

    if json || config.logging.json {
        builder.json().init();
    } else {
        builder.with_ansi(use_color(config.general.color)).init();
    }
}

fn use_color(choice: ColorChoice) -> bool {
    match choice {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stderr().is_terminal(),
    }
}
