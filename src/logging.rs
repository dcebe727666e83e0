use std::io::Write;

use env_logger::{Builder, Env, Target};

/// `LOG:<LEVEL>:<message>`, the diagnostic line format read by the caller.
pub fn format_line(level: log::Level, message: &std::fmt::Arguments<'_>) -> String {
    format!("LOG:{level}:{message}")
}

/// Sends log records to stdout next to the `PARSED_EMAIL:` lines.
/// `RUST_LOG` overrides the default `info` level.
pub fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stdout)
        .format(|buf, record| writeln!(buf, "{}", format_line(record.level(), record.args())))
        .try_init();
}
