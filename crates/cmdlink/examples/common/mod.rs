//! Logging and argument helpers shared by the demos.

#![allow(dead_code)]

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Log to stderr. `RUST_LOG` wins over `level` when set.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

/// Command ids spoken by the device and host demos.
pub mod ids {
    use cmdlink::frame::CommandId;

    pub const ACK: CommandId = 1;
    pub const ERROR: CommandId = 2;
    pub const SET_LED: CommandId = 3;
    pub const ADD: CommandId = 4;
    pub const SUM: CommandId = 5;
    pub const ECHO: CommandId = 6;
    pub const ECHO_REPLY: CommandId = 7;
    pub const SAMPLE: CommandId = 8;
    pub const SAMPLE_REPLY: CommandId = 9;
    pub const BYE: CommandId = 10;
}
