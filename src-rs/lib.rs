#![deny(clippy::all)]

pub mod config;
pub mod cons;
pub mod error;
mod ffi;
pub mod llm;


use anyhow::Context;
use std::path::Path;
use std::sync::Once;

static INIT: Once = Once::new();

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "uistudy.log";

pub fn init_logger() {
    INIT.call_once(|| {
        // Try to load log4rs configuration from file first
        let config_path = std::env::var("LOG4RS_CONFIG").unwrap_or_else(|_| "log4rs.yaml".to_string());
        if log4rs::init_file(&config_path, Default::default()).is_ok() {
            println!("[INIT] Logger initialized from {}", config_path);
            return;
        }
        println!("[INIT] Failed to load {}, falling back to default config", config_path);

        let initialized = fallback_log_config(Path::new(LOG_DIR))
            .and_then(|config| log4rs::init_config(config).context("Failed to install logger"));
        match initialized {
            Ok(_) => println!("[INIT] Logger initialized successfully"),
            Err(e) => println!("[INIT] Failed to initialize logger: {:#}", e),
        }
    });
}

/// File logger at `<dir>/uistudy.log`, Info and above.
pub(crate) fn fallback_log_config(dir: &Path) -> anyhow::Result<log4rs::Config> {
    use log::LevelFilter;
    use log4rs::append::file::FileAppender;
    use log4rs::config::{Appender, Config, Root};
    use log4rs::encode::pattern::PatternEncoder;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log dir {}", dir.display()))?;

    let pattern = "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}\n";
    let log_path = dir.join(LOG_FILE);
    let logfile = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build(&log_path)
        .with_context(|| format!("Failed to create log file {}", log_path.display()))?;

    Config::builder()
        .appender(Appender::builder().build("logfile", Box::new(logfile)))
        .build(Root::builder().appender("logfile").build(LevelFilter::Info))
        .map_err(|e| anyhow::anyhow!("Failed to build log config: {}", e))
}

/// Resolved configuration as JSON. API keys are never serialized.
#[napi_derive::napi]
pub fn get_app_config() -> String {
    init_logger();
    let config = match config::AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to load config: {:?}", e);
            return "{}".to_string();
        }
    };
    serde_json::to_string(&config).unwrap_or("{}".to_string())
}

// Re-export FFI functions and types
pub use ffi::*;
