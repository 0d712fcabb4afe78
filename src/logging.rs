use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::Config;
use crate::constants::LOG_RETENTION_DAYS;

/// sled 的内部日志在 info 级别过于嘈杂，除非 RUST_LOG 显式指定
const QUIET_DEPENDENCIES: &[&str] = &["sled=warn"];

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    /// Rolling file name prefix. Each binary writes its own files.
    pub file_prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
            file_prefix: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

impl From<&Config> for LogConfig {
    fn from(config: &Config) -> Self {
        Self {
            log_level: config.log_level.clone(),
            enable_file_logs: config.enable_file_logs,
            log_dir: config.log_dir.clone(),
            ..Self::default()
        }
    }
}

impl LogConfig {
    pub fn with_file_prefix(mut self, prefix: &str) -> Self {
        self.file_prefix = prefix.to_string();
        self
    }
}

/// `log_level` plus the dependency overrides, unless `RUST_LOG` already
/// mentions that target.
fn filter_directives(log_level: &str) -> String {
    let mut directives = vec![log_level.trim().to_string()];
    for quiet in QUIET_DEPENDENCIES {
        let target = quiet.split('=').next().unwrap_or(quiet);
        if !log_level.contains(target) {
            directives.push((*quiet).to_string());
        }
    }
    directives.join(",")
}

pub fn init_tracing(config: &LogConfig) {
    let env_filter = EnvFilter::try_new(filter_directives(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = fmt::layer().with_target(true).with_thread_ids(false);

    let registry = Registry::default().with(env_filter).with(stdout_layer);

    if config.enable_file_logs {
        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(&config.file_prefix)
            .filename_suffix("log")
            .max_log_files(LOG_RETENTION_DAYS)
            .build(&config.log_dir)
            .expect("Failed to create rolling file appender");
        let file_layer = fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .json();
        // 全局 subscriber 已设置时 try_init 返回错误（测试中属正常情况）
        if let Err(e) = registry.with(file_layer).try_init() {
            let msg = e.to_string();
            if !msg.contains("already been set") {
                panic!("Failed to initialize tracing with file logs: {e}");
            }
        }
    } else if let Err(e) = registry.try_init() {
        let msg = e.to_string();
        if !msg.contains("already been set") {
            panic!("Failed to initialize tracing: {e}");
        }
    }
}
