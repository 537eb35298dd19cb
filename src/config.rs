use crate::{cors::CorsConfig, exception::Exception};

use log::{error, warn};
use serde_derive::{Deserialize, Serialize};

use std::fs::File;
use std::io::{self, prelude::*};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    port: u16,
    local: bool,
    worker_threads: usize,
    #[serde(default)]
    base: String,
    #[serde(default = "default_logging_enabled")]
    logging_enabled: bool,
    #[serde(default = "default_logs_path")]
    logs_path: String,
    #[serde(default)]
    log_ttl_days: Option<u64>,
    #[serde(default)]
    cors: CorsConfig,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logs_path() -> String {
    "./logs".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            port: 7878,
            local: true,
            worker_threads: num_cpus::get(),
            base: String::new(),
            logging_enabled: default_logging_enabled(),
            logs_path: default_logs_path(),
            log_ttl_days: None,
            cors: CorsConfig::default(),
        }
    }

    /// 从 TOML 文件读取配置。文件内容无法解析时记录错误并使用默认配置。
    pub fn from_toml(filename: &str) -> Result<Self, Exception> {
        let mut file = File::open(filename).map_err(|e| {
            error!("无法打开配置文件{}：{}", filename, e);
            match e.kind() {
                io::ErrorKind::NotFound => Exception::ConfigNotFound,
                _ => Exception::ConfigUnreadable,
            }
        })?;
        let mut str_val = String::new();
        file.read_to_string(&mut str_val).map_err(|e| {
            error!("读取配置文件{}失败：{}", filename, e);
            Exception::ConfigUnreadable
        })?;
        Ok(Self::from_toml_str(&str_val))
    }

    /// 从 TOML 文本构建配置
    pub fn from_toml_str(text: &str) -> Self {
        let mut raw_config: Config = match toml::from_str(text) {
            Ok(t) => t,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象，使用默认配置：{}", e);
                Config::new()
            }
        };
        if raw_config.worker_threads == 0 {
            raw_config.worker_threads = num_cpus::get();
        }
        if raw_config.log_ttl_days == Some(0) {
            warn!("log_ttl_days被设置为0，这会在启动时删除当天以前的全部日志");
        }
        raw_config
    }
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn logging_enabled(&self) -> bool {
        self.logging_enabled
    }

    pub fn logs_path(&self) -> &str {
        &self.logs_path
    }

    pub fn log_ttl_days(&self) -> Option<u64> {
        self.log_ttl_days
    }

    pub fn cors(&self) -> &CorsConfig {
        &self.cors
    }
}
