// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! CORS 响应头的计算。配置在服务启动前写入，之后每个请求只读。

use crate::param::{DEFAULT_CORS_HEADERS, DEFAULT_CORS_METHODS, DEFAULT_CORS_ORIGIN};
use serde_derive::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CorsConfig {
    #[serde(default)]
    pub origins: Vec<String>,
    #[serde(default)]
    pub allow_headers: Vec<String>,
    #[serde(default)]
    pub allow_methods: String,
}

impl CorsConfig {
    /// 计算三个 `Access-Control-Allow-*` 响应头，未配置的项使用默认值
    pub fn headers(&self) -> [(&'static str, String); 3] {
        let origin = match self.origins.is_empty() {
            true => DEFAULT_CORS_ORIGIN.to_string(),
            false => self.origins.join(","),
        };
        let methods = match self.allow_methods.is_empty() {
            true => DEFAULT_CORS_METHODS.to_string(),
            false => self.allow_methods.clone(),
        };
        let headers = match self.allow_headers.is_empty() {
            true => DEFAULT_CORS_HEADERS.to_string(),
            false => self.allow_headers.join(","),
        };
        [
            ("Access-Control-Allow-Origin", origin),
            ("Access-Control-Allow-Methods", methods),
            ("Access-Control-Allow-Headers", headers),
        ]
    }
}
