// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 错误响应器
//!
//! 路由未命中、请求解析失败或处理器链崩溃时，由这里生成最终的错误响应。
//! 用户可以注册一次错误覆盖函数来改写响应体的形状。

use crate::response::{Body, Response};
use log::warn;
use serde_json::json;
use std::{fmt, sync::Arc};

/// 传给错误覆盖函数的错误值
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchError {
    message: String,
    status: u16,
}

impl DispatchError {
    pub fn new(message: &str, status: u16) -> Self {
        Self {
            message: message.to_string(),
            status,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> u16 {
        self.status
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DispatchError {}

/// 错误覆盖函数：把错误转换成自定义响应体
pub type ErrorOverride = Arc<dyn Fn(&DispatchError) -> Body + Send + Sync>;

#[derive(Clone, Default)]
pub struct ErrorResponder {
    custom: Option<ErrorOverride>,
}

impl ErrorResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册覆盖函数，只有第一次注册生效
    pub fn set_override(&mut self, custom: ErrorOverride) -> bool {
        if self.custom.is_some() {
            warn!("错误覆盖函数已注册，忽略重复注册");
            return false;
        }
        self.custom = Some(custom);
        true
    }

    pub fn has_override(&self) -> bool {
        self.custom.is_some()
    }

    /// 写出错误响应。
    ///
    /// 已缓冲但未终结的响应体会被丢弃；状态码与 `Content-Type: text/plain` 总是先于响应体写入。
    /// 覆盖函数返回 `Raw` 时视为不支持的形状，退回默认的 `{error, status}` 响应体。
    pub fn respond(&self, response: &mut Response, status: u16, error: &str) {
        if response.is_finished() {
            warn!("响应已终结，跳过错误响应：{} {}", status, error);
            return;
        }
        response.clear_body();
        response.write_head(status, [("Content-Type", "text/plain")]);

        if let Some(custom) = &self.custom {
            match custom(&DispatchError::new(error, status)) {
                body @ (Body::Text(_) | Body::Json(_)) => {
                    response.end_with(body.render().as_bytes());
                    return;
                }
                Body::Raw(raw) => {
                    warn!("错误覆盖函数返回了不支持的响应体：{}，使用默认响应体", raw);
                }
            }
        }

        let payload = json!({ "error": error, "status": status });
        response.end_with(payload.to_string().as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_payload() {
        let mut response = Response::new();
        ErrorResponder::new().respond(&mut response, 404, "No results found");

        assert_eq!(response.status_code(), 404);
        assert_eq!(response.get_header("Content-Type"), Some("text/plain"));
        assert_eq!(
            response.body_text(),
            r#"{"error":"No results found","status":404}"#
        );
        assert!(response.is_finished());
    }

    #[test]
    fn test_override_text() {
        let mut responder = ErrorResponder::new();
        responder.set_override(Arc::new(|e: &DispatchError| {
            Body::from(format!("oops: {} ({})", e, e.status()))
        }));
        let mut response = Response::new();
        responder.respond(&mut response, 404, "missing");

        assert_eq!(response.body_text(), "oops: missing (404)");
        assert_eq!(response.get_header("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn test_override_json() {
        let mut responder = ErrorResponder::new();
        responder.set_override(Arc::new(|e: &DispatchError| {
            Body::from(json!({ "message": e.message() }))
        }));
        let mut response = Response::new();
        responder.respond(&mut response, 404, "missing");

        assert_eq!(response.body_text(), r#"{"message":"missing"}"#);
    }

    #[test]
    fn test_override_raw_falls_back() {
        let mut responder = ErrorResponder::new();
        responder.set_override(Arc::new(|_: &DispatchError| Body::from(json!(42))));
        let mut response = Response::new();
        responder.respond(&mut response, 500, "boom");

        assert_eq!(response.body_text(), r#"{"error":"boom","status":500}"#);
        assert!(response.is_finished());
    }

    #[test]
    fn test_override_set_once() {
        let mut responder = ErrorResponder::new();
        assert!(responder.set_override(Arc::new(|_: &DispatchError| Body::from("first"))));
        assert!(!responder.set_override(Arc::new(|_: &DispatchError| Body::from("second"))));

        let mut response = Response::new();
        responder.respond(&mut response, 404, "x");
        assert_eq!(response.body_text(), "first");
    }

    #[test]
    fn test_finished_response_untouched() {
        let mut response = Response::new();
        response.send("already");
        ErrorResponder::new().respond(&mut response, 500, "late");

        assert_eq!(response.status_code(), 200);
        assert_eq!(response.body_text(), "already");
    }
}
