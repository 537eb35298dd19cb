// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了分发层在读取配置、解析请求报文时可能抛出的各类异常情况。
//!
//! ## 设计意图
//! - **错误分类**：涵盖了协议解析错误与配置加载错误。
//! - **语义映射**：每个协议类变体都通过 [`Exception::status_code`] 对应一个 HTTP 状态码，
//!   由错误响应器写回客户端。
//! - 路由未命中不属于异常，它由分发引擎直接转交错误响应器处理。

use std::fmt;

/// 分发层处理过程中发生的异常类型。
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Exception {
    /// 客户端发送的请求字节流无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 请求行缺少方法、目标或版本中的某一项。
    MalformedRequestLine,
    /// 客户端使用了分发层不认识的 HTTP 方法（例如 TRACE）。
    UnSupportedRequestMethod,
    /// 客户端使用了不支持的 HTTP 协议版本（例如 HTTP/2.0）。
    UnsupportedHttpVersion,
    /// 请求声明的 `Content-Length` 超出单个请求允许的大小。
    PayloadTooLarge,
    /// 指定的配置文件不存在。
    ConfigNotFound,
    /// 配置文件存在但无法读取。
    ConfigUnreadable,
}

use Exception::*;

impl Exception {
    /// 协议类异常对应的 HTTP 状态码，配置类异常统一视为服务端错误。
    pub fn status_code(&self) -> u16 {
        match self {
            RequestIsNotUtf8 | MalformedRequestLine => 400,
            UnSupportedRequestMethod => 405,
            PayloadTooLarge => 413,
            UnsupportedHttpVersion => 505,
            ConfigNotFound | ConfigUnreadable => 500,
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            MalformedRequestLine => write!(f, "Malformed request line"),
            UnSupportedRequestMethod => write!(f, "Unsupported request method"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            PayloadTooLarge => write!(f, "Request body too large"),
            ConfigNotFound => write!(f, "Config file not found"),
            ConfigUnreadable => write!(f, "Config file can't be read"),
        }
    }
}

impl std::error::Error for Exception {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(MalformedRequestLine.status_code(), 400);
        assert_eq!(UnSupportedRequestMethod.status_code(), 405);
        assert_eq!(UnsupportedHttpVersion.status_code(), 505);
        assert_eq!(PayloadTooLarge.status_code(), 413);
        assert_eq!(ConfigNotFound.status_code(), 500);
    }

    #[test]
    fn test_display() {
        assert_eq!(UnSupportedRequestMethod.to_string(), "Unsupported request method");
    }
}
