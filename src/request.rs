// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求处理模块
//!
//! 该模块负责将 TCP 流中读取的原始字节解析为强类型的 `Request` 结构体，
//! 并在分发前派生出规范化路径与原始查询串。它涵盖了：
//! 1. 请求行（Request-Line）的解析（方法、目标、版本）。
//! 2. 全部 HTTP 标头（Headers）按原始顺序保存。
//! 3. 请求体按 `Content-Length` 累积为文本。

use crate::{exception::Exception, param::*, path};
use log::error;

/// 请求头与请求体之间的分隔符
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// 表示一个完整的 HTTP 请求。
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP 请求方法
    method: HttpRequestMethod,
    /// 请求行中的原始目标（包含查询字符串）
    target: String,
    /// HTTP 协议版本
    version: HttpVersion,
    /// 按到达顺序保存的请求头
    headers: Vec<(String, String)>,
    /// 累积得到的请求体文本
    body: String,
    /// 规范化后的路径，由分发引擎在匹配前写入
    normalized_path: String,
    /// 第一个 `?` 之后的原始查询串，不做解析
    query: Option<String>,
}

impl Request {
    /// 手动构造一个请求，常用于测试或内部转发。
    pub fn new(method: HttpRequestMethod, target: &str) -> Self {
        Self {
            method,
            target: target.to_string(),
            version: HttpVersion::V1_1,
            headers: Vec::new(),
            body: String::new(),
            normalized_path: String::new(),
            query: None,
        }
    }

    /// 追加一个请求头
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// 设置请求体
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    /// 从原始字节缓冲区尝试构建 `Request` 实例。
    ///
    /// # 逻辑步骤
    /// 1. 验证编码：确保请求头部分是合法的 UTF-8 字符串。
    /// 2. 解析请求行：提取方法、目标和协议版本。
    /// 3. 逐行解析标头，保持原始顺序。
    /// 4. 将分隔符之后的字节作为请求体，以有损方式转为文本。
    ///
    /// # 参数
    /// * `buffer` - 从网络 Socket 读取的原始数据。
    /// * `id` - 连接 ID，用于在多任务环境下追踪日志。
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        let (head, body) = match header_block_end(buffer) {
            Some(end) => (&buffer[..end], &buffer[end + HEADER_TERMINATOR.len()..]),
            None => (buffer, &b""[..]),
        };

        let request_string = match std::str::from_utf8(head) {
            Ok(string) => string,
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let mut request_lines = request_string.split(CRLF);
        let request_line = request_lines.next().unwrap_or_default();

        // 解析请求行 (e.g., "GET /index.html HTTP/1.1")
        let parts: Vec<&str> = request_line.split_whitespace().collect();
        if parts.len() != 3 {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, request_line);
            return Err(Exception::MalformedRequestLine);
        }

        let method = match HttpRequestMethod::parse(parts[0]) {
            Some(m) => m,
            None => {
                error!("[ID{}]不支持的HTTP请求方法：{}", id, parts[0]);
                return Err(Exception::UnSupportedRequestMethod);
            }
        };

        let version = match parts[2].to_uppercase().as_str() {
            "HTTP/1.1" => HttpVersion::V1_1,
            "HTTP/1.0" => HttpVersion::V1_0,
            other => {
                error!("[ID{}]不支持的HTTP协议版本：{}", id, other);
                return Err(Exception::UnsupportedHttpVersion);
            }
        };

        let headers = request_lines
            .filter(|line| !line.is_empty())
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .collect();

        Ok(Self {
            method,
            target: parts[1].to_string(),
            version,
            headers,
            body: String::from_utf8_lossy(body).to_string(),
            normalized_path: String::new(),
            query: None,
        })
    }

    /// 按第一个 `?` 拆分目标，写入规范化路径与原始查询串。
    ///
    /// 规范化结果为空时视为根路径 `/`，与路由表的注册规则一致。
    pub fn split_target(&mut self) {
        let (raw_path, query) = match self.target.split_once('?') {
            Some((p, q)) => (p, Some(q.to_string())),
            None => (self.target.as_str(), None),
        };
        let normalized = path::normalize(raw_path);
        self.normalized_path = if normalized.is_empty() {
            "/".to_string()
        } else {
            normalized
        };
        self.query = query;
    }
}

// --- Getter 访问器实现 ---

impl Request {
    /// 获取请求方法
    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    /// 获取请求行中的原始目标
    pub fn target(&self) -> &str {
        &self.target
    }

    /// 获取 HTTP 协议版本
    pub fn version(&self) -> HttpVersion {
        self.version
    }

    /// 获取规范化后的路径
    pub fn normalized_path(&self) -> &str {
        &self.normalized_path
    }

    /// 获取原始查询串
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// 获取全部请求头
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// 按名称查找请求头，大小写不敏感
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 获取请求体文本
    pub fn body(&self) -> &str {
        &self.body
    }
}

/// 查找请求头结束位置（`\r\n\r\n` 的起始下标）。
pub fn header_block_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}

/// 从已到达的请求头中读取 `Content-Length`，缺失或非法时视为 0。
pub fn content_length(head: &[u8]) -> usize {
    String::from_utf8_lossy(head)
        .split(CRLF)
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}
