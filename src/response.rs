// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 响应模块
//!
//! `Response` 在内存中累积状态行、响应头与响应体，直到处理器调用终结操作。
//! 终结之后的任何写入都会被拒绝并记录警告，保证一个响应只会被终结一次。

use crate::param::*;

use bytes::{BufMut, Bytes, BytesMut};
use chrono::prelude::*;
use log::warn;
use serde_json::{Map, Value};

/// `send` 可以接受的响应体。
///
/// 类型在调用方构造时就已确定，写出时不再做运行时类型判断。
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// 原样写出的文本
    Text(String),
    /// 键值对象，序列化为 JSON
    Json(Map<String, Value>),
    /// 其它值，按字符串形式写出
    Raw(String),
}

impl Body {
    /// 该响应体默认对应的 `Content-Type`
    fn content_type(&self) -> &'static str {
        match self {
            Body::Json(_) => "application/json",
            Body::Text(_) | Body::Raw(_) => "text/plain;charset=utf-8",
        }
    }

    /// 写入响应时使用的文本形式
    pub fn render(&self) -> String {
        match self {
            Body::Text(s) | Body::Raw(s) => s.clone(),
            Body::Json(map) => Value::Object(map.clone()).to_string(),
        }
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Text(s.to_string())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Text(s)
    }
}

impl From<Map<String, Value>> for Body {
    fn from(map: Map<String, Value>) -> Self {
        Body::Json(map)
    }
}

impl From<Value> for Body {
    /// 对象映射为 `Json`，字符串映射为 `Text`，其余（数组、数字等）映射为 `Raw`
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Body::Json(map),
            Value::String(s) => Body::Text(s),
            other => Body::Raw(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    version: HttpVersion,
    status_code: u16,
    information: String,
    headers: Vec<(String, String)>,
    content: BytesMut,
    date: DateTime<Utc>,
    finished: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            version: HttpVersion::V1_1,
            status_code: 200,
            information: "OK".to_string(),
            headers: Vec::new(),
            content: BytesMut::new(),
            date: Utc::now(),
            finished: false,
        }
    }

    /// 设置状态码，未知状态码的原因短语为 `Unknown`
    pub fn set_status(&mut self, code: u16) -> &mut Self {
        self.status_code = code;
        self.information = reason_phrase(code).to_string();
        self
    }

    /// 设置单个响应头，同名（大小写不敏感）的旧值被覆盖并保持原位置
    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
        self
    }

    /// 批量设置响应头，逐个调用 [`Response::set_header`]
    pub fn set_headers<K, V, I>(&mut self, headers: I) -> &mut Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (name, value) in headers {
            self.set_header(name.as_ref(), value.as_ref());
        }
        self
    }

    /// 按名称查找响应头，大小写不敏感
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 一次性设置状态码与响应头
    pub fn write_head<K, V, I>(&mut self, code: u16, headers: I) -> &mut Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.set_status(code).set_headers(headers)
    }

    /// 向响应体追加数据，响应已终结时返回 `false`
    pub fn write(&mut self, chunk: &[u8]) -> bool {
        if self.finished {
            warn!("响应已终结，忽略后续写入（{} bytes）", chunk.len());
            return false;
        }
        self.content.put_slice(chunk);
        true
    }

    /// 丢弃尚未终结的响应体，已终结的响应不受影响
    pub fn clear_body(&mut self) {
        if !self.finished {
            self.content.clear();
        }
    }

    /// 终结响应，重复调用不会产生第二次写入
    pub fn end(&mut self) -> bool {
        if self.finished {
            warn!("响应已终结，忽略重复的 end 调用");
            return false;
        }
        self.finished = true;
        self.date = Utc::now();
        true
    }

    /// 追加最后一段数据并终结响应
    pub fn end_with(&mut self, chunk: &[u8]) -> bool {
        self.write(chunk) && self.end()
    }

    /// 写出响应体并终结响应。
    ///
    /// 若尚未设置 `Content-Type`，根据响应体类型补上。第二次调用是空操作。
    pub fn send(&mut self, body: impl Into<Body>) -> bool {
        if self.finished {
            warn!("send 在已终结的响应上被调用，已忽略");
            return false;
        }
        let body = body.into();
        if self.get_header("Content-Type").is_none() {
            self.set_header("Content-Type", body.content_type());
        }
        self.end_with(body.render().as_bytes())
    }

    /// 序列化为 HTTP/1.1 报文，`Content-Length`、`Date` 与 `Server` 由此处补齐
    pub fn as_bytes(&self) -> Vec<u8> {
        let mut head = [
            self.version.to_string().as_str(),
            " ",
            &self.status_code.to_string(),
            " ",
            &self.information,
            CRLF,
        ]
        .concat();
        for (name, value) in &self.headers {
            head.push_str(&[name.as_str(), ": ", value, CRLF].concat());
        }
        head.push_str(&["Content-Length: ", &self.content.len().to_string(), CRLF].concat());
        head.push_str(&["Date: ", &format_date(&self.date), CRLF].concat());
        head.push_str(&["Server: ", SERVER_NAME, CRLF].concat());
        head.push_str(&["Connection: close", CRLF, CRLF].concat());

        [head.as_bytes(), &self.content[..]].concat()
    }
}

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &str {
        &self.information
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// 当前已写入的响应体
    pub fn body(&self) -> Bytes {
        Bytes::copy_from_slice(&self.content)
    }

    /// 响应体的文本形式，非 UTF-8 字节以替换字符呈现
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.content).to_string()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_date() {
        let date = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_date(&date), "Tue, 02 Jan 2024 03:04:05 GMT");
    }

    #[test]
    fn test_response_new() {
        let response = Response::new();
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.information(), "OK");
        assert!(!response.is_finished());
        assert!(response.headers().is_empty());
    }

    #[test]
    fn test_set_headers_last_write_wins() {
        let mut response = Response::new();
        response.set_headers([("X-A", "1"), ("X-B", "2"), ("x-a", "3")]);

        assert_eq!(response.headers().len(), 2);
        assert_eq!(response.headers()[0], ("X-A".to_string(), "3".to_string()));
        assert_eq!(response.get_header("x-b"), Some("2"));
    }

    #[test]
    fn test_send_json_object() {
        let mut response = Response::new();
        assert!(response.send(json!({"a": 1})));

        assert_eq!(response.body_text(), r#"{"a":1}"#);
        assert_eq!(response.get_header("Content-Type"), Some("application/json"));
        assert!(response.is_finished());
    }

    #[test]
    fn test_send_text_keeps_existing_content_type() {
        let mut response = Response::new();
        response.set_header("Content-Type", "text/html");
        response.send("<p>hi</p>");

        assert_eq!(response.body_text(), "<p>hi</p>");
        assert_eq!(response.get_header("content-type"), Some("text/html"));
    }

    #[test]
    fn test_send_array_is_stringified() {
        let mut response = Response::new();
        response.send(json!([1, 2]));

        assert_eq!(response.body_text(), "[1,2]");
        assert_eq!(
            response.get_header("Content-Type"),
            Some("text/plain;charset=utf-8")
        );
    }

    #[test]
    fn test_second_send_is_noop() {
        let mut response = Response::new();
        assert!(response.send("first"));
        assert!(!response.send("second"));

        assert_eq!(response.body_text(), "first");
    }

    #[test]
    fn test_write_after_end_refused() {
        let mut response = Response::new();
        response.write(b"abc");
        assert!(response.end());
        assert!(!response.write(b"def"));
        assert!(!response.end());

        assert_eq!(response.body(), Bytes::from_static(b"abc"));
    }

    #[test]
    fn test_clear_body_before_end() {
        let mut response = Response::new();
        response.write(b"partial");
        response.clear_body();
        response.end_with(b"error");

        assert_eq!(response.body_text(), "error");
    }

    #[test]
    fn test_write_head() {
        let mut response = Response::new();
        response.write_head(404, [("Content-Type", "text/plain")]);

        assert_eq!(response.status_code(), 404);
        assert_eq!(response.information(), "Not Found");
        assert_eq!(response.get_header("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn test_as_bytes() {
        let mut response = Response::new();
        response.set_header("X-Test", "yes");
        response.send("hello");

        let text = String::from_utf8(response.as_bytes()).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("X-Test: yes\r\n"));
        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(text.contains("Server: rewind\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.ends_with("\r\n\r\nhello"));
    }

    #[test]
    fn test_body_from_value() {
        assert_eq!(Body::from(json!("x")), Body::Text("x".to_string()));
        assert_eq!(Body::from(json!(3)), Body::Raw("3".to_string()));
        assert!(matches!(Body::from(json!({})), Body::Json(_)));
    }
}
