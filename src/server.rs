// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 传输层
//!
//! 基于 Tokio 的 TCP 监听循环：每个连接一个轻量任务，读取完整请求后交给 [`App::handle`]，
//! 写回响应并关闭连接，最后才把请求事件交给日志汇。

use crate::{
    app::App,
    exception::Exception,
    logger::LogKind,
    request::{self, Request},
};

use log::{debug, error, info, warn};
use serde_json::json;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

use std::{
    io,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    sync::Arc,
    time::Instant,
};

/// 单次读取的缓冲区大小
const READ_CHUNK: usize = 1024;
/// 单个请求允许累积的最大字节数
const MAX_REQUEST_BYTES: usize = 1024 * 1024;
/// 请求头与请求体之间的空行 `\r\n\r\n`
const HEADER_TERMINATOR_LEN: usize = 4;

impl App {
    /// 绑定端口并开始服务。绑定成功后以实际监听地址调用一次 `on_ready`。
    ///
    /// 正常情况下不会返回；只有绑定失败时返回错误。
    pub async fn listen<F>(self, port: u16, on_ready: F) -> io::Result<()>
    where
        F: FnOnce(SocketAddr),
    {
        let address = match self.local() {
            true => Ipv4Addr::new(127, 0, 0, 1),
            false => Ipv4Addr::new(0, 0, 0, 0),
        };
        info!("服务端将在{}:{}上监听Socket连接", address, port);

        let listener = match TcpListener::bind(SocketAddrV4::new(address, port)).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("无法绑定端口：{}，错误：{}", port, e);
                return Err(e);
            }
        };
        let local_addr = listener.local_addr()?;
        info!("端口{}绑定完成", local_addr.port());

        self.sweep_expired_logs();
        self.log(
            LogKind::Success,
            json!({ "message": format!("Listening on {}", local_addr) }),
        );

        let app = Arc::new(self);
        on_ready(local_addr);

        let mut id: u128 = 0;
        loop {
            let (mut stream, addr) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("接受连接失败：{}", e);
                    continue;
                }
            };
            debug!("[ID{}]新的连接：{}", id, addr);

            let app = Arc::clone(&app);
            tokio::spawn(async move {
                handle_connection(&mut stream, id, app).await;
            });
            id += 1;
        }
    }
}

/// # 连接处理器
///
/// 负责单个 TCP 流的生命周期：读取并解析请求、分发、写回响应，最后记录请求事件。
async fn handle_connection(stream: &mut TcpStream, id: u128, app: Arc<App>) {
    let buffer = match read_request(stream).await {
        Ok(Incoming::Complete(buffer)) => buffer,
        Ok(Incoming::Oversized(declared)) => {
            warn!("[ID{}]请求声明的Content-Length为{}，超出上限", id, declared);
            let response = app.reject(Exception::PayloadTooLarge, id);
            if let Err(e) = stream.write_all(&response.as_bytes()).await {
                error!("[ID{}]发送响应失败: {}", id, e);
            }
            let _ = stream.flush().await;
            return;
        }
        Ok(Incoming::Closed) => return, // 客户端主动关闭连接
        Err(e) => {
            error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
            return;
        }
    };
    debug!("[ID{}]HTTP请求接收完毕，{} bytes", id, buffer.len());

    let start_time = Instant::now();

    let (request, response) = match Request::try_from(&buffer, id) {
        Ok(mut request) => {
            let response = app.handle(&mut request, id);
            (Some(request), response)
        }
        Err(e) => (None, app.reject(e, id)),
    };

    debug!(
        "[ID{}]HTTP响应构建完成，服务端用时{}ms。",
        id,
        start_time.elapsed().as_millis()
    );

    if let Err(e) = stream.write_all(&response.as_bytes()).await {
        error!("[ID{}]发送响应失败: {}", id, e);
    }
    let _ = stream.flush().await;

    if let Some(request) = request {
        info!(
            "[ID{}] {}, {}, {}, {}",
            id,
            request.method(),
            request.normalized_path(),
            response.status_code(),
            response.information(),
        );
        app.log_request(&request, &response);
    }
}

/// 一次读取的结果
enum Incoming {
    /// 对端在任何数据到达前关闭了连接
    Closed,
    Complete(Vec<u8>),
    /// 声明的请求体长度超过 [`MAX_REQUEST_BYTES`]，不再继续读取
    Oversized(usize),
}

/// 读取一个完整的请求：先读到请求头结束，再按 `Content-Length` 读完请求体。
async fn read_request(stream: &mut TcpStream) -> io::Result<Incoming> {
    let mut buffer = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        if let Some(end) = request::header_block_end(&buffer) {
            let declared = request::content_length(&buffer[..end]);
            if declared > MAX_REQUEST_BYTES {
                return Ok(Incoming::Oversized(declared));
            }
            // declared 已受上限约束，相加不会溢出
            let expected = end + HEADER_TERMINATOR_LEN + declared;
            if buffer.len() >= expected {
                buffer.truncate(expected);
                break;
            }
        }
        if buffer.len() >= MAX_REQUEST_BYTES {
            warn!("请求超过{}字节，按已读取内容处理", MAX_REQUEST_BYTES);
            break;
        }

        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
    }

    match buffer.is_empty() {
        true => Ok(Incoming::Closed),
        false => Ok(Incoming::Complete(buffer)),
    }
}
