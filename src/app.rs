// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 分发引擎
//!
//! `App` 持有路由表、CORS 配置、错误响应器与事件日志汇。注册阶段通过 `&mut self`
//! 修改，`listen` 之后整体放入 `Arc` 只读共享。每个请求的分发流程：
//!
//! 1. 按第一个 `?` 拆分目标，规范化路径，保留原始查询串。
//! 2. 写入 CORS 响应头。
//! 3. 线性扫描路由表，首个方法与路径都相等的路由胜出，从下标 0 开始执行处理器链。
//! 4. 未命中时交给错误响应器返回 404。
//!
//! 整个分发过程处于一个恢复边界之内：处理器链崩溃会被捕获一次、记录为 `error` 事件，
//! 并在响应尚未终结时补写 500。

use crate::{
    chain::{Handler, Next},
    config::Config,
    cors::CorsConfig,
    error::{DispatchError, ErrorResponder},
    exception::Exception,
    logger::{self, FileSink, LogEvent, LogKind, LogSink, NullSink, QueuedSink},
    param::{HttpRequestMethod, NOT_FOUND_MESSAGE},
    request::Request,
    response::{Body, Response},
    router::Router,
};

use chrono::Utc;
use log::{debug, error, info, warn};
use serde_json::{json, Map, Value};

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
    sync::Arc,
};

/// 处理器返回时响应仍未终结所使用的错误信息
const UNFINISHED_MESSAGE: &str = "Response was never finalized";
/// 处理器链崩溃时使用的错误信息
const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

pub struct App {
    router: Router,
    cors: CorsConfig,
    errors: ErrorResponder,
    sink: Arc<dyn LogSink>,
    local: bool,
    retention: Option<(PathBuf, u64)>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            cors: CorsConfig::default(),
            errors: ErrorResponder::new(),
            sink: Arc::new(NullSink),
            local: true,
            retention: None,
        }
    }

    /// 以给定前缀创建应用，之后注册的路由都会带上该前缀
    pub fn with_base(base: &str) -> Self {
        let mut app = Self::new();
        app.router.set_base(base);
        app
    }

    /// 按配置构建应用。开启日志时会启动后台写入任务，因此必须在 tokio 运行时内调用。
    pub fn from_config(config: &Config) -> Self {
        let mut app = Self::with_base(config.base());
        app.configure_cors(config.cors().clone());
        app.local = config.local();
        if config.logging_enabled() {
            let file_sink = Arc::new(FileSink::new(config.logs_path()));
            let (queued, _handle) = QueuedSink::spawn(file_sink);
            app.sink = Arc::new(queued);
            app.retention = config
                .log_ttl_days()
                .map(|ttl| (PathBuf::from(config.logs_path()), ttl));
        }
        app
    }

    /// 替换事件日志汇
    pub fn set_sink(&mut self, sink: Arc<dyn LogSink>) {
        self.sink = sink;
    }

    /// 监听地址是否只绑定回环地址
    pub fn set_local(&mut self, local: bool) {
        self.local = local;
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn router(&self) -> &Router {
        &self.router
    }
}

// --- 注册接口 ---

impl App {
    pub fn add_route<I>(&mut self, method: HttpRequestMethod, path: &str, chain: I)
    where
        I: IntoIterator<Item = Handler>,
    {
        self.router.add_route(method, path, chain);
    }

    pub fn get<I: IntoIterator<Item = Handler>>(&mut self, path: &str, chain: I) {
        self.router.get(path, chain);
    }

    pub fn post<I: IntoIterator<Item = Handler>>(&mut self, path: &str, chain: I) {
        self.router.post(path, chain);
    }

    pub fn put<I: IntoIterator<Item = Handler>>(&mut self, path: &str, chain: I) {
        self.router.put(path, chain);
    }

    pub fn patch<I: IntoIterator<Item = Handler>>(&mut self, path: &str, chain: I) {
        self.router.patch(path, chain);
    }

    pub fn delete<I: IntoIterator<Item = Handler>>(&mut self, path: &str, chain: I) {
        self.router.delete(path, chain);
    }

    /// 并入子路由表，见 [`Router::mount`]
    pub fn mount(&mut self, router: Router) {
        self.router.mount(router);
    }

    /// 注册错误覆盖函数，只有第一次注册生效
    pub fn set_error_override<F>(&mut self, custom: F) -> bool
    where
        F: Fn(&DispatchError) -> Body + Send + Sync + 'static,
    {
        self.errors.set_override(Arc::new(custom))
    }

    pub fn configure_cors(&mut self, cors: CorsConfig) {
        self.cors = cors;
    }

    /// 只设置允许的来源，其余 CORS 配置保持不变
    pub fn cors(&mut self, origins: Vec<String>) {
        self.cors.origins = origins;
    }
}

// --- 分发 ---

impl App {
    /// 分发一个已解析的请求，总是返回一个已终结的响应。
    pub fn handle(&self, request: &mut Request, id: u128) -> Response {
        let mut response = Response::new();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.dispatch(request, &mut response, id)
        }));
        if let Err(cause) = outcome {
            let message = panic_message(&*cause);
            error!("[ID{}]处理请求{}时发生异常：{}", id, request.target(), message);
            self.log(
                LogKind::Error,
                json!({
                    "message": format!("Application Error: {}", message),
                    "target": request.target(),
                }),
            );
            self.errors.respond(&mut response, 500, INTERNAL_ERROR_MESSAGE);
        }

        if !response.is_finished() {
            warn!(
                "[ID{}]{} {} 的处理器链既未调用next也未写出响应",
                id,
                request.method(),
                request.normalized_path()
            );
            self.errors.respond(&mut response, 500, UNFINISHED_MESSAGE);
        }
        response
    }

    fn dispatch(&self, request: &mut Request, response: &mut Response, id: u128) {
        request.split_target();
        response.set_headers(self.cors.headers());

        match self.router.find(request.method(), request.normalized_path()) {
            Some(route) => {
                debug!("[ID{}]命中路由：{} {}", id, route.method(), route.path());
                Next::start(Arc::clone(route.chain()), request, response);
            }
            None => {
                debug!(
                    "[ID{}]未找到路由：{} {}",
                    id,
                    request.method(),
                    request.normalized_path()
                );
                self.errors.respond(response, 404, NOT_FOUND_MESSAGE);
            }
        }
    }

    /// 为无法解析的请求生成错误响应，并记录 `error` 事件。
    pub fn reject(&self, exception: Exception, id: u128) -> Response {
        warn!("[ID{}]拒绝请求：{}", id, exception);
        self.log(
            LogKind::Error,
            json!({ "message": format!("Request Error: {}", exception) }),
        );
        let mut response = Response::new();
        response.set_headers(self.cors.headers());
        self.errors
            .respond(&mut response, exception.status_code(), &exception.to_string());
        response
    }
}

// --- 事件日志 ---

impl App {
    pub fn log(&self, kind: LogKind, payload: Value) {
        self.sink.write(LogEvent::new(kind, payload));
    }

    /// 记录一次完成的请求。应在响应写回客户端之后调用。
    pub fn log_request(&self, request: &Request, response: &Response) {
        self.log(
            LogKind::Request,
            json!({
                "path": request.normalized_path(),
                "query": request.query(),
                "method": request.method().to_string(),
                "status": response.status_code(),
                "request_headers": headers_to_json(request.headers()),
                "response_headers": headers_to_json(response.headers()),
                "body": request.body(),
            }),
        );
    }

    /// 按配置的保留天数清理过期日志文件
    pub fn sweep_expired_logs(&self) {
        let Some((root, ttl)) = &self.retention else {
            return;
        };
        match logger::clear_expired_logs(root, *ttl, Utc::now().date_naive()) {
            Ok(0) => debug!("没有过期的日志文件"),
            Ok(n) => {
                info!("已清理{}个过期日志文件", n);
                self.log(LogKind::Info, json!({ "expired_logs_removed": n }));
            }
            Err(e) => warn!("清理过期日志失败：{}", e),
        }
    }
}

fn headers_to_json(headers: &[(String, String)]) -> Value {
    let map: Map<String, Value> = headers
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    Value::Object(map)
}

fn panic_message(cause: &(dyn Any + Send)) -> String {
    if let Some(s) = cause.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = cause.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
