// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 结构化事件日志
//!
//! 分发引擎只认识 [`LogSink::write`]。事件落盘、控制台镜像与过期清理都在这里完成：
//! - [`FileSink`] 按 `日志根目录/类型/rewind-log-日期.log` 追加写入，并镜像到 `log` 门面。
//! - [`QueuedSink`] 通过无界通道把写入转交给后台阻塞任务，调用方永远不会等待 I/O。
//! - [`NullSink`] 在关闭日志时丢弃所有事件。

use chrono::{DateTime, NaiveDate, Utc};
use log::{error, info, warn};
use serde_json::Value;
use std::{
    fmt,
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{sync::mpsc, task::JoinHandle};

/// 日志文件名前缀
const LOG_FILE_PREFIX: &str = "rewind-log-";
/// 处理器崩溃信息使用的日志目标
pub const PANIC_TARGET: &str = "rewind::panic";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Info,
    Error,
    Request,
    Success,
}

impl LogKind {
    pub const ALL: [LogKind; 4] = [LogKind::Info, LogKind::Error, LogKind::Request, LogKind::Success];

    /// 首字母大写的名称，用于日志文件头
    fn title(&self) -> &'static str {
        match self {
            LogKind::Info => "Info",
            LogKind::Error => "Error",
            LogKind::Request => "Request",
            LogKind::Success => "Success",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogKind::Info => write!(f, "info"),
            LogKind::Error => write!(f, "error"),
            LogKind::Request => write!(f, "request"),
            LogKind::Success => write!(f, "success"),
        }
    }
}

/// 发往日志汇的一条事件
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub kind: LogKind,
    pub timestamp: DateTime<Utc>,
    pub payload: Value,
}

impl LogEvent {
    pub fn new(kind: LogKind, payload: Value) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// 事件日志汇。实现方自行决定输出位置与保留策略。
#[cfg_attr(test, mockall::automock)]
pub trait LogSink: Send + Sync {
    fn write(&self, event: LogEvent);
}

pub struct NullSink;

impl LogSink for NullSink {
    fn write(&self, _event: LogEvent) {}
}

/// 按类型与日期分文件写入的日志汇
pub struct FileSink {
    root: PathBuf,
}

impl FileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 某类事件在某天对应的日志文件
    pub fn file_for(&self, kind: LogKind, date: NaiveDate) -> PathBuf {
        self.root
            .join(kind.to_string())
            .join(format!("{}{}.log", LOG_FILE_PREFIX, date.format("%Y-%m-%d")))
    }

    fn append(&self, event: &LogEvent) -> io::Result<()> {
        let path = self.file_for(event.kind, event.timestamp.date_naive());
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let date = event.timestamp.format("%Y-%m-%d");
        let time = event.timestamp.format("%H:%M:%S%.3fZ");
        let payload = serde_json::to_string_pretty(&event.payload)?;
        let entry = format!("Log: [{}] - [{}]: {},\n", time, event.kind, payload);

        let fresh = !path.exists();
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if fresh {
            write!(
                file,
                "{} logs for [{}] starting at [{}]\n\n",
                event.kind.title(),
                date,
                time
            )?;
        }
        file.write_all(entry.as_bytes())
    }
}

impl LogSink for FileSink {
    fn write(&self, event: LogEvent) {
        match event.kind {
            LogKind::Error => error!(target: "rewind::events", "{}: {}", event.kind, event.payload),
            _ => info!(target: "rewind::events", "{}: {}", event.kind, event.payload),
        }
        if let Err(e) = self.append(&event) {
            error!("写入日志文件失败（{}）：{}", self.root.display(), e);
        }
    }
}

/// 把写入排队到后台任务的日志汇
pub struct QueuedSink {
    sender: mpsc::UnboundedSender<LogEvent>,
}

impl QueuedSink {
    /// 启动后台写入任务。必须在 tokio 运行时内调用；所有 `QueuedSink` 被丢弃后任务结束。
    pub fn spawn(inner: Arc<dyn LogSink>) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<LogEvent>();
        let handle = tokio::task::spawn_blocking(move || {
            while let Some(event) = receiver.blocking_recv() {
                inner.write(event);
            }
        });
        (Self { sender }, handle)
    }
}

impl LogSink for QueuedSink {
    fn write(&self, event: LogEvent) {
        if self.sender.send(event).is_err() {
            warn!("日志后台任务已退出，事件被丢弃");
        }
    }
}

/// 用 `log` 门面替换默认的 panic 钩子，使崩溃信息与其它诊断输出走同一套 appender。
///
/// 分发引擎仍会捕获处理器崩溃并写出 500，这里只负责输出位置。
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        error!(target: PANIC_TARGET, "{}", info);
    }));
}

/// 删除日期早于 `today - ttl_days` 的日志文件，返回删除数量。
pub fn clear_expired_logs(root: &Path, ttl_days: u64, today: NaiveDate) -> io::Result<usize> {
    let mut removed = 0;
    for kind in LogKind::ALL {
        let dir = root.join(kind.to_string());
        if !dir.is_dir() {
            continue;
        }
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let date = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_prefix(LOG_FILE_PREFIX))
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
            let Some(date) = date else { continue };
            if (today - date).num_days() > ttl_days as i64 {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
    }
    Ok(removed)
}
