#[cfg(test)]
mod logging_tests {
    //! 文件日志汇与排队写入的端到端测试：按配置构建应用，经排队日志汇把事件落到临时目录。

    use chrono::{Duration as Days, Utc};
    use rewind::logger::{FileSink, QueuedSink};
    use rewind::{handler, App, Config, HttpRequestMethod, LogKind, Request};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn config_for(dir: &TempDir, extra: &str) -> Config {
        let text = format!(
            "port = 0\nlocal = true\nworker_threads = 1\nlogs_path = \"{}\"\n{}",
            dir.path().display(),
            extra
        );
        Config::from_toml_str(&text)
    }

    #[tokio::test]
    async fn test_request_event_lands_in_daily_file() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(FileSink::new(dir.path()));
        let (queued, worker) = QueuedSink::spawn(sink.clone());

        let mut app = App::new();
        app.set_sink(Arc::new(queued));
        app.post("/items", vec![handler(|_, res, _| {
            res.set_status(201);
            res.send("created");
        })]);

        let mut request =
            Request::new(HttpRequestMethod::Post, "/items/?tag=a").with_body("payload");
        let response = app.handle(&mut request, 0);
        app.log_request(&request, &response);

        // 丢弃应用即关闭队列，等待后台任务写完
        drop(app);
        worker.await.unwrap();

        let file = sink.file_for(LogKind::Request, Utc::now().date_naive());
        let content = fs::read_to_string(file).unwrap();
        assert!(content.starts_with("Request logs for ["));
        assert!(content.contains("Log: ["));
        assert!(content.contains("\"path\": \"/items\""));
        assert!(content.contains("\"query\": \"tag=a\""));
        assert!(content.contains("\"status\": 201"));
        assert!(content.contains("\"body\": \"payload\""));
    }

    #[tokio::test]
    async fn test_from_config_sweeps_expired_files() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path());
        let today = Utc::now().date_naive();

        let stale = sink.file_for(LogKind::Info, today - Days::days(30));
        let fresh = sink.file_for(LogKind::Info, today - Days::days(1));
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();
        fs::write(&fresh, "new").unwrap();

        let app = App::from_config(&config_for(&dir, "log_ttl_days = 7"));
        app.sweep_expired_logs();

        assert!(!stale.exists());
        assert!(fresh.exists());
    }

    #[tokio::test]
    async fn test_logging_disabled_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let app = App::from_config(&config_for(&dir, "logging_enabled = false"));

        let mut request = Request::new(HttpRequestMethod::Get, "/nothing");
        let response = app.handle(&mut request, 0);
        app.log_request(&request, &response);
        drop(app);

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_error_events_share_one_file_per_day() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path());
        let app = {
            let mut app = App::new();
            app.set_sink(Arc::new(FileSink::new(dir.path())));
            app
        };

        app.log(LogKind::Error, serde_json::json!({ "message": "first" }));
        app.log(LogKind::Error, serde_json::json!({ "message": "second" }));

        let content =
            fs::read_to_string(sink.file_for(LogKind::Error, Utc::now().date_naive())).unwrap();
        assert_eq!(content.matches("Error logs for [").count(), 1);
        assert_eq!(content.matches("Log: [").count(), 2);
        assert!(content.contains("[error]"));
    }
}
