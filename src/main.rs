// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # rewind 演示服务
//!
//! 加载配置、初始化日志系统，注册几条示例路由与一个挂载的子路由表，然后开始监听。

use log::info;
use rewind::{handler, App, Body, Config, Router};
use serde_json::json;
use tokio::runtime::Builder;

use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // 1. 初始化日志系统：通过外部 YAML 配置级别与输出目的地
    log4rs::init_file("config/log4rs.yaml", Default::default())?;
    rewind::logger::install_panic_hook();

    // 2. 环境配置加载：从 TOML 文件读取运行参数
    let config = Config::from_toml("config/development.toml")?;
    info!("配置文件已载入");

    // 3. 异步运行时定制：根据配置文件分配工作线程数
    let runtime = Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let app = build_app(&config);
        app.listen(config.port(), |addr| {
            info!("服务已就绪：http://{}", addr);
        })
        .await
    })?;
    Ok(())
}

fn build_app(config: &Config) -> App {
    let mut app = App::from_config(config);

    app.get("/", vec![handler(|_, res, _| {
        res.send("rewind is running");
    })]);

    app.get("/health", vec![
        handler(|req, res, next| {
            res.set_headers([("Cache-Control", "no-store")]);
            next.run(req, res);
        }),
        handler(|_, res, _| {
            res.send(json!({ "status": "ok" }));
        }),
    ]);

    app.post("/echo", vec![handler(|req, res, _| {
        let body = req.body().to_string();
        res.send(body);
    })]);

    let mut users = Router::with_base("/api");
    users.get("/users", vec![handler(|req, res, _| {
        res.send(json!({ "users": [], "query": req.query() }));
    })]);
    users.delete("/users", vec![handler(|_, res, _| {
        res.set_status(204);
        res.end();
    })]);
    app.mount(users);

    app.set_error_override(|e| {
        Body::from(json!({ "error": e.message(), "status": e.status(), "service": "rewind" }))
    });

    app
}
