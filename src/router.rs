// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由表
//!
//! 路由按注册顺序追加保存，分发时线性扫描、首个命中者胜出，因此允许重复注册。
//! 同一个 `Router` 既充当应用的根路由表，也充当可挂载的子路由表。

use crate::{
    chain::{Chain, Handler},
    param::HttpRequestMethod,
    path,
};
use log::debug;

/// 一条已注册的路由，入表后不再修改
#[derive(Clone)]
pub struct Route {
    method: HttpRequestMethod,
    path: String,
    chain: Chain,
}

impl Route {
    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// 方法与规范化路径都完全相等才算命中
    pub fn matches(&self, method: HttpRequestMethod, path: &str) -> bool {
        self.method == method && self.path == path
    }
}

/// 按 HTTP 方法选出的注册函数
pub type Registrar = fn(&mut Router, &str, Vec<Handler>);

#[derive(Clone, Default)]
pub struct Router {
    base: String,
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以给定前缀创建路由表
    pub fn with_base(base: &str) -> Self {
        let mut router = Self::new();
        router.set_base(base);
        router
    }

    /// 设置前缀，只影响之后注册的路由
    pub fn set_base(&mut self, base: &str) {
        self.base = path::normalize(base);
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// 追加一条路由，路径为 `normalize(base) + normalize(path)`，结果为空时为 `/`
    pub fn add_route<I>(&mut self, method: HttpRequestMethod, route_path: &str, chain: I)
    where
        I: IntoIterator<Item = Handler>,
    {
        let endpoint = path::join(&self.base, route_path);
        debug!("注册路由：{} {}", method, endpoint);
        self.routes.push(Route {
            method,
            path: endpoint,
            chain: chain.into_iter().collect(),
        });
    }

    pub fn get<I: IntoIterator<Item = Handler>>(&mut self, route_path: &str, chain: I) {
        self.add_route(HttpRequestMethod::Get, route_path, chain);
    }

    pub fn post<I: IntoIterator<Item = Handler>>(&mut self, route_path: &str, chain: I) {
        self.add_route(HttpRequestMethod::Post, route_path, chain);
    }

    pub fn put<I: IntoIterator<Item = Handler>>(&mut self, route_path: &str, chain: I) {
        self.add_route(HttpRequestMethod::Put, route_path, chain);
    }

    pub fn patch<I: IntoIterator<Item = Handler>>(&mut self, route_path: &str, chain: I) {
        self.add_route(HttpRequestMethod::Patch, route_path, chain);
    }

    pub fn delete<I: IntoIterator<Item = Handler>>(&mut self, route_path: &str, chain: I) {
        self.add_route(HttpRequestMethod::Delete, route_path, chain);
    }

    /// 方法到注册函数的映射。没有专用注册函数的方法（HEAD、OPTIONS）返回 `None`。
    pub fn registrar(method: HttpRequestMethod) -> Option<Registrar> {
        match method {
            HttpRequestMethod::Get => Some(Router::get::<Vec<Handler>> as Registrar),
            HttpRequestMethod::Post => Some(Router::post::<Vec<Handler>> as Registrar),
            HttpRequestMethod::Put => Some(Router::put::<Vec<Handler>> as Registrar),
            HttpRequestMethod::Patch => Some(Router::patch::<Vec<Handler>> as Registrar),
            HttpRequestMethod::Delete => Some(Router::delete::<Vec<Handler>> as Registrar),
            HttpRequestMethod::Head | HttpRequestMethod::Options => None,
        }
    }

    /// 把子路由表按原注册顺序并入当前表。
    ///
    /// 子表保存的路径已包含子表前缀，这里把它当作普通路径重新注册，
    /// 因此当前表自己的前缀会再加在最前面。
    pub fn mount(&mut self, router: Router) {
        for route in router.routes {
            let chain: Vec<Handler> = route.chain.iter().cloned().collect();
            match Self::registrar(route.method) {
                Some(register) => register(self, &route.path, chain),
                None => self.add_route(route.method, &route.path, chain),
            }
        }
    }

    /// 线性扫描，返回第一条命中的路由
    pub fn find(&self, method: HttpRequestMethod, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.matches(method, path))
    }
}
