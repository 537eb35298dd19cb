// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 处理器链
//!
//! 每个路由绑定一条有序的处理器链。处理器通过调用 [`Next::run`] 把控制权交给下一个处理器，
//! 或者自行写出响应结束这次分发。`Next` 持有本次请求独有的游标，不同请求之间互不可见。

use crate::{request::Request, response::Response};
use std::sync::Arc;

/// 处理器：中间件与终结处理器共用同一签名。
pub type Handler = Arc<dyn Fn(&mut Request, &mut Response, &mut Next) + Send + Sync>;

/// 一条路由上的处理器序列。
pub type Chain = Arc<[Handler]>;

/// 把闭包包装成 [`Handler`]。
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut Request, &mut Response, &mut Next) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// 单次分发的链执行状态。
pub struct Next {
    chain: Chain,
    cursor: usize,
}

impl Next {
    /// 从下标 0 开始执行处理器链。空链直接以空响应体终结。
    pub fn start(chain: Chain, request: &mut Request, response: &mut Response) {
        let first = match chain.first() {
            Some(h) => Arc::clone(h),
            None => {
                response.end();
                return;
            }
        };
        let mut next = Next { chain, cursor: 0 };
        first(request, response, &mut next);
    }

    /// 推进到下一个处理器。
    ///
    /// 游标已经位于最后一个处理器时，以空写入终结响应而不再前进；
    /// 响应若已终结，这次终结是空操作。
    pub fn run(&mut self, request: &mut Request, response: &mut Response) {
        if self.cursor + 1 >= self.chain.len() {
            if !response.is_finished() {
                response.end();
            }
            return;
        }
        self.cursor += 1;
        let handler = Arc::clone(&self.chain[self.cursor]);
        handler(request, response, self);
    }

    /// 当前正在执行的处理器下标
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}
