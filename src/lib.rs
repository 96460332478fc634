// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # minihttpd
//!
//! 一个基于线程池的 HTTP/1.1 静态文件服务器：一个监听线程接受连接并放入队列，
//! 固定数量的 worker 线程从队列中取出连接、解析请求并返回 webroot 下的静态资源。

pub mod config;
pub mod exception;
pub mod listener;
pub mod logger;
pub mod param;
pub mod queue;
pub mod request;
pub mod resolver;
pub mod response;
pub mod server;
pub mod util;
pub mod worker;

pub use config::{CliArgs, Config};
pub use exception::Exception;
pub use param::{HttpRequestMethod, HttpVersion};
pub use queue::{ConnectionQueue, ConnectionTask};
pub use request::Request;
pub use resolver::{resolve_get, Resolved, StaticResolver};
pub use response::{build_response, send, Response};
pub use server::Server;
pub use util::HtmlBuilder;
