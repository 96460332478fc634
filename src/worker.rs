// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Worker 线程池
//!
//! 固定数量的 OS 线程从连接队列中取出连接，读取请求、解析、分发并发送响应，最后关闭连接。
//!
//! 每个 worker 的状态流转：
//! 空闲 → 取出连接 → 读取 → 解析 → 分发（GET / POST / HEAD / 错误）→ 响应 → 关闭 → 空闲。
//!
//! 取消是协作式的：worker 总是先完成手头的连接，再检查取消标志并退出。
//! 单个连接上的读写失败只会放弃该连接，不会影响线程池。

use crate::{
    exception::Exception,
    param::{HttpRequestMethod, MAX_REQUEST_SIZE},
    queue::{ConnectionQueue, ConnectionTask},
    request::Request,
    resolver::StaticResolver,
    response::{send, Response},
};

use log::{debug, error, info, warn};

use std::{
    io::Read,
    net::Shutdown,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

/// 所有 worker 共享的只读上下文
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub resolver: StaticResolver,
    /// 读取请求的超时时间，`None` 表示一直等待
    pub read_timeout: Option<Duration>,
}

struct Worker {
    id: usize,
    thread: Option<JoinHandle<()>>,
}

pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// 启动 `size` 个 worker 线程，线程名为 `worker-<n>`。
    pub fn spawn(
        size: usize,
        queue: Arc<ConnectionQueue>,
        cancel: Arc<AtomicBool>,
        context: Arc<WorkerContext>,
    ) -> Result<Self, Exception> {
        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            let queue = Arc::clone(&queue);
            let cancel = Arc::clone(&cancel);
            let context = Arc::clone(&context);
            let thread = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || worker_loop(id, &queue, &cancel, &context))?;
            workers.push(Worker {
                id,
                thread: Some(thread),
            });
        }
        debug!("已启动{}个worker线程", size);
        Ok(Self { workers })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// 等待所有 worker 退出。调用前应先设置取消标志并关闭队列。
    pub fn join(&mut self) {
        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    error!("worker-{}异常退出", worker.id);
                }
            }
        }
    }
}

fn worker_loop(
    worker_id: usize,
    queue: &ConnectionQueue,
    cancel: &AtomicBool,
    context: &WorkerContext,
) {
    while !cancel.load(Ordering::SeqCst) {
        let task = match queue.pop() {
            Some(task) => task,
            None => break,
        };
        let id = task.id;
        if let Err(e) = handle_connection(task, context) {
            warn!("[ID{}]放弃连接: {}", id, e);
        }
    }
    debug!("worker-{}退出", worker_id);
}

/// 处理一个连接的完整生命周期，连接在函数返回时关闭。
///
/// 只读取一次，最多 `MAX_REQUEST_SIZE` 字节；对端未发送任何数据就关闭时不发送响应。
pub fn handle_connection(task: ConnectionTask, context: &WorkerContext) -> Result<(), Exception> {
    let ConnectionTask {
        id,
        mut stream,
        peer,
    } = task;
    stream.set_read_timeout(context.read_timeout)?;

    let mut buffer = [0u8; MAX_REQUEST_SIZE];
    let bytes_read = stream.read(&mut buffer)?;
    if bytes_read == 0 {
        debug!("[ID{}]客户端主动关闭连接", id);
        return Ok(());
    }
    let start_time = Instant::now();
    debug!("[ID{}]读取到{}字节", id, bytes_read);

    let request = Request::parse(&buffer[..bytes_read], id);
    let response = dispatch(&request, &context.resolver)?;
    send(&mut stream, &response.as_bytes())?;

    info!(
        "[ID{}] {} \"{} {} {}\" {} {} {}B {}ms",
        id,
        peer,
        request.method(),
        request.raw_uri(),
        request.version(),
        response.status_code(),
        response.information(),
        response.content_length(),
        start_time.elapsed().as_millis()
    );

    if let Err(e) = stream.shutdown(Shutdown::Write) {
        debug!("[ID{}]关闭写端失败: {}", id, e);
    }
    Ok(())
}

/// 为一个已解析的请求生成响应。
///
/// 解析错误直接以对应状态码和空响应体返回；GET 与 HEAD 交给静态资源解析，
/// HEAD 保留 Content-Length 但不发送响应体；POST 目前总是返回 200 和空响应体。
pub fn dispatch(request: &Request, resolver: &StaticResolver) -> Result<Response, Exception> {
    if let Some(code) = request.parse_status() {
        return Ok(Response::new(code));
    }
    let response = match request.method() {
        HttpRequestMethod::Get => Response::from(resolver.resolve(request)?),
        HttpRequestMethod::Head => Response::from(resolver.resolve(request)?).head_only(),
        HttpRequestMethod::Post => {
            debug!("[ID{}]POST请求尚未实现，返回空响应", request.id());
            Response::new(200)
        }
        HttpRequestMethod::Unsupported => Response::new(405),
    };
    Ok(response)
}
