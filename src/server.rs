// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 服务器
//!
//! 持有只读配置、取消标志与连接队列，负责启动和停止监听线程与 worker 线程池。
//!
//! ```no_run
//! use minihttpd::{Config, Server};
//!
//! let config = Config::new().with_www_root("www").with_port(0);
//! let mut server = Server::new(config)?;
//! let addr = server.start()?;
//! println!("listening on {}", addr);
//! server.stop();
//! # Ok::<(), minihttpd::Exception>(())
//! ```

use crate::{
    config::Config,
    exception::Exception,
    listener,
    queue::ConnectionQueue,
    resolver::StaticResolver,
    worker::{WorkerContext, WorkerPool},
};

use log::{debug, error, info};

use std::{
    net::{SocketAddr, ToSocketAddrs},
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::JoinHandle,
};

pub struct Server {
    config: Arc<Config>,
    resolver: StaticResolver,
    cancel: Arc<AtomicBool>,
    queue: Arc<ConnectionQueue>,
    local_addr: Option<SocketAddr>,
    listener: Option<JoinHandle<()>>,
    pool: Option<WorkerPool>,
}

impl Server {
    /// 创建服务器但不打开任何 socket。webroot 不存在或不是目录时返回错误。
    pub fn new(config: Config) -> Result<Self, Exception> {
        let resolver = StaticResolver::new(Path::new(config.www_root()))?;
        info!("www root: {}", resolver.webroot().display());
        Ok(Self {
            config: Arc::new(config),
            resolver,
            cancel: Arc::new(AtomicBool::new(false)),
            queue: Arc::new(ConnectionQueue::new()),
            local_addr: None,
            listener: None,
            pool: None,
        })
    }

    /// 绑定端口并启动监听线程与 worker，立即返回实际监听的地址。
    ///
    /// 每个 `Server` 只能启动一次，停止后也不能再次启动。
    pub fn start(&mut self) -> Result<SocketAddr, Exception> {
        if self.listener.is_some() || self.cancel.load(Ordering::SeqCst) {
            return Err(Exception::AlreadyStarted);
        }

        let listen_address = self.config.listen_address();
        let addr = listen_address
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| Exception::AddressUnresolvable(listen_address.clone()))?;
        let tcp_listener = listener::bind(addr, self.config.backlog())?;
        let local_addr = tcp_listener.local_addr()?;
        info!("服务端将在{}上监听Socket连接", local_addr);

        let context = Arc::new(WorkerContext {
            resolver: self.resolver.clone(),
            read_timeout: self.config.read_timeout(),
        });
        let worker_threads = self.config.worker_threads();
        let mut pool = WorkerPool::spawn(
            worker_threads,
            Arc::clone(&self.queue),
            Arc::clone(&self.cancel),
            context,
        )?;

        let handle = match listener::spawn(
            tcp_listener,
            Arc::clone(&self.queue),
            Arc::clone(&self.cancel),
        ) {
            Ok(handle) => handle,
            Err(e) => {
                self.cancel.store(true, Ordering::SeqCst);
                self.queue.close();
                pool.join();
                return Err(e);
            }
        };

        info!("服务器已启动，worker线程数：{}", worker_threads);
        self.local_addr = Some(local_addr);
        self.listener = Some(handle);
        self.pool = Some(pool);
        Ok(local_addr)
    }

    /// 停止服务器并等待所有线程退出。
    ///
    /// 正在处理的连接会先处理完；队列中尚未被取走的连接直接关闭。重复调用没有副作用。
    pub fn stop(&mut self) {
        let already_cancelled = self.cancel.swap(true, Ordering::SeqCst);
        if let Some(handle) = self.listener.take() {
            if let Some(addr) = self.local_addr {
                listener::wake(addr);
            }
            if handle.join().is_err() {
                error!("监听线程异常退出");
            }
        }
        self.queue.close();
        if let Some(mut pool) = self.pool.take() {
            pool.join();
        }
        if !already_cancelled {
            info!("服务器已停止");
        }
    }

    /// 启动服务器并阻塞当前线程，直到收到 Ctrl-C 后停止。
    pub fn run(mut self) -> Result<(), Exception> {
        if !self.is_running() {
            self.start()?;
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let signal = runtime.block_on(tokio::signal::ctrl_c());
        match signal {
            Ok(()) => info!("收到停机信号，正在退出..."),
            Err(ref e) => error!("无法监听停机信号: {}", e),
        }
        self.stop();
        signal.map_err(Exception::from)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.listener.is_some()
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if self.is_running() {
            debug!("Server被丢弃，自动停止");
            self.stop();
        }
    }
}
