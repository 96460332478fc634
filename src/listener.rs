// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 监听线程
//!
//! 绑定一个 TCP socket 并循环接受连接。每个连接只做 `accept`，随即被放入连接队列，
//! 所有阻塞式读取都发生在 worker 中，因此慢速客户端不会拖住新连接的接受。

use crate::{
    exception::Exception,
    queue::{ConnectionQueue, ConnectionTask},
};

use log::{debug, error, info};
use tokio::net::TcpSocket;

use std::{
    io,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

/// 唤醒监听线程时连接自身的超时时间
const WAKE_TIMEOUT: Duration = Duration::from_secs(1);

/// 绑定并以指定的 backlog 开始监听，返回阻塞模式的标准库监听器。
///
/// 标准库无法设置 backlog，这里借助 tokio 的 `TcpSocket` 完成 socket 的创建与监听，
/// 随后转换回 `std::net::TcpListener` 交给监听线程使用。
pub fn bind(addr: SocketAddr, backlog: u32) -> Result<TcpListener, Exception> {
    let bind_failed = |e: io::Error| Exception::BindFailed(addr.to_string(), e);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()?;
    let listener = runtime
        .block_on(async {
            let socket = match addr {
                SocketAddr::V4(_) => TcpSocket::new_v4()?,
                SocketAddr::V6(_) => TcpSocket::new_v6()?,
            };
            socket.set_reuseaddr(true)?;
            socket.bind(addr)?;
            Ok::<_, io::Error>(socket.listen(backlog)?.into_std()?)
        })
        .map_err(bind_failed)?;
    listener.set_nonblocking(false).map_err(bind_failed)?;
    Ok(listener)
}

/// 在名为 `listener` 的线程中运行接受循环
pub fn spawn(
    listener: TcpListener,
    queue: Arc<ConnectionQueue>,
    cancel: Arc<AtomicBool>,
) -> Result<JoinHandle<()>, Exception> {
    let handle = thread::Builder::new()
        .name("listener".to_string())
        .spawn(move || accept_loop(listener, &queue, &cancel))?;
    Ok(handle)
}

fn accept_loop(listener: TcpListener, queue: &ConnectionQueue, cancel: &AtomicBool) {
    let mut id: u128 = 0;
    loop {
        if cancel.load(Ordering::SeqCst) {
            break;
        }
        match listener.accept() {
            Ok((stream, peer)) => {
                if cancel.load(Ordering::SeqCst) {
                    debug!("监听线程被唤醒以退出，来自{}", peer);
                    break;
                }
                debug!("[ID{}]新的连接：{}", id, peer);
                if queue.push(ConnectionTask { id, stream, peer }).is_err() {
                    debug!("[ID{}]连接队列已关闭，丢弃连接", id);
                    break;
                }
                id += 1;
            }
            Err(e) => {
                if cancel.load(Ordering::SeqCst) {
                    break;
                }
                error!("接受连接时遇到错误: {}", e);
                // 文件描述符耗尽时 accept 会立即失败，稍作等待
                thread::sleep(Duration::from_millis(10));
            }
        }
    }
    info!("监听线程退出，共接受{}个连接", id);
}

/// 连接监听地址一次，使阻塞在 `accept` 上的监听线程返回并检查取消标志。
pub fn wake(addr: SocketAddr) {
    let target = match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), addr.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), addr.port())
        }
        _ => addr,
    };
    if let Err(e) = TcpStream::connect_timeout(&target, WAKE_TIMEOUT) {
        debug!("唤醒监听线程失败（监听线程可能已退出）: {}", e);
    }
}
