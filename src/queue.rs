// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 连接队列
//!
//! 监听线程与 worker 之间唯一共享的可变结构：一个线程安全、阻塞式、先进先出、容量不限的队列。
//! 生产者（监听线程）永远不会阻塞；消费者（worker）在队列为空时无超时地等待，
//! 直到有新连接到达或队列被关闭。

use std::{
    collections::VecDeque,
    net::{SocketAddr, TcpStream},
    sync::{Condvar, Mutex, MutexGuard},
};

use log::warn;

/// 一个已接受、等待处理的 TCP 连接。
///
/// 在被 worker 取出之前归队列所有，之后归该 worker 独占，drop 时关闭连接。
#[derive(Debug)]
pub struct ConnectionTask {
    pub id: u128,
    pub stream: TcpStream,
    pub peer: SocketAddr,
}

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

pub struct ConnectionQueue<T = ConnectionTask> {
    state: Mutex<QueueState<T>>,
    available: Condvar,
}

impl<T> ConnectionQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("连接队列的锁被污染，恢复并继续");
                poisoned.into_inner()
            }
        }
    }

    /// 放入一个连接，不会阻塞。队列已关闭时把连接原样退回。
    pub fn push(&self, item: T) -> Result<(), T> {
        let mut state = self.lock();
        if state.closed {
            return Err(item);
        }
        state.items.push_back(item);
        drop(state);
        self.available.notify_one();
        Ok(())
    }

    /// 取出最早放入的连接，队列为空时阻塞等待。
    ///
    /// 队列关闭后返回 `None`，此时尚未被取走的连接会随队列一起被丢弃。
    pub fn pop(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            state = match self.available.wait(state) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }

    /// 关闭队列并唤醒所有等待中的 worker，丢弃排队中的连接。
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.items.clear();
        drop(state);
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for ConnectionQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread, time::Duration};

    #[test]
    fn test_fifo_order() {
        let queue = ConnectionQueue::new();
        for i in 0..5 {
            queue.push(i).unwrap();
        }
        assert_eq!(queue.len(), 5);
        for i in 0..5 {
            assert_eq!(queue.pop(), Some(i));
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_blocks_until_push() {
        let queue = Arc::new(ConnectionQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop())
        };

        thread::sleep(Duration::from_millis(50));
        queue.push("late").unwrap();

        assert_eq!(consumer.join().unwrap(), Some("late"));
    }

    #[test]
    fn test_close_wakes_all_consumers() {
        let queue: Arc<ConnectionQueue<u32>> = Arc::new(ConnectionQueue::new());
        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.pop())
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        queue.close();

        for c in consumers {
            assert_eq!(c.join().unwrap(), None);
        }
        assert!(queue.is_closed());
    }

    #[test]
    fn test_push_after_close_is_rejected() {
        let queue = ConnectionQueue::new();
        queue.push(1).unwrap();
        queue.close();

        assert_eq!(queue.push(2), Err(2));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_each_item_consumed_once() {
        let queue = Arc::new(ConnectionQueue::new());
        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut got = Vec::new();
                    while let Some(i) = queue.pop() {
                        if i == u32::MAX {
                            break;
                        }
                        got.push(i);
                    }
                    got
                })
            })
            .collect();

        for i in 0..1000u32 {
            queue.push(i).unwrap();
        }
        for _ in 0..4 {
            queue.push(u32::MAX).unwrap();
        }

        let mut all: Vec<u32> = consumers
            .into_iter()
            .flat_map(|c| c.join().unwrap())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..1000).collect::<Vec<_>>());
    }
}
