// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了服务器在启动和请求处理生命周期中可能出现的各类异常情况。
//!
//! - **启动期错误**：webroot 不存在、配置文件无法解析、端口绑定失败等，这些错误在打开任何
//!   socket 之前就会被报告给运维人员，属于致命错误。
//! - **连接期错误**：socket 读写或文件读取失败，只会放弃当前连接，不会影响线程池。
//!
//! 协议层面的错误（请求行格式错误、不支持的方法或版本）不在此列，它们以状态码的形式
//! 记录在 `Request::parse_status` 中，并作为正常的 HTTP 响应返回给客户端。

use std::{fmt, io};

/// 服务器运行过程中发生的异常类型。
#[derive(Debug)]
pub enum Exception {
    /// 配置的 webroot 不存在。
    WebrootNotFound(String),
    /// 配置的 webroot 存在，但不是一个目录。
    WebrootNotDirectory(String),
    /// 配置文件无法读取。
    ConfigUnreadable(String, io::Error),
    /// 配置文件不是合法的 TOML，或字段类型不匹配。
    ConfigMalformed(String, String),
    /// 监听地址无法解析为 socket 地址。
    AddressUnresolvable(String),
    /// 绑定或监听端口失败（例如端口已被占用）。
    BindFailed(String, io::Error),
    /// 服务器已经启动，不能重复调用 `start`。
    AlreadyStarted,
    /// 日志系统初始化失败。
    LoggerInit(String),
    /// socket 或文件 I/O 失败，只影响当前连接。
    Io(io::Error),
}

use Exception::*;

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebrootNotFound(p) => write!(f, "The webroot {} does not exist", p),
            WebrootNotDirectory(p) => write!(f, "The webroot {} is not a directory", p),
            ConfigUnreadable(p, e) => write!(f, "Couldn't read config file {}: {}", p, e),
            ConfigMalformed(p, e) => write!(f, "Malformed config file {}: {}", p, e),
            AddressUnresolvable(a) => write!(f, "Couldn't resolve listen address {}", a),
            BindFailed(a, e) => write!(f, "Couldn't bind {}: {}", a, e),
            AlreadyStarted => write!(f, "Server has already been started"),
            LoggerInit(e) => write!(f, "Couldn't initialize logger: {}", e),
            Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Exception {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigUnreadable(_, e) | BindFailed(_, e) | Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Exception {
    fn from(e: io::Error) -> Self {
        Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_names_the_path() {
        let e = WebrootNotFound("/no/such/dir".to_string());
        assert_eq!(e.to_string(), "The webroot /no/such/dir does not exist");
    }

    #[test]
    fn test_io_error_converts_and_keeps_source() {
        let e: Exception = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
        assert!(matches!(e, Io(_)));
        assert!(e.source().is_some());
        assert!(AlreadyStarted.source().is_none());
    }
}
