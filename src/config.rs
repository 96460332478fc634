// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 配置模块
//!
//! 运行参数有三个来源，优先级从高到低：命令行参数、TOML 配置文件、内置默认值。
//! 配置在启动时一次性确定，之后以只读形式传入服务器。

use crate::exception::Exception;

use clap::Parser;
use log::warn;
use serde_derive::{Deserialize, Serialize};

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// 未指定 `--config` 时尝试读取的配置文件
pub const DEFAULT_CONFIG_FILE: &str = "config/development.toml";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    address: String,
    port: u16,
    www_root: String,
    /// 0 表示按 CPU 核心数设置
    worker_threads: usize,
    backlog: u32,
    /// 0 表示不限制
    read_timeout_secs: u64,
    verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8080,
            www_root: ".".to_string(),
            worker_threads: 2,
            backlog: 100,
            read_timeout_secs: 30,
            verbose: false,
        }
    }

    /// 从 TOML 文件读取配置，文件中缺失的字段使用默认值。
    pub fn from_toml<P: AsRef<Path>>(filename: P) -> Result<Self, Exception> {
        let filename = filename.as_ref();
        let origin = filename.display().to_string();
        let str_val = fs::read_to_string(filename)
            .map_err(|e| Exception::ConfigUnreadable(origin.clone(), e))?;
        Self::from_toml_str(&str_val, &origin)
    }

    /// `origin` 仅用于错误信息
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, Exception> {
        let mut config: Self = toml::from_str(content)
            .map_err(|e| Exception::ConfigMalformed(origin.to_string(), e.to_string()))?;
        config.normalize();
        Ok(config)
    }

    /// 按优先级合并配置文件与命令行参数。
    ///
    /// 显式指定的配置文件必须存在；未指定时只有默认配置文件存在才会读取。
    pub fn load(args: &CliArgs) -> Result<Self, Exception> {
        let mut config = match &args.config {
            Some(path) => Self::from_toml(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::from_toml(DEFAULT_CONFIG_FILE)?,
            None => Self::new(),
        };
        config.apply(args);
        Ok(config)
    }

    /// 用命令行中出现的参数覆盖当前配置
    pub fn apply(&mut self, args: &CliArgs) {
        if let Some(host) = &args.host {
            self.address = host.clone();
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(webroot) = &args.webroot {
            self.www_root = webroot.clone();
        }
        if let Some(threads) = args.threads {
            self.worker_threads = threads;
        }
        if let Some(backlog) = args.backlog {
            self.backlog = backlog;
        }
        if args.verbose {
            self.verbose = true;
        }
        self.normalize();
    }

    fn normalize(&mut self) {
        if self.backlog == 0 {
            warn!("backlog被设置为0，将改为1");
            self.backlog = 1;
        }
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.address = address.to_string();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_www_root<P: AsRef<Path>>(mut self, www_root: P) -> Self {
        self.www_root = www_root.as_ref().to_string_lossy().into_owned();
        self
    }

    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }

    pub fn with_read_timeout_secs(mut self, secs: u64) -> Self {
        self.read_timeout_secs = secs;
        self
    }
}

impl Config {
    /// `address:port`，IPv6 地址会加上方括号
    pub fn listen_address(&self) -> String {
        if self.address.contains(':') && !self.address.starts_with('[') {
            format!("[{}]:{}", self.address, self.port)
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }

    pub fn www_root(&self) -> &str {
        &self.www_root
    }

    /// 实际使用的 worker 数量，至少为 1
    pub fn worker_threads(&self) -> usize {
        match self.worker_threads {
            0 => num_cpus::get().max(1),
            n => n,
        }
    }

    pub fn backlog(&self) -> u32 {
        self.backlog
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        match self.read_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// 命令行参数。未出现的参数为 `None`，不会覆盖配置文件中的值。
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "minihttpd")]
#[command(about = "一个基于线程池的 HTTP/1.1 静态文件服务器")]
#[command(version)]
pub struct CliArgs {
    /// TOML 配置文件路径
    #[arg(short, long, env = "MINIHTTPD_CONFIG")]
    pub config: Option<PathBuf>,

    /// 监听地址
    #[arg(short = 'l', long, env = "MINIHTTPD_HOST")]
    pub host: Option<String>,

    /// 监听端口，0 表示由系统分配
    #[arg(short, long, env = "MINIHTTPD_PORT")]
    pub port: Option<u16>,

    /// 网站根目录
    #[arg(long, env = "MINIHTTPD_WEBROOT")]
    pub webroot: Option<String>,

    /// worker 线程数，0 表示按 CPU 核心数设置
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// listen 的 backlog
    #[arg(long)]
    pub backlog: Option<u32>,

    /// 输出 debug 级别日志
    #[arg(short, long)]
    pub verbose: bool,

    /// log4rs 的 YAML 配置文件，指定后忽略 `--verbose`
    #[arg(long)]
    pub log_config: Option<PathBuf>,
}
