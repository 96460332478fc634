// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 日志初始化
//!
//! 整个进程只在 `main` 中初始化一次 log4rs，其余模块只通过 `log` 门面输出日志。

use crate::exception::Exception;

use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};

use std::path::Path;

const CONSOLE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l:<5})} [{T}] {t} - {m}{n}";

/// 初始化日志系统。
///
/// 指定了 YAML 配置文件时完全按文件配置；否则只输出到控制台，
/// `verbose` 为真时级别为 Debug，否则为 Info。
pub fn init(verbose: bool, log_config: Option<&Path>) -> Result<(), Exception> {
    match log_config {
        Some(path) => log4rs::init_file(path, Default::default())
            .map_err(|e| Exception::LoggerInit(format!("{}: {}", path.display(), e))),
        None => {
            let config = build_config(verbose)?;
            log4rs::init_config(config)
                .map(|_| ())
                .map_err(|e| Exception::LoggerInit(e.to_string()))
        }
    }
}

pub fn build_config(verbose: bool) -> Result<Config, Exception> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();

    Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))
        .map_err(|e| Exception::LoggerInit(e.to_string()))
}
