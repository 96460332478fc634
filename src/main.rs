// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # minihttpd 程序入口
//!
//! 解析命令行参数并加载配置，初始化日志系统后启动服务器，直到收到 Ctrl-C。

use minihttpd::{logger, CliArgs, Config, Exception, Server};

use clap::Parser;
use log::{error, info};

use std::process;

fn main() {
    let args = CliArgs::parse();

    // 日志系统尚未初始化，配置错误只能直接输出到标准错误
    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    if let Err(e) = logger::init(config.verbose(), args.log_config.as_deref()) {
        eprintln!("{}", e);
        process::exit(1);
    }
    info!("配置文件已载入");

    if let Err(e) = serve(config) {
        error!("{}", e);
        process::exit(1);
    }
}

fn serve(config: Config) -> Result<(), Exception> {
    let server = Server::new(config)?;
    server.run()
}
