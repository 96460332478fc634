// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求处理模块
//!
//! 该模块负责将 TCP 流中读取的原始字节解析为强类型的 `Request` 结构体：
//! 1. 请求行（Request-Line）的解析（方法、URI、版本）。
//! 2. 请求头（Headers）的提取。
//!
//! 解析永远不会失败：协议层面的错误被记录为 `parse_status`，由 worker 直接转化为
//! 对应状态码的响应。请求体不会被解析，`Content-Length` 也不会被用来读取更多数据。

use crate::{param::*, util::decode_uri_path};
use log::{debug, warn};
use std::{collections::HashMap, path::PathBuf};

/// 表示一个解析完成的 HTTP 请求。
///
/// 每个连接只构造一次，解析完成后不可变。
#[derive(Debug, Clone)]
pub struct Request {
    /// 连接编号，用于在多线程环境下追踪日志
    id: u128,
    method: HttpRequestMethod,
    /// 未经解码的原始 URI
    raw_uri: String,
    version: HttpVersion,
    /// 请求头，键保持收到时的大小写，重复的键以最后一次出现为准
    headers: HashMap<String, String>,
    /// 第一个解析错误对应的状态码，`None` 表示请求可以被分发
    parse_status: Option<u16>,
}

impl Request {
    fn empty(id: u128) -> Self {
        Self {
            id,
            method: HttpRequestMethod::Unsupported,
            raw_uri: String::new(),
            version: HttpVersion::Unsupported,
            headers: HashMap::new(),
            parse_status: None,
        }
    }

    /// 从连接读取到的第一段字节构建 `Request`。
    ///
    /// # 逻辑步骤
    /// 1. 请求行按空白字符切分，必须恰好得到三个部分，否则为 400。
    /// 2. 方法必须是 `GET`、`POST`、`HEAD` 之一（大小写敏感），否则为 405。
    /// 3. 版本必须是 `HTTP/1.0` 或 `HTTP/1.1`（大小写不敏感），否则为 505。
    /// 4. 之后的每一行以第一个 `": "` 切分为名称和值，不含 `": "` 的行被忽略。
    ///
    /// 一旦出现错误就停止解析，`parse_status` 只记录第一个错误。
    pub fn parse(buffer: &[u8], id: u128) -> Self {
        let mut request = Self::empty(id);
        let mut lines = buffer.split(|&b| b == b'\n').map(trim_line_end);

        let request_line = lines.next().unwrap_or_default();
        let tokens: Vec<&[u8]> = request_line
            .split(|b| b.is_ascii_whitespace())
            .filter(|t| !t.is_empty())
            .collect();

        if tokens.len() != 3 {
            warn!(
                "[ID{}]HTTP请求行格式不正确：{}",
                id,
                String::from_utf8_lossy(request_line)
            );
            request.parse_status = Some(400);
            return request;
        }

        request.method = HttpRequestMethod::from_bytes(tokens[0]);
        request.raw_uri = String::from_utf8_lossy(tokens[1]).into_owned();
        request.version = HttpVersion::from_bytes(tokens[2]);

        if request.method == HttpRequestMethod::Unsupported {
            warn!(
                "[ID{}]不支持的HTTP请求方法：{}",
                id,
                String::from_utf8_lossy(tokens[0])
            );
            request.parse_status = Some(405);
            return request;
        }
        if request.version == HttpVersion::Unsupported {
            warn!(
                "[ID{}]不支持的HTTP协议版本：{}",
                id,
                String::from_utf8_lossy(tokens[2])
            );
            request.parse_status = Some(505);
            return request;
        }

        for line in lines {
            if let Some(idx) = find_separator(line) {
                let name = String::from_utf8_lossy(&line[..idx]).into_owned();
                let value = String::from_utf8_lossy(&line[idx + 2..]).into_owned();
                request.headers.insert(name, value);
            }
        }

        debug!(
            "[ID{}]解析完成：{} {} {}，{}个请求头",
            id,
            request.method,
            request.raw_uri,
            request.version,
            request.headers.len()
        );
        request
    }
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    match line.last() {
        Some(b'\r') => &line[..line.len() - 1],
        _ => line,
    }
}

fn find_separator(line: &[u8]) -> Option<usize> {
    line.windows(2).position(|w| w == b": ")
}

// --- Getter 访问器实现 ---

impl Request {
    pub fn id(&self) -> u128 {
        self.id
    }

    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    /// 获取原始（未解码）URI
    pub fn raw_uri(&self) -> &str {
        &self.raw_uri
    }

    /// 去掉查询字符串和片段后再做百分号解码的路径
    pub fn decoded_path(&self) -> PathBuf {
        decode_uri_path(&self.raw_uri)
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// 按名称查找请求头，名称比较不区分大小写
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn parse_status(&self) -> Option<u16> {
        self.parse_status
    }

    /// 客户端是否希望得到 JSON 格式的目录列表
    pub fn accepts_json(&self) -> bool {
        self.header("Accept")
            .map_or(false, |a| a.contains("application/json"))
    }
}
