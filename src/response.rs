// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 响应构建模块
//!
//! 将状态码、响应头和响应体序列化为原始字节。调用方没有提供的标准响应头会被补全为默认值，
//! 调用方提供的响应头（例如根据扩展名推断的 `Content-Type`）永远不会被覆盖。

use crate::param::*;

use bytes::Bytes;
use chrono::prelude::*;
use log::debug;

use std::io::{self, Write};

#[derive(Debug, Clone)]
pub struct Response {
    status_code: u16,
    information: String,
    date: DateTime<Utc>,
    /// 调用方显式设置的响应头，按设置顺序序列化
    headers: Vec<(String, String)>,
    content: Option<Bytes>,
    /// HEAD 请求：保留 Content-Length，但不发送响应体
    head_only: bool,
}

impl Response {
    pub fn new(code: u16) -> Self {
        Self {
            status_code: code,
            information: reason_phrase(code).to_string(),
            date: Utc::now(),
            headers: Vec::new(),
            content: None,
            head_only: false,
        }
    }

    /// 设置一个响应头。同名（不区分大小写）的响应头会被替换。
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
        self
    }

    pub fn with_headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        headers
            .into_iter()
            .fold(self, |r, (k, v)| r.with_header(k.as_ref(), v.as_ref()))
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.content = Some(body.into());
        self
    }

    pub fn head_only(mut self) -> Self {
        self.head_only = true;
        self
    }

    /// 序列化为完整的响应报文。
    ///
    /// 状态行固定宣告 `HTTP/1.1`；随后是调用方的响应头和补全的默认响应头；
    /// 空行之后原样附加响应体（HEAD 请求除外）。
    pub fn as_bytes(&self) -> Vec<u8> {
        let content_length = self.content_length().to_string();
        let date = format_date(&self.date);
        let defaults: [(&str, &str); 6] = [
            ("Content-Length", &content_length),
            ("Date", &date),
            ("Server", SERVER_NAME),
            ("Connection", "Closed"),
            ("Content-Encoding", "utf-8"),
            ("Content-Type", "text/html"),
        ];

        let mut header = format!(
            "HTTP/{} {} {}{}",
            SERVER_HTTP_VERSION, self.status_code, self.information, CRLF
        );
        for (name, value) in &self.headers {
            header.push_str(&[name.as_str(), ": ", value.as_str(), CRLF].concat());
        }
        for (name, value) in defaults {
            if self.header(name).is_none() {
                header.push_str(&[name, ": ", value, CRLF].concat());
            }
        }
        header.push_str(CRLF);

        let body: &[u8] = match (&self.content, self.head_only) {
            (Some(c), false) => &c[..],
            _ => b"",
        };
        [header.as_bytes(), body].concat()
    }
}

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &str {
        &self.information
    }

    /// 调用方设置的响应头（不含默认值）
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_length(&self) -> usize {
        self.content.as_ref().map_or(0, |c| c.len())
    }
}

/// 由状态码、可选响应头和可选响应体直接生成响应报文
pub fn build_response(code: u16, headers: &[(&str, &str)], body: Option<&[u8]>) -> Vec<u8> {
    let mut response = Response::new(code).with_headers(headers.iter().copied());
    if let Some(b) = body {
        response = response.with_body(Bytes::copy_from_slice(b));
    }
    response.as_bytes()
}

/// 将整个响应写入连接。`write_all` 会循环处理部分写入，直到全部写完或连接出错。
pub fn send<W: Write>(connection: &mut W, response: &[u8]) -> io::Result<()> {
    connection.write_all(response)?;
    connection.flush()?;
    debug!("响应发送完毕，共{}字节", response.len());
    Ok(())
}

/// RFC 1123 格式，例如 `Sun, 06 Nov 1994 08:49:37 GMT`
fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
