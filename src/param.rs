// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 协议参数与常量模块
//!
//! 该模块定义了服务器遵循的 HTTP 协议相关常量和数据结构，包括：
//! - 常见的 HTTP 状态码及其原因短语（Reason Phrase）。
//! - 文件后缀名到 MIME 类型、压缩容器后缀到 `Content-Encoding` 的映射表。
//! - HTTP 方法与版本的强类型枚举。

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;

/// 服务器名称标识，用于 HTTP 响应头的 `Server` 字段
pub const SERVER_NAME: &str = concat!("minihttpd/", env!("CARGO_PKG_VERSION"));

/// 响应状态行中固定宣告的协议版本，不与客户端协商
pub const SERVER_HTTP_VERSION: &str = "1.1";

/// HTTP 协议规定的换行符（Carriage Return Line Feed）
pub const CRLF: &str = "\r\n";

/// 每个连接只读取一次，且最多读取这么多字节作为请求
pub const MAX_REQUEST_SIZE: usize = 2048;

/// 目录请求时优先查找的首页文件名
pub const INDEX_FILE: &str = "index.html";

/// 随程序一同发布的默认 404 页面
pub const NOT_FOUND_PAGE: &[u8] = include_bytes!("../static/404.html");

/// 无法识别后缀时使用的兜底 MIME 类型
pub const DEFAULT_MIME: &str = "application/octet-stream";

lazy_static! {
    /// HTTP 状态码与其对应的标准原因短语映射表。
    ///
    /// 参考标准：[RFC 2616 §10](https://www.rfc-editor.org/rfc/rfc2616#section-10)。
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = {
        let mut map = HashMap::new();
        map.insert(100, "Continue");
        map.insert(101, "Switching Protocols");

        map.insert(200, "OK");
        map.insert(201, "Created");
        map.insert(202, "Accepted");
        map.insert(203, "Non-Authoritative Information");
        map.insert(204, "No Content");
        map.insert(205, "Reset Content");
        map.insert(206, "Partial Content");

        map.insert(300, "Multiple Choices");
        map.insert(301, "Moved Permanently");
        map.insert(302, "Found");
        map.insert(303, "See Other");
        map.insert(304, "Not Modified");
        map.insert(305, "Use Proxy");
        map.insert(307, "Temporary Redirect");

        map.insert(400, "Bad Request");
        map.insert(401, "Unauthorized");
        map.insert(402, "Payment Required");
        map.insert(403, "Forbidden");
        map.insert(404, "Not Found");
        map.insert(405, "Method Not Allowed");
        map.insert(406, "Not Acceptable");
        map.insert(407, "Proxy Authentication Required");
        map.insert(408, "Request Timeout");
        map.insert(409, "Conflict");
        map.insert(410, "Gone");
        map.insert(411, "Length Required");
        map.insert(412, "Precondition Failed");
        map.insert(413, "Request Entity Too Large");
        map.insert(414, "Request-URI Too Long");
        map.insert(415, "Unsupported Media Type");
        map.insert(416, "Requested Range Not Satisfiable");
        map.insert(417, "Expectation Failed");

        map.insert(500, "Internal Server Error");
        map.insert(501, "Not Implemented");
        map.insert(502, "Bad Gateway");
        map.insert(503, "Service Unavailable");
        map.insert(504, "Gateway Timeout");
        map.insert(505, "HTTP Version Not Supported");
        map
    };
}

lazy_static! {
    /// 文件后缀名到 MIME 类型（Media Type）的映射表。
    pub static ref MIME_TYPES: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        map.insert("aac", "audio/aac");
        map.insert("avi", "video/x-msvideo");
        map.insert("avif", "image/avif");
        map.insert("bin", "application/octet-stream");
        map.insert("bmp", "image/bmp");
        map.insert("css", "text/css");
        map.insert("csv", "text/csv");
        map.insert("doc", "application/msword");
        map.insert("epub", "application/epub+zip");
        map.insert("gif", "image/gif");
        map.insert("htm", "text/html");
        map.insert("html", "text/html");
        map.insert("ico", "image/x-icon");
        map.insert("ics", "text/calendar");
        map.insert("iso", "application/x-iso9660-image");
        map.insert("jar", "application/java-archive");
        map.insert("js", "text/javascript");
        map.insert("json", "application/json");
        map.insert("jpg", "image/jpeg");
        map.insert("jpeg", "image/jpeg");
        map.insert("md", "text/markdown");
        map.insert("mjs", "text/javascript");
        map.insert("mp3", "audio/mpeg");
        map.insert("mp4", "video/mp4");
        map.insert("mpeg", "video/mpeg");
        map.insert("oga", "audio/ogg");
        map.insert("ogv", "video/ogg");
        map.insert("otf", "font/otf");
        map.insert("pdf", "application/pdf");
        map.insert("png", "image/png");
        map.insert("rtf", "application/rtf");
        map.insert("sh", "application/x-sh");
        map.insert("svg", "image/svg+xml");
        map.insert("tar", "application/x-tar");
        map.insert("tif", "image/tiff");
        map.insert("tiff", "image/tiff");
        map.insert("txt", "text/plain");
        map.insert("ttf", "font/ttf");
        map.insert("wasm", "application/wasm");
        map.insert("wav", "audio/wav");
        map.insert("webm", "video/webm");
        map.insert("webp", "image/webp");
        map.insert("woff", "font/woff");
        map.insert("woff2", "font/woff2");
        map.insert("xhtml", "application/xhtml+xml");
        map.insert("xml", "text/xml");
        map.insert("zip", "application/zip");
        map.insert("7z", "application/x-7z-compressed");
        map
    };
}

lazy_static! {
    /// 压缩容器后缀到 `Content-Encoding` 的映射表。
    ///
    /// 例如 `site.tar.gz` 的类型按 `tar` 推断，编码为 `gzip`。
    pub static ref ENCODINGS: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        map.insert("gz", "gzip");
        map.insert("Z", "compress");
        map.insert("bz2", "bzip2");
        map.insert("xz", "xz");
        map.insert("br", "br");
        map
    };
}

/// 请求行中允许出现的 HTTP 方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpRequestMethod {
    /// 获取资源
    Get,
    /// 提交数据（目前仅为占位实现）
    Post,
    /// 获取资源的元数据（不包含响应体）
    Head,
    /// 解析失败或不在支持范围内的方法
    Unsupported,
}

impl HttpRequestMethod {
    /// 按字节精确匹配方法名，大小写敏感。
    pub fn from_bytes(token: &[u8]) -> Self {
        match token {
            b"GET" => HttpRequestMethod::Get,
            b"POST" => HttpRequestMethod::Post,
            b"HEAD" => HttpRequestMethod::Head,
            _ => HttpRequestMethod::Unsupported,
        }
    }
}

/// 请求行中允许出现的 HTTP 协议版本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    V1_0,
    V1_1,
    Unsupported,
}

impl HttpVersion {
    /// 版本串大小写不敏感。
    pub fn from_bytes(token: &[u8]) -> Self {
        if token.eq_ignore_ascii_case(b"HTTP/1.1") {
            HttpVersion::V1_1
        } else if token.eq_ignore_ascii_case(b"HTTP/1.0") {
            HttpVersion::V1_0
        } else {
            HttpVersion::Unsupported
        }
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpVersion::V1_0 => write!(f, "HTTP/1.0"),
            HttpVersion::V1_1 => write!(f, "HTTP/1.1"),
            HttpVersion::Unsupported => write!(f, "-"),
        }
    }
}

impl fmt::Display for HttpRequestMethod {
    /// 将枚举格式化为 HTTP 标准大写方法名
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpRequestMethod::Get => write!(f, "GET"),
            HttpRequestMethod::Post => write!(f, "POST"),
            HttpRequestMethod::Head => write!(f, "HEAD"),
            HttpRequestMethod::Unsupported => write!(f, "-"),
        }
    }
}

/// 查询状态码对应的原因短语，未收录的状态码返回 `Unknown`。
pub fn reason_phrase(code: u16) -> &'static str {
    STATUS_CODES.get(&code).copied().unwrap_or("Unknown")
}
