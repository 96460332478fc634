// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use std::{
    borrow::Cow,
    ffi::OsStr,
    fs::Metadata,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use percent_encoding::{percent_decode_str, percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::param::reason_phrase;

/// 路径中单独一段需要编码的字符：除 RFC 3986 非保留字符以外的全部字节
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// 生成简单 HTML 页面（错误页与目录列表）的构建器
pub struct HtmlBuilder {
    title: String,
    css: String,
    body: String,
}

impl HtmlBuilder {
    pub fn from_status_code(code: u16, note: Option<&str>) -> Self {
        let title = format!("{} {}", code, reason_phrase(code));
        let css = r"
            body {
                width: 35em;
                margin: 0 auto;
                font-family: Tahoma, Verdana, Arial, sans-serif;
            }
            "
        .to_string();
        let description = note.unwrap_or_else(|| reason_phrase(code));
        let body = format!(
            r"
            <h1>{}</h1>
            <p>{}</p>
            ",
            code, description
        );
        Self { title, css, body }
    }

    /// 根据目录内容生成文件列表页面。
    ///
    /// `rel_dir` 是目录相对于 webroot 的路径（webroot 自身为空路径），
    /// 所有链接都是从 webroot 出发的绝对路径。`rel_dir` 非空时额外生成指向父目录的 `..` 链接。
    pub fn from_dir(rel_dir: &Path, dir_vec: &mut Vec<PathBuf>) -> Self {
        let mut body = String::new();
        sort_dir_entries(dir_vec);

        let display = web_path(rel_dir);
        body.push_str(&format!("<h1>Index of {}</h1><hr>", escape_html(&display)));
        body.push_str("<table>");
        body.push_str(
            r#"
            <tr>
                <td>Name</td>
                <td>Size</td>
                <td>Modified</td>
            </tr>
            "#,
        );
        if let Some(parent) = rel_dir.parent() {
            let link = href(parent, true);
            body.push_str(&format!(
                r#"
            <tr>
                <td><a href="{}">..</a></td>
                <td></td>
                <td></td>
            </tr>
            "#,
                link
            ));
        }
        for entry in dir_vec.iter() {
            let name = match entry.file_name() {
                Some(f) => f,
                None => continue,
            };
            let filename = name.to_string_lossy();
            let metadata = entry.metadata().ok();
            let formatted_time = metadata
                .as_ref()
                .and_then(modified_time)
                .map(|t| t.format("%Y-%m-%d %H:%M:%S %:z").to_string())
                .unwrap_or_default();

            let child = rel_dir.join(name);
            if entry.is_dir() {
                let link = href(&child, true);
                let label = escape_html(&format!("{}/", filename));
                body.push_str(&format!(
                    r#"
                    <tr>
                        <td><a href="{}">{}</a></td>
                        <td>-</td>
                        <td>{}</td>
                    </tr>
                    "#,
                    link, label, formatted_time
                ));
            } else {
                let link = href(&child, false);
                let size = metadata.map(|m| m.len()).unwrap_or(0);
                body.push_str(&format!(
                    r#"
                    <tr>
                        <td><a href="{}">{}</a></td>
                        <td>{}</td>
                        <td>{}</td>
                    </tr>
                    "#,
                    link,
                    escape_html(&filename),
                    format_file_size(size),
                    formatted_time
                ));
            }
        }
        body.push_str("</table>");
        HtmlBuilder {
            title: format!("Index of {}", escape_html(&display)),
            css: r"
            table {
                border-collapse: collapse;
                width: 100%;
            }

            td {
                padding: 8px;
                white-space: pre-wrap;
                border: none;
            }"
            .to_string(),
            body,
        }
    }

    pub fn build(&self) -> String {
        format!(
            r##"<!DOCTYPE html>
            <html>
                <head>
                    <meta charset="utf-8">
                    <title>{}</title>
                    <style>{}</style>
                </head>
                <body>
                {}
                </body>
            </html>"##,
            self.title, self.css, self.body
        )
    }
}

pub fn format_file_size(size: u64) -> String {
    let units = ["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < units.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.1} {}", size, units[unit_index])
}

/// 目录在前，其余按名称排序
pub fn sort_dir_entries(vec: &mut [PathBuf]) {
    vec.sort_by(|a, b| {
        let a_is_dir = a.is_dir();
        let b_is_dir = b.is_dir();

        if a_is_dir && !b_is_dir {
            std::cmp::Ordering::Less
        } else if !a_is_dir && b_is_dir {
            std::cmp::Ordering::Greater
        } else {
            a.cmp(b)
        }
    });
}

/// webroot 相对路径的显示形式，以 `/` 开头、以 `/` 分隔，只用于页面文字
pub fn web_path(rel: &Path) -> String {
    let mut out = String::from("/");
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    out.push_str(&parts.join("/"));
    out
}

/// webroot 相对路径对应的链接。
///
/// 每一段按文件名的原始字节做百分号编码，因此不是合法 UTF-8 的文件名也能被访问到；
/// 目录链接以 `/` 结尾。
pub fn href(rel: &Path, is_dir: bool) -> String {
    let mut out = String::from("/");
    let parts: Vec<String> = rel
        .components()
        .map(|c| percent_encode(&os_bytes(c.as_os_str()), PATH_SEGMENT).to_string())
        .collect();
    out.push_str(&parts.join("/"));
    if is_dir && !out.ends_with('/') {
        out.push('/');
    }
    out
}

/// 去掉查询字符串与片段后对 URI 路径做百分号解码。
///
/// 非法的转义序列原样保留，解码得到的字节不做 UTF-8 转换。
pub fn decode_uri_path(raw_uri: &str) -> PathBuf {
    let path = raw_uri.split(['?', '#']).next().unwrap_or_default();
    let bytes: Cow<'_, [u8]> = percent_decode_str(path).into();
    path_from_bytes(&bytes)
}

#[cfg(unix)]
fn os_bytes(s: &OsStr) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(s.as_bytes())
}

#[cfg(not(unix))]
fn os_bytes(s: &OsStr) -> Cow<'_, [u8]> {
    match s.to_string_lossy() {
        Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
        Cow::Owned(s) => Cow::Owned(s.into_bytes()),
    }
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

/// 文件的修改时间（本地时区），HTML 与 JSON 目录列表共用
pub fn modified_time(metadata: &Metadata) -> Option<DateTime<Local>> {
    metadata.modified().ok().map(DateTime::<Local>::from)
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
