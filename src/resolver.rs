// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 静态资源解析模块
//!
//! 将请求 URI 映射到 webroot 下的文件系统路径，并给出 `(状态码, 响应头, 响应体)`：
//!
//! 1. 去掉查询字符串与片段，百分号解码，去掉一个前导 `/` 后与 webroot 拼接。
//! 2. 规范化路径（解析符号链接与 `..`）。路径不存在返回 404 与内置的默认页面；
//!    规范化后落在 webroot 之外返回 403。
//! 3. 目录：存在 `index.html` 则按文件返回，否则生成目录列表（HTML 或 JSON）。
//! 4. 普通文件：根据扩展名推断 `Content-Type` 与 `Content-Encoding`，读取全部内容。

use crate::{
    exception::Exception,
    param::*,
    request::Request,
    response::Response,
    util::{decode_uri_path, format_file_size, href, modified_time, HtmlBuilder},
};

use bytes::Bytes;
use log::{debug, warn};

use std::{
    fs,
    path::{Path, PathBuf},
};

/// 静态资源解析的结果
#[derive(Debug, Clone)]
pub struct Resolved {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Resolved {
    fn new(status: u16, content_type: &str, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: body.into(),
        }
    }

    fn not_found() -> Self {
        Self::new(404, "text/html", Bytes::from_static(NOT_FOUND_PAGE))
    }

    fn forbidden() -> Self {
        let page = HtmlBuilder::from_status_code(
            403,
            Some("The requested path lies outside of the document root."),
        )
        .build();
        Self::new(403, "text/html", page)
    }
}

impl From<Resolved> for Response {
    fn from(resolved: Resolved) -> Self {
        Response::new(resolved.status)
            .with_headers(resolved.headers)
            .with_body(resolved.body)
    }
}

/// 目录列表的输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    Html,
    Json,
}

/// 绑定到一个已规范化 webroot 的解析器
#[derive(Debug, Clone)]
pub struct StaticResolver {
    webroot: PathBuf,
}

impl StaticResolver {
    /// webroot 必须存在且是目录。
    pub fn new(webroot: &Path) -> Result<Self, Exception> {
        let display = webroot.display().to_string();
        let webroot = webroot
            .canonicalize()
            .map_err(|_| Exception::WebrootNotFound(display.clone()))?;
        if !webroot.is_dir() {
            return Err(Exception::WebrootNotDirectory(display));
        }
        Ok(Self { webroot })
    }

    pub fn webroot(&self) -> &Path {
        &self.webroot
    }

    /// 处理 GET/HEAD 请求，`Accept: application/json` 时目录列表以 JSON 返回
    pub fn resolve(&self, request: &Request) -> Result<Resolved, Exception> {
        let format = match request.accepts_json() {
            true => IndexFormat::Json,
            false => IndexFormat::Html,
        };
        self.resolve_uri(request.raw_uri(), format, request.id())
    }

    pub fn resolve_uri(
        &self,
        raw_uri: &str,
        format: IndexFormat,
        id: u128,
    ) -> Result<Resolved, Exception> {
        let relative = decode_uri_path(raw_uri.strip_prefix('/').unwrap_or(raw_uri));
        let candidate = self.webroot.join(relative);

        let canonical = match candidate.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                debug!("[ID{}]路径{}无法规范化: {}", id, candidate.display(), e);
                return Ok(Resolved::not_found());
            }
        };
        let rel = match self.contained(&canonical) {
            Some(r) => r,
            None => {
                warn!(
                    "[ID{}]请求的路径{}越出了webroot，返回403",
                    id,
                    canonical.display()
                );
                return Ok(Resolved::forbidden());
            }
        };
        debug!("[ID{}]映射物理路径：{}", id, canonical.display());

        if canonical.is_dir() {
            if let Some(index) = self.index_file(&canonical) {
                debug!("[ID{}]目录中存在{}", id, INDEX_FILE);
                return self.serve_file(&index, id);
            }
            return self.autoindex(&canonical, &rel, format, id);
        }
        if canonical.is_file() {
            return self.serve_file(&canonical, id);
        }
        debug!("[ID{}]{}既不是文件也不是目录", id, canonical.display());
        Ok(Resolved::not_found())
    }

    /// 规范化路径相对于 webroot 的部分，越界时返回 `None`
    fn contained(&self, canonical: &Path) -> Option<PathBuf> {
        canonical
            .strip_prefix(&self.webroot)
            .ok()
            .map(Path::to_path_buf)
    }

    fn index_file(&self, dir: &Path) -> Option<PathBuf> {
        let index = dir.join(INDEX_FILE).canonicalize().ok()?;
        match index.is_file() && self.contained(&index).is_some() {
            true => Some(index),
            false => None,
        }
    }

    fn serve_file(&self, path: &Path, id: u128) -> Result<Resolved, Exception> {
        let (mime, encoding) = guess_type(path);
        debug!("[ID{}]MIME类型: {:?}, 编码: {:?}", id, mime, encoding);
        let contents = fs::read(path)?;
        let mut resolved = Resolved::new(200, mime.unwrap_or(DEFAULT_MIME), contents);
        if let Some(e) = encoding {
            resolved
                .headers
                .push(("Content-Encoding".to_string(), e.to_string()));
        }
        Ok(resolved)
    }

    fn autoindex(
        &self,
        dir: &Path,
        rel: &Path,
        format: IndexFormat,
        id: u128,
    ) -> Result<Resolved, Exception> {
        debug!("[ID{}]生成目录列表: {}, 格式: {:?}", id, dir.display(), format);
        let mut dir_vec = Vec::<PathBuf>::new();
        for entry in fs::read_dir(dir)? {
            dir_vec.push(entry?.path());
        }

        match format {
            IndexFormat::Html => {
                let page = HtmlBuilder::from_dir(rel, &mut dir_vec).build();
                Ok(Resolved::new(200, "text/html", page))
            }
            IndexFormat::Json => {
                crate::util::sort_dir_entries(&mut dir_vec);
                let json_struct: Vec<_> = dir_vec
                    .iter()
                    .map(|p| {
                        let meta = fs::metadata(p).ok();
                        let is_dir = p.is_dir();
                        let size = meta.as_ref().map(|m| m.len()).unwrap_or(0);
                        let modified = meta
                            .as_ref()
                            .and_then(modified_time)
                            .map(|t| t.to_rfc3339())
                            .unwrap_or_default();
                        let link = p
                            .file_name()
                            .map(|name| href(&rel.join(name), is_dir))
                            .unwrap_or_default();

                        let size_str = format_file_size(size);
                        serde_json::json!({
                            "name": p.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
                            "href": link,
                            "type": if is_dir { "dir" } else { "file" },
                            "size": if is_dir { "-" } else { size_str.as_str() },
                            "raw_size": size,
                            "date": modified
                        })
                    })
                    .collect();
                let body = serde_json::to_vec(&json_struct)
                    .map_err(|e| Exception::Io(e.into()))?;
                Ok(Resolved::new(200, "application/json", body))
            }
        }
    }
}

/// 对一个 webroot 解析 GET 请求的 URI，目录列表使用 HTML 格式
pub fn resolve_get(webroot: &Path, raw_uri: &str) -> Result<Resolved, Exception> {
    StaticResolver::new(webroot)?.resolve_uri(raw_uri, IndexFormat::Html, 0)
}

/// 根据文件名推断 `(MIME 类型, Content-Encoding)`。
///
/// 压缩容器后缀（如 `.gz`）决定编码，MIME 类型由去掉该后缀后的扩展名决定。
pub fn guess_type(path: &Path) -> (Option<&'static str>, Option<&'static str>) {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return (None, None),
    };
    let (stem, ext) = match name.rsplit_once('.') {
        Some(pair) => pair,
        None => return (None, None),
    };

    let (encoding, stem, ext) = match ENCODINGS.get(ext) {
        Some(e) => match stem.rsplit_once('.') {
            Some((s, inner)) => (Some(*e), s, inner),
            None => return (None, Some(*e)),
        },
        None => (None, stem, ext),
    };
    if stem.is_empty() && encoding.is_none() {
        // 形如 `.bashrc` 的隐藏文件没有扩展名
        return (None, None);
    }

    let mime = MIME_TYPES
        .get(ext)
        .or_else(|| MIME_TYPES.get(ext.to_ascii_lowercase().as_str()))
        .copied();
    (mime, encoding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn webroot() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.txt"), "hello world").unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs").join("a.md"), "# a").unwrap();
        fs::create_dir(dir.path().join("docs").join("nested")).unwrap();
        fs::create_dir(dir.path().join("site")).unwrap();
        fs::write(dir.path().join("site").join("index.html"), "<h1>site</h1>").unwrap();
        dir
    }

    fn header<'a>(resolved: &'a Resolved, name: &str) -> Option<&'a str> {
        resolved
            .headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_serves_file_with_mime() {
        let root = webroot();
        let resolved = resolve_get(root.path(), "/hello.txt").unwrap();

        assert_eq!(resolved.status, 200);
        assert_eq!(header(&resolved, "Content-Type"), Some("text/plain"));
        assert_eq!(header(&resolved, "Content-Encoding"), None);
        assert_eq!(&resolved.body[..], b"hello world");
    }

    #[test]
    fn test_resolving_twice_is_identical() {
        let root = webroot();
        let first = resolve_get(root.path(), "/hello.txt").unwrap();
        let second = resolve_get(root.path(), "/hello.txt").unwrap();

        assert_eq!(first.status, second.status);
        assert_eq!(first.body, second.body);
    }

    #[test]
    fn test_query_string_is_ignored() {
        let root = webroot();
        let resolved = resolve_get(root.path(), "/hello.txt?v=2#frag").unwrap();
        assert_eq!(resolved.status, 200);
    }

    #[test]
    fn test_percent_encoded_name() {
        let root = webroot();
        fs::write(root.path().join("my file.txt"), "spaced").unwrap();

        let resolved = resolve_get(root.path(), "/my%20file.txt").unwrap();
        assert_eq!(resolved.status, 200);
        assert_eq!(&resolved.body[..], b"spaced");
    }

    #[test]
    fn test_missing_file_is_404_with_bundled_page() {
        let root = webroot();
        let resolved = resolve_get(root.path(), "/missing.txt").unwrap();

        assert_eq!(resolved.status, 404);
        assert_eq!(&resolved.body[..], NOT_FOUND_PAGE);
        assert_eq!(header(&resolved, "Content-Type"), Some("text/html"));
    }

    #[test]
    fn test_directory_with_index() {
        let root = webroot();
        let resolved = resolve_get(root.path(), "/site/").unwrap();

        assert_eq!(resolved.status, 200);
        assert_eq!(&resolved.body[..], b"<h1>site</h1>");
        assert_eq!(header(&resolved, "Content-Type"), Some("text/html"));
    }

    #[test]
    fn test_autoindex_lists_children_and_parent() {
        let root = webroot();
        let resolved = resolve_get(root.path(), "/docs").unwrap();
        let body = String::from_utf8_lossy(&resolved.body);

        assert_eq!(resolved.status, 200);
        assert_eq!(header(&resolved, "Content-Type"), Some("text/html"));
        assert!(body.contains(r#"href="/docs/a.md""#));
        assert!(body.contains(r#"href="/docs/nested/""#));
        assert!(body.contains(r#"<a href="/">..</a>"#));
    }

    #[test]
    fn test_autoindex_of_webroot_has_no_parent() {
        let root = webroot();
        fs::remove_file(root.path().join("hello.txt")).unwrap();
        let resolved = resolve_get(root.path(), "/").unwrap();
        let body = String::from_utf8_lossy(&resolved.body);

        assert_eq!(resolved.status, 200);
        assert!(body.contains(r#"href="/docs/""#));
        assert!(body.contains(r#"href="/site/""#));
        assert!(!body.contains(">..</a>"));
    }

    #[test]
    fn test_nested_parent_link() {
        let root = webroot();
        let resolved = resolve_get(root.path(), "/docs/nested/").unwrap();
        let body = String::from_utf8_lossy(&resolved.body);

        assert!(body.contains(r#"<a href="/docs/">..</a>"#));
    }

    #[test]
    fn test_autoindex_json() {
        let root = webroot();
        let resolver = StaticResolver::new(root.path()).unwrap();
        let resolved = resolver.resolve_uri("/docs/", IndexFormat::Json, 0).unwrap();

        assert_eq!(header(&resolved, "Content-Type"), Some("application/json"));
        let entries: serde_json::Value = serde_json::from_slice(&resolved.body).unwrap();
        let entries = entries.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["name"], "nested");
        assert_eq!(entries[0]["type"], "dir");
        assert_eq!(entries[1]["name"], "a.md");
        assert_eq!(entries[1]["raw_size"], 3);
        assert_eq!(entries[0]["href"], "/docs/nested/");
        assert_eq!(entries[1]["href"], "/docs/a.md");
    }

    #[test]
    fn test_listings_agree_on_modified_time() {
        let root = webroot();
        let resolver = StaticResolver::new(root.path()).unwrap();
        let meta = fs::metadata(root.path().join("docs").join("a.md")).unwrap();
        let modified = modified_time(&meta).unwrap();

        let json = resolver.resolve_uri("/docs/", IndexFormat::Json, 0).unwrap();
        let entries: serde_json::Value = serde_json::from_slice(&json.body).unwrap();
        assert_eq!(entries[1]["date"], modified.to_rfc3339());

        let html = resolver.resolve_uri("/docs/", IndexFormat::Html, 0).unwrap();
        let body = String::from_utf8_lossy(&html.body);
        assert!(body.contains(&modified.format("%Y-%m-%d %H:%M:%S %:z").to_string()));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_name_is_reachable_from_listing() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let root = webroot();
        fs::remove_dir_all(root.path().join("docs")).unwrap();
        fs::remove_dir_all(root.path().join("site")).unwrap();
        fs::remove_file(root.path().join("hello.txt")).unwrap();
        fs::write(root.path().join(OsStr::from_bytes(b"caf\xE9.txt")), "latin-1 name").unwrap();

        let listing = resolve_get(root.path(), "/").unwrap();
        let body = String::from_utf8_lossy(&listing.body).into_owned();
        let start = body.find(r#"<a href=""#).unwrap() + r#"<a href=""#.len();
        let link = &body[start..start + body[start..].find('"').unwrap()];
        assert_eq!(link, "/caf%E9.txt");

        let resolved = resolve_get(root.path(), link).unwrap();
        assert_eq!(resolved.status, 200);
        assert_eq!(&resolved.body[..], b"latin-1 name");
    }

    #[test]
    fn test_traversal_is_contained() {
        let root = webroot();
        let inner = root.path().join("docs");
        for uri in [
            "/../hello.txt",
            "/../../../../etc/passwd",
            "/%2e%2e/hello.txt",
            "/..%2f..%2f..%2fetc/passwd",
            "//etc/passwd",
        ] {
            let resolved = resolve_get(&inner, uri).unwrap();
            assert!(
                resolved.status == 403 || resolved.status == 404,
                "{} returned {}",
                uri,
                resolved.status
            );
            assert_ne!(&resolved.body[..], b"hello world");
        }
    }

    #[test]
    fn test_dotdot_inside_webroot_is_allowed() {
        let root = webroot();
        let resolved = resolve_get(root.path(), "/docs/../hello.txt").unwrap();
        assert_eq!(resolved.status, 200);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_outside_webroot_is_forbidden() {
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), "secret").unwrap();
        let root = webroot();
        std::os::unix::fs::symlink(outside.path().join("secret.txt"), root.path().join("link.txt"))
            .unwrap();

        let resolved = resolve_get(root.path(), "/link.txt").unwrap();
        assert_eq!(resolved.status, 403);
    }

    #[test]
    fn test_missing_webroot() {
        let err = StaticResolver::new(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, Exception::WebrootNotFound(_)));

        let root = webroot();
        let err = StaticResolver::new(&root.path().join("hello.txt")).unwrap_err();
        assert!(matches!(err, Exception::WebrootNotDirectory(_)));
    }

    #[test]
    fn test_guess_type() {
        assert_eq!(guess_type(Path::new("a.html")), (Some("text/html"), None));
        assert_eq!(guess_type(Path::new("A.PNG")), (Some("image/png"), None));
        assert_eq!(guess_type(Path::new("site.tar.gz")), (Some("application/x-tar"), Some("gzip")));
        assert_eq!(guess_type(Path::new("data.json.br")), (Some("application/json"), Some("br")));
        assert_eq!(guess_type(Path::new("blob.gz")), (None, Some("gzip")));
        assert_eq!(guess_type(Path::new("README")), (None, None));
        assert_eq!(guess_type(Path::new(".bashrc")), (None, None));
        assert_eq!(guess_type(Path::new("x.unknownext")), (None, None));
    }

    #[test]
    fn test_unknown_type_falls_back() {
        let root = webroot();
        fs::write(root.path().join("blob.tar.gz"), [0x1f, 0x8b, 0x00]).unwrap();
        fs::write(root.path().join("README"), "readme").unwrap();

        let gz = resolve_get(root.path(), "/blob.tar.gz").unwrap();
        assert_eq!(header(&gz, "Content-Type"), Some("application/x-tar"));
        assert_eq!(header(&gz, "Content-Encoding"), Some("gzip"));
        assert_eq!(&gz.body[..], &[0x1f, 0x8b, 0x00]);

        let readme = resolve_get(root.path(), "/README").unwrap();
        assert_eq!(header(&readme, "Content-Type"), Some(DEFAULT_MIME));
    }

    #[test]
    fn test_into_response() {
        let root = webroot();
        let response: Response = resolve_get(root.path(), "/hello.txt").unwrap().into();

        assert_eq!(response.status_code(), 200);
        assert_eq!(response.header("Content-Type"), Some("text/plain"));
        assert_eq!(response.content_length(), 11);
    }
}
