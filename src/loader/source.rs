use reqwest::Client;
use reqwest::header::{CONTENT_RANGE, CONTENT_TYPE, RANGE};
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncReadExt;

use super::MediaLoader;
use super::probe::{Container, probe_container};
use crate::error::LoadError;

/// 已加载资源的元数据 + 文件头
#[derive(Debug, Clone, Serialize)]
pub struct MediaHandle {
    pub source: String,
    pub content_type: Option<String>,
    /// 资源总大小（服务端或文件系统给出时）
    pub content_length: Option<u64>,
    pub container: Container,
    #[serde(skip)]
    pub head: Vec<u8>,
}

impl MediaHandle {
    pub fn head_len(&self) -> usize {
        self.head.len()
    }
}

/// 加载配置
#[derive(Debug, Clone)]
pub struct SourceLoaderConfig {
    /// HTTP 超时（秒）
    pub http_timeout_secs: u64,
    /// HTTP 连接超时（秒）
    pub http_connect_timeout_secs: u64,
    /// 每个资源最多读取的字节数（足够解析容器头）
    pub probe_bytes: usize,
}

impl Default for SourceLoaderConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: env::var("MEDIA_PRELOAD_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            http_connect_timeout_secs: env::var("MEDIA_PRELOAD_HTTP_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            probe_bytes: env::var("MEDIA_PRELOAD_PROBE_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(64 * 1024),
        }
    }
}

/// 按资源地址选择 HTTP 或本地文件读取的 loader
#[derive(Debug, Clone)]
pub struct SourceLoader {
    http: Client,
    probe_bytes: usize,
}

impl SourceLoader {
    pub fn new(config: SourceLoaderConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .connect_timeout(Duration::from_secs(config.http_connect_timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::error!(err = %e, "初始化 HTTP 客户端失败");
                Client::new()
            });
        tracing::debug!(
            timeout_secs = config.http_timeout_secs,
            connect_timeout_secs = config.http_connect_timeout_secs,
            probe_bytes = config.probe_bytes,
            "SourceLoader 已创建"
        );

        Self {
            http,
            probe_bytes: config.probe_bytes.max(1),
        }
    }

    async fn load_http(&self, url: &str) -> Result<MediaHandle, LoadError> {
        let resp = self
            .http
            .get(url)
            .header(RANGE, format!("bytes=0-{}", self.probe_bytes - 1))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                status,
                url: url.to_owned(),
            });
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        // 206 时总长度在 Content-Range 里："bytes 0-65535/1048576"
        let content_length = resp
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit_once('/'))
            .and_then(|(_, total)| total.parse().ok())
            .or_else(|| resp.content_length().filter(|_| status.as_u16() == 200));

        let mut head = Vec::with_capacity(self.probe_bytes.min(64 * 1024));
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let bytes = chunk?;
            let room = self.probe_bytes - head.len();
            head.extend_from_slice(&bytes[..bytes.len().min(room)]);
            if head.len() >= self.probe_bytes {
                break;
            }
        }

        Ok(MediaHandle {
            container: probe_container(&head, url),
            source: url.to_owned(),
            content_type,
            content_length,
            head,
        })
    }

    async fn load_file(&self, source: &str, path: PathBuf) -> Result<MediaHandle, LoadError> {
        let io_err = |e| LoadError::Io {
            path: path.clone(),
            source: e,
        };

        let file = tokio::fs::File::open(&path).await.map_err(io_err)?;
        let content_length = file.metadata().await.ok().map(|m| m.len());

        let mut head = Vec::new();
        file.take(self.probe_bytes as u64)
            .read_to_end(&mut head)
            .await
            .map_err(io_err)?;

        Ok(MediaHandle {
            container: probe_container(&head, source),
            source: source.to_owned(),
            content_type: None,
            content_length,
            head,
        })
    }
}

impl MediaLoader for SourceLoader {
    type Handle = MediaHandle;

    async fn load(&self, id: &str) -> Result<MediaHandle, LoadError> {
        tracing::debug!(id, "开始加载资源元数据");
        let handle = if id.starts_with("http://") || id.starts_with("https://") {
            self.load_http(id).await?
        } else if let Some(path) = id.strip_prefix("file://") {
            self.load_file(id, PathBuf::from(path)).await?
        } else if id.contains("://") {
            return Err(LoadError::UnsupportedScheme(id.to_owned()));
        } else {
            self.load_file(id, PathBuf::from(id)).await?
        };

        if handle.head.is_empty() {
            return Err(LoadError::Empty(id.to_owned()));
        }
        tracing::debug!(
            id,
            container = %handle.container,
            bytes = handle.head_len(),
            "资源元数据加载完成"
        );
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> SourceLoader {
        SourceLoader::new(SourceLoaderConfig {
            http_timeout_secs: 5,
            http_connect_timeout_secs: 5,
            probe_bytes: 16,
        })
    }

    #[tokio::test]
    async fn reads_only_probe_bytes_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("clip.mp4");
        let mut bytes = vec![0, 0, 0, 0x20];
        bytes.extend_from_slice(b"ftypisom");
        bytes.resize(1024, 0xAB);
        std::fs::write(&path, &bytes).expect("write");

        let id = path.to_string_lossy().into_owned();
        let handle = loader().load(&id).await.expect("load");
        assert_eq!(handle.head_len(), 16);
        assert_eq!(handle.content_length, Some(1024));
        assert_eq!(handle.container, Container::Mp4);
    }

    #[tokio::test]
    async fn file_scheme_is_supported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("clip.ogv");
        std::fs::write(&path, b"OggS\0\x02").expect("write");

        let id = format!("file://{}", path.display());
        let handle = loader().load(&id).await.expect("load");
        assert_eq!(handle.container, Container::Ogg);
        assert_eq!(handle.source, id);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = loader()
            .load("/definitely/not/here.webm")
            .await
            .expect_err("must fail");
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.mp4");
        std::fs::write(&path, b"").expect("write");

        let err = loader()
            .load(&path.to_string_lossy())
            .await
            .expect_err("must fail");
        assert!(matches!(err, LoadError::Empty(_)));
    }

    #[tokio::test]
    async fn unknown_scheme_is_rejected() {
        let err = loader()
            .load("rtmp://live.example.com/stream")
            .await
            .expect_err("must fail");
        assert!(matches!(err, LoadError::UnsupportedScheme(_)));
    }
}
