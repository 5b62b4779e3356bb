//! 媒体加载相关错误

use reqwest::StatusCode;
use std::path::PathBuf;

/// 单次加载失败的原因
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// HTTP 请求错误
    #[error("HTTP 请求失败: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 状态码错误
    #[error("HTTP 状态码 {status}: {url}")]
    Status { status: StatusCode, url: String },

    /// 读取本地文件失败
    #[error("读取文件失败({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 资源没有任何数据
    #[error("资源为空: {0}")]
    Empty(String),

    /// 不支持的资源定位符
    #[error("不支持的资源地址: {0}")]
    UnsupportedScheme(String),

    /// 其他错误（自定义 loader 使用）
    #[error("{0}")]
    Other(String),
}

/// 队列唯一的错误类型：某个资源加载失败。
///
/// 只在本地消化：记录日志并广播事件，不会返回给 `request` 的调用方。
#[derive(Debug, thiserror::Error)]
#[error("预加载失败({id}): {source}")]
pub struct LoadFailure {
    pub id: String,
    #[source]
    pub source: LoadError,
}
