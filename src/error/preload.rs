//! 预加载队列客户端错误

/// `Preloader` 调用失败
#[derive(Debug, thiserror::Error)]
pub enum PreloadError {
    /// 队列 actor 已退出（shutdown 或 panic）
    #[error("预加载队列已关闭")]
    Closed,
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for PreloadError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        PreloadError::Closed
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for PreloadError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        PreloadError::Closed
    }
}
