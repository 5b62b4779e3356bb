//! 外部加载能力：给定资源 id，异步返回可用的媒体 handle 或失败原因。

mod probe;
mod source;

use std::future::Future;
use std::sync::Arc;

use crate::error::LoadError;

pub use probe::{Container, probe_container};
pub use source::{MediaHandle, SourceLoader, SourceLoaderConfig};

/// 队列只关心结果，不关心加载方式。
pub trait MediaLoader: Send + Sync + 'static {
    type Handle: Send + Sync + 'static;

    fn load(&self, id: &str) -> impl Future<Output = Result<Self::Handle, LoadError>> + Send;
}

impl<L: MediaLoader> MediaLoader for Arc<L> {
    type Handle = L::Handle;

    fn load(&self, id: &str) -> impl Future<Output = Result<Self::Handle, LoadError>> + Send {
        (**self).load(id)
    }
}
