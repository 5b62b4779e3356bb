//! 顺序预加载队列：逐个加载资源元数据，对外暴露每个资源的加载状态和 handle。

mod actor;
mod messages;
mod queue;
mod status;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::error::PreloadError;
use crate::loader::MediaLoader;

pub use actor::{PreloadReceiver, PreloadSender};
pub use messages::{PreloadCommand, PreloadEvent};
pub use queue::{Completion, DEFAULT_LOOKAHEAD, LoadTicket, PreloadQueue};
pub use status::{ResourceStatus, StatusSnapshot};

/// 默认的加载间隔
pub const DEFAULT_DRAIN_DELAY: Duration = Duration::from_millis(100);

/// 预加载队列配置
#[derive(Debug, Clone)]
pub struct PreloadConfig {
    /// 初始化后立即请求的资源数
    pub lookahead: usize,
    /// 两次加载之间的间隔
    pub drain_delay: Duration,
    /// 命令 channel 容量
    pub command_capacity: usize,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            lookahead: env::var("MEDIA_PRELOAD_LOOKAHEAD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_LOOKAHEAD),
            drain_delay: env::var("MEDIA_PRELOAD_DRAIN_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_DRAIN_DELAY),
            command_capacity: 256,
        }
    }
}

/// 预加载事件订阅端
pub type PreloadEvents<H> = PreloadReceiver<H>;

/// 启动一个预加载会话。
///
/// 返回的 `Preloader` 可以随意 clone；所有 clone 都 drop 或调用 `shutdown` 后会话结束。
/// 事件订阅端不消费也不会阻塞队列。
pub fn spawn_preloader<L: MediaLoader>(
    loader: L,
    config: PreloadConfig,
) -> (Preloader<L::Handle>, PreloadEvents<L::Handle>) {
    let (tx, rx) = actor::spawn_preload_actor(loader, config);
    (Preloader { tx }, rx)
}

/// 预加载队列的客户端句柄
pub struct Preloader<H> {
    tx: PreloadSender<H>,
}

impl<H> Clone for Preloader<H> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<H: Send + Sync + 'static> Preloader<H> {
    /// 资源列表变化时调用：重置状态并预取前几个
    pub async fn initialize<I, S>(&self, ids: I) -> Result<(), PreloadError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids = ids.into_iter().map(Into::into).collect();
        self.tx.send(PreloadCommand::Initialize { ids }).await?;
        Ok(())
    }

    pub async fn request(&self, id: impl Into<String>) -> Result<(), PreloadError> {
        self.tx
            .send(PreloadCommand::Request { id: id.into() })
            .await?;
        Ok(())
    }

    pub async fn query(&self, id: impl Into<String>) -> Result<ResourceStatus<H>, PreloadError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(PreloadCommand::Query {
                id: id.into(),
                reply,
            })
            .await?;
        Ok(rx.await?)
    }

    pub async fn handle(&self, id: impl Into<String>) -> Result<Option<Arc<H>>, PreloadError> {
        Ok(self.query(id).await?.handle)
    }

    pub async fn is_loaded(&self, id: impl Into<String>) -> Result<bool, PreloadError> {
        Ok(self.query(id).await?.loaded)
    }

    pub async fn is_loading(&self, id: impl Into<String>) -> Result<bool, PreloadError> {
        Ok(self.query(id).await?.loading)
    }

    pub async fn snapshot(&self) -> Result<StatusSnapshot<H>, PreloadError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(PreloadCommand::Snapshot { reply }).await?;
        Ok(rx.await?)
    }

    /// 结束会话；在途加载不会被取消，结果直接丢弃
    pub async fn shutdown(&self) -> Result<(), PreloadError> {
        self.tx.send(PreloadCommand::Shutdown).await?;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
