use tokio::sync::oneshot;

use super::status::{ResourceStatus, StatusSnapshot};

#[derive(Debug)]
pub enum PreloadCommand<H> {
    /// 替换资源列表，重置所有状态
    Initialize { ids: Vec<String> },
    /// 幂等入队（fire-and-forget）
    Request { id: String },
    Query {
        id: String,
        reply: oneshot::Sender<ResourceStatus<H>>,
    },
    Snapshot {
        reply: oneshot::Sender<StatusSnapshot<H>>,
    },
    Shutdown,
}

#[derive(Debug)]
pub enum PreloadEvent<H> {
    Initialized {
        generation: u64,
        ids: Vec<String>,
    },
    /// 任意一次状态变化（开始加载 / 加载完成 / 加载失败）
    StatusChanged {
        id: String,
        status: ResourceStatus<H>,
    },
    LoadFailed {
        id: String,
        message: String,
    },
    /// 没有在途加载，队列也空了
    Idle,
}
