use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 单个资源的加载状态
///
/// `handle` 只在 `loaded == true` 时存在；队列持有它，消费方拿到的是共享引用。
pub struct ResourceStatus<H> {
    pub loaded: bool,
    pub loading: bool,
    pub handle: Option<Arc<H>>,
}

impl<H> ResourceStatus<H> {
    pub fn not_loaded() -> Self {
        Self {
            loaded: false,
            loading: false,
            handle: None,
        }
    }

    pub fn loading() -> Self {
        Self {
            loaded: false,
            loading: true,
            handle: None,
        }
    }

    pub fn loaded(handle: Arc<H>) -> Self {
        Self {
            loaded: true,
            loading: false,
            handle: Some(handle),
        }
    }

    /// 既没加载中也没加载完成（包括失败过的资源）
    pub fn is_idle(&self) -> bool {
        !self.loaded && !self.loading
    }
}

impl<H> Default for ResourceStatus<H> {
    fn default() -> Self {
        Self::not_loaded()
    }
}

// 手写 Clone：只克隆 Arc，不要求 H: Clone。
impl<H> Clone for ResourceStatus<H> {
    fn clone(&self) -> Self {
        Self {
            loaded: self.loaded,
            loading: self.loading,
            handle: self.handle.clone(),
        }
    }
}

impl<H> fmt::Debug for ResourceStatus<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceStatus")
            .field("loaded", &self.loaded)
            .field("loading", &self.loading)
            .field("has_handle", &self.handle.is_some())
            .finish()
    }
}

/// 全量状态快照，供需要对任意变化做出反应的观察者使用
pub type StatusSnapshot<H> = HashMap<String, ResourceStatus<H>>;
