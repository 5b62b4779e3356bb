use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use super::status::{ResourceStatus, StatusSnapshot};
use crate::error::{LoadError, LoadFailure};

/// `initialize` 后立即请求的资源数
pub const DEFAULT_LOOKAHEAD: usize = 3;

/// 一次加载的凭证：资源 id + 发起时的会话代数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub id: String,
    pub generation: u64,
}

/// `complete` 的结果
#[derive(Debug)]
pub enum Completion<H> {
    Loaded { id: String, handle: Arc<H> },
    Failed(LoadFailure),
    /// 属于旧会话（中途重新 initialize）的结果，已丢弃
    Stale { id: String },
}

/// 顺序预加载队列的状态机。
///
/// 不做任何 IO：每个状态转换都返回调用方接下来要做的事
/// （拿到 `LoadTicket` 就去调用 loader）。同一时刻最多只有一个 ticket 在途。
pub struct PreloadQueue<H> {
    statuses: HashMap<String, ResourceStatus<H>>,
    pending: VecDeque<String>,
    in_flight: Option<LoadTicket>,
    generation: u64,
    lookahead: usize,
}

impl<H> Default for PreloadQueue<H> {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKAHEAD)
    }
}

impl<H> PreloadQueue<H> {
    pub fn new(lookahead: usize) -> Self {
        Self {
            statuses: HashMap::new(),
            pending: VecDeque::new(),
            in_flight: None,
            generation: 0,
            lookahead,
        }
    }

    /// 用新的资源列表重置会话，并立即请求前 `lookahead` 个。
    ///
    /// 在途的旧加载不会被取消，它仍占着 in-flight 位，完成后结果被丢弃。
    pub fn initialize(&mut self, ids: &[String]) -> Option<LoadTicket> {
        self.generation = self.generation.wrapping_add(1);
        self.pending.clear();
        self.statuses = ids
            .iter()
            .map(|id| (id.clone(), ResourceStatus::not_loaded()))
            .collect();

        let mut started = None;
        for id in ids.iter().take(self.lookahead) {
            if let Some(ticket) = self.request(id) {
                started = Some(ticket);
            }
        }
        started
    }

    /// 幂等入队；空闲时立即开始加载。
    pub fn request(&mut self, id: &str) -> Option<LoadTicket> {
        if let Some(st) = self.statuses.get(id)
            && (st.loaded || st.loading)
        {
            return None;
        }
        if self.pending.iter().any(|p| p == id) {
            return None;
        }

        self.pending.push_back(id.to_owned());
        if self.in_flight.is_some() {
            return None;
        }
        self.drain()
    }

    /// 取出队首开始加载；在途或队列为空时什么都不做。
    pub fn drain(&mut self) -> Option<LoadTicket> {
        if self.in_flight.is_some() {
            return None;
        }
        let id = self.pending.pop_front()?;

        let ticket = LoadTicket {
            id: id.clone(),
            generation: self.generation,
        };
        self.statuses.insert(id, ResourceStatus::loading());
        self.in_flight = Some(ticket.clone());
        Some(ticket)
    }

    /// 应用一次加载的结果并释放 in-flight 位。
    pub fn complete(&mut self, ticket: LoadTicket, result: Result<H, LoadError>) -> Completion<H> {
        match self.in_flight.take() {
            Some(current) if current == ticket => {}
            other => {
                tracing::warn!(id = %ticket.id, "收到非当前在途加载的结果，忽略");
                self.in_flight = other;
                return Completion::Stale { id: ticket.id };
            }
        }

        if ticket.generation != self.generation {
            return Completion::Stale { id: ticket.id };
        }

        match result {
            Ok(handle) => {
                let handle = Arc::new(handle);
                self.statuses
                    .insert(ticket.id.clone(), ResourceStatus::loaded(handle.clone()));
                Completion::Loaded {
                    id: ticket.id,
                    handle,
                }
            }
            Err(source) => {
                self.statuses
                    .insert(ticket.id.clone(), ResourceStatus::not_loaded());
                Completion::Failed(LoadFailure {
                    id: ticket.id,
                    source,
                })
            }
        }
    }

    pub fn query(&self, id: &str) -> ResourceStatus<H> {
        self.statuses.get(id).cloned().unwrap_or_default()
    }

    pub fn handle(&self, id: &str) -> Option<Arc<H>> {
        self.statuses.get(id).and_then(|st| st.handle.clone())
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.statuses.get(id).is_some_and(|st| st.loaded)
    }

    pub fn is_loading(&self, id: &str) -> bool {
        self.statuses.get(id).is_some_and(|st| st.loading)
    }

    pub fn snapshot(&self) -> StatusSnapshot<H> {
        self.statuses
            .iter()
            .map(|(id, st)| (id.clone(), st.clone()))
            .collect()
    }

    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(String::as_str)
    }

    pub fn in_flight(&self) -> Option<&LoadTicket> {
        self.in_flight.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn lookahead(&self) -> usize {
        self.lookahead
    }

    /// 没有在途加载且队列为空
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.pending.is_empty()
    }
}
