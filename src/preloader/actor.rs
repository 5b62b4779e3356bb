use std::sync::Arc;
use std::time::Duration;

use tokio::select;
use tokio::sync::mpsc;

use super::PreloadConfig;
use super::messages::{PreloadCommand, PreloadEvent};
use super::queue::{Completion, LoadTicket, PreloadQueue};
use super::status::ResourceStatus;
use crate::error::LoadError;
use crate::loader::MediaLoader;

pub type PreloadSender<H> = mpsc::Sender<PreloadCommand<H>>;
pub type PreloadReceiver<H> = mpsc::UnboundedReceiver<PreloadEvent<H>>;

enum Internal<H> {
    Finished {
        ticket: LoadTicket,
        result: Result<H, LoadError>,
    },
    /// 节流定时器到期，尝试取下一个
    Drain,
}

struct PreloadActor<L: MediaLoader> {
    loader: Arc<L>,
    queue: PreloadQueue<L::Handle>,
    drain_delay: Duration,
    rx_cmd: mpsc::Receiver<PreloadCommand<L::Handle>>,
    tx_evt: mpsc::UnboundedSender<PreloadEvent<L::Handle>>,
    tx_internal: mpsc::UnboundedSender<Internal<L::Handle>>,
    rx_internal: mpsc::UnboundedReceiver<Internal<L::Handle>>,
}

impl<L: MediaLoader> PreloadActor<L> {
    fn new(
        loader: L,
        config: &PreloadConfig,
        rx_cmd: mpsc::Receiver<PreloadCommand<L::Handle>>,
        tx_evt: mpsc::UnboundedSender<PreloadEvent<L::Handle>>,
    ) -> Self {
        let (tx_internal, rx_internal) = mpsc::unbounded_channel();
        Self {
            loader: Arc::new(loader),
            queue: PreloadQueue::new(config.lookahead),
            drain_delay: config.drain_delay,
            rx_cmd,
            tx_evt,
            tx_internal,
            rx_internal,
        }
    }

    async fn run(mut self) {
        tracing::info!(
            lookahead = self.queue.lookahead(),
            drain_delay_ms = self.drain_delay.as_millis() as u64,
            "PreloadActor 已启动"
        );

        loop {
            select! {
                maybe_cmd = self.rx_cmd.recv() => {
                    let Some(cmd) = maybe_cmd else {
                        break;
                    };
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                Some(internal) = self.rx_internal.recv() => {
                    self.handle_internal(internal);
                }
            }
        }

        // 在途加载不取消；它的结果发到已关闭的 channel 上被丢弃
        tracing::info!(
            in_flight = self.queue.in_flight().map(|t| t.id.as_str()),
            "PreloadActor 已退出"
        );
    }

    /// 返回 false 表示退出
    fn handle_command(&mut self, cmd: PreloadCommand<L::Handle>) -> bool {
        match cmd {
            PreloadCommand::Initialize { ids } => {
                let started = self.queue.initialize(&ids);
                tracing::info!(
                    generation = self.queue.generation(),
                    total = ids.len(),
                    "预加载列表已重置"
                );
                self.emit(PreloadEvent::Initialized {
                    generation: self.queue.generation(),
                    ids,
                });
                if let Some(ticket) = started {
                    self.start(ticket);
                }
                self.emit_if_idle();
            }
            PreloadCommand::Request { id } => {
                match self.queue.request(&id) {
                    Some(ticket) => self.start(ticket),
                    None => tracing::trace!(id = %id, "请求已在队列/加载中/已完成，跳过"),
                }
                self.emit_if_idle();
            }
            PreloadCommand::Query { id, reply } => {
                let _ = reply.send(self.queue.query(&id));
            }
            PreloadCommand::Snapshot { reply } => {
                let _ = reply.send(self.queue.snapshot());
            }
            PreloadCommand::Shutdown => {
                return false;
            }
        }
        true
    }

    fn handle_internal(&mut self, internal: Internal<L::Handle>) {
        match internal {
            Internal::Finished { ticket, result } => {
                match self.queue.complete(ticket, result) {
                    Completion::Loaded { id, handle } => {
                        tracing::info!(id = %id, "预加载完成");
                        self.emit(PreloadEvent::StatusChanged {
                            id,
                            status: ResourceStatus::loaded(handle),
                        });
                    }
                    Completion::Failed(failure) => {
                        tracing::warn!(id = %failure.id, err = %failure.source, "预加载失败");
                        self.emit(PreloadEvent::StatusChanged {
                            id: failure.id.clone(),
                            status: ResourceStatus::not_loaded(),
                        });
                        self.emit(PreloadEvent::LoadFailed {
                            id: failure.id,
                            message: failure.source.to_string(),
                        });
                    }
                    Completion::Stale { id } => {
                        tracing::debug!(id = %id, "丢弃旧列表的加载结果");
                    }
                }

                self.schedule_drain();
                self.emit_if_idle();
            }
            Internal::Drain => {
                if let Some(ticket) = self.queue.drain() {
                    self.start(ticket);
                }
            }
        }
    }

    fn start(&mut self, ticket: LoadTicket) {
        tracing::debug!(id = %ticket.id, generation = ticket.generation, "开始预加载");
        self.emit(PreloadEvent::StatusChanged {
            id: ticket.id.clone(),
            status: self.queue.query(&ticket.id),
        });

        let loader = self.loader.clone();
        let tx_internal = self.tx_internal.clone();
        tokio::spawn(async move {
            let result = loader.load(&ticket.id).await;
            let _ = tx_internal.send(Internal::Finished { ticket, result });
        });
    }

    /// 每次加载结束后隔一小段时间再取下一个，让出宿主的更新循环
    fn schedule_drain(&self) {
        let tx_internal = self.tx_internal.clone();
        let delay = self.drain_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx_internal.send(Internal::Drain);
        });
    }

    fn emit_if_idle(&self) {
        if self.queue.is_idle() {
            self.emit(PreloadEvent::Idle);
        }
    }

    fn emit(&self, evt: PreloadEvent<L::Handle>) {
        // 没有订阅者时直接丢弃
        let _ = self.tx_evt.send(evt);
    }
}

pub fn spawn_preload_actor<L: MediaLoader>(
    loader: L,
    config: PreloadConfig,
) -> (PreloadSender<L::Handle>, PreloadReceiver<L::Handle>) {
    let (tx_cmd, rx_cmd) = mpsc::channel::<PreloadCommand<L::Handle>>(config.command_capacity.max(1));
    let (tx_evt, rx_evt) = mpsc::unbounded_channel::<PreloadEvent<L::Handle>>();

    let actor = PreloadActor::new(loader, &config, rx_cmd, tx_evt);

    if tokio::runtime::Handle::try_current().is_ok() {
        tokio::spawn(actor.run());
    } else {
        std::thread::spawn(move || match tokio::runtime::Runtime::new() {
            Ok(rt) => rt.block_on(actor.run()),
            Err(e) => tracing::error!(err = %e, "创建 tokio runtime 失败，预加载队列不可用"),
        });
    }

    (tx_cmd, rx_evt)
}
