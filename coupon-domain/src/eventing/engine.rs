//! 消费引擎（ConsumerEngine）
//!
//! 以消费组身份驱动 `EventHandler` 的长驻工作池：
//! - 分区按轮转分配给 `workers` 个工作者，每个工作者合并其分区的记录流顺序处理，
//!   因此分区内有序、跨分区无序；
//! - 处理成功后提交位点（至少一次：提交前崩溃会导致重投）；
//! - 处理器返回错误视为致命，该工作者停止且不提交位点；
//! - `EngineHandle::join` 在任一工作者致命退出时立即取消其余工作者并返回该错误，
//!   未提交的记录在重启后重投。
//!
use super::{EventHandler, EventLog, LogRecord};
use crate::error::{DomainError, DomainResult as Result};
use bon::Builder;
use futures_util::{StreamExt, stream};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// ConsumerEngine：
/// - 订阅 Log 中 handler 所属 topic 的全部分区
/// - 按分区把记录交给 Handler，成功后提交位点
#[derive(Builder)]
pub struct ConsumerEngine {
    event_log: Arc<dyn EventLog>,
    handler: Arc<dyn EventHandler>,
    #[builder(default)]
    config: ConsumerConfig,
}

impl ConsumerEngine {
    /// 启动消费引擎，返回可用于关闭/等待的句柄
    pub fn start(self: Arc<Self>) -> EngineHandle {
        let token = CancellationToken::new();
        let workers = self.config.workers.max(1);
        let running = Arc::new(AtomicUsize::new(0));
        let mut tasks = JoinSet::new();

        for (worker, partitions) in assign_partitions(self.event_log.partitions(), workers)
            .into_iter()
            .enumerate()
        {
            if partitions.is_empty() {
                continue;
            }
            running.fetch_add(1, Ordering::AcqRel);
            tasks.spawn(Self::run_worker(
                self.clone(),
                worker,
                partitions,
                token.clone(),
                RunningGuard(running.clone()),
            ));
        }

        tracing::info!(
            topic = self.handler.topic(),
            group_id = %self.config.group_id,
            workers = tasks.len(),
            handler = self.handler.handler_name(),
            "consumer engine started"
        );

        EngineHandle {
            token,
            tasks,
            running,
        }
    }

    async fn run_worker(
        self: Arc<Self>,
        worker: usize,
        partitions: Vec<u32>,
        token: CancellationToken,
        _running: RunningGuard,
    ) -> Result<()> {
        let topic = self.handler.topic().to_string();
        let group_id = self.config.group_id.clone();

        let mut streams = Vec::with_capacity(partitions.len());
        for partition in &partitions {
            streams.push(
                self.event_log
                    .subscribe(&topic, &group_id, *partition)
                    .await?,
            );
        }
        let mut records = stream::select_all(streams);
        tracing::debug!(worker, ?partitions, "consumer worker subscribed");

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    break;
                }
                maybe_record = records.next() => {
                    match maybe_record {
                        Some(Ok(record)) => {
                            if let Err(err) = self.process(&record).await {
                                tracing::error!(
                                    worker,
                                    partition = record.partition(),
                                    offset = record.offset(),
                                    error = %err,
                                    "consumer worker stopped on fatal error"
                                );
                                return Err(err);
                            }
                        }
                        Some(Err(err)) => {
                            tracing::warn!(worker, error = %err, "error reading from event log");
                        }
                        None => {
                            break;
                        }
                    }
                }
            }
        }

        tracing::debug!(worker, "consumer worker stopped");
        Ok(())
    }

    async fn process(&self, record: &LogRecord) -> Result<()> {
        self.handler.handle(record).await?;

        // 提交失败不影响已完成的处理：记录稍后会被重投，由幂等校验兜底
        if let Err(err) = self
            .event_log
            .commit(
                record.topic(),
                &self.config.group_id,
                record.partition(),
                record.offset() + 1,
            )
            .await
        {
            tracing::warn!(
                partition = record.partition(),
                offset = record.offset(),
                error = %err,
                "offset commit failed"
            );
        }
        Ok(())
    }
}

/// 按轮转把 `0..partitions` 分给 `workers` 个工作者
fn assign_partitions(partitions: u32, workers: usize) -> Vec<Vec<u32>> {
    let workers = workers.max(1);
    let mut assignment = vec![Vec::new(); workers];
    for partition in 0..partitions {
        assignment[partition as usize % workers].push(partition);
    }
    assignment
}

/// 消费引擎配置
#[derive(Clone, Debug)]
pub struct ConsumerConfig {
    /// 消费组标识
    pub group_id: String,
    /// 工作者数量（超过分区数的部分空闲）
    pub workers: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            group_id: "group_1".to_string(),
            workers: 4,
        }
    }
}

/// 工作者退出（含 panic）时递减运行计数
struct RunningGuard(Arc<AtomicUsize>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// 引擎运行句柄：用于优雅关闭与等待任务结束
pub struct EngineHandle {
    token: CancellationToken,
    tasks: JoinSet<Result<()>>,
    running: Arc<AtomicUsize>,
}

impl EngineHandle {
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// 仍在运行的工作者数量
    pub fn running_workers(&self) -> usize {
        self.running.load(Ordering::Acquire)
    }

    /// 等待工作者结束
    ///
    /// 任一工作者致命退出时立即取消其余工作者，等待它们停止后返回该错误；
    /// 否则在 `shutdown` 后全部正常退出时返回 `Ok(())`。
    pub async fn join(mut self) -> Result<()> {
        let mut first_error = None;

        while let Some(joined) = self.tasks.join_next().await {
            let outcome = joined.unwrap_or_else(|join_err| {
                Err(DomainError::event_log(format!(
                    "consumer worker panicked: {join_err}"
                )))
            });
            match outcome {
                Err(err) if first_error.is_none() => {
                    tracing::error!(error = %err, "consumer worker failed; stopping remaining workers");
                    self.token.cancel();
                    first_error = Some(err);
                }
                _ => {}
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
