//! 显式装配（IssuanceSystem）
//!
//! 进程启动时由调用方注入各外部协作者，在这里一次性构造全部组件；
//! 不存在隐式装配或全局单例。
//!
use crate::apply_service::ApplyService;
use crate::config::IssuanceConfig;
use crate::context::AppContext;
use crate::dto::IssuanceReport;
use crate::error::AppError;
use crate::query::GetIssuanceReport;
use crate::query_handler::{IssuanceReportHandler, QueryHandler};
use bon::Builder;
use coupon_domain::allocation::AllocationGate;
use coupon_domain::coordination::{CoordinationStore, InMemoryCoordinationStore};
use coupon_domain::dedup::DedupGuard;
use coupon_domain::eventing::{
    ConsumerEngine, EngineHandle, EventLog, EventPublisher, FailureRecorder, InMemoryEventLog,
    IssuanceConsumer, RepositoryFailureRecorder,
};
use coupon_domain::persist::{
    CouponRepository, FailedEventRepository, InMemoryCouponRepository,
    InMemoryFailedEventRepository,
};
use std::sync::Arc;

/// 外部协作者
#[derive(Clone, Builder)]
pub struct Collaborators {
    coordination: Arc<dyn CoordinationStore>,
    event_log: Arc<dyn EventLog>,
    coupons: Arc<dyn CouponRepository>,
    failures: Arc<dyn FailedEventRepository>,
    /// 未提供时基于 `failures` 构造 `RepositoryFailureRecorder`
    recorder: Option<Arc<dyn FailureRecorder>>,
}

pub struct IssuanceSystem {
    config: IssuanceConfig,
    service: Arc<ApplyService>,
    engine: Arc<ConsumerEngine>,
    report: IssuanceReportHandler,
}

impl IssuanceSystem {
    pub fn new(config: IssuanceConfig, collaborators: Collaborators) -> Result<Self, AppError> {
        config.validate()?;

        let Collaborators {
            coordination,
            event_log,
            coupons,
            failures,
            recorder,
        } = collaborators;

        if event_log.partitions() != config.partitions {
            return Err(AppError::Config(format!(
                "config expects {} partitions but the event log has {}",
                config.partitions,
                event_log.partitions()
            )));
        }

        let dedup = DedupGuard::new(coordination.clone(), config.dedup_key.clone());
        let gate = AllocationGate::new(coordination, config.counter_key.clone(), config.quota);
        let publisher = EventPublisher::new(event_log.clone(), config.topic.clone());
        let service = Arc::new(ApplyService::new(dedup, gate, publisher));

        let recorder: Arc<dyn FailureRecorder> = match recorder {
            Some(recorder) => recorder,
            None => Arc::new(RepositoryFailureRecorder::new(failures.clone())),
        };
        let consumer =
            IssuanceConsumer::new(coupons.clone(), recorder).with_topic(config.topic.clone());
        let engine = Arc::new(
            ConsumerEngine::builder()
                .event_log(event_log)
                .handler(Arc::new(consumer))
                .config(config.consumer_config())
                .build(),
        );

        tracing::info!(
            quota = config.quota,
            topic = %config.topic,
            group_id = %config.group_id,
            workers = config.workers,
            "issuance system assembled"
        );

        Ok(Self {
            report: IssuanceReportHandler::new(coupons, failures),
            config,
            service,
            engine,
        })
    }

    pub fn config(&self) -> &IssuanceConfig {
        &self.config
    }

    /// 调用方路径
    pub fn service(&self) -> Arc<ApplyService> {
        self.service.clone()
    }

    /// 启动消费工作池
    pub fn start_consumers(&self) -> EngineHandle {
        self.engine.clone().start()
    }

    pub async fn report(&self) -> Result<IssuanceReport, AppError> {
        self.report.handle(&AppContext::default(), GetIssuanceReport).await
    }
}

/// 全内存的协作者集合，用于测试与本地运行
#[derive(Clone)]
pub struct InMemoryBackends {
    pub coordination: Arc<InMemoryCoordinationStore>,
    pub event_log: Arc<InMemoryEventLog>,
    pub coupons: Arc<InMemoryCouponRepository>,
    pub failures: Arc<InMemoryFailedEventRepository>,
}

impl InMemoryBackends {
    pub fn new(partitions: u32) -> Self {
        Self {
            coordination: Arc::new(InMemoryCoordinationStore::new()),
            event_log: Arc::new(InMemoryEventLog::new(partitions)),
            coupons: Arc::new(InMemoryCouponRepository::new()),
            failures: Arc::new(InMemoryFailedEventRepository::new()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::builder()
            .coordination(self.coordination.clone())
            .event_log(self.event_log.clone())
            .coupons(self.coupons.clone())
            .failures(self.failures.clone())
            .build()
    }

    /// 按配置的分区数构造
    pub fn for_config(config: &IssuanceConfig) -> Self {
        Self::new(config.partitions)
    }

    /// 按配置构造全内存系统
    pub fn system(&self, config: IssuanceConfig) -> Result<IssuanceSystem, AppError> {
        IssuanceSystem::new(config, self.collaborators())
    }
}
