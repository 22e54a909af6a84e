//! 突发申请演示：N 个并发申请者争抢配额，等待消费端落库后输出核对结果。
//!
//! ```bash
//! RUST_LOG=info cargo run -p coupon-demo -- --requests 1000 --quota 100
//! # 多进程共享计数器与去重集合
//! RUST_LOG=info cargo run -p coupon-demo -- --store-url redis://127.0.0.1:6379/
//! ```
use anyhow::Context;
use clap::Parser;
use coupon_application::command::ApplyCoupon;
use coupon_application::command_handler::CommandHandler;
use coupon_application::context::AppContext;
use coupon_application::{Collaborators, InMemoryBackends, IssuanceConfig, IssuanceSystem};
use coupon_domain::coordination::RedisCoordinationStore;
use coupon_domain::coupon::OwnerId;
use coupon_domain::state::IssuanceState;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "coupon-demo", about = "Burst coupon issuance against a quota")]
struct CliArgs {
    /// 并发申请数（身份为 0..requests）
    #[arg(long, env = "COUPON_REQUESTS", default_value_t = 1000)]
    requests: i64,
    /// 配额
    #[arg(long, env = "COUPON_QUOTA", default_value_t = 100)]
    quota: i64,
    /// 每个 topic 的分区数
    #[arg(long, env = "COUPON_PARTITIONS", default_value_t = 4)]
    partitions: u32,
    /// 消费工作者数
    #[arg(long, env = "COUPON_WORKERS", default_value_t = 4)]
    workers: usize,
    #[arg(long, env = "COUPON_TOPIC", default_value = "coupon_create")]
    topic: String,
    #[arg(long, env = "COUPON_GROUP_ID", default_value = "group_1")]
    group_id: String,
    /// 共享协调存储（Redis）地址；省略时使用进程内存储
    #[arg(long, env = "COUPON_STORE_URL")]
    store_url: Option<String>,
    /// 等待消费端追平的最长时间（秒）
    #[arg(long, env = "COUPON_DRAIN_TIMEOUT_SECS", default_value_t = 30)]
    drain_timeout_secs: u64,
}

impl CliArgs {
    fn issuance_config(&self) -> IssuanceConfig {
        IssuanceConfig::builder()
            .quota(self.quota)
            .partitions(self.partitions)
            .workers(self.workers)
            .topic(self.topic.clone())
            .group_id(self.group_id.clone())
            .maybe_store_url(self.store_url.clone())
            .build()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let backends = InMemoryBackends::for_config(&args.issuance_config());
    let system = match args.store_url.as_deref() {
        Some(url) => {
            let store = RedisCoordinationStore::connect(url).await?;
            let collaborators = Collaborators::builder()
                .coordination(Arc::new(store))
                .event_log(backends.event_log.clone())
                .coupons(backends.coupons.clone())
                .failures(backends.failures.clone())
                .build();
            IssuanceSystem::new(args.issuance_config(), collaborators)?
        }
        None => backends.system(args.issuance_config())?,
    };
    let config = system.config().clone();
    let consumers = system.start_consumers();

    let started = Instant::now();
    let mut tasks = Vec::with_capacity(args.requests.max(0) as usize);
    for owner in 0..args.requests {
        let service = system.service();
        tasks.push(tokio::spawn(async move {
            let ctx = AppContext::new().with_actor("coupon-demo");
            service.handle(&ctx, ApplyCoupon::new(OwnerId::new(owner))).await
        }));
    }

    let mut outcomes: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut errors = 0usize;
    for t in tasks {
        match t.await.context("apply task panicked")? {
            Ok(receipt) => *outcomes.entry(receipt.state.as_str()).or_default() += 1,
            Err(err) => {
                errors += 1;
                tracing::warn!(error = %err, "request failed");
            }
        }
    }
    let caller_elapsed = started.elapsed();

    let drained = tokio::time::timeout(Duration::from_secs(args.drain_timeout_secs), async {
        while backends.event_log.lag(&config.topic, &config.group_id) > 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .is_ok();

    consumers.shutdown();
    consumers.join().await?;

    let report = system.report().await?;
    tracing::info!(
        requests = args.requests,
        quota = config.quota,
        enqueued = outcomes.get(IssuanceState::Enqueued.as_str()).copied().unwrap_or(0),
        rejected_quota = outcomes
            .get(IssuanceState::RejectedQuota.as_str())
            .copied()
            .unwrap_or(0),
        rejected_duplicate = outcomes
            .get(IssuanceState::RejectedDuplicate.as_str())
            .copied()
            .unwrap_or(0),
        errors,
        caller_ms = caller_elapsed.as_millis() as u64,
        "caller side finished"
    );
    tracing::info!(
        drained,
        issued = report.issued,
        failed = report.failed,
        "consumer side finished"
    );

    if args.store_url.is_none() {
        tracing::info!(
            tickets_taken = backends.coordination.counter(&config.counter_key),
            claimed = backends.coordination.set_len(&config.dedup_key),
            "in-process coordination store"
        );
    }

    if !drained {
        anyhow::bail!(
            "consumers did not drain within {}s",
            args.drain_timeout_secs
        );
    }
    Ok(())
}
