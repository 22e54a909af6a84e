//! 发放配置（IssuanceConfig）
//!
//! 部署所需的配置面：配额、协调存储键、日志 topic、消费组与并发度。
//! 默认值：配额 100、`coupon_count`、`applied_user`、`coupon_create`、`group_1`。
//!
use crate::error::AppError;
use bon::Builder;
use coupon_domain::allocation::DEFAULT_COUNTER_KEY;
use coupon_domain::dedup::DEFAULT_DEDUP_KEY;
use coupon_domain::eventing::{ConsumerConfig, DEFAULT_TOPIC};
use serde::{Deserialize, Serialize};

pub const DEFAULT_QUOTA: i64 = 100;
pub const DEFAULT_GROUP_ID: &str = "group_1";

#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuanceConfig {
    /// 配额（最多发放的名额数）
    #[builder(default = DEFAULT_QUOTA)]
    pub quota: i64,
    /// 取号计数器键
    #[builder(into, default = DEFAULT_COUNTER_KEY.to_string())]
    pub counter_key: String,
    /// 去重集合键
    #[builder(into, default = DEFAULT_DEDUP_KEY.to_string())]
    pub dedup_key: String,
    /// 发放事件 topic
    #[builder(into, default = DEFAULT_TOPIC.to_string())]
    pub topic: String,
    /// 消费组标识
    #[builder(into, default = DEFAULT_GROUP_ID.to_string())]
    pub group_id: String,
    /// 每个 topic 的分区数；装配时须与注入日志的分区数一致
    #[builder(default = 4)]
    pub partitions: u32,
    /// 消费工作者数量
    #[builder(default = 4)]
    pub workers: usize,
    /// 共享协调存储地址（如 `redis://127.0.0.1:6379/`）；为空时使用进程内存储
    #[builder(into)]
    pub store_url: Option<String>,
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl IssuanceConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.quota <= 0 {
            return Err(AppError::Config(format!(
                "quota must be positive, got {}",
                self.quota
            )));
        }
        for (name, value) in [
            ("counter_key", &self.counter_key),
            ("dedup_key", &self.dedup_key),
            ("topic", &self.topic),
            ("group_id", &self.group_id),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Config(format!("{name} must not be empty")));
            }
        }
        if self.counter_key == self.dedup_key {
            return Err(AppError::Config(
                "counter_key and dedup_key must differ".to_string(),
            ));
        }
        if self
            .store_url
            .as_deref()
            .is_some_and(|url| url.trim().is_empty())
        {
            return Err(AppError::Config(
                "store_url must not be blank when set".to_string(),
            ));
        }
        if self.partitions == 0 || self.workers == 0 {
            return Err(AppError::Config(
                "partitions and workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn consumer_config(&self) -> ConsumerConfig {
        ConsumerConfig {
            group_id: self.group_id.clone(),
            workers: self.workers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_standard_keys_and_quota() {
        let config = IssuanceConfig::default();
        assert_eq!(config.quota, 100);
        assert_eq!(config.counter_key, "coupon_count");
        assert_eq!(config.dedup_key, "applied_user");
        assert_eq!(config.topic, "coupon_create");
        assert_eq!(config.group_id, "group_1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides_selected_fields() {
        let config = IssuanceConfig::builder().quota(5).topic("t").workers(1).build();
        assert_eq!(config.quota, 5);
        assert_eq!(config.topic, "t");
        assert_eq!(config.consumer_config().workers, 1);
        assert_eq!(config.group_id, DEFAULT_GROUP_ID);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let zero_quota = IssuanceConfig::builder().quota(0).build();
        assert!(matches!(zero_quota.validate(), Err(AppError::Config(_))));

        let blank_topic = IssuanceConfig::builder().topic(" ").build();
        assert!(blank_topic.validate().is_err());

        let same_keys = IssuanceConfig::builder()
            .counter_key("k")
            .dedup_key("k")
            .build();
        assert!(same_keys.validate().is_err());

        let no_workers = IssuanceConfig::builder().workers(0).build();
        assert!(no_workers.validate().is_err());

        let blank_store = IssuanceConfig::builder().store_url("  ").build();
        assert!(blank_store.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: IssuanceConfig =
            serde_json::from_str(r#"{ "quota": 10, "workers": 2 }"#).unwrap();
        assert_eq!(config.quota, 10);
        assert_eq!(config.workers, 2);
        assert_eq!(config.topic, DEFAULT_TOPIC);
        assert_eq!(config.store_url, None);
    }

    #[test]
    fn store_url_is_read_from_json() {
        let config: IssuanceConfig =
            serde_json::from_str(r#"{ "store_url": "redis://cache:6379/" }"#).unwrap();
        assert_eq!(config.store_url.as_deref(), Some("redis://cache:6379/"));
        assert!(config.validate().is_ok());
    }
}
