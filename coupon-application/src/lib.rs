//! 优惠券发放应用层（coupon-application）
//!
//! - `command`/`command_handler`：`ApplyCoupon` 命令与处理协议；
//! - `apply_service`：调用方同步路径（去重 → 取号 → 发布）；
//! - `query`/`query_handler`/`dto`：发放结果核对；
//! - `config`：部署配置面；
//! - `system`：显式装配全部组件。
//!
pub mod apply_service;
pub mod command;
pub mod command_handler;
pub mod config;
pub mod context;
pub mod dto;
pub mod error;
pub mod query;
pub mod query_handler;
pub mod system;

pub use apply_service::{ApplyReceipt, ApplyService};
pub use config::IssuanceConfig;
pub use error::AppError;
pub use system::{Collaborators, InMemoryBackends, IssuanceSystem};
