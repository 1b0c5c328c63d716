//! 日志初始化
//!
//! 解析器本身只通过 `tracing` 宏输出日志；进程入口可用这里的函数安装订阅器。
//! `RUST_LOG` 存在时优先使用它，否则使用传入的默认指令。

use tracing_subscriber::EnvFilter;

use crate::error::{ResolverError, Result};

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// 安装文本格式的全局订阅器
///
/// # 示例
/// ```rust,no_run
/// flare_simplelb::logging::init_tracing("info,flare_simplelb=debug").ok();
/// ```
pub fn init_tracing(default_directive: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_directive))
        .with_target(true)
        .try_init()
        .map_err(|e| ResolverError::Telemetry(e.to_string()))
}

/// 安装 JSON 格式的全局订阅器
pub fn init_json_tracing(default_directive: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter(default_directive))
        .with_current_span(false)
        .try_init()
        .map_err(|e| ResolverError::Telemetry(e.to_string()))
}
