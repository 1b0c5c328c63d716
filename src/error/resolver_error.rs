//! 解析器统一错误类型

use thiserror::Error;

/// 地址源、下游 sink 等外部协作者返回的错误类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 解析器统一错误类型
///
/// 构建期错误（`EmptyServiceName`、`InvalidTarget`、`UnknownScheme`、`Config`、`Runtime`）
/// 同步返回给调用方；运行期错误通过 sink 的 `report_error` 上报，不会终止后台任务。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    /// 目标中的服务名为空
    #[error("empty service name in target")]
    EmptyServiceName,

    /// 目标字符串无法解析
    #[error("invalid target {target:?}: {reason}")]
    InvalidTarget { target: String, reason: String },

    /// 注册表中没有对应 scheme 的构建器
    #[error("no resolver builder registered for scheme {0:?}")]
    UnknownScheme(String),

    /// 地址源拉取或监听失败
    #[error("address source unavailable: {0}")]
    SourceUnavailable(String),

    /// 重试次数耗尽
    #[error("still failing after {attempts} attempts: {last_error}")]
    RetryExhausted { attempts: usize, last_error: String },

    /// 下游拒绝了新的地址状态
    #[error("sink rejected resolver state: {0}")]
    SinkRejected(String),

    /// 解析器正在关闭
    #[error("resolver cancelled")]
    Cancelled,

    /// 配置非法
    #[error("invalid resolver config: {0}")]
    Config(String),

    /// 当前线程没有可用的 tokio 运行时
    #[error("no tokio runtime available: {0}")]
    Runtime(String),

    /// 日志订阅器初始化失败
    #[error("failed to initialise tracing: {0}")]
    Telemetry(String),
}

impl ResolverError {
    /// 创建地址源不可用错误
    pub fn source_unavailable(error: impl std::fmt::Display) -> Self {
        ResolverError::SourceUnavailable(error.to_string())
    }

    /// 创建下游拒绝错误
    pub fn sink_rejected(error: impl std::fmt::Display) -> Self {
        ResolverError::SinkRejected(error.to_string())
    }

    /// 创建目标解析错误
    pub fn invalid_target(target: impl Into<String>, reason: impl Into<String>) -> Self {
        ResolverError::InvalidTarget {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// 创建配置错误
    pub fn config(reason: impl Into<String>) -> Self {
        ResolverError::Config(reason.into())
    }

    /// 是否值得在同一周期内重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, ResolverError::SourceUnavailable(_))
    }

    /// 是否为关闭过程中的取消
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ResolverError::Cancelled)
    }
}

/// 解析器结果类型
pub type Result<T> = std::result::Result<T, ResolverError>;
