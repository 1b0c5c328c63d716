//! 拨号目标解析
//!
//! 格式：`scheme://authority[/endpoint]`，authority 即服务名。

use std::fmt;
use std::str::FromStr;

use crate::error::{ResolverError, Result};

/// 拨号目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    scheme: String,
    authority: String,
    endpoint: String,
}

impl Target {
    /// 直接由 scheme 和服务名构造
    pub fn new(scheme: impl Into<String>, service_name: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            authority: service_name.into(),
            endpoint: String::new(),
        }
    }

    /// 解析目标字符串
    ///
    /// authority 为空（如 `simplelb:///svc`）仍然是合法的解析结果，
    /// 只是服务名为空，构建时会被拒绝。
    pub fn parse(target: &str) -> Result<Self> {
        let (scheme, rest) = target
            .split_once("://")
            .ok_or_else(|| ResolverError::invalid_target(target, "missing \"://\" separator"))?;

        if scheme.is_empty() {
            return Err(ResolverError::invalid_target(target, "empty scheme"));
        }

        let (authority, endpoint) = rest.split_once('/').unwrap_or((rest, ""));

        Ok(Self {
            scheme: scheme.to_ascii_lowercase(),
            authority: authority.to_string(),
            endpoint: endpoint.to_string(),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// 服务名（authority 部分）
    pub fn service_name(&self) -> &str {
        &self.authority
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl FromStr for Target {
    type Err = ResolverError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)?;
        if !self.endpoint.is_empty() {
            write!(f, "/{}", self.endpoint)?;
        }
        Ok(())
    }
}
