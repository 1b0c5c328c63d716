//! scheme → 构建器 注册表
//!
//! 注册表由调用方创建并注入，不使用进程级全局状态。

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use crate::error::{ResolverError, Result};
use crate::resolver::builder::ResolverBuilder;
use crate::resolver::engine::ResolverHandle;
use crate::resolver::sink::StateSink;
use crate::resolver::target::Target;

/// 解析器注册表
#[derive(Default)]
pub struct ResolverRegistry {
    builders: RwLock<HashMap<String, Arc<dyn ResolverBuilder>>>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册构建器
    ///
    /// 每个 scheme 只对应一个构建器，重复注册会替换旧的并返回它。
    pub fn register(&self, builder: Arc<dyn ResolverBuilder>) -> Option<Arc<dyn ResolverBuilder>> {
        let scheme = builder.scheme().to_ascii_lowercase();
        let mut builders = self.builders.write().unwrap_or_else(PoisonError::into_inner);
        let previous = builders.insert(scheme.clone(), builder);
        if previous.is_some() {
            warn!(scheme = %scheme, "Replacing previously registered resolver builder");
        } else {
            info!(scheme = %scheme, "Registered resolver builder");
        }
        previous
    }

    /// 查找构建器
    pub fn get(&self, scheme: &str) -> Option<Arc<dyn ResolverBuilder>> {
        let builders = self.builders.read().unwrap_or_else(PoisonError::into_inner);
        builders.get(&scheme.to_ascii_lowercase()).cloned()
    }

    /// 已注册的 scheme（排序后）
    pub fn schemes(&self) -> Vec<String> {
        let builders = self.builders.read().unwrap_or_else(PoisonError::into_inner);
        let mut schemes: Vec<String> = builders.keys().cloned().collect();
        schemes.sort();
        schemes
    }

    /// 解析目标字符串并用对应的构建器构建解析器
    pub fn build(&self, target: &str, sink: Arc<dyn StateSink>) -> Result<ResolverHandle> {
        let target = Target::parse(target)?;
        let builder = self
            .get(target.scheme())
            .ok_or_else(|| ResolverError::UnknownScheme(target.scheme().to_string()))?;
        builder.build(&target, sink)
    }
}
