//! 错误处理模块
//!
//! 提供解析器的统一错误类型，以及外部协作者使用的装箱错误别名

pub mod resolver_error;

// 重新导出公共类型
pub use resolver_error::{BoxError, ResolverError, Result};
