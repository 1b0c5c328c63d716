//! 地址与解析器阶段定义

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;

use crate::resolver::differ;

/// 可拨号的后端地址（`host` 或 `host:port`）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// 创建新的地址
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// 获取地址字符串
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 转换为内部字符串
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(address: &str) -> Self {
        Self(address.to_string())
    }
}

impl From<String> for Address {
    fn from(address: String) -> Self {
        Self(address)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Address {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// 地址集合
///
/// 语义上是集合：比较时忽略顺序，重复地址只保留第一次出现的位置。
/// 发布给下游时保持来源批次中的首次出现顺序，保证结果可复现。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Address>", into = "Vec<Address>")]
pub struct AddressSet {
    addresses: Vec<Address>,
}

impl AddressSet {
    /// 创建空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 地址数量（去重后）
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// 是否包含指定地址
    pub fn contains(&self, address: &str) -> bool {
        self.addresses.iter().any(|a| a.as_str() == address)
    }

    /// 按发布顺序迭代
    pub fn iter(&self) -> std::slice::Iter<'_, Address> {
        self.addresses.iter()
    }

    /// 以切片形式访问
    pub fn as_slice(&self) -> &[Address] {
        &self.addresses
    }

    /// 转换为地址列表
    pub fn into_vec(self) -> Vec<Address> {
        self.addresses
    }

    /// 转换为字符串列表（用于日志和下游拨号）
    pub fn to_strings(&self) -> Vec<String> {
        self.addresses.iter().map(|a| a.to_string()).collect()
    }
}

impl<A: Into<Address>> FromIterator<A> for AddressSet {
    fn from_iter<I: IntoIterator<Item = A>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let addresses = iter
            .into_iter()
            .map(Into::into)
            .filter(|address: &Address| seen.insert(address.clone()))
            .collect();
        Self { addresses }
    }
}

impl From<Vec<Address>> for AddressSet {
    fn from(addresses: Vec<Address>) -> Self {
        addresses.into_iter().collect()
    }
}

impl From<AddressSet> for Vec<Address> {
    fn from(set: AddressSet) -> Self {
        set.addresses
    }
}

impl<'a> IntoIterator for &'a AddressSet {
    type Item = &'a Address;
    type IntoIter = std::slice::Iter<'a, Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.addresses.iter()
    }
}

impl IntoIterator for AddressSet {
    type Item = Address;
    type IntoIter = std::vec::IntoIter<Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.addresses.into_iter()
    }
}

/// 集合相等：忽略顺序
impl PartialEq for AddressSet {
    fn eq(&self, other: &Self) -> bool {
        !differ::changed(self, other)
    }
}

impl Eq for AddressSet {}

impl fmt::Display for AddressSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, address) in self.addresses.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            f.write_str(address.as_str())?;
        }
        f.write_str("]")
    }
}

/// 解析器生命周期阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// 已构建，后台任务尚未开始第一次获取
    Starting,
    /// 正常运行（轮询中或流式接收中）
    Running,
    /// 监听流断开或打开失败，等待重连
    Reconnecting,
    /// 已收到取消信号，后台任务正在退出
    Closing,
    /// 后台任务已退出
    Closed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Starting => "starting",
            Phase::Running => "running",
            Phase::Reconnecting => "reconnecting",
            Phase::Closing => "closing",
            Phase::Closed => "closed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
