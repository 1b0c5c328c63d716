//! 地址集合差异比较
//!
//! 两个输入都按集合处理（同一输入内的重复地址折叠为一个），
//! 当且仅当对称差非空时认为发生了变化。基于哈希成员判断，期望复杂度 O(n+m)。

use std::collections::HashSet;

use crate::types::Address;

/// 判断地址集合是否发生变化
///
/// # 示例
/// ```rust
/// use flare_simplelb::Address;
/// use flare_simplelb::resolver::differ::changed;
///
/// let a = Address::from("10.0.0.1:80");
/// let b = Address::from("10.0.0.2:80");
///
/// assert!(!changed(&[a.clone(), a.clone(), b.clone()], &[b.clone(), a.clone()]));
/// assert!(changed(&[a.clone()], &[a, b]));
/// ```
pub fn changed<'a, I, J>(old: I, new: J) -> bool
where
    I: IntoIterator<Item = &'a Address>,
    J: IntoIterator<Item = &'a Address>,
{
    let old: HashSet<&str> = old.into_iter().map(Address::as_str).collect();
    let new: HashSet<&str> = new.into_iter().map(Address::as_str).collect();

    old.len() != new.len() || !old.iter().all(|address| new.contains(address))
}
