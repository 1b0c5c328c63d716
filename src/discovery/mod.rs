//! 与 tower 生态的集成

pub mod discover;

pub use discover::{AddressDiscover, DiscoverSink, discover_channel};
