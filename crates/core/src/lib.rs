//! # `stockbook-core` - 领域核心
//!
//! 定义日线行情、证券登记、分析结果等领域实体，以及存储层和分析层的抽象端口。
//! 具体实现（SQLite、CSV 导入）位于其他 crate，通过 `Arc<dyn Trait>` 注入。

pub mod analytics;
pub mod common;
pub mod config;
pub mod market;
pub mod store;

#[cfg(feature = "test-utils")]
pub mod test_utils;
