//! KvForage - 可切换存储引擎的异步 key-value 存储
//!
//! 调用方通过统一的异步 API 读写数据，实际使用哪个存储驱动由注册表在运行时选择，
//! 没有持久化引擎可用时回退到进程内存驱动。
//!
//! ## 模块
//!
//! - **forage**: 实例配置、驱动注册与选择、初始化屏障和存储实例
//!
//! ## 快速开始
//!
//! ```rust,no_run
//! use kvforage::{ForageOptions, LocalForage};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), kvforage::ForageError> {
//!     let store = LocalForage::new(ForageOptions::new().with_name("myapp"))?;
//!
//!     store.set_item("user", json!({"name": "alice"})).await?;
//!     let user = store.get_item("user").await?;
//!     assert_eq!(user["name"], "alice");
//!
//!     Ok(())
//! }
//! ```

pub mod forage;

// 重新导出主要的公共 API
pub use forage::{
    CallbackExt, DbInfo, Driver, DriverPreference, DriverRegistry, DropOptions, DropTarget,
    ForageConfig, ForageError, ForageOptions, IntoKey, LocalForage, MemoryDriver,
    MemoryDriverConfig, NamespaceTable, ReadyState,
};
pub use forage::{ASYNC_STORAGE, LOCAL_STORAGE, TEMP_STORAGE, WEBSQL_STORAGE};
