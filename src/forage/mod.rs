//! 异步 key-value 存储抽象模块
//!
//! 同一套 API 背后可以切换不同的存储驱动，调用方不依赖具体可用的是哪一个

pub mod completion;
pub mod config;
pub mod driver;
pub mod error;
pub mod instance;
pub mod key;
pub mod key_prefix;
pub mod ready_gate;

// 重新导出核心接口
pub use completion::CallbackExt;
pub use config::{DriverPreference, ForageConfig, ForageOptions, DEFAULT_NAME, DEFAULT_STORE_NAME};
pub use driver::{
    DbInfo, DriverRegistry, DropOptions, DropScope, DropTarget, Driver, MemoryDriver,
    MemoryDriverConfig, NamespaceTable, ASYNC_STORAGE, LOCAL_STORAGE, TEMP_STORAGE,
    WEBSQL_STORAGE,
};
pub use error::ForageError;
pub use instance::LocalForage;
pub use key::{normalize_key, IntoKey};
pub use key_prefix::compute_prefix;
pub use ready_gate::ReadyState;
