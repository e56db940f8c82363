pub mod core;
pub mod memory_driver;
pub mod registry;


// 重新导出核心类型和 trait
pub use self::core::{DbInfo, DropOptions, DropScope, DropTarget, Driver};
// 重新导出具体实现
pub use memory_driver::{MemoryDriver, MemoryDriverConfig, NamespaceTable};
pub use registry::DriverRegistry;

/// 结构化数据库驱动名
pub const ASYNC_STORAGE: &str = "asyncStorage";
/// 关系型数据库驱动名
pub const WEBSQL_STORAGE: &str = "webSQLStorage";
/// 扁平 key-value 驱动名
pub const LOCAL_STORAGE: &str = "localStorageWrapper";
/// 内存驱动名，总是可用
pub const TEMP_STORAGE: &str = "tempStorageWrapper";
