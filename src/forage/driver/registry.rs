use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::sync::{Arc, RwLock};

use super::core::Driver;
use super::memory_driver::MemoryDriver;
use crate::forage::error::ForageError;

/// 进程内默认注册表，第一次使用时创建，之后所有 [`LocalForage::new`] 创建的实例共享它
///
/// [`LocalForage::new`]: crate::forage::LocalForage::new
static DEFAULT_REGISTRY: Lazy<Arc<DriverRegistry>> =
    Lazy::new(|| Arc::new(DriverRegistry::with_builtin_drivers()));

/// 驱动注册表
///
/// 保存按名字索引的候选驱动，并根据实例的驱动偏好选出第一个可用的驱动。
/// 同名重复注册会覆盖之前的驱动，但已经选中旧驱动的实例不受影响（实例持有自己的 `Arc`）。
#[derive(Default)]
pub struct DriverRegistry {
    drivers: RwLock<IndexMap<String, Arc<dyn Driver>>>,
}

impl DriverRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建注册了内置驱动的注册表
    ///
    /// 内置驱动只有 [`MemoryDriver`]，每个注册表持有一张独立的命名空间表
    pub fn with_builtin_drivers() -> Self {
        let memory: Arc<dyn Driver> = Arc::new(MemoryDriver::default());
        let mut drivers = IndexMap::new();
        drivers.insert(memory.name().to_string(), memory);

        Self {
            drivers: RwLock::new(drivers),
        }
    }

    /// 进程内共享的默认注册表
    ///
    /// 同一个进程里通过它选中同一驱动的实例，只要 name 和 store_name 相同就能看到彼此的写入
    pub fn shared_default() -> Arc<DriverRegistry> {
        Arc::clone(&DEFAULT_REGISTRY)
    }

    /// 以驱动自身的名字注册
    pub fn define(&self, driver: Arc<dyn Driver>) -> Result<(), ForageError> {
        let name = driver.name().to_string();
        self.define_with_name(&name, driver)
    }

    /// 以指定名字注册，同名驱动会被替换
    pub fn define_with_name(
        &self,
        name: &str,
        driver: Arc<dyn Driver>,
    ) -> Result<(), ForageError> {
        if name.is_empty() {
            return Err(ForageError::InvalidArguments(
                "driver name must not be empty".to_string(),
            ));
        }

        let mut drivers = self
            .drivers
            .write()
            .map_err(|_| ForageError::Driver("Failed to acquire write lock".to_string()))?;
        if drivers.insert(name.to_string(), driver).is_some() {
            log::debug!("driver redefined: {}", name);
        } else {
            log::debug!("driver defined: {}", name);
        }
        Ok(())
    }

    /// 按名字获取驱动
    pub fn get(&self, name: &str) -> Option<Arc<dyn Driver>> {
        self.drivers
            .read()
            .ok()
            .and_then(|drivers| drivers.get(name).cloned())
    }

    /// 已注册的驱动名，按注册顺序
    pub fn names(&self) -> Vec<String> {
        self.drivers
            .read()
            .map(|drivers| drivers.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// 驱动已注册并且在当前环境可用
    pub async fn supports(&self, name: &str) -> bool {
        match self.get(name) {
            Some(driver) => driver.supports().await,
            None => false,
        }
    }

    /// 按偏好顺序选出第一个已注册且可用的驱动
    pub async fn select(
        &self,
        preference: &[String],
    ) -> Result<(String, Arc<dyn Driver>), ForageError> {
        for name in preference {
            let driver = match self.get(name) {
                Some(driver) => driver,
                None => {
                    log::debug!("driver not defined, skipped: {}", name);
                    continue;
                }
            };

            if !driver.supports().await {
                log::warn!("driver not supported in this environment, skipped: {}", name);
                continue;
            }

            log::debug!("driver selected: {}", name);
            return Ok((name.clone(), driver));
        }

        Err(ForageError::NoMatchingDriver {
            tried: preference.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forage::driver::common_tests::db_info;
    use crate::forage::driver::{MemoryDriver, ASYNC_STORAGE, TEMP_STORAGE};
    use crate::forage::driver::{DbInfo, DropTarget};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    /// 环境中不可用的驱动
    struct UnsupportedDriver;

    #[async_trait]
    impl Driver for UnsupportedDriver {
        fn name(&self) -> &str {
            ASYNC_STORAGE
        }

        async fn supports(&self) -> bool {
            false
        }

        async fn init_storage(&self, _info: &DbInfo) -> Result<(), ForageError> {
            Err(ForageError::Driver("unsupported".to_string()))
        }

        async fn get_item(&self, _info: &DbInfo, _key: &str) -> Result<Value, ForageError> {
            Ok(Value::Null)
        }

        async fn set_item(
            &self,
            _info: &DbInfo,
            _key: &str,
            value: Value,
        ) -> Result<Value, ForageError> {
            Ok(value)
        }

        async fn remove_item(&self, _info: &DbInfo, _key: &str) -> Result<(), ForageError> {
            Ok(())
        }

        async fn clear(&self, _info: &DbInfo) -> Result<(), ForageError> {
            Ok(())
        }

        async fn keys(&self, _info: &DbInfo) -> Result<Vec<String>, ForageError> {
            Ok(vec![])
        }

        async fn length(&self, _info: &DbInfo) -> Result<usize, ForageError> {
            Ok(0)
        }

        async fn drop_instance(&self, _target: &DropTarget) -> Result<(), ForageError> {
            Ok(())
        }
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[tokio::test]
    async fn test_builtin_drivers() {
        let registry = DriverRegistry::with_builtin_drivers();
        assert_eq!(registry.names(), vec![TEMP_STORAGE.to_string()]);
        assert!(registry.supports(TEMP_STORAGE).await);
        assert!(!registry.supports(ASYNC_STORAGE).await);
    }

    #[tokio::test]
    async fn test_select_skips_undefined_and_unsupported() -> anyhow::Result<()> {
        let registry = DriverRegistry::with_builtin_drivers();
        registry.define(Arc::new(UnsupportedDriver))?;

        let (name, driver) = registry
            .select(&names(&["missing", ASYNC_STORAGE, TEMP_STORAGE]))
            .await?;
        assert_eq!(name, TEMP_STORAGE);
        assert_eq!(driver.name(), TEMP_STORAGE);
        Ok(())
    }

    #[tokio::test]
    async fn test_select_respects_preference_order() -> anyhow::Result<()> {
        let registry = DriverRegistry::new();
        registry.define_with_name("first", Arc::new(MemoryDriver::default()))?;
        registry.define_with_name("second", Arc::new(MemoryDriver::default()))?;

        let (name, _) = registry.select(&names(&["second", "first"])).await?;
        assert_eq!(name, "second");
        Ok(())
    }

    #[tokio::test]
    async fn test_select_no_matching_driver() -> anyhow::Result<()> {
        let registry = DriverRegistry::new();
        registry.define(Arc::new(UnsupportedDriver))?;

        let err = match registry.select(&names(&[ASYNC_STORAGE, "missing"])).await {
            Ok(_) => panic!("selection should fail"),
            Err(err) => err,
        };
        assert_eq!(
            err,
            ForageError::NoMatchingDriver {
                tried: names(&[ASYNC_STORAGE, "missing"])
            }
        );
        Ok(())
    }

    #[test]
    fn test_define_rejects_empty_name() {
        let registry = DriverRegistry::new();
        let err = registry
            .define_with_name("", Arc::new(MemoryDriver::default()))
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENTS");
    }

    #[tokio::test]
    async fn test_redefine_does_not_affect_held_driver() -> anyhow::Result<()> {
        let registry = DriverRegistry::new();
        registry.define(Arc::new(MemoryDriver::default()))?;
        let (_, held) = registry.select(&names(&[TEMP_STORAGE])).await?;

        let info = db_info("app", "store");
        held.set_item(&info, "k", json!(1)).await?;

        // 同名重新注册一个新的驱动（独立的命名空间表）
        registry.define(Arc::new(MemoryDriver::default()))?;
        assert_eq!(registry.names(), vec![TEMP_STORAGE.to_string()]);

        let (_, fresh) = registry.select(&names(&[TEMP_STORAGE])).await?;
        assert_eq!(fresh.get_item(&info, "k").await?, Value::Null);
        assert_eq!(held.get_item(&info, "k").await?, json!(1));
        Ok(())
    }

    #[test]
    fn test_shared_default_is_built_once() {
        let a = DriverRegistry::shared_default();
        let b = DriverRegistry::shared_default();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.get(TEMP_STORAGE).is_some());
    }
}
