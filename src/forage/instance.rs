//! 面向调用方的存储实例
//!
//! 每个方法同步地规范化 key，然后返回一个 future：参数错误表现为一个已经失败的 future，
//! 不会 panic，也不会绕过回调。所有操作都先经过 [`ReadyGate`]。

use futures::future::{self, BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, OnceLock, RwLock};

use super::config::{DriverPreference, ForageConfig, ForageOptions};
use super::driver::{DbInfo, DriverRegistry, DropOptions, DropTarget, Driver};
use super::error::ForageError;
use super::key::{normalize_key, IntoKey};
use super::ready_gate::{GatePass, ReadyGate, ReadyState};

/// 实例选中的驱动及其命名空间，只设置一次
struct Binding {
    name: String,
    driver: Arc<dyn Driver>,
    info: DbInfo,
}

/// 异步 key-value 存储实例
///
/// 实例创建时只合并配置；驱动选择和 `init_storage` 在第一次操作（或显式调用
/// [`LocalForage::ready`]）时执行且只执行一次。
///
/// # 示例
///
/// ```ignore
/// use kvforage::{LocalForage, ForageOptions};
///
/// let store = LocalForage::new(ForageOptions::new().with_name("myapp"))?;
/// store.set_item("user", serde_json::json!({"name": "alice"})).await?;
/// let user = store.get_item("user").await?;
///
/// // 与 store 共享驱动（和数据）的另一个实例
/// let cache = store.create_instance(ForageOptions::new().with_store_name("cache"))?;
/// ```
pub struct LocalForage {
    registry: Arc<DriverRegistry>,
    /// create_instance 时使用的默认配置
    defaults: ForageConfig,
    config: RwLock<ForageConfig>,
    binding: OnceLock<Binding>,
    gate: ReadyGate,
}

impl LocalForage {
    /// 使用进程内共享的默认注册表创建实例
    ///
    /// 需要独立后端时使用 [`LocalForage::with_registry`]
    pub fn new(options: ForageOptions) -> Result<Self, ForageError> {
        Self::with_registry(DriverRegistry::shared_default(), options)
    }

    /// 使用给定的驱动注册表和默认配置创建实例
    pub fn with_registry(
        registry: Arc<DriverRegistry>,
        options: ForageOptions,
    ) -> Result<Self, ForageError> {
        Self::with_defaults(registry, ForageConfig::default(), options)
    }

    /// 使用给定的驱动注册表和默认配置创建实例，options 按字段覆盖 defaults
    pub fn with_defaults(
        registry: Arc<DriverRegistry>,
        defaults: ForageConfig,
        options: ForageOptions,
    ) -> Result<Self, ForageError> {
        let config = defaults.merge(&options)?;
        Ok(Self {
            registry,
            defaults,
            config: RwLock::new(config),
            binding: OnceLock::new(),
            gate: ReadyGate::new(),
        })
    }

    /// 创建共享同一个驱动注册表的新实例
    pub fn create_instance(&self, options: ForageOptions) -> Result<LocalForage, ForageError> {
        Self::with_defaults(Arc::clone(&self.registry), self.defaults.clone(), options)
    }

    pub fn registry(&self) -> Arc<DriverRegistry> {
        Arc::clone(&self.registry)
    }

    // ========== 配置 ==========

    /// 当前配置的快照
    pub fn current_config(&self) -> ForageConfig {
        self.config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// 合并新的选项，初始化开始后返回 ConfigLocked
    pub fn config(&self, options: ForageOptions) -> Result<ForageConfig, ForageError> {
        self.gate.while_uninitialized(|| -> Result<ForageConfig, ForageError> {
            let mut config = self
                .config
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let merged = config.merge(&options)?;
            *config = merged.clone();
            Ok(merged)
        })?
    }

    /// 修改驱动偏好，初始化开始后返回 ConfigLocked
    pub fn set_driver(&self, driver: impl Into<DriverPreference>) -> Result<(), ForageError> {
        self.config(ForageOptions::new().with_driver(driver))
            .map(|_| ())
    }

    /// 已选中的驱动名，选择之前为 None
    pub fn driver(&self) -> Option<String> {
        self.binding.get().map(|binding| binding.name.clone())
    }

    /// 驱动已注册并且在当前环境可用
    pub fn supports<'a>(&'a self, driver_name: &'a str) -> BoxFuture<'a, bool> {
        self.registry.supports(driver_name).boxed()
    }

    pub fn ready_state(&self) -> ReadyState {
        self.gate.state()
    }

    // ========== 初始化 ==========

    async fn initialize(&self) -> Result<(), ForageError> {
        let binding = match self.binding.get() {
            Some(binding) => binding,
            None => {
                let config = self.current_config();
                let (name, driver) = self.registry.select(&config.driver).await?;
                let info = DbInfo::new(config);
                // 只有持有排队锁的调用会走到这里，set 不会冲突
                let _ = self.binding.set(Binding { name, driver, info });
                self.binding.get().ok_or_else(|| {
                    ForageError::Driver("driver binding is missing".to_string())
                })?
            }
        };

        log::debug!(
            "init storage [{}] with driver {}",
            binding.info.key_prefix,
            binding.name
        );
        binding
            .driver
            .init_storage(&binding.info)
            .await
            .map_err(|e| e.into_driver_init(&binding.name))
    }

    async fn enter(&self) -> Result<(GatePass<'_>, &Binding), ForageError> {
        let pass = self.gate.enter(|| self.initialize()).await?;
        let binding = self
            .binding
            .get()
            .ok_or_else(|| ForageError::Driver("driver binding is missing".to_string()))?;
        Ok((pass, binding))
    }

    /// 等待驱动选择和初始化完成
    pub fn ready(&self) -> BoxFuture<'_, Result<(), ForageError>> {
        async move {
            self.enter().await?;
            Ok(())
        }
        .boxed()
    }

    // ========== 数据操作 ==========

    /// 获取值，key 不存在时返回 `Value::Null`
    pub fn get_item<K: IntoKey>(&self, key: K) -> BoxFuture<'_, Result<Value, ForageError>> {
        let key = match normalize_key(key) {
            Ok(key) => key,
            Err(err) => return future::ready(Err(err)).boxed(),
        };

        async move {
            let (_pass, binding) = self.enter().await?;
            binding.driver.get_item(&binding.info, &key).await
        }
        .boxed()
    }

    /// 写入值并返回写入的值，`None` 会以 `Value::Null` 保存
    pub fn set_item<K: IntoKey, V: Into<Value>>(
        &self,
        key: K,
        value: V,
    ) -> BoxFuture<'_, Result<Value, ForageError>> {
        let key = match normalize_key(key) {
            Ok(key) => key,
            Err(err) => return future::ready(Err(err)).boxed(),
        };
        let value = value.into();

        async move {
            let (_pass, binding) = self.enter().await?;
            binding.driver.set_item(&binding.info, &key, value).await
        }
        .boxed()
    }

    /// 删除 key，不存在时也返回成功
    pub fn remove_item<K: IntoKey>(&self, key: K) -> BoxFuture<'_, Result<(), ForageError>> {
        let key = match normalize_key(key) {
            Ok(key) => key,
            Err(err) => return future::ready(Err(err)).boxed(),
        };

        async move {
            let (_pass, binding) = self.enter().await?;
            binding.driver.remove_item(&binding.info, &key).await
        }
        .boxed()
    }

    /// 清空当前实例的命名空间
    pub fn clear(&self) -> BoxFuture<'_, Result<(), ForageError>> {
        async move {
            let (_pass, binding) = self.enter().await?;
            binding.driver.clear(&binding.info).await
        }
        .boxed()
    }

    /// 当前命名空间所有 key 的快照
    pub fn keys(&self) -> BoxFuture<'_, Result<Vec<String>, ForageError>> {
        async move {
            let (_pass, binding) = self.enter().await?;
            binding.driver.keys(&binding.info).await
        }
        .boxed()
    }

    pub fn length(&self) -> BoxFuture<'_, Result<usize, ForageError>> {
        async move {
            let (_pass, binding) = self.enter().await?;
            binding.driver.length(&binding.info).await
        }
        .boxed()
    }

    /// 第 index 个 key，越界时返回 None
    pub fn key(&self, index: usize) -> BoxFuture<'_, Result<Option<String>, ForageError>> {
        async move {
            let (_pass, binding) = self.enter().await?;
            binding.driver.key(&binding.info, index).await
        }
        .boxed()
    }

    /// 依次访问 (key, value, 从 1 开始的序号)，回调返回 `Some` 时提前结束
    pub fn iterate<'a, F>(
        &'a self,
        mut visitor: F,
    ) -> BoxFuture<'a, Result<Option<Value>, ForageError>>
    where
        F: FnMut(&str, &Value, usize) -> Option<Value> + Send + 'a,
    {
        async move {
            let (_pass, binding) = self.enter().await?;
            binding.driver.iterate(&binding.info, &mut visitor).await
        }
        .boxed()
    }

    /// 删除命名空间
    ///
    /// - 只给 name：删除该应用下的所有 store
    /// - 给 name 和 store_name：只删除该 store
    /// - 不给 name：删除当前实例配置对应的 store（store_name 可单独指定）
    pub fn drop_instance(&self, options: DropOptions) -> BoxFuture<'_, Result<(), ForageError>> {
        let target = match DropTarget::resolve(&options, Some(&self.current_config())) {
            Ok(target) => target,
            Err(err) => return future::ready(Err(err)).boxed(),
        };

        async move {
            let (_pass, binding) = self.enter().await?;
            binding.driver.drop_instance(&target).await
        }
        .boxed()
    }

    // ========== 类型化辅助方法 ==========

    /// 读取并反序列化为 T，key 不存在时返回 None
    pub fn get_item_as<'a, T, K>(
        &'a self,
        key: K,
    ) -> BoxFuture<'a, Result<Option<T>, ForageError>>
    where
        T: DeserializeOwned + Send + 'a,
        K: IntoKey,
    {
        let item = self.get_item(key);
        async move {
            match item.await? {
                Value::Null => Ok(None),
                value => Ok(Some(serde_json::from_value(value)?)),
            }
        }
        .boxed()
    }

    /// 序列化 T 后写入
    pub fn set_item_as<T, K>(&self, key: K, value: &T) -> BoxFuture<'_, Result<(), ForageError>>
    where
        T: Serialize + ?Sized,
        K: IntoKey,
    {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(err) => return future::ready(Err(err.into())).boxed(),
        };
        self.set_item(key, value).map(|result| result.map(|_| ())).boxed()
    }
}
