use async_trait::async_trait;
use dashmap::DashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smart_default::SmartDefault;
use std::sync::Arc;

use super::core::{DbInfo, DropScope, DropTarget, Driver};
use super::TEMP_STORAGE;
use crate::forage::error::ForageError;

/// 按前缀划分的两级容器：命名空间前缀 -> (key -> value)
///
/// 同一张表可以被多个驱动实例共享，前缀相同的实例看到同一份数据。
/// key 保持插入顺序。
#[derive(Debug, Default)]
pub struct NamespaceTable {
    namespaces: DashMap<String, IndexMap<String, Value>>,
    initial_capacity: Option<usize>,
}

impl NamespaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新建命名空间时预留 initial_capacity 个 key 的容量，None 时不预留
    pub fn with_initial_capacity(initial_capacity: Option<usize>) -> Self {
        Self {
            namespaces: DashMap::new(),
            initial_capacity,
        }
    }

    fn empty_namespace(&self) -> IndexMap<String, Value> {
        match self.initial_capacity {
            Some(capacity) => IndexMap::with_capacity(capacity),
            None => IndexMap::new(),
        }
    }

    /// 命名空间不存在时创建，返回是否新建
    pub fn ensure(&self, prefix: &str) -> bool {
        if self.namespaces.contains_key(prefix) {
            return false;
        }
        let mut created = false;
        self.namespaces.entry(prefix.to_string()).or_insert_with(|| {
            created = true;
            self.empty_namespace()
        });
        created
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.namespaces.contains_key(prefix)
    }

    pub fn get(&self, prefix: &str, key: &str) -> Option<Value> {
        self.namespaces
            .get(prefix)
            .and_then(|namespace| namespace.get(key).cloned())
    }

    /// 写入时命名空间不存在则重新创建
    pub fn set(&self, prefix: &str, key: &str, value: Value) {
        self.namespaces
            .entry(prefix.to_string())
            .or_insert_with(|| self.empty_namespace())
            .insert(key.to_string(), value);
    }

    pub fn remove(&self, prefix: &str, key: &str) {
        if let Some(mut namespace) = self.namespaces.get_mut(prefix) {
            namespace.shift_remove(key);
        }
    }

    pub fn keys(&self, prefix: &str) -> Vec<String> {
        self.namespaces
            .get(prefix)
            .map(|namespace| namespace.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, prefix: &str) -> usize {
        self.namespaces
            .get(prefix)
            .map(|namespace| namespace.len())
            .unwrap_or(0)
    }

    /// 删除前缀完全相同的命名空间
    pub fn drop_namespace(&self, prefix: &str) -> bool {
        self.namespaces.remove(prefix).is_some()
    }

    /// 删除所有以 app_prefix 开头的命名空间，返回删除数量
    pub fn drop_app(&self, app_prefix: &str) -> usize {
        let before = self.namespaces.len();
        self.namespaces
            .retain(|prefix, _| !prefix.starts_with(app_prefix));
        before.saturating_sub(self.namespaces.len())
    }

    /// 当前存在的所有命名空间前缀
    pub fn prefixes(&self) -> Vec<String> {
        let mut prefixes: Vec<String> = self
            .namespaces
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        prefixes.sort();
        prefixes
    }
}

/// MemoryDriver 配置结构体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, SmartDefault)]
#[serde(default)]
pub struct MemoryDriverConfig {
    /// 新建命名空间的初始容量，None 时按需增长
    pub initial_capacity: Option<usize>,
}

/// 基于进程内存的驱动，在没有持久化引擎时兜底使用
///
/// `clear` 会删除整个命名空间，之后对同一前缀的操作透明地看到一个空的命名空间。
pub struct MemoryDriver {
    table: Arc<NamespaceTable>,
}

impl MemoryDriver {
    /// 创建使用独立命名空间表的驱动
    pub fn new(config: MemoryDriverConfig) -> Self {
        Self {
            table: Arc::new(NamespaceTable::with_initial_capacity(config.initial_capacity)),
        }
    }

    /// 创建共享给定命名空间表的驱动
    pub fn with_table(table: Arc<NamespaceTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> Arc<NamespaceTable> {
        Arc::clone(&self.table)
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new(MemoryDriverConfig::default())
    }
}

#[async_trait]
impl Driver for MemoryDriver {
    fn name(&self) -> &str {
        TEMP_STORAGE
    }

    async fn init_storage(&self, info: &DbInfo) -> Result<(), ForageError> {
        if self.table.ensure(&info.key_prefix) {
            log::debug!("namespace created: {}", info.key_prefix);
        }
        Ok(())
    }

    async fn get_item(&self, info: &DbInfo, key: &str) -> Result<Value, ForageError> {
        Ok(self.table.get(&info.key_prefix, key).unwrap_or(Value::Null))
    }

    async fn set_item(
        &self,
        info: &DbInfo,
        key: &str,
        value: Value,
    ) -> Result<Value, ForageError> {
        self.table.set(&info.key_prefix, key, value.clone());
        Ok(value)
    }

    async fn remove_item(&self, info: &DbInfo, key: &str) -> Result<(), ForageError> {
        self.table.remove(&info.key_prefix, key);
        Ok(())
    }

    async fn clear(&self, info: &DbInfo) -> Result<(), ForageError> {
        if self.table.drop_namespace(&info.key_prefix) {
            log::debug!("namespace cleared: {}", info.key_prefix);
        }
        Ok(())
    }

    async fn keys(&self, info: &DbInfo) -> Result<Vec<String>, ForageError> {
        Ok(self.table.keys(&info.key_prefix))
    }

    async fn length(&self, info: &DbInfo) -> Result<usize, ForageError> {
        Ok(self.table.len(&info.key_prefix))
    }

    async fn drop_instance(&self, target: &DropTarget) -> Result<(), ForageError> {
        match target.scope() {
            DropScope::Namespace(prefix) => {
                let dropped = self.table.drop_namespace(&prefix);
                log::debug!("drop namespace {}: {}", prefix, dropped);
            }
            DropScope::App(prefix) => {
                let dropped = self.table.drop_app(&prefix);
                log::debug!("drop app {}: {} namespaces", prefix, dropped);
            }
        }
        Ok(())
    }
}
