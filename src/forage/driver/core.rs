use async_trait::async_trait;
use serde_json::Value;

use crate::forage::config::{sanitize_store_name, ForageConfig, DEFAULT_STORE_NAME};
use crate::forage::error::ForageError;
use crate::forage::key_prefix::{app_prefix, compute_prefix};

/// 实例绑定到驱动后的数据库信息
#[derive(Debug, Clone, PartialEq)]
pub struct DbInfo {
    pub config: ForageConfig,
    /// 由 name 和 store_name 计算出的命名空间前缀，初始化后不再变化
    pub key_prefix: String,
}

impl DbInfo {
    pub fn new(config: ForageConfig) -> Self {
        let key_prefix = compute_prefix(&config.name, &config.store_name, DEFAULT_STORE_NAME);
        Self { config, key_prefix }
    }
}

/// `drop_instance` 的调用参数，未设置的字段从当前实例配置中补齐
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DropOptions {
    pub name: Option<String>,
    pub store_name: Option<String>,
}

impl DropOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_store_name(mut self, store_name: impl Into<String>) -> Self {
        self.store_name = Some(store_name.into());
        self
    }
}

/// 要删除的命名空间
#[derive(Debug, Clone, PartialEq)]
pub struct DropTarget {
    pub name: String,
    /// 为 None 时删除 name 下的所有命名空间
    pub store_name: Option<String>,
}

/// 删除范围
#[derive(Debug, Clone, PartialEq)]
pub enum DropScope {
    /// 仅删除前缀完全相同的命名空间
    Namespace(String),
    /// 删除所有以该前缀开头的命名空间
    App(String),
}

impl DropTarget {
    /// 根据调用参数和当前实例配置确定要删除的目标
    ///
    /// 未显式给出 name 时，name 和缺省的 store_name 都取自当前配置；
    /// 两处都拿不到 name 时返回 InvalidArguments。
    /// store_name 与 [`ForageConfig::merge`] 一样做字符替换，保证前缀和 [`DbInfo`] 一致。
    pub fn resolve(
        options: &DropOptions,
        current: Option<&ForageConfig>,
    ) -> Result<DropTarget, ForageError> {
        let explicit_name = options.name.as_ref().filter(|name| !name.is_empty());

        let (name, store_name) = match explicit_name {
            Some(name) => (Some(name.clone()), options.store_name.clone()),
            None => (
                current.map(|config| config.name.clone()),
                options
                    .store_name
                    .clone()
                    .or_else(|| current.map(|config| config.store_name.clone())),
            ),
        };

        match name.filter(|name| !name.is_empty()) {
            Some(name) => Ok(DropTarget {
                name,
                store_name: store_name
                    .filter(|s| !s.is_empty())
                    .map(|s| sanitize_store_name(&s)),
            }),
            None => Err(ForageError::InvalidArguments(
                "dropInstance requires a name".to_string(),
            )),
        }
    }

    pub fn scope(&self) -> DropScope {
        match &self.store_name {
            Some(store_name) => {
                DropScope::Namespace(compute_prefix(&self.name, store_name, DEFAULT_STORE_NAME))
            }
            None => DropScope::App(app_prefix(&self.name)),
        }
    }
}

/// 存储驱动统一接口
///
/// 驱动本身不保存实例状态，每个操作都通过 [`DbInfo`] 指明所在的命名空间，
/// 因此同一个驱动可以被多个实例共享。
#[async_trait]
pub trait Driver: Send + Sync {
    /// 驱动名，在注册表内唯一
    fn name(&self) -> &str;

    /// 当前环境是否可以使用该驱动
    async fn supports(&self) -> bool {
        true
    }

    /// 打开（不存在时创建）命名空间，对同一命名空间可重复调用
    async fn init_storage(&self, info: &DbInfo) -> Result<(), ForageError>;

    /// 获取值，key 不存在时返回 `Value::Null`
    async fn get_item(&self, info: &DbInfo, key: &str) -> Result<Value, ForageError>;

    /// 写入值并返回写入的值
    async fn set_item(&self, info: &DbInfo, key: &str, value: Value)
        -> Result<Value, ForageError>;

    /// 删除 key，不存在时也返回成功
    async fn remove_item(&self, info: &DbInfo, key: &str) -> Result<(), ForageError>;

    /// 清空当前命名空间，不影响其他命名空间
    async fn clear(&self, info: &DbInfo) -> Result<(), ForageError>;

    /// 当前命名空间的所有 key 的快照
    async fn keys(&self, info: &DbInfo) -> Result<Vec<String>, ForageError>;

    /// 当前命名空间的 key 数量
    async fn length(&self, info: &DbInfo) -> Result<usize, ForageError>;

    /// 删除目标命名空间，不要求有实例在其上初始化
    async fn drop_instance(&self, target: &DropTarget) -> Result<(), ForageError>;

    /// 第 index 个 key
    async fn key(&self, info: &DbInfo, index: usize) -> Result<Option<String>, ForageError> {
        Ok(self.keys(info).await?.into_iter().nth(index))
    }

    /// 依次访问 (key, value, 从 1 开始的序号)，回调返回 `Some` 时提前结束并返回该值
    async fn iterate(
        &self,
        info: &DbInfo,
        visitor: &mut (dyn for<'k, 'v> FnMut(&'k str, &'v Value, usize) -> Option<Value> + Send),
    ) -> Result<Option<Value>, ForageError> {
        let keys = self.keys(info).await?;
        for (i, key) in keys.iter().enumerate() {
            let value = self.get_item(info, key).await?;
            if let Some(result) = visitor(key.as_str(), &value, i + 1) {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: &str, store_name: &str) -> ForageConfig {
        ForageConfig {
            name: name.to_string(),
            store_name: store_name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_db_info_prefix() {
        assert_eq!(DbInfo::new(config("A", DEFAULT_STORE_NAME)).key_prefix, "A/");
        assert_eq!(DbInfo::new(config("A", "S1")).key_prefix, "A/S1/");
    }

    #[test]
    fn test_resolve_explicit_name_without_store_drops_app() -> anyhow::Result<()> {
        let current = config("current", "store");
        let target = DropTarget::resolve(&DropOptions::new().with_name("A"), Some(&current))?;

        assert_eq!(target.name, "A");
        assert_eq!(target.store_name, None);
        assert_eq!(target.scope(), DropScope::App("A/".to_string()));
        Ok(())
    }

    #[test]
    fn test_resolve_explicit_name_and_store() -> anyhow::Result<()> {
        let target = DropTarget::resolve(
            &DropOptions::new().with_name("A").with_store_name("S1"),
            None,
        )?;
        assert_eq!(target.scope(), DropScope::Namespace("A/S1/".to_string()));
        Ok(())
    }

    #[test]
    fn test_resolve_falls_back_to_current_config() -> anyhow::Result<()> {
        let current = config("current", "store");

        let target = DropTarget::resolve(&DropOptions::new(), Some(&current))?;
        assert_eq!(
            target.scope(),
            DropScope::Namespace("current/store/".to_string())
        );

        let target =
            DropTarget::resolve(&DropOptions::new().with_store_name("other"), Some(&current))?;
        assert_eq!(
            target.scope(),
            DropScope::Namespace("current/other/".to_string())
        );

        // 空 name 视为未设置
        let target = DropTarget::resolve(&DropOptions::new().with_name(""), Some(&current))?;
        assert_eq!(target.name, "current");
        Ok(())
    }

    #[test]
    fn test_resolve_sanitizes_store_name() -> anyhow::Result<()> {
        let target = DropTarget::resolve(
            &DropOptions::new().with_name("A").with_store_name("my-store"),
            None,
        )?;
        assert_eq!(target.store_name.as_deref(), Some("my_store"));
        assert_eq!(target.scope(), DropScope::Namespace("A/my_store/".to_string()));

        let merged = ForageConfig::default().merge(
            &crate::forage::config::ForageOptions::new()
                .with_name("A")
                .with_store_name("my-store"),
        )?;
        assert_eq!(
            target.scope(),
            DropScope::Namespace(DbInfo::new(merged).key_prefix)
        );
        Ok(())
    }

    #[test]
    fn test_resolve_without_any_name() {
        let err = DropTarget::resolve(&DropOptions::new(), None).unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENTS");
    }
}
