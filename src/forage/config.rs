//! 实例配置
//!
//! 调用方传入的 [`ForageOptions`] 按字段覆盖默认的 [`ForageConfig`]，
//! 合并结果经过校验后挂在实例上，初始化开始后不可再修改。

use garde::Validate;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

use super::driver::{ASYNC_STORAGE, LOCAL_STORAGE, TEMP_STORAGE, WEBSQL_STORAGE};
use super::error::ForageError;

pub const DEFAULT_NAME: &str = "localforage";
pub const DEFAULT_STORE_NAME: &str = "keyvaluepairs";

/// 驱动偏好：单个驱动名或按优先级排列的驱动名列表
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DriverPreference {
    One(String),
    Many(Vec<String>),
}

impl DriverPreference {
    pub fn names(&self) -> Vec<String> {
        match self {
            DriverPreference::One(name) => vec![name.clone()],
            DriverPreference::Many(names) => names.clone(),
        }
    }
}

impl From<&str> for DriverPreference {
    fn from(name: &str) -> Self {
        DriverPreference::One(name.to_string())
    }
}

impl From<String> for DriverPreference {
    fn from(name: String) -> Self {
        DriverPreference::One(name)
    }
}

impl From<Vec<String>> for DriverPreference {
    fn from(names: Vec<String>) -> Self {
        DriverPreference::Many(names)
    }
}

impl From<Vec<&str>> for DriverPreference {
    fn from(names: Vec<&str>) -> Self {
        DriverPreference::Many(names.into_iter().map(String::from).collect())
    }
}

/// 调用方传入的实例选项，未设置的字段继承默认值
///
/// ```ignore
/// let options = ForageOptions::from_json5(r#"
///     {
///         name: "myapp",
///         storeName: "users",
///         driver: ["asyncStorage", "tempStorageWrapper"],
///     }
/// "#)?;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ForageOptions {
    /// 应用级命名空间
    pub name: Option<String>,
    /// 应用下的子命名空间
    pub store_name: Option<String>,
    /// 驱动偏好
    pub driver: Option<DriverPreference>,
    pub version: Option<f64>,
    pub size: Option<u64>,
    pub description: Option<String>,
}

impl ForageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON5 文本解析选项
    pub fn from_json5(text: &str) -> Result<Self, ForageError> {
        Ok(json5::from_str(text)?)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_store_name(mut self, store_name: impl Into<String>) -> Self {
        self.store_name = Some(store_name.into());
        self
    }

    pub fn with_driver(mut self, driver: impl Into<DriverPreference>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    pub fn with_version(mut self, version: f64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

fn default_driver_order() -> Vec<String> {
    [ASYNC_STORAGE, WEBSQL_STORAGE, LOCAL_STORAGE, TEMP_STORAGE]
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// 合并后的实例配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, SmartDefault, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ForageConfig {
    /// 应用名
    #[default = "localforage"]
    #[garde(length(min = 1))]
    pub name: String,

    /// store 名，非单词字符会被替换为 `_`
    #[default = "keyvaluepairs"]
    #[garde(length(min = 1))]
    pub store_name: String,

    /// 按优先级排列的驱动名
    #[default(default_driver_order())]
    #[garde(length(min = 1))]
    pub driver: Vec<String>,

    /// 以下字段原样透传给驱动
    #[default = 1.0]
    #[garde(range(min = 0.0))]
    pub version: f64,

    #[default = 4980736]
    #[garde(skip)]
    pub size: u64,

    #[default = ""]
    #[garde(skip)]
    pub description: String,
}

impl ForageConfig {
    /// 用选项按字段覆盖当前配置，返回新的配置
    pub fn merge(&self, options: &ForageOptions) -> Result<ForageConfig, ForageError> {
        let mut merged = self.clone();

        if let Some(name) = &options.name {
            merged.name = name.clone();
        }
        if let Some(store_name) = &options.store_name {
            merged.store_name = sanitize_store_name(store_name);
        }
        if let Some(driver) = &options.driver {
            merged.driver = driver.names();
        }
        if let Some(version) = options.version {
            merged.version = version;
        }
        if let Some(size) = options.size {
            merged.size = size;
        }
        if let Some(description) = &options.description {
            merged.description = description.clone();
        }

        merged
            .validate()
            .map_err(|e| ForageError::InvalidConfig(e.to_string()))?;

        Ok(merged)
    }
}

/// 将 store 名中的非单词字符替换为 `_`
pub fn sanitize_store_name(store_name: &str) -> String {
    let sanitized: String = store_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if sanitized != store_name {
        log::warn!(
            "storeName \"{}\" contains non-word characters, using \"{}\"",
            store_name,
            sanitized
        );
    }
    sanitized
}
