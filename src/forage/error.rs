use thiserror::Error;

/// 存储实例统一错误类型
///
/// 所有错误都可以 `Clone`，初始化失败会被缓存并原样返回给之后的每一次调用
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForageError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Config locked: {0}")]
    ConfigLocked(String),

    #[error("Driver [{driver}] init failed: {message}")]
    DriverInit { driver: String, message: String },

    #[error("No available storage method found, tried: [{}]", .tried.join(", "))]
    NoMatchingDriver { tried: Vec<String> },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ForageError {
    /// 稳定的错误标识，不随错误信息变化
    pub fn code(&self) -> &'static str {
        match self {
            ForageError::InvalidArguments(_) => "INVALID_ARGUMENTS",
            ForageError::ConfigLocked(_) => "CONFIG_LOCKED",
            ForageError::DriverInit { .. } => "DRIVER_INIT",
            ForageError::NoMatchingDriver { .. } => "NO_MATCHING_DRIVER",
            ForageError::InvalidConfig(_) => "INVALID_CONFIG",
            ForageError::Driver(_) => "DRIVER",
            ForageError::Serialization(_) => "SERIALIZATION",
        }
    }

    /// 将初始化阶段的任意错误包装为 DriverInit
    ///
    /// 已经是 DriverInit 的错误保持不变
    pub fn into_driver_init(self, driver: &str) -> Self {
        match self {
            ForageError::DriverInit { .. } => self,
            other => ForageError::DriverInit {
                driver: driver.to_string(),
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for ForageError {
    fn from(err: serde_json::Error) -> Self {
        ForageError::Serialization(err.to_string())
    }
}

impl From<json5::Error> for ForageError {
    fn from(err: json5::Error) -> Self {
        ForageError::Serialization(err.to_string())
    }
}
