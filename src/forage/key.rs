use serde_json::Value;

use super::error::ForageError;

/// 可以作为存储 key 的类型
///
/// 字符串原样使用；数字、布尔值等标量会被转换为字符串并输出告警；
/// `None` 和 `Value::Null` 不是合法的 key。
pub trait IntoKey {
    fn into_key(self) -> Result<String, ForageError>;
}

impl IntoKey for &str {
    fn into_key(self) -> Result<String, ForageError> {
        Ok(self.to_string())
    }
}

impl IntoKey for String {
    fn into_key(self) -> Result<String, ForageError> {
        Ok(self)
    }
}

impl IntoKey for &String {
    fn into_key(self) -> Result<String, ForageError> {
        Ok(self.clone())
    }
}

macro_rules! coerce_into_key {
    ($($t:ty),* $(,)?) => {
        $(
            impl IntoKey for $t {
                fn into_key(self) -> Result<String, ForageError> {
                    Ok(coerce(self))
                }
            }
        )*
    };
}

coerce_into_key!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char,
);

impl<T: IntoKey> IntoKey for Option<T> {
    fn into_key(self) -> Result<String, ForageError> {
        match self {
            Some(key) => key.into_key(),
            None => Err(ForageError::InvalidArguments(
                "key must not be undefined".to_string(),
            )),
        }
    }
}

impl IntoKey for &Value {
    fn into_key(self) -> Result<String, ForageError> {
        match self {
            Value::Null => Err(ForageError::InvalidArguments(
                "key must not be null".to_string(),
            )),
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(coerce(n)),
            Value::Bool(b) => Ok(coerce(b)),
            other => Ok(coerce(other)),
        }
    }
}

impl IntoKey for Value {
    fn into_key(self) -> Result<String, ForageError> {
        (&self).into_key()
    }
}

fn coerce<T: ToString>(key: T) -> String {
    let key = key.to_string();
    log::warn!("{} used as a key, but it is not a string", key);
    key
}

/// 规范化 key
pub fn normalize_key<K: IntoKey>(key: K) -> Result<String, ForageError> {
    key.into_key()
}
