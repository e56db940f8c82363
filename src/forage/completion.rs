//! 回调形式的完成通知
//!
//! 回调只是订阅同一个异步结果的适配器，不会产生第二条执行路径

use futures::future::{FutureExt, Inspect};
use std::future::Future;

use super::error::ForageError;

/// 为返回 `Result<T, ForageError>` 的 future 附加完成回调
///
/// future 是惰性的：只有被 await 或交给 `tokio::spawn` 之后操作才会执行，回调也才会被调用。
/// 直接丢弃返回的 future 时操作不会发出，回调也不会触发。
///
/// ```ignore
/// let value = store
///     .get_item("key")
///     .with_callback(|result| match result {
///         Ok(value) => println!("got {}", value),
///         Err(err) => eprintln!("{}: {}", err.code(), err),
///     })
///     .await?;
/// ```
pub trait CallbackExt<T>: Future<Output = Result<T, ForageError>> + Sized {
    /// 结果产生时先调用 callback，再把同一个结果交给 await 的一方
    fn with_callback<C>(self, callback: C) -> Inspect<Self, C>
    where
        C: FnOnce(&Result<T, ForageError>),
    {
        self.inspect(callback)
    }
}

impl<T, F> CallbackExt<T> for F where F: Future<Output = Result<T, ForageError>> {}
