use std::future::Future;
use std::sync::RwLock;
use tokio::sync::{Mutex, MutexGuard};

use super::error::ForageError;

/// 实例的初始化状态
#[derive(Debug, Clone, PartialEq)]
pub enum ReadyState {
    Uninitialized,
    Initializing,
    Ready,
    /// 初始化失败是永久的，之后的所有操作都返回同一个错误
    Failed(ForageError),
}

/// 进入就绪门后持有的凭证
///
/// 在就绪之前进入的操作会拿到排队锁，持有期间执行驱动调用，
/// 保证这些操作按发起顺序执行；就绪之后走快速路径，不持有锁。
pub type GatePass<'a> = Option<MutexGuard<'a, ()>>;

/// 实例级初始化屏障
///
/// 第一个进入的调用执行初始化并缓存结果，之后的调用复用该结果，不会重复初始化
pub struct ReadyGate {
    state: RwLock<ReadyState>,
    // tokio 的 Mutex 按 FIFO 顺序唤醒等待者
    queue: Mutex<()>,
}

impl ReadyGate {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ReadyState::Uninitialized),
            queue: Mutex::new(()),
        }
    }

    pub fn state(&self) -> ReadyState {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_state(&self, state: ReadyState) {
        log::debug!("ready state -> {:?}", state);
        *self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }

    /// 初始化尚未开始时执行 f，否则返回 ConfigLocked
    ///
    /// f 执行期间持有状态写锁，初始化不会在此期间开始
    pub fn while_uninitialized<R>(&self, f: impl FnOnce() -> R) -> Result<R, ForageError> {
        let state = self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match *state {
            ReadyState::Uninitialized => Ok(f()),
            _ => Err(ForageError::ConfigLocked(
                "config cannot be changed after initialization has begun".to_string(),
            )),
        }
    }

    fn settled(&self) -> Option<Result<(), ForageError>> {
        match self.state() {
            ReadyState::Ready => Some(Ok(())),
            ReadyState::Failed(err) => Some(Err(err)),
            ReadyState::Uninitialized | ReadyState::Initializing => None,
        }
    }

    /// 等待初始化完成
    ///
    /// `init` 只会在第一个拿到排队锁且尚未初始化的调用中执行
    pub async fn enter<F, Fut>(&self, init: F) -> Result<GatePass<'_>, ForageError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), ForageError>>,
    {
        if let Some(result) = self.settled() {
            return result.map(|_| None);
        }

        let pass = self.queue.lock().await;
        match self.state() {
            ReadyState::Ready => Ok(Some(pass)),
            ReadyState::Failed(err) => Err(err),
            // Initializing 只会出现在上一次初始化被中途丢弃时，重新初始化
            ReadyState::Uninitialized | ReadyState::Initializing => {
                self.set_state(ReadyState::Initializing);
                match init().await {
                    Ok(()) => {
                        self.set_state(ReadyState::Ready);
                        Ok(Some(pass))
                    }
                    Err(err) => {
                        log::error!("storage initialization failed: {}", err);
                        self.set_state(ReadyState::Failed(err.clone()));
                        Err(err)
                    }
                }
            }
        }
    }
}

impl Default for ReadyGate {
    fn default() -> Self {
        Self::new()
    }
}
