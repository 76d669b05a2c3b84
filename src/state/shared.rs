//! 可观察的运行状态
//!
//! 所有计数器、错误信息和运行标志都只能通过 [`SharedState`] 修改。
//! 每次修改都会同步通知全部观察者，观察者拿到的是独立的快照副本。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;

use crate::models::{Answer, Mode, QuestionContext, TokenUsage};
use crate::state::memory::AnswerMemory;

/// 状态快照
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub running: bool,
    pub mode: Mode,
    pub answered_count: u64,
    pub correct_count: u64,
    pub retry_count: u64,
    pub last_error: Option<String>,
    /// 当前动作的简短描述
    pub activity: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    /// 按配置单价估算的累计花费
    pub spent: f64,
}

impl StateSnapshot {
    fn initial(mode: Mode) -> Self {
        Self {
            running: false,
            mode,
            answered_count: 0,
            correct_count: 0,
            retry_count: 0,
            last_error: None,
            activity: "Idle".to_string(),
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            spent: 0.0,
        }
    }
}

/// 状态观察者
pub type Observer = dyn Fn(&StateSnapshot) + Send + Sync;

#[derive(Default)]
struct Observers {
    next_id: u64,
    list: Vec<(u64, Arc<Observer>)>,
}

struct Inner {
    snapshot: Mutex<StateSnapshot>,
    observers: Mutex<Observers>,
    memory: Mutex<AnswerMemory>,
    token_cost_per_1k: f64,
}

impl Inner {
    fn remove_observer(&self, id: u64) {
        lock(&self.observers).list.retain(|(observer_id, _)| *observer_id != id);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 共享状态句柄，clone 后指向同一份状态
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<Inner>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(Mode::default())
    }
}

impl SharedState {
    pub const DEFAULT_TOKEN_COST_PER_1K: f64 = 0.09;

    pub fn new(mode: Mode) -> Self {
        Self::with_token_cost(mode, Self::DEFAULT_TOKEN_COST_PER_1K)
    }

    pub fn with_token_cost(mode: Mode, token_cost_per_1k: f64) -> Self {
        Self {
            inner: Arc::new(Inner {
                snapshot: Mutex::new(StateSnapshot::initial(mode)),
                observers: Mutex::new(Observers::default()),
                memory: Mutex::new(AnswerMemory::new()),
                token_cost_per_1k,
            }),
        }
    }

    /// 当前状态的副本
    pub fn snapshot(&self) -> StateSnapshot {
        lock(&self.inner.snapshot).clone()
    }

    pub fn mode(&self) -> Mode {
        lock(&self.inner.snapshot).mode
    }

    /// 注册观察者
    ///
    /// 注册时立即同步推送一次当前快照，之后每次修改推送一次，
    /// 直到返回的 [`Subscription`] 被释放。
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&StateSnapshot) + Send + Sync + 'static,
    {
        let observer: Arc<Observer> = Arc::new(observer);
        let id = {
            let mut observers = lock(&self.inner.observers);
            let id = observers.next_id;
            observers.next_id += 1;
            observers.list.push((id, observer.clone()));
            id
        };
        observer(&self.snapshot());
        Subscription {
            id,
            state: Arc::downgrade(&self.inner),
        }
    }

    pub fn observer_count(&self) -> usize {
        lock(&self.inner.observers).list.len()
    }

    // ========== 修改操作 ==========

    pub fn set_running(&self, running: bool) {
        self.mutate(|s| s.running = running);
    }

    pub fn set_mode(&self, mode: Mode) {
        self.mutate(|s| s.mode = mode);
    }

    pub fn set_error(&self, message: Option<String>) {
        self.mutate(|s| s.last_error = message);
    }

    pub fn set_activity(&self, message: impl Into<String>) {
        let message = message.into();
        self.mutate(|s| s.activity = message);
    }

    /// 记录一次判题结果
    pub fn record_result(&self, was_correct: bool) {
        self.mutate(|s| {
            s.answered_count += 1;
            if was_correct {
                s.correct_count += 1;
            }
        });
    }

    pub fn record_retry(&self) {
        self.mutate(|s| s.retry_count += 1);
    }

    /// 累加 token 用量；`None` 时既不修改也不通知
    pub fn record_token_usage(&self, usage: Option<TokenUsage>) {
        let Some(usage) = usage else {
            return;
        };
        let cost_per_1k = self.inner.token_cost_per_1k;
        self.mutate(|s| {
            let total = usage.total();
            s.prompt_tokens += usage.prompt_tokens;
            s.completion_tokens += usage.completion_tokens;
            s.total_tokens += total;
            s.spent += total as f64 / 1000.0 * cost_per_1k;
        });
    }

    // ========== 答案缓存 ==========

    pub fn remember(&self, context: &QuestionContext, answer: Answer) -> bool {
        lock(&self.inner.memory).remember(context, answer)
    }

    pub fn recall(&self, context: &QuestionContext) -> Option<Answer> {
        lock(&self.inner.memory).recall(context)
    }

    pub fn memory_len(&self) -> usize {
        lock(&self.inner.memory).len()
    }

    /// 应用修改并通知观察者
    ///
    /// 观察者在锁外调用，可以在回调里再读取状态。
    fn mutate(&self, apply: impl FnOnce(&mut StateSnapshot)) {
        let snapshot = {
            let mut guard = lock(&self.inner.snapshot);
            apply(&mut guard);
            guard.clone()
        };
        let observers: Vec<Arc<Observer>> = lock(&self.inner.observers)
            .list
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in observers {
            observer(&snapshot);
        }
    }
}

/// 观察者订阅，释放时自动取消
#[must_use = "释放 Subscription 会立即取消订阅"]
pub struct Subscription {
    id: u64,
    state: Weak<Inner>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.state.upgrade() {
            inner.remove_observer(self.id);
        }
    }
}
