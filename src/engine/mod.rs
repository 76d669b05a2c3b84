//! 答题引擎层
//!
//! - `collaborators` - 引擎依赖的读 / 写 / 模型三个 trait
//! - `modes` - 答题模式 → 提交行为
//! - `retry` - 有限次线性退避重试
//! - `prompt` - 提示词构建与回复解析
//! - `answer_engine` - 状态机与主循环

pub mod answer_engine;
pub mod collaborators;
pub mod modes;
pub mod prompt;
pub mod retry;

pub use answer_engine::{AnswerEngine, EngineDeps, EngineOptions, EngineTimings, IterationOutcome};
pub use collaborators::{
    AnswerWriter, ChatMessage, CompletionOptions, ModelReply, ModelService, QuestionReader, Role,
};
pub use modes::{random_delay, resolve_behavior, resolve_behavior_named, ModeBehavior};
pub use retry::{retry_with_backoff, RetryPolicy};
