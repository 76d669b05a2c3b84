//! 运行状态层
//!
//! - `shared` - 可观察的运行状态（计数器、错误、订阅）
//! - `memory` - 题目指纹到答案的缓存

pub mod memory;
pub mod shared;

pub use memory::{AnswerMemory, MemoryEntry};
pub use shared::{Observer, SharedState, StateSnapshot, Subscription};
