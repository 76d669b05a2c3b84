//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用生命周期
//! - 连接浏览器，持有 Browser
//! - 组装 DomReader / DomWriter / OpenAiModelService / SharedState / AnswerEngine
//! - 读取操作员命令直到退出
//!
//! ### `commands` - 操作员命令
//! - `start | stop | refresh | mode <name> | status | quit`
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator (App + 命令)
//!     ↓
//! engine::AnswerEngine (状态机 + 主循环)
//!     ↓
//! page / services (DOM 读写、LLM 调用)
//!     ↓
//! infrastructure (JsExecutor)
//! ```

pub mod app;
pub mod commands;

pub use app::App;
pub use commands::{dispatch, handle_line, Command, CommandParseError};
