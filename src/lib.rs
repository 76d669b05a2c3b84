//! # Question Autopilot
//!
//! 自动读取网页题目、调用大模型作答、按模式填写和提交的 Rust 应用程序
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//!
//! ### ② 适配层（Page / Services）
//! - `page/` - `DomReader` / `DomWriter`，把 DOM 读写包装成引擎的 trait
//! - `services/` - `OpenAiModelService`，OpenAI 兼容的模型调用
//!
//! ### ③ 引擎层（Engine / State）
//! - `engine/` - 答题状态机、模式策略、重试、提示词
//! - `state/` - 可订阅的共享状态和答案记忆
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/` - 组装各层并处理操作员命令
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod engine;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod page;
pub mod services;
pub mod state;
pub mod utils;

// 重新导出常用类型
pub use browser::connect_to_browser_and_page;
pub use config::Config;
pub use engine::{AnswerEngine, EngineDeps, EngineOptions, IterationOutcome};
pub use error::{AppError, AppResult};
pub use infrastructure::JsExecutor;
pub use models::{Answer, Feedback, Mode, QuestionContext, QuestionKind};
pub use orchestrator::{App, Command};
pub use state::{SharedState, StateSnapshot};
