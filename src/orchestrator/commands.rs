//! 操作员命令
//!
//! 从标准输入读到的一行文本解析为 [`Command`]，再分发给答题引擎。

use std::ops::ControlFlow;
use std::str::FromStr;

use thiserror::Error;
use tracing::{info, warn};

use crate::engine::AnswerEngine;
use crate::models::{Mode, UnknownMode};
use crate::utils::logging::{log_command_help, log_snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    /// 重新读取当前题目
    Refresh,
    Mode(Mode),
    Status,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("命令为空")]
    Empty,
    #[error("未知命令: {0}")]
    Unknown(String),
    #[error("mode 命令缺少模式名称")]
    MissingMode,
    #[error(transparent)]
    UnknownMode(#[from] UnknownMode),
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let name = parts.next().ok_or(CommandParseError::Empty)?;
        let command = match name.to_ascii_lowercase().as_str() {
            "start" => Command::Start,
            "stop" => Command::Stop,
            "refresh" => Command::Refresh,
            "status" => Command::Status,
            "quit" | "exit" => Command::Quit,
            "mode" => {
                let mode = parts.next().ok_or(CommandParseError::MissingMode)?;
                Command::Mode(mode.parse()?)
            }
            _ => return Err(CommandParseError::Unknown(name.to_string())),
        };
        Ok(command)
    }
}

/// 执行一条命令，`quit` 时返回 `Break`
pub async fn dispatch(engine: &AnswerEngine, command: Command) -> ControlFlow<()> {
    match command {
        Command::Start => {
            engine.start();
        }
        Command::Stop => engine.stop(),
        Command::Refresh => {
            if let Err(e) = engine.refresh().await {
                warn!("⚠️ 刷新题目失败: {:#}", e);
            }
        }
        Command::Mode(mode) => engine.set_mode(mode),
        Command::Status => log_snapshot(&engine.state().snapshot()),
        Command::Quit => {
            info!("👋 收到退出命令");
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}

/// 解析并执行一行输入，空行忽略，无法解析时打印帮助
pub async fn handle_line(engine: &AnswerEngine, line: &str) -> ControlFlow<()> {
    match line.parse::<Command>() {
        Ok(command) => dispatch(engine, command).await,
        Err(CommandParseError::Empty) => ControlFlow::Continue(()),
        Err(e) => {
            warn!("⚠️ {}", e);
            log_command_help();
            ControlFlow::Continue(())
        }
    }
}
