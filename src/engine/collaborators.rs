//! 引擎依赖的外部能力
//!
//! 引擎只认识这三个 trait：读页面、写页面、调用模型。
//! 具体实现（浏览器、OpenAI 兼容服务、测试替身）都在引擎之外。

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{Feedback, QuestionContext, TokenUsage};

/// 读取页面上的题目和反馈
#[async_trait]
pub trait QuestionReader: Send + Sync {
    /// 当前题目，没有检测到题目时返回 `None`
    async fn read_context(&self) -> Result<Option<QuestionContext>>;

    /// 当前判题反馈，没有时返回 `None`
    async fn read_feedback(&self) -> Result<Option<Feedback>>;

    /// 等待题干变化，超时前变化返回 `true`
    async fn wait_for_context_change(&self, previous_text: &str, timeout: Duration) -> Result<bool>;
}

/// 向页面写入答案并操作按钮
#[async_trait]
pub trait AnswerWriter: Send + Sync {
    async fn fill_answer(&self, text: &str) -> Result<()>;

    async fn submit(&self) -> Result<()>;

    /// 进入下一题
    async fn advance(&self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// 单次补全请求的参数
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: u32,
    /// 为 true 时不发送 temperature，使用服务端默认值
    pub use_default_temperature: bool,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: Some(0.2),
            max_tokens: 512,
            use_default_temperature: false,
        }
    }
}

impl CompletionOptions {
    /// 实际要发送的 temperature
    pub fn effective_temperature(&self) -> Option<f32> {
        if self.use_default_temperature {
            None
        } else {
            self.temperature
        }
    }
}

/// 模型回复
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

impl ModelReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }
}

/// 语言模型服务
#[async_trait]
pub trait ModelService: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage], options: &CompletionOptions) -> Result<ModelReply>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_temperature_is_omitted_on_request() {
        let options = CompletionOptions {
            use_default_temperature: true,
            ..Default::default()
        };
        assert_eq!(options.effective_temperature(), None);
        assert_eq!(CompletionOptions::default().effective_temperature(), Some(0.2));
    }
}
