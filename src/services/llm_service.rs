//! LLM 服务 - 业务能力层
//!
//! 通过 `async-openai` 调用 OpenAI 兼容的 chat completions 接口，
//! 实现引擎需要的 `ModelService`。只负责"发消息、取回复"，不关心题目流程。

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::engine::{ChatMessage, CompletionOptions, ModelReply, ModelService, Role};
use crate::error::{AppError, LlmError};
use crate::models::TokenUsage;

/// OpenAI 兼容的模型服务
pub struct OpenAiModelService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl OpenAiModelService {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage, OpenAIError> {
    let content = message.content.clone();
    let converted = match message.role {
        Role::System => ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(content)
                .build()?,
        ),
        Role::User => ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(content)
                .build()?,
        ),
        Role::Assistant => ChatCompletionRequestMessage::Assistant(
            ChatCompletionRequestAssistantMessageArgs::default()
                .content(content)
                .build()?,
        ),
    };
    Ok(converted)
}

#[async_trait]
impl ModelService for OpenAiModelService {
    async fn complete(&self, messages: &[ChatMessage], options: &CompletionOptions) -> Result<ModelReply> {
        debug!(
            "调用 LLM API，模型: {}，消息数: {}",
            self.model_name,
            messages.len()
        );

        let request_messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model_name)
            .messages(request_messages)
            .max_tokens(options.max_tokens);
        if let Some(temperature) = options.effective_temperature() {
            builder.temperature(temperature);
        }
        let request = builder.build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::llm_api_failed(&self.model_name, e)
        })?;

        let usage = response.usage.as_ref().map(|u| TokenUsage {
            prompt_tokens: u64::from(u.prompt_tokens),
            completion_tokens: u64::from(u.completion_tokens),
            total_tokens: Some(u64::from(u.total_tokens)),
        });
        if let Some(u) = &usage {
            debug!(
                "LLM API 调用成功，token: prompt={} completion={}",
                u.prompt_tokens, u.completion_tokens
            );
        }

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                AppError::from(LlmError::EmptyContent {
                    model: self.model_name.clone(),
                })
            })?;

        Ok(ModelReply {
            content: content.trim().to_string(),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_keep_their_roles() {
        let messages = [
            ChatMessage::system("sys"),
            ChatMessage::user("hi"),
            ChatMessage {
                role: Role::Assistant,
                content: "ok".to_string(),
            },
        ];
        let converted: Vec<_> = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<_, _>>()
            .unwrap();
        assert!(matches!(converted[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(converted[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(converted[2], ChatCompletionRequestMessage::Assistant(_)));
    }

    /// 需要真实的 LLM_API_KEY
    ///
    /// 运行方式：
    /// ```bash
    /// cargo test test_complete_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_complete_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let service = OpenAiModelService::new(&Config::from_env());
        let reply = service
            .complete(
                &[
                    ChatMessage::system("Answer with a single number."),
                    ChatMessage::user("2+2"),
                ],
                &CompletionOptions::default(),
            )
            .await
            .unwrap();

        println!("LLM 响应: {} ({:?})", reply.content, reply.usage);
        assert!(!reply.content.is_empty());
    }
}
