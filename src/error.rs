//! 错误类型
//!
//! 库内部的可分类错误在这里定义；编排层和适配层统一使用 `anyhow::Result`，
//! 需要时再用 `downcast_ref` 取回具体类型。

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 答题引擎错误
    #[error("引擎错误: {0}")]
    Engine(#[from] EngineError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 执行脚本失败
    #[error("执行脚本失败: {source}")]
    ScriptExecutionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 脚本返回值无法反序列化
    #[error("脚本返回值解析失败: {source}")]
    ResultDecodeFailed {
        #[source]
        source: serde_json::Error,
    },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 清洗后无法得到答案
    #[error("Unable to parse model response: {response:?}")]
    Unparseable { response: String },
}

/// 答题引擎错误
#[derive(Debug, Error)]
pub enum EngineError {
    /// 题干为空
    #[error("题干不能为空")]
    EmptyQuestion,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Browser(BrowserError::ResultDecodeFailed { source: err })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建浏览器连接错误
    pub fn browser_connection_failed(
        port: u16,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::ConnectionFailed {
            port,
            source: Box::new(source),
        })
    }

    /// 创建LLM API调用错误
    pub fn llm_api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }

    /// 创建模型响应无法解析错误
    pub fn unparseable_response(response: impl Into<String>) -> Self {
        AppError::Llm(LlmError::Unparseable {
            response: response.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_group_prefix() {
        let err = AppError::from(EngineError::EmptyQuestion);
        assert_eq!(err.to_string(), "引擎错误: 题干不能为空");
    }

    #[test]
    fn test_unparseable_keeps_raw_response() {
        let err = AppError::unparseable_response("   ");
        assert!(matches!(
            err,
            AppError::Llm(LlmError::Unparseable { ref response }) if response == "   "
        ));
    }

    #[test]
    fn test_source_chain_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = AppError::browser_connection_failed(2001, io);
        let source = std::error::Error::source(&err).expect("group source");
        assert!(source.to_string().contains("2001"));
    }
}
