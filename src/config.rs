use std::str::FromStr;

use tracing::warn;

use crate::error::ConfigError;
use crate::models::Mode;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 目标URL
    pub target_url: String,
    /// 优先复用标题包含该文本的页面
    pub target_title: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 启动时的答题模式
    pub default_mode: Mode,
    /// 连接浏览器后立即开始答题
    pub auto_start: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    /// 每 1K token 的估算费用
    pub token_cost_per_1k: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 2001,
            target_url: "https://mathspace.co/".to_string(),
            target_title: Some("Mathspace".to_string()),
            verbose_logging: false,
            default_mode: Mode::Semi,
            auto_start: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_temperature: 0.2,
            llm_max_tokens: 512,
            token_cost_per_1k: 0.09,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            browser_debug_port: parse_env("BROWSER_DEBUG_PORT", "u16", default.browser_debug_port),
            target_url: std::env::var("TARGET_URL").unwrap_or(default.target_url),
            target_title: std::env::var("TARGET_TITLE").ok().or(default.target_title),
            verbose_logging: parse_env("VERBOSE_LOGGING", "bool", default.verbose_logging),
            default_mode: parse_env("ANSWER_MODE", "instant|semi|delayed", default.default_mode),
            auto_start: parse_env("AUTO_START", "bool", default.auto_start),
            llm_api_key: std::env::var("LLM_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_temperature: parse_env("LLM_TEMPERATURE", "f32", default.llm_temperature),
            llm_max_tokens: parse_env("LLM_MAX_TOKENS", "u32", default.llm_max_tokens),
            token_cost_per_1k: parse_env("TOKEN_COST_PER_1K", "f64", default.token_cost_per_1k),
        }
    }
}

/// 在日志初始化之前读取详细日志开关
///
/// 这里解析失败时不报告，日志就绪后 `Config::from_env` 会再次解析并给出警告。
pub fn verbose_logging_from_env() -> bool {
    std::env::var("VERBOSE_LOGGING")
        .ok()
        .and_then(|value| parse_flag(&value))
        .unwrap_or(Config::default().verbose_logging)
}

fn parse_flag(value: &str) -> Option<bool> {
    parse_value("VERBOSE_LOGGING", value, "bool").ok()
}

/// 读取并解析环境变量，缺失或解析失败时回退到默认值
fn parse_env<T: FromStr>(var_name: &str, expected_type: &str, default: T) -> T {
    match std::env::var(var_name) {
        Ok(value) => parse_value(var_name, &value, expected_type).unwrap_or_else(|e| {
            warn!("⚠️ {}，使用默认值", e);
            default
        }),
        Err(_) => default,
    }
}

fn parse_value<T: FromStr>(var_name: &str, value: &str, expected_type: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: expected_type.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_default_mode_is_semi() {
        assert_eq!(Config::default().default_mode, Mode::Semi);
    }

    #[test]
    fn test_parse_value_accepts_padded_input() {
        let port: u16 = parse_value("BROWSER_DEBUG_PORT", " 9222 ", "u16").unwrap();
        assert_eq!(port, 9222);

        let mode: Mode = parse_value("ANSWER_MODE", "Delayed", "mode").unwrap();
        assert_eq!(mode, Mode::Delayed);
    }

    #[test]
    fn test_parse_flag_is_silent_on_bad_value() {
        assert_eq!(parse_flag(" true "), Some(true));
        assert_eq!(parse_flag("false"), Some(false));
        assert_eq!(parse_flag("yes"), None);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_bad_value_warns_and_falls_back() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        std::env::set_var("QUESTION_AUTOPILOT_TEST_PORT", "not-a-port");
        let port = tracing::subscriber::with_default(subscriber, || {
            parse_env("QUESTION_AUTOPILOT_TEST_PORT", "u16", 2001u16)
        });
        std::env::remove_var("QUESTION_AUTOPILOT_TEST_PORT");

        assert_eq!(port, 2001);
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("QUESTION_AUTOPILOT_TEST_PORT"));
        assert!(output.contains("not-a-port"));
    }

    #[test]
    fn test_parse_value_reports_variable() {
        let err = parse_value::<u32>("LLM_MAX_TOKENS", "lots", "u32").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("LLM_MAX_TOKENS"));
        assert!(message.contains("lots"));
    }
}
