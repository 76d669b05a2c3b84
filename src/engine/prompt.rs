//! 提示词构建与模型响应解析

use std::sync::OnceLock;

use regex::Regex;

use crate::models::QuestionContext;

/// 固定的系统提示词
pub const SYSTEM_PROMPT: &str =
    "You are a solver that must return answers only in the exact format the UI expects.";

fn answer_label() -> Result<&'static Regex, regex::Error> {
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^answer\s*:?"))
        .as_ref()
        .map_err(|e| e.clone())
}

/// 单独的选项字母：整条回复只有一个字母，或字母后紧跟标点/空白
fn option_letter() -> Result<&'static Regex, regex::Error> {
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z])(?:$|[^A-Za-z0-9])"))
        .as_ref()
        .map_err(|e| e.clone())
}

/// 根据题目上下文构建用户提示词
pub fn compose_prompt(context: &QuestionContext) -> String {
    let mut lines: Vec<String> = vec![
        "Use the following question context to determine the answer.".to_string(),
        format!("Question Type: {}", context.kind),
        "Question:".to_string(),
        context.question_text.clone(),
    ];

    if context.options.is_empty() {
        lines.push(
            "Respond with only the final numeric or textual answer with no explanation."
                .to_string(),
        );
    } else {
        lines.push("Options:".to_string());
        for (index, option) in context.options.iter().enumerate() {
            lines.push(format!("{}. {}", option_label(index), option));
        }
        lines.push("Respond with the exact option text or its corresponding letter.".to_string());
    }

    if !context.prior_steps.is_empty() {
        lines.push("Previous working or hints:".to_string());
        for (index, step) in context.prior_steps.iter().enumerate() {
            lines.push(format!("{}. {}", index + 1, step));
        }
    }

    if let Some(feedback) = context.feedback_text.as_deref().filter(|f| !f.trim().is_empty()) {
        lines.push(format!("Prior feedback: {}", feedback));
    }

    lines.join("\n")
}

/// 选项序号对应的字母（0 → A）
fn option_label(index: usize) -> char {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| char::from(b'A' + i))
        .unwrap_or('?')
}

/// 清洗模型回复，得到要写入页面的答案
///
/// 返回 `None` 表示清洗后为空，调用方应视为失败。
pub fn parse_model_response(
    context: &QuestionContext,
    response: &str,
) -> Result<Option<String>, regex::Error> {
    let stripped = answer_label()?.replace(response.trim(), "");
    let cleaned = stripped.trim();

    if context.is_multiple_choice() {
        if let Some(option) = option_by_letter(cleaned, &context.options)? {
            return Ok(Some(option.clone()));
        }
        let wanted = cleaned.to_lowercase();
        if let Some(option) = context
            .options
            .iter()
            .find(|option| option.trim().to_lowercase() == wanted)
        {
            return Ok(Some(option.clone()));
        }
    }

    if cleaned.is_empty() {
        Ok(None)
    } else {
        Ok(Some(cleaned.to_string()))
    }
}

fn option_by_letter<'a>(
    cleaned: &str,
    options: &'a [String],
) -> Result<Option<&'a String>, regex::Error> {
    let letter = option_letter()?
        .captures(cleaned)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().chars().next())
        .map(|c| c.to_ascii_uppercase());
    Ok(letter
        .and_then(|l| (l as u8).checked_sub(b'A'))
        .and_then(|index| options.get(usize::from(index))))
}
