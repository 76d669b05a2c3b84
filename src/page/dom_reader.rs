//! 页面读取 - 基于 JsExecutor 实现 QuestionReader

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::engine::QuestionReader;
use crate::infrastructure::JsExecutor;
use crate::models::{Feedback, QuestionContext, QuestionKind};
use crate::page::selectors::{self, js_string};
use crate::utils::logging::truncate_text;

/// 页面脚本读到的原始题目
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestion {
    pub question_text: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub prior_steps: Vec<String>,
    #[serde(default)]
    pub feedback_text: Option<String>,
}

impl RawQuestion {
    /// 推断题型并转换为题目上下文，题干为空时返回 `None`
    ///
    /// 有选项 → 选择题；否则有作答步骤 → 多步骤题；否则简答题。
    pub fn into_context(self) -> Option<QuestionContext> {
        let kind = if !self.options.is_empty() {
            QuestionKind::MultipleChoice
        } else if !self.prior_steps.is_empty() {
            QuestionKind::Steps
        } else {
            QuestionKind::ShortAnswer
        };
        let mut context = QuestionContext::new(kind, self.question_text.trim())
            .ok()?
            .with_options(self.options)
            .with_prior_steps(self.prior_steps);
        context.feedback_text = self.feedback_text.filter(|f| !f.trim().is_empty());
        Some(context)
    }
}

/// 页面脚本读到的原始反馈
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFeedback {
    pub text: String,
    #[serde(default)]
    pub correction: Option<String>,
}

impl RawFeedback {
    /// 反馈文本含 "correct" 且不含 "incorrect" 视为答对
    pub fn into_feedback(self) -> Feedback {
        let text = self.text.trim().to_string();
        let lowered = text.to_lowercase();
        let was_correct = lowered.contains("correct") && !lowered.contains("incorrect");
        Feedback {
            was_correct,
            correct_answer: self
                .correction
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            feedback_text: Some(text),
        }
    }
}

fn question_script() -> String {
    let option_selectors = serde_json::Value::from(selectors::OPTION_CANDIDATES.to_vec());
    format!(
        r#"
        (() => {{
            const header = document.querySelector({header});
            const headerText = header?.textContent?.trim() || '';
            const subText = Array.from(document.querySelectorAll({sub}))
                .map((node) => {{
                    const clone = node.cloneNode(true);
                    clone.querySelectorAll('button, svg').forEach((el) => el.remove());
                    return (clone.textContent || '').replace(/\b(Help|Lesson|Calculator)\b/gi, '').trim();
                }})
                .filter(Boolean)
                .join('\n');
            const questionText = [headerText, subText].filter(Boolean).join('\n\n').trim();
            if (!questionText) {{
                return null;
            }}
            const options = [];
            for (const selector of {options}) {{
                document.querySelectorAll(selector).forEach((node) => {{
                    const text = node.textContent?.trim();
                    if (text && !options.includes(text)) {{
                        options.push(text);
                    }}
                }});
            }}
            const priorSteps = Array.from(document.querySelectorAll({step}))
                .map((node) => (node.textContent || '').trim())
                .filter(Boolean);
            const feedbackNode = document.querySelector({feedback});
            const feedbackText = feedbackNode?.textContent?.trim() || null;
            return {{ questionText, options, priorSteps, feedbackText }};
        }})()
        "#,
        header = js_string(selectors::QUESTION_HEADER),
        sub = js_string(selectors::SUBPROBLEM),
        options = option_selectors,
        step = js_string(selectors::WORKING_STEP),
        feedback = js_string(selectors::FEEDBACK_BANNER),
    )
}

fn feedback_script() -> String {
    format!(
        r#"
        (() => {{
            const feedbackNode = document.querySelector({feedback});
            if (!feedbackNode) {{
                return null;
            }}
            const correctionNode = document.querySelector({correction});
            return {{
                text: feedbackNode.textContent?.trim() || '',
                correction: correctionNode?.textContent?.trim() || null
            }};
        }})()
        "#,
        feedback = js_string(selectors::FEEDBACK_BANNER),
        correction = js_string(selectors::CORRECTION_TEXT),
    )
}

/// 页面读取器
pub struct DomReader {
    executor: JsExecutor,
    poll_interval: Duration,
}

impl DomReader {
    pub fn new(executor: JsExecutor) -> Self {
        Self {
            executor,
            poll_interval: Duration::from_millis(400),
        }
    }

    async fn read_raw(&self) -> Result<Option<RawQuestion>> {
        self.executor
            .eval_as::<Option<RawQuestion>>(question_script())
            .await
            .context("读取题目失败")
    }
}

#[async_trait]
impl QuestionReader for DomReader {
    async fn read_context(&self) -> Result<Option<QuestionContext>> {
        let context = self.read_raw().await?.and_then(RawQuestion::into_context);
        if let Some(ctx) = &context {
            debug!(
                "读取到题目 [{}]: {}",
                ctx.kind,
                truncate_text(&ctx.question_text, 80)
            );
        }
        Ok(context)
    }

    async fn read_feedback(&self) -> Result<Option<Feedback>> {
        let raw = self
            .executor
            .eval_as::<Option<RawFeedback>>(feedback_script())
            .await
            .context("读取反馈失败")?;
        Ok(raw.map(RawFeedback::into_feedback))
    }

    async fn wait_for_context_change(&self, previous_text: &str, timeout: Duration) -> Result<bool> {
        let previous = previous_text.trim();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            match self.read_raw().await {
                Ok(Some(raw)) => {
                    let current = raw.question_text.trim();
                    if !current.is_empty() && current != previous {
                        return Ok(true);
                    }
                }
                Ok(None) => {}
                // 翻页过程中页面上下文可能被销毁，继续等待
                Err(e) => debug!("等待题目变化时读取失败: {:#}", e),
            }
            sleep(self.poll_interval).await;
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> RawQuestion {
        RawQuestion {
            question_text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_kind_inference() {
        let ctx = raw("2+2").into_context().unwrap();
        assert_eq!(ctx.kind, QuestionKind::ShortAnswer);

        let ctx = RawQuestion {
            prior_steps: vec!["x = 1".into()],
            ..raw("solve")
        }
        .into_context()
        .unwrap();
        assert_eq!(ctx.kind, QuestionKind::Steps);

        let ctx = RawQuestion {
            options: vec!["A".into(), "B".into()],
            prior_steps: vec!["x = 1".into()],
            ..raw("pick")
        }
        .into_context()
        .unwrap();
        assert_eq!(ctx.kind, QuestionKind::MultipleChoice);
    }

    #[test]
    fn test_blank_question_is_dropped() {
        assert!(raw("   ").into_context().is_none());
    }

    #[test]
    fn test_blank_feedback_is_dropped() {
        let ctx = RawQuestion {
            feedback_text: Some("  ".into()),
            ..raw("q")
        }
        .into_context()
        .unwrap();
        assert_eq!(ctx.feedback_text, None);
    }

    #[test]
    fn test_feedback_correctness() {
        let fb = RawFeedback {
            text: "Correct! Well done".into(),
            correction: None,
        }
        .into_feedback();
        assert!(fb.was_correct);

        let fb = RawFeedback {
            text: "That is incorrect".into(),
            correction: Some(" 42 ".into()),
        }
        .into_feedback();
        assert!(!fb.was_correct);
        assert_eq!(fb.correct_answer.as_deref(), Some("42"));
        assert_eq!(fb.feedback_text.as_deref(), Some("That is incorrect"));

        let fb = RawFeedback {
            text: "Try again".into(),
            correction: Some("".into()),
        }
        .into_feedback();
        assert!(!fb.was_correct);
        assert_eq!(fb.correct_answer, None);
    }

    #[test]
    fn test_scripts_embed_selectors() {
        let script = question_script();
        assert!(script.contains(r#"[data-testid=\"working-step\"]"#));
        assert!(script.contains("ProblemHeaderRightColumn"));
        assert!(feedback_script().contains("correct-answer"));
    }

    #[test]
    fn test_raw_question_deserializes_script_result() {
        let value = serde_json::json!({
            "questionText": "Capital?",
            "options": ["Paris", "London"],
            "priorSteps": [],
            "feedbackText": null
        });
        let raw: RawQuestion = serde_json::from_value(value).unwrap();
        assert_eq!(raw.into_context().unwrap().options.len(), 2);
    }
}
