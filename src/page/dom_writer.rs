//! 页面写入 - 基于 JsExecutor 实现 AnswerWriter

use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::engine::AnswerWriter;
use crate::infrastructure::JsExecutor;
use crate::page::selectors::{self, js_string};

/// 填写答案的脚本
///
/// 优先写入输入框（逐步触发 input 事件，兼容受控组件）；
/// 没有输入框时点击文本匹配的选项。返回实际使用的方式，都找不到时返回 null。
fn fill_script(answer: &str) -> String {
    format!(
        r#"
        (() => {{
            const answer = {answer};
            const input = document.querySelector({input});
            if (input) {{
                const setter = Object.getOwnPropertyDescriptor(window.HTMLInputElement.prototype, 'value')?.set;
                const setValue = (value) => {{
                    if (setter) {{
                        setter.call(input, value);
                    }} else {{
                        input.value = value;
                    }}
                    input.dispatchEvent(new Event('input', {{ bubbles: true }}));
                }};
                input.focus();
                setValue('');
                setValue(answer);
                input.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return 'input';
            }}
            const wanted = answer.trim().toLowerCase();
            const option = Array.from(document.querySelectorAll({choice}))
                .find((node) => (node.textContent || '').trim().toLowerCase() === wanted);
            if (option) {{
                option.click();
                return 'choice';
            }}
            return null;
        }})()
        "#,
        answer = js_string(answer),
        input = js_string(selectors::ANSWER_INPUT),
        choice = js_string(selectors::CHOICE_OPTION),
    )
}

fn click_script(selector: &str) -> String {
    format!(
        r#"
        (() => {{
            const button = document.querySelector({selector});
            if (!button) {{
                return false;
            }}
            button.click();
            return true;
        }})()
        "#,
        selector = js_string(selector),
    )
}

fn log_click(clicked: bool, what: &str) -> bool {
    if clicked {
        debug!("已点击{}按钮", what);
    } else {
        warn!("⚠️ 未找到{}按钮，跳过点击", what);
    }
    clicked
}

/// 页面写入器
pub struct DomWriter {
    executor: JsExecutor,
}

impl DomWriter {
    pub fn new(executor: JsExecutor) -> Self {
        Self { executor }
    }

    /// 点击按钮；按钮不存在时只记录日志，由引擎的翻页检查发现卡住的题目
    async fn click(&self, selector: &str, what: &str) -> Result<()> {
        let clicked: bool = self.executor.eval_as(click_script(selector)).await?;
        log_click(clicked, what);
        Ok(())
    }
}

#[async_trait]
impl AnswerWriter for DomWriter {
    async fn fill_answer(&self, answer: &str) -> Result<()> {
        let method: Option<String> = self.executor.eval_as(fill_script(answer)).await?;
        match method {
            Some(method) => {
                debug!("答案已填写 (方式: {})", method);
                Ok(())
            }
            None => bail!("未找到可填写答案的输入框或选项"),
        }
    }

    async fn submit(&self) -> Result<()> {
        self.click(selectors::SUBMIT_BUTTON, "提交").await
    }

    async fn advance(&self) -> Result<()> {
        self.click(selectors::NEXT_BUTTON, "下一题").await
    }
}
