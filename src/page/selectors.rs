//! 答题页面的 CSS 选择器

/// 题目标题
pub const QUESTION_HEADER: &str = r#"[class*="ProblemHeaderRightColumn"]"#;
/// 子问题
pub const SUBPROBLEM: &str = r#"div[class^="subproblem"]"#;
/// 选择题选项的候选选择器
pub const OPTION_CANDIDATES: [&str; 3] = [
    r#"[role="radiogroup"] [role="radio"]"#,
    r#"button[role="radio"]"#,
    r#"[class*="multipleChoiceOption"]"#,
];
/// 已有作答步骤
pub const WORKING_STEP: &str = r#"[data-testid="working-step"]"#;
/// 判题反馈
pub const FEEDBACK_BANNER: &str =
    r#"[data-testid="feedback"], .feedback-message, [class*="feedbackMessage"]"#;
/// 页面给出的正确答案
pub const CORRECTION_TEXT: &str =
    r#"[data-testid="correct-answer"], .correct-answer, [class*="correctAnswer"]"#;

/// 答案输入框
pub const ANSWER_INPUT: &str = r#"input[data-testid="answer-input"], .answer-input input"#;
/// 可点击的选项
pub const CHOICE_OPTION: &str = r#"[data-testid="choice"], .multiple-choice-option"#;
pub const SUBMIT_BUTTON: &str = r#"button[data-testid="submit"], button.submit"#;
pub const NEXT_BUTTON: &str = r#"[data-testid="next-btn"], button.next-question"#;

/// 转成可直接嵌入 JS 的字符串字面量
pub fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}
