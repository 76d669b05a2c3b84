//! 题目相关的数据结构

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    ShortAnswer,
    MultipleChoice,
    /// 多步骤题（页面上已有作答步骤）
    Steps,
    #[serde(other)]
    Other,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::ShortAnswer => "short_answer",
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::Steps => "steps",
            QuestionKind::Other => "other",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 当前页面上的题目上下文
///
/// 每轮读取一次，用完即丢；只有它的指纹和最终答案会进入答案缓存。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionContext {
    pub kind: QuestionKind,
    pub question_text: String,
    /// 选项（仅选择题）
    #[serde(default)]
    pub options: Vec<String>,
    /// 已有的作答步骤
    #[serde(default)]
    pub prior_steps: Vec<String>,
    /// 上一次尝试留下的反馈
    #[serde(default)]
    pub feedback_text: Option<String>,
}

impl QuestionContext {
    /// 创建题目上下文，题干为空白时返回错误
    pub fn new(kind: QuestionKind, question_text: impl Into<String>) -> Result<Self, EngineError> {
        let question_text = question_text.into();
        if question_text.trim().is_empty() {
            return Err(EngineError::EmptyQuestion);
        }
        Ok(Self {
            kind,
            question_text,
            options: Vec::new(),
            prior_steps: Vec::new(),
            feedback_text: None,
        })
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    pub fn with_prior_steps(mut self, steps: Vec<String>) -> Self {
        self.prior_steps = steps;
        self
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback_text = Some(feedback.into());
        self
    }

    /// 缓存键：(题型, 去空白并转小写的题干)
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(self.kind, &self.question_text)
    }

    pub fn is_multiple_choice(&self) -> bool {
        self.kind == QuestionKind::MultipleChoice && !self.options.is_empty()
    }
}

/// 题目指纹
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    kind: QuestionKind,
    normalized: String,
}

impl Fingerprint {
    pub fn new(kind: QuestionKind, question_text: &str) -> Self {
        Self {
            kind,
            normalized: question_text.trim().to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.kind, self.normalized)
    }
}

/// 写入页面的答案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub raw: String,
    /// 来源标记，只用于观察，不参与分支判断
    pub confidence: f64,
}

impl Answer {
    /// 模型生成的答案
    pub const GENERATED_CONFIDENCE: f64 = 0.6;
    /// 页面给出的正确答案
    pub const CORRECTED_CONFIDENCE: f64 = 1.0;

    pub fn new(raw: impl Into<String>, confidence: f64) -> Self {
        Self {
            raw: raw.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn generated(raw: impl Into<String>) -> Self {
        Self::new(raw, Self::GENERATED_CONFIDENCE)
    }

    pub fn corrected(raw: impl Into<String>) -> Self {
        Self::new(raw, Self::CORRECTED_CONFIDENCE)
    }
}

/// 提交后的判题反馈
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub was_correct: bool,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub feedback_text: Option<String>,
}
