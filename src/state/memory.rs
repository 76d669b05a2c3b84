//! 答案缓存
//!
//! 进程级别的 指纹 → 已验证答案 映射，没有淘汰策略。

use std::collections::HashMap;

use crate::models::{Answer, Fingerprint, QuestionContext};

/// 缓存条目
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryEntry {
    pub question_text: String,
    pub answer: Answer,
}

#[derive(Debug, Default)]
pub struct AnswerMemory {
    entries: HashMap<Fingerprint, MemoryEntry>,
}

impl AnswerMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入或覆盖答案，返回是否写入
    ///
    /// 指纹为空时不写入。
    pub fn remember(&mut self, context: &QuestionContext, answer: Answer) -> bool {
        let key = context.fingerprint();
        if key.is_empty() {
            return false;
        }
        self.entries.insert(
            key,
            MemoryEntry {
                question_text: context.question_text.clone(),
                answer,
            },
        );
        true
    }

    pub fn recall(&self, context: &QuestionContext) -> Option<Answer> {
        self.entries
            .get(&context.fingerprint())
            .map(|entry| entry.answer.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
