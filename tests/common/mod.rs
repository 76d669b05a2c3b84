//! 引擎测试用的替身实现
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::time::sleep;

use question_autopilot::engine::{
    AnswerEngine, AnswerWriter, ChatMessage, CompletionOptions, EngineDeps, EngineOptions,
    ModelReply, ModelService, QuestionReader,
};
use question_autopilot::models::{Feedback, Mode, QuestionContext, QuestionKind, TokenUsage};
use question_autopilot::state::SharedState;

pub fn short_answer(text: &str) -> QuestionContext {
    QuestionContext::new(QuestionKind::ShortAnswer, text).unwrap()
}

pub fn multiple_choice(text: &str, options: &[&str]) -> QuestionContext {
    QuestionContext::new(QuestionKind::MultipleChoice, text)
        .unwrap()
        .with_options(options.iter().map(|o| o.to_string()).collect())
}

pub fn feedback(was_correct: bool, correct_answer: Option<&str>, text: Option<&str>) -> Feedback {
    Feedback {
        was_correct,
        correct_answer: correct_answer.map(str::to_string),
        feedback_text: text.map(str::to_string),
    }
}

/// 按脚本返回题目和反馈
#[derive(Default)]
pub struct ScriptedReader {
    contexts: Mutex<VecDeque<QuestionContext>>,
    /// 脚本用完后每次都返回这道题
    fallback: Mutex<Option<QuestionContext>>,
    feedback: Mutex<VecDeque<Feedback>>,
    advances: AtomicBool,
    read_delay: Mutex<Duration>,
    pub context_reads: AtomicUsize,
    pub feedback_reads: AtomicUsize,
    pub advance_timeouts: Mutex<Vec<Duration>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ScriptedReader {
    pub fn new() -> Self {
        Self {
            advances: AtomicBool::new(true),
            ..Default::default()
        }
    }

    pub fn push_context(&self, context: QuestionContext) {
        self.contexts.lock().unwrap().push_back(context);
    }

    pub fn set_fallback(&self, context: QuestionContext) {
        *self.fallback.lock().unwrap() = Some(context);
    }

    pub fn push_feedback(&self, feedback: Feedback) {
        self.feedback.lock().unwrap().push_back(feedback);
    }

    pub fn set_advances(&self, advances: bool) {
        self.advances.store(advances, Ordering::SeqCst);
    }

    pub fn set_read_delay(&self, delay: Duration) {
        *self.read_delay.lock().unwrap() = delay;
    }

    pub fn context_reads(&self) -> usize {
        self.context_reads.load(Ordering::SeqCst)
    }

    pub fn feedback_reads(&self) -> usize {
        self.feedback_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionReader for ScriptedReader {
    async fn read_context(&self) -> Result<Option<QuestionContext>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.context_reads.fetch_add(1, Ordering::SeqCst);

        let delay = *self.read_delay.lock().unwrap();
        if !delay.is_zero() {
            sleep(delay).await;
        }

        let next = self.contexts.lock().unwrap().pop_front();
        let context = next.or_else(|| self.fallback.lock().unwrap().clone());
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(context)
    }

    async fn read_feedback(&self) -> Result<Option<Feedback>> {
        self.feedback_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.feedback.lock().unwrap().pop_front())
    }

    async fn wait_for_context_change(&self, _previous_text: &str, timeout: Duration) -> Result<bool> {
        self.advance_timeouts.lock().unwrap().push(timeout);
        Ok(self.advances.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterCall {
    Fill(String),
    Submit,
    Advance,
}

/// 记录所有页面写入
#[derive(Default)]
pub struct RecordingWriter {
    calls: Mutex<Vec<WriterCall>>,
}

impl RecordingWriter {
    pub fn calls(&self) -> Vec<WriterCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnswerWriter for RecordingWriter {
    async fn fill_answer(&self, text: &str) -> Result<()> {
        self.calls.lock().unwrap().push(WriterCall::Fill(text.to_string()));
        Ok(())
    }

    async fn submit(&self) -> Result<()> {
        self.calls.lock().unwrap().push(WriterCall::Submit);
        Ok(())
    }

    async fn advance(&self) -> Result<()> {
        self.calls.lock().unwrap().push(WriterCall::Advance);
        Ok(())
    }
}

/// 按脚本返回模型回复，脚本用完后一直失败
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<ModelReply, String>>>,
    calls: AtomicUsize,
    pub last_messages: Mutex<Vec<ChatMessage>>,
}

impl ScriptedModel {
    pub fn reply(&self, content: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(ModelReply::text(content)));
    }

    pub fn reply_with_usage(&self, content: &str, usage: TokenUsage) {
        self.replies.lock().unwrap().push_back(Ok(ModelReply {
            content: content.to_string(),
            usage: Some(usage),
        }));
    }

    pub fn fail(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelService for ScriptedModel {
    async fn complete(&self, messages: &[ChatMessage], _options: &CompletionOptions) -> Result<ModelReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_messages.lock().unwrap() = messages.to_vec();
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("model unavailable")),
        }
    }
}

pub struct Harness {
    pub engine: AnswerEngine,
    pub state: SharedState,
    pub reader: Arc<ScriptedReader>,
    pub writer: Arc<RecordingWriter>,
    pub model: Arc<ScriptedModel>,
}

impl Harness {
    pub fn new(mode: Mode) -> Self {
        let reader = Arc::new(ScriptedReader::new());
        let writer = Arc::new(RecordingWriter::default());
        let model = Arc::new(ScriptedModel::default());
        let state = SharedState::new(mode);
        let engine = AnswerEngine::with_options(
            EngineDeps {
                reader: reader.clone(),
                writer: writer.clone(),
                model: model.clone(),
                state: state.clone(),
            },
            EngineOptions {
                rng_seed: Some(7),
                ..Default::default()
            },
        );
        Self {
            engine,
            state,
            reader,
            writer,
            model,
        }
    }
}
