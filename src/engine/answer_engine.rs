//! 答题引擎
//!
//! 核心职责：驱动"读题 → 取答案 → 填写 → (提交) → 等反馈 → 翻页"的循环。
//!
//! - 同一时间最多只有一个循环在跑，重复 `start()` 只会恢复运行标志
//! - `stop()` 是协作式的：循环只在循环顶部和等待反馈时检查停止请求，
//!   正在进行的页面写入或模型调用会正常完成
//! - 单轮出错不会结束循环，只记录重试和错误信息，冷却后继续

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::engine::collaborators::{
    AnswerWriter, ChatMessage, CompletionOptions, ModelService, QuestionReader,
};
use crate::engine::modes::{random_delay, resolve_behavior, ModeBehavior};
use crate::engine::prompt::{compose_prompt, parse_model_response, SYSTEM_PROMPT};
use crate::engine::retry::{retry_with_backoff, RetryPolicy};
use crate::error::AppError;
use crate::models::{Answer, Feedback, Mode, QuestionContext};
use crate::state::SharedState;
use crate::utils::logging::truncate_text;

/// 循环中用到的所有等待时间
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineTimings {
    /// 两轮之间的固定间隔
    pub idle_poll: Duration,
    /// 没有检测到题目时的等待
    pub no_question_wait: Duration,
    /// 单轮出错后的冷却
    pub error_cooldown: Duration,
    /// 反馈轮询间隔
    pub feedback_poll: Duration,
    pub feedback_timeout_auto: Duration,
    pub feedback_timeout_manual: Duration,
    pub advance_timeout_auto: Duration,
    pub advance_timeout_manual: Duration,
}

impl Default for EngineTimings {
    fn default() -> Self {
        Self {
            idle_poll: Duration::from_millis(250),
            no_question_wait: Duration::from_millis(750),
            error_cooldown: Duration::from_secs(2),
            feedback_poll: Duration::from_millis(400),
            feedback_timeout_auto: Duration::from_secs(8),
            feedback_timeout_manual: Duration::from_secs(120),
            advance_timeout_auto: Duration::from_secs(25),
            advance_timeout_manual: Duration::from_secs(120),
        }
    }
}

impl EngineTimings {
    fn feedback_timeout(&self, behavior: &ModeBehavior) -> Duration {
        if behavior.auto_submit {
            self.feedback_timeout_auto
        } else {
            self.feedback_timeout_manual
        }
    }

    fn advance_timeout(&self, behavior: &ModeBehavior) -> Duration {
        if behavior.auto_submit {
            self.advance_timeout_auto
        } else {
            self.advance_timeout_manual
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub timings: EngineTimings,
    pub retry: RetryPolicy,
    pub completion: CompletionOptions,
    /// 固定随机种子（测试用），为空时从系统熵初始化
    pub rng_seed: Option<u64>,
}

/// 引擎依赖
pub struct EngineDeps {
    pub reader: Arc<dyn QuestionReader>,
    pub writer: Arc<dyn AnswerWriter>,
    pub model: Arc<dyn ModelService>,
    pub state: SharedState,
}

/// 单轮处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum IterationOutcome {
    /// 页面上没有题目
    NoQuestion,
    Processed {
        answer: Answer,
        from_cache: bool,
        /// 判题结果，`None` 表示等待窗口内没有反馈
        was_correct: Option<bool>,
        advanced: bool,
    },
}

/// 停止请求和"循环在跑"两个标志，始终在同一把锁下读写
#[derive(Debug, Default)]
struct LoopControl {
    stop_requested: bool,
    loop_in_flight: bool,
}

struct EngineInner {
    reader: Arc<dyn QuestionReader>,
    writer: Arc<dyn AnswerWriter>,
    model: Arc<dyn ModelService>,
    state: SharedState,
    timings: EngineTimings,
    retry: RetryPolicy,
    completion: CompletionOptions,
    control: Mutex<LoopControl>,
    rng: Mutex<StdRng>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 答题引擎句柄，clone 后指向同一个引擎
#[derive(Clone)]
pub struct AnswerEngine {
    inner: Arc<EngineInner>,
}

impl AnswerEngine {
    pub fn new(deps: EngineDeps) -> Self {
        Self::with_options(deps, EngineOptions::default())
    }

    pub fn with_options(deps: EngineDeps, options: EngineOptions) -> Self {
        let rng = match options.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            inner: Arc::new(EngineInner {
                reader: deps.reader,
                writer: deps.writer,
                model: deps.model,
                state: deps.state,
                timings: options.timings,
                retry: options.retry,
                completion: options.completion,
                control: Mutex::new(LoopControl::default()),
                rng: Mutex::new(rng),
            }),
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.inner.state
    }

    pub fn is_loop_in_flight(&self) -> bool {
        lock(&self.inner.control).loop_in_flight
    }

    /// 开始答题
    ///
    /// 已有循环在跑时只恢复运行标志并清除停止请求，不会再启动第二个循环。
    /// 返回是否启动了新循环。
    pub fn start(&self) -> bool {
        let spawn = {
            let mut control = lock(&self.inner.control);
            control.stop_requested = false;
            if control.loop_in_flight {
                false
            } else {
                control.loop_in_flight = true;
                true
            }
        };
        self.inner.state.set_running(true);

        if spawn {
            info!("▶️ 启动答题循环 (模式: {})", self.inner.state.mode());
            let engine = self.clone();
            tokio::spawn(async move { engine.run_loop().await });
        } else {
            info!("▶️ 答题循环仍在运行，恢复运行状态");
        }
        spawn
    }

    /// 请求停止，循环在下一个检查点退出
    pub fn stop(&self) {
        lock(&self.inner.control).stop_requested = true;
        self.inner.state.set_running(false);
        self.set_activity("Stopped");
        info!("⏸️ 已请求停止答题循环");
    }

    /// 重新读取当前题目，只用于观察
    pub async fn refresh(&self) -> Result<Option<QuestionContext>> {
        let context = self.inner.reader.read_context().await?;
        match &context {
            Some(ctx) => info!(
                "🔄 当前题目 [{}]: {}",
                ctx.kind,
                truncate_text(&ctx.question_text, 60)
            ),
            None => info!("🔄 当前没有检测到题目"),
        }
        Ok(context)
    }

    pub fn set_mode(&self, mode: Mode) {
        self.inner.state.set_mode(mode);
        info!("🔧 答题模式切换为: {}", mode);
    }

    fn stop_requested(&self) -> bool {
        lock(&self.inner.control).stop_requested
    }

    /// 循环顶部检查点：看到停止请求时清除"循环在跑"标志
    fn should_exit(&self) -> bool {
        let mut control = lock(&self.inner.control);
        if control.stop_requested {
            control.loop_in_flight = false;
            true
        } else {
            false
        }
    }

    async fn run_loop(self) {
        let timings = &self.inner.timings;
        while !self.should_exit() {
            if let Err(e) = self.process_question().await {
                error!("❌ 处理题目失败: {:#}", e);
                self.inner.state.set_error(Some(e.to_string()));
                self.inner.state.record_retry();
                self.set_activity("Cooling down after error");
                sleep(timings.error_cooldown).await;
            }
            sleep(timings.idle_poll).await;
        }
        // 退出前的最后一轮可能覆盖了 stop() 写入的状态
        self.set_activity("Stopped");
        info!("⏹️ 答题循环已退出");
    }

    /// 处理一轮
    pub async fn process_question(&self) -> Result<IterationOutcome> {
        let inner = &self.inner;
        let state = &inner.state;

        self.set_activity("Reading question");
        let Some(context) = inner.reader.read_context().await? else {
            self.set_activity("Waiting for question");
            sleep(inner.timings.no_question_wait).await;
            return Ok(IterationOutcome::NoQuestion);
        };
        info!(
            "📝 题目 [{}]: {}",
            context.kind,
            truncate_text(&context.question_text, 80)
        );

        let (answer, from_cache) = match state.recall(&context) {
            Some(answer) => {
                info!("💾 命中答案缓存: {}", truncate_text(&answer.raw, 40));
                (answer, true)
            }
            None => (self.generate_answer(&context).await?, false),
        };

        self.set_activity("Filling answer");
        inner.writer.fill_answer(&answer.raw).await?;

        let behavior = resolve_behavior(state.mode());
        if behavior.auto_submit {
            let delay = self.next_delay(&behavior);
            if !delay.is_zero() {
                debug!("提交前等待 {} ms", delay.as_millis());
                sleep(delay).await;
            }
            self.set_activity("Submitting");
            inner.writer.submit().await?;
        }

        self.set_activity("Waiting for feedback");
        let feedback = self
            .wait_for_feedback(inner.timings.feedback_timeout(&behavior))
            .await?;
        match &feedback {
            Some(feedback) => self.apply_feedback(&context, &answer, feedback),
            None => debug!("等待窗口内没有检测到反馈"),
        }

        if behavior.auto_submit {
            self.set_activity("Advancing");
            inner.writer.advance().await?;
        }

        self.set_activity("Waiting for next question");
        let advanced = inner
            .reader
            .wait_for_context_change(
                &context.question_text,
                inner.timings.advance_timeout(&behavior),
            )
            .await?;
        if advanced {
            state.set_error(None);
        } else if behavior.auto_submit {
            warn!("⚠️ 提交后题目没有变化");
            state.set_error(Some("Question did not advance".to_string()));
        } else {
            debug!("等待人工提交或翻页");
        }

        Ok(IterationOutcome::Processed {
            answer,
            from_cache,
            was_correct: feedback.map(|f| f.was_correct),
            advanced,
        })
    }

    /// 缓存未命中时调用模型生成答案
    async fn generate_answer(&self, context: &QuestionContext) -> Result<Answer> {
        info!("🤖 请求模型作答 (题型: {})", context.kind);
        self.set_activity("Requesting answer");

        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(compose_prompt(context)),
        ];
        let raw = retry_with_backoff(&self.inner.retry, "模型调用", |attempt| {
            debug!("模型调用第 {} 次", attempt);
            self.request_answer(&messages, context)
        })
        .await?;

        info!("✓ 模型答案: {}", truncate_text(&raw, 40));
        Ok(Answer::generated(raw))
    }

    async fn request_answer(&self, messages: &[ChatMessage], context: &QuestionContext) -> Result<String> {
        let reply = self
            .inner
            .model
            .complete(messages, &self.inner.completion)
            .await?;
        self.inner.state.record_token_usage(reply.usage);

        match parse_model_response(context, &reply.content)? {
            Some(answer) => Ok(answer),
            None => Err(AppError::unparseable_response(reply.content).into()),
        }
    }

    /// 轮询反馈，超时或收到停止请求时返回 `None`
    async fn wait_for_feedback(&self, timeout: Duration) -> Result<Option<Feedback>> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline && !self.stop_requested() {
            if let Some(feedback) = self.inner.reader.read_feedback().await? {
                return Ok(Some(feedback));
            }
            sleep(self.inner.timings.feedback_poll).await;
        }
        Ok(None)
    }

    fn apply_feedback(&self, context: &QuestionContext, answer: &Answer, feedback: &Feedback) {
        let state = &self.inner.state;
        state.record_result(feedback.was_correct);

        if feedback.was_correct {
            info!("✅ 回答正确");
            state.remember(context, answer.clone());
            state.set_error(None);
            return;
        }

        let message = feedback
            .feedback_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .unwrap_or("Incorrect")
            .to_string();

        match feedback
            .correct_answer
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
        {
            Some(correct) => {
                warn!("❌ 回答错误，记录正确答案: {}", truncate_text(correct, 40));
                state.remember(context, Answer::corrected(correct));
            }
            None => {
                // 旧答案保留在缓存中，下次遇到同一题仍会使用
                warn!("❌ 回答错误，页面没有给出正确答案");
            }
        }
        state.set_error(Some(message));
    }

    fn next_delay(&self, behavior: &ModeBehavior) -> Duration {
        let mut rng = lock(&self.inner.rng);
        random_delay(behavior, &mut *rng)
    }

    /// 只在内容变化时更新，避免空闲轮询时反复通知观察者
    fn set_activity(&self, activity: &str) {
        let state = &self.inner.state;
        if state.snapshot().activity != activity {
            state.set_activity(activity);
        }
    }
}
