//! 应用编排
//!
//! 持有浏览器资源，组装页面适配器、模型服务、共享状态和答题引擎，
//! 然后从标准输入读取操作员命令。

use std::ops::ControlFlow;
use std::sync::Arc;

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::browser;
use crate::config::Config;
use crate::engine::{AnswerEngine, CompletionOptions, EngineDeps, EngineOptions};
use crate::infrastructure::JsExecutor;
use crate::orchestrator::commands::handle_line;
use crate::page::{DomReader, DomWriter};
use crate::services::OpenAiModelService;
use crate::state::{SharedState, Subscription};
use crate::utils::logging::{log_command_help, log_snapshot, log_startup};

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    engine: AnswerEngine,
    _subscription: Subscription,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        if config.llm_api_key.is_empty() {
            warn!("⚠️ 未设置 LLM_API_KEY，模型调用将会失败");
        }

        let (browser, page) = browser::connect_to_browser_and_page(
            config.browser_debug_port,
            Some(&config.target_url),
            config.target_title.as_deref(),
        )
        .await
        .context("初始化浏览器失败")?;

        // 事件监听失败不影响答题
        if let Err(e) = browser::watch_page_events(&page).await {
            warn!("⚠️ 无法监听页面事件: {:#}", e);
        }

        let executor = JsExecutor::new(page);
        let state = SharedState::with_token_cost(config.default_mode, config.token_cost_per_1k);
        let subscription = state.subscribe(|snapshot| {
            debug!(
                "状态更新: running={} mode={} activity={} answered={} correct={}",
                snapshot.running,
                snapshot.mode,
                snapshot.activity,
                snapshot.answered_count,
                snapshot.correct_count
            );
        });

        let deps = EngineDeps {
            reader: Arc::new(DomReader::new(executor.clone())),
            writer: Arc::new(DomWriter::new(executor)),
            model: Arc::new(OpenAiModelService::new(&config)),
            state,
        };
        let options = EngineOptions {
            completion: CompletionOptions {
                temperature: Some(config.llm_temperature),
                max_tokens: config.llm_max_tokens,
                use_default_temperature: false,
            },
            ..Default::default()
        };
        let engine = AnswerEngine::with_options(deps, options);

        Ok(Self {
            config,
            _browser: browser,
            engine,
            _subscription: subscription,
        })
    }

    pub fn engine(&self) -> &AnswerEngine {
        &self.engine
    }

    /// 运行应用主逻辑
    ///
    /// 收到 `quit`、输入结束或 Ctrl-C 时停止引擎并返回。
    pub async fn run(self) -> Result<()> {
        log_command_help();
        if self.config.auto_start {
            self.engine.start();
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line.context("读取命令失败")? {
                        Some(line) => {
                            if let ControlFlow::Break(()) = handle_line(&self.engine, &line).await {
                                break;
                            }
                        }
                        None => {
                            info!("📭 输入已结束");
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("🛑 收到 Ctrl-C");
                    break;
                }
            }
        }

        self.engine.stop();
        log_snapshot(&self.engine.state().snapshot());
        info!("✅ 程序结束");
        Ok(())
    }
}
