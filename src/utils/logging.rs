/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::StateSnapshot;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则默认 `info`，详细模式下为 `debug`。
/// 重复调用不会报错（测试中会多次初始化）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 程序启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🌐 浏览器调试端口: {}", config.browser_debug_port);
    info!("🤖 模型: {}", config.llm_model_name);
    info!("📋 默认答题模式: {}", config.default_mode);
    info!("{}", "=".repeat(60));
}

/// 打印可用命令
pub fn log_command_help() {
    info!("💡 可用命令: start | stop | refresh | mode <instant|semi|delayed> | status | quit");
}

/// 打印当前状态
pub fn log_snapshot(snapshot: &StateSnapshot) {
    info!("{}", "─".repeat(60));
    info!(
        "📊 运行: {} | 模式: {} | 当前: {}",
        if snapshot.running { "是" } else { "否" },
        snapshot.mode,
        snapshot.activity
    );
    info!(
        "✅ 正确: {}/{} | 🔁 重试: {}",
        snapshot.correct_count, snapshot.answered_count, snapshot.retry_count
    );
    info!(
        "🧮 Token: {} (prompt {} / completion {}) | 估算花费: {:.4}",
        snapshot.total_tokens, snapshot.prompt_tokens, snapshot.completion_tokens, snapshot.spent
    );
    if let Some(err) = &snapshot.last_error {
        info!("⚠️ 最近错误: {}", err);
    }
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
