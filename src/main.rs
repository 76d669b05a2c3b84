use anyhow::Result;
use question_autopilot::config::verbose_logging_from_env;
use question_autopilot::utils::logging;
use question_autopilot::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 先初始化日志，配置解析的警告才能输出
    logging::init(verbose_logging_from_env());

    // 加载配置
    let config = Config::from_env();

    // 初始化并运行应用
    App::initialize(config).await?.run().await
}
