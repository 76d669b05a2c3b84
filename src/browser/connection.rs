use anyhow::Result;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

use crate::error::AppError;

/// 连接到已打开调试端口的浏览器并获取答题页面
///
/// 优先复用标题包含 `target_title` 的页面，找不到时新建页面并导航到 `target_url`。
pub async fn connect_to_browser_and_page(
    port: u16,
    target_url: Option<&str>,
    target_title: Option<&str>,
) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);
    debug!("目标 URL: {:?}, 目标标题: {:?}", target_url, target_title);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        AppError::browser_connection_failed(port, e)
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                warn!("浏览器事件处理结束: {}", e);
                break;
            }
        }
    });

    // 等待浏览器状态同步
    sleep(Duration::from_millis(300)).await;

    let pages = browser.pages().await.map_err(AppError::from)?;
    debug!("获取到 {} 个页面", pages.len());

    if let Some(title) = target_title {
        for page in pages.iter() {
            if let Ok(Some(page_title)) = page.get_title().await {
                debug!("检查页面标题: {}", page_title);
                if page_title.contains(title) {
                    info!("✓ 找到答题页面: {}", page_title);
                    return Ok((browser, page.clone()));
                }
            }
        }
        debug!("未找到标题包含 '{}' 的页面，将创建新页面", title);
    }

    let page = browser
        .new_page(target_url.unwrap_or("about:blank"))
        .await
        .map_err(|e| {
            error!("创建页面失败: {}", e);
            AppError::from(e)
        })?;
    match target_url {
        Some(url) => info!("已打开新页面: {}", url),
        None => info!("已打开空白页面"),
    }

    Ok((browser, page))
}
