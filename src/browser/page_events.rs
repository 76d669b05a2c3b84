use anyhow::Result;
use chromiumoxide::cdp::browser_protocol::page::EventFrameNavigated;
use chromiumoxide::cdp::js_protocol::runtime::{EventExceptionThrown, ExceptionDetails};
use chromiumoxide::Page;
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::error::AppError;

/// 监听页面导航和脚本异常，写入日志
///
/// 两个监听任务随页面事件流结束而退出。
pub async fn watch_page_events(page: &Page) -> Result<()> {
    let mut navigations = page
        .event_listener::<EventFrameNavigated>()
        .await
        .map_err(AppError::from)?;
    let mut exceptions = page
        .event_listener::<EventExceptionThrown>()
        .await
        .map_err(AppError::from)?;

    tokio::spawn(async move {
        while let Some(event) = navigations.next().await {
            // 只关心主框架，iframe 导航太多
            if event.frame.parent_id.is_none() {
                info!("🧭 {}", navigation_line(&event.frame.url));
            }
        }
        debug!("页面导航事件流已结束");
    });

    tokio::spawn(async move {
        while let Some(event) = exceptions.next().await {
            warn!("💥 {}", exception_line(&event.exception_details));
        }
        debug!("页面异常事件流已结束");
    });

    debug!("已开始监听页面事件");
    Ok(())
}

fn navigation_line(url: &str) -> String {
    format!("页面已导航: {}", url)
}

fn exception_line(details: &ExceptionDetails) -> String {
    let message = details
        .exception
        .as_ref()
        .and_then(|e| e.description.as_deref())
        .unwrap_or(&details.text);
    describe_exception(
        message,
        details.url.as_deref(),
        details.line_number,
        details.column_number,
    )
}

fn describe_exception(message: &str, url: Option<&str>, line: i64, column: i64) -> String {
    // CDP 的行列号从 0 开始
    match url.filter(|u| !u.is_empty()) {
        Some(url) => format!("页面脚本异常: {} ({}:{}:{})", message, url, line + 1, column + 1),
        None => format!("页面脚本异常: {}", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_exception_with_location() {
        let line = describe_exception(
            "TypeError: x is undefined",
            Some("https://example.com/app.js"),
            9,
            0,
        );
        assert_eq!(
            line,
            "页面脚本异常: TypeError: x is undefined (https://example.com/app.js:10:1)"
        );
    }

    #[test]
    fn test_describe_exception_without_location() {
        assert_eq!(describe_exception("Uncaught", None, 0, 0), "页面脚本异常: Uncaught");
        assert_eq!(describe_exception("Uncaught", Some(""), 3, 4), "页面脚本异常: Uncaught");
    }

    #[test]
    fn test_navigation_line() {
        assert_eq!(navigation_line("https://example.com/q/2"), "页面已导航: https://example.com/q/2");
    }
}
