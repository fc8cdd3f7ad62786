use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::BrowserError;

/// 连接到已打开的浏览器（远程调试端口）
pub async fn connect_to_browser(port: u16) -> Result<Browser, BrowserError> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        BrowserError::ConnectionFailed { port, source: e }
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    Ok(browser)
}

/// 为一个申请打开新页面并导航到申请 URL
///
/// 每个申请使用独立的页面，申请结束后由调用方关闭。
pub async fn open_application_page(browser: &Browser, url: &str) -> Result<Page, BrowserError> {
    debug!("创建新页面并导航到: {}", url);
    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建新页面失败: {}", e);
        BrowserError::NavigationFailed {
            url: url.to_string(),
            source: e,
        }
    })?;

    page.goto(url).await.map_err(|e| {
        error!("导航到 {} 失败: {}", url, e);
        BrowserError::NavigationFailed {
            url: url.to_string(),
            source: e,
        }
    })?;

    info!("已导航到: {}", url);
    Ok(page)
}
