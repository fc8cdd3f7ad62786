//! 单个申请处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责一个申请目标的资源生命周期，是申请级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **页面管理**：为申请打开独立页面，结束后关闭
//! 2. **流程调度**：委托 `ApplicationFlow` 处理整个表单
//! 3. **结果落盘**：通过 `OutcomeWriter` 追加写入申请结果

use anyhow::Result;
use chromiumoxide::Browser;
use tracing::{error, warn};

use crate::browser::open_application_page;
use crate::infrastructure::ChromePage;
use crate::models::{ApplicationOutcome, ApplicationTarget};
use crate::services::OutcomeWriter;
use crate::utils::logging::log_outcome;
use crate::workflow::{ApplicationCtx, ApplicationFlow};

/// 处理单个申请
///
/// # 返回
/// 返回申请是否成功提交；只有结果写入失败才返回错误
pub async fn process_application(
    browser: &Browser,
    flow: &ApplicationFlow,
    ctx: &ApplicationCtx,
    target: &ApplicationTarget,
    writer: &OutcomeWriter,
) -> Result<bool> {
    let outcome = match open_application_page(browser, &target.url).await {
        Ok(page) => {
            let chrome_page = ChromePage::new(page);
            let outcome = flow.run(&chrome_page, ctx, target).await;

            if let Err(e) = chrome_page.page().clone().close().await {
                warn!("{} 关闭页面失败: {}", ctx, e);
            }
            outcome
        }
        Err(e) => {
            error!("{} ❌ 无法打开申请页面: {}", ctx, e);
            ApplicationOutcome::start(&target.url, target.job.clone())
                .finish_stalled(format!("无法打开申请页面: {}", e))
        }
    };

    log_outcome(ctx.index, &outcome);
    writer.write(&outcome).await?;

    Ok(outcome.success)
}
