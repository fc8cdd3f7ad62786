//! 批量申请处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责申请计划的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：连接或启动浏览器，加载申请计划
//! 2. **顺序处理**：逐个处理计划中的申请，每个申请使用独立页面
//! 3. **资源管理**：持有 Browser，确保生命周期正确
//! 4. **全局统计**：汇总所有申请的处理结果
//!
//! 同一个页面只被一个流程驱动，因此申请之间不并发。

use std::path::Path;

use anyhow::Result;
use chromiumoxide::Browser;
use tracing::{error, info, warn};

use crate::browser;
use crate::config::Config;
use crate::models::{load_application_plan, ApplicationPlan};
use crate::orchestrator::application_processor::process_application;
use crate::services::OutcomeWriter;
use crate::utils::logging::{log_startup, print_final_stats};
use crate::workflow::{ApplicationCtx, ApplicationFlow};

/// 应用主结构
pub struct App {
    config: Config,
    browser: Browser,
    plan: ApplicationPlan,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let plan = load_application_plan(Path::new(&config.plan_file)).await?;

        log_startup(plan.applications.len(), config.headless);

        let browser = if config.headless {
            browser::launch_headless_browser(config.chrome_executable.as_deref()).await?
        } else {
            browser::connect_to_browser(config.browser_debug_port).await?
        };

        if !config.escalation_enabled() {
            info!("💡 未配置 LLM_API_KEY，低置信度问题将使用分析器的保守答案");
        }

        Ok(Self {
            config,
            browser,
            plan,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        if self.plan.applications.is_empty() {
            warn!("⚠️ 申请计划为空，程序结束");
            return Ok(());
        }

        let stats = self.process_all_applications().await?;

        print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            &self.config.outcome_file,
        );

        Ok(())
    }

    /// 顺序处理所有申请
    async fn process_all_applications(&self) -> Result<ProcessingStats> {
        let flow = ApplicationFlow::new(&self.config, self.plan.profile.clone());
        let writer = OutcomeWriter::with_path(&self.config.outcome_file);
        let total = self.plan.applications.len();
        let mut stats = ProcessingStats {
            total,
            ..Default::default()
        };

        for (idx, target) in self.plan.applications.iter().enumerate() {
            let ctx = ApplicationCtx::new(idx + 1, total, &target.url, target.job.clone());

            match process_application(&self.browser, &flow, &ctx, target, &writer).await {
                Ok(true) => stats.success += 1,
                Ok(false) => stats.failed += 1,
                Err(e) => {
                    error!("{} ❌ 处理过程中发生错误: {}", ctx, e);
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    success: usize,
    failed: usize,
    total: usize,
}
