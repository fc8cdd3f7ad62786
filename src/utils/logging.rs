/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::ApplicationOutcome;

/// 初始化日志
///
/// `RUST_LOG` 优先；未设置时 verbose 为 debug，否则为 info。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("job_apply_submit={},warn", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(total: usize, headless: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 职位申请表单自动填写");
    info!(
        "🌐 浏览器模式: {}",
        if headless { "无头浏览器" } else { "连接已打开的浏览器" }
    );
    info!("📋 待处理申请: {} 个", total);
    info!("{}", "=".repeat(60));
}

/// 记录单个申请的结果
pub fn log_outcome(index: usize, outcome: &ApplicationOutcome) {
    info!("\n{}", "─".repeat(60));
    if outcome.success {
        info!(
            "✅ [申请 {}] 已提交: {} (共 {} 页, 回答 {} 个问题)",
            index,
            outcome.url,
            outcome.pages_visited,
            outcome.answers.len()
        );
    } else {
        info!(
            "❌ [申请 {}] 未完成: {} | {}",
            index,
            outcome.url,
            outcome.failure_reason.as_deref().unwrap_or("未知原因")
        );
    }
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(success: usize, failed: usize, total: usize, outcome_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n申请结果已保存至: {}", outcome_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_by_characters() {
        assert_eq!(truncate_text("你好世界", 2), "你好...");
        assert_eq!(truncate_text("short", 10), "short");
    }
}
