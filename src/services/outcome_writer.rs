//! 申请结果写入服务 - 业务能力层
//!
//! 只负责"追加写 outcomes.jsonl"能力，不关心流程

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::models::ApplicationOutcome;

/// 申请结果写入服务
///
/// 每个申请一行 JSON，便于外部持久化层增量读取。
pub struct OutcomeWriter {
    outcome_file_path: PathBuf,
}

impl OutcomeWriter {
    pub fn new() -> Self {
        Self {
            outcome_file_path: PathBuf::from("outcomes.jsonl"),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            outcome_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.outcome_file_path
    }

    /// 追加写入一条申请结果
    pub async fn write(&self, outcome: &ApplicationOutcome) -> Result<()> {
        debug!(
            "写入申请结果: {} | 成功: {} | 页数: {}",
            outcome.url, outcome.success, outcome.pages_visited
        );

        let mut line = serde_json::to_string(outcome).context("序列化申请结果失败")?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.outcome_file_path)
            .await
            .with_context(|| format!("打开结果文件失败: {}", self.outcome_file_path.display()))?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

impl Default for OutcomeWriter {
    fn default() -> Self {
        Self::new()
    }
}
