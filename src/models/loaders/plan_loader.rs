use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{AppError, AppResult};
use crate::models::profile::{ApplicantProfile, JobContext};

/// 申请计划：一个申请人资料 + 多个申请目标
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationPlan {
    #[serde(default)]
    pub profile: ApplicantProfile,
    #[serde(default)]
    pub applications: Vec<ApplicationTarget>,
}

/// 单个申请目标
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationTarget {
    pub url: String,
    #[serde(default)]
    pub job: JobContext,
    #[serde(default)]
    pub resume: DocumentPaths,
    #[serde(default)]
    pub cover_letter: DocumentPaths,
}

/// 自定义文档与默认文档路径
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentPaths {
    pub custom: Option<PathBuf>,
    pub default: Option<PathBuf>,
}

impl DocumentPaths {
    /// 至少提供了一个文件
    pub fn is_configured(&self) -> bool {
        self.custom.is_some() || self.default.is_some()
    }
}

/// 从 TOML 文件加载申请计划
pub async fn load_application_plan(plan_path: &Path) -> AppResult<ApplicationPlan> {
    let path_str = plan_path.display().to_string();
    let content = fs::read_to_string(plan_path)
        .await
        .map_err(|e| AppError::file(&path_str, e))?;

    let plan = parse_application_plan(&content).map_err(|e| AppError::invalid_plan(&path_str, e))?;

    for (i, target) in plan.applications.iter().enumerate() {
        if target.url.trim().is_empty() {
            return Err(AppError::invalid_plan(
                &path_str,
                format!("第 {} 个申请缺少 url", i + 1),
            ));
        }
    }

    tracing::info!(
        "成功加载申请计划: {} 个申请目标",
        plan.applications.len()
    );
    Ok(plan)
}

/// 解析申请计划文本
pub fn parse_application_plan(content: &str) -> Result<ApplicationPlan, toml::de::Error> {
    toml::from_str(content)
}
