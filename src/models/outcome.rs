use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::models::document::DocumentUploadResult;
use crate::models::page::PageInfo;
use crate::models::profile::JobContext;
use crate::models::question::{AnswerValue, QuestionAnalysis};
use crate::models::validation::ValidationError;

/// 已回答的筛选问题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    pub question_text: String,
    pub analysis: QuestionAnalysis,
    /// 实际填写的答案（可能来自 AI 兜底）
    pub answer: AnswerValue,
    pub escalated: bool,
    /// 是否成功填入页面
    pub filled: bool,
}

/// 单次申请的结构化结果，交给外部持久化层
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationOutcome {
    pub url: String,
    pub job: JobContext,
    pub success: bool,
    pub submitted: bool,
    pub pages_visited: usize,
    pub last_page: Option<PageInfo>,
    pub documents: Vec<DocumentUploadResult>,
    pub answers: Vec<AnsweredQuestion>,
    pub unresolved_errors: Vec<ValidationError>,
    /// "卡在第 X 步，原因 Y"
    pub failure_reason: Option<String>,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
}

impl ApplicationOutcome {
    pub fn start(url: impl Into<String>, job: JobContext) -> Self {
        Self {
            url: url.into(),
            job,
            success: false,
            submitted: false,
            pages_visited: 0,
            last_page: None,
            documents: Vec::new(),
            answers: Vec::new(),
            unresolved_errors: Vec::new(),
            failure_reason: None,
            started_at: Local::now(),
            finished_at: None,
        }
    }

    /// 标记申请成功提交
    pub fn finish_submitted(mut self) -> Self {
        self.success = true;
        self.submitted = true;
        self.finished_at = Some(Local::now());
        self
    }

    /// 标记申请停滞
    pub fn finish_stalled(mut self, reason: impl Into<String>) -> Self {
        self.success = false;
        self.failure_reason = Some(reason.into());
        self.finished_at = Some(Local::now());
        self
    }

    /// 使用的某类文档的最终结果
    pub fn document(
        &self,
        document_type: crate::models::DocumentType,
    ) -> Option<&DocumentUploadResult> {
        self.documents
            .iter()
            .rev()
            .find(|d| d.document_type == document_type)
    }
}
