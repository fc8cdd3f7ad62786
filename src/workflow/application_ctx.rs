//! 申请处理上下文
//!
//! 封装"我正在处理计划中的第几个申请"这一信息

use std::fmt::Display;

use crate::models::JobContext;

/// 申请处理上下文
#[derive(Debug, Clone)]
pub struct ApplicationCtx {
    /// 申请在计划中的索引（从1开始，仅用于日志显示）
    pub index: usize,

    /// 计划中的申请总数
    pub total: usize,

    /// 申请页面 URL
    pub url: String,

    pub job: JobContext,
}

impl ApplicationCtx {
    pub fn new(index: usize, total: usize, url: impl Into<String>, job: JobContext) -> Self {
        Self {
            index,
            total,
            url: url.into(),
            job,
        }
    }
}

impl Display for ApplicationCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[申请 {}/{}]", self.index, self.total)
    }
}
