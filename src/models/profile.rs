//! 申请人资料与职位上下文
//!
//! 两者都由外部协作方提供，字段稀疏且全部可选。缺失时各组件使用各自的保守默认值。

use serde::{Deserialize, Serialize};

/// 申请人资料
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicantProfile {
    /// 工作年限，缺失时问题分析使用保守默认值
    pub experience_years: Option<f64>,
    /// 到岗时间描述，例如 "Two weeks notice"
    pub availability: Option<String>,
    /// 是否接受搬迁，缺失时视为接受
    pub willing_to_relocate: Option<bool>,
    /// 是否拥有合法工作许可，缺失时视为拥有
    pub work_authorization: Option<bool>,
    /// 是否需要签证担保，缺失时视为不需要
    pub need_sponsorship: Option<bool>,
    /// 期望薪资（原样填写）
    pub salary_expectation: Option<String>,
    /// 技能列表
    pub skills: Vec<String>,
    /// 最高学历
    pub education_level: Option<String>,
}

impl ApplicantProfile {
    /// 问题文本中提到的技能（大小写不敏感）
    pub fn skills_mentioned_in(&self, text_lower: &str) -> Vec<&str> {
        self.skills
            .iter()
            .map(String::as_str)
            .filter(|skill| !skill.is_empty() && text_lower.contains(&skill.to_lowercase()))
            .collect()
    }
}

/// 职位上下文
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobContext {
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
}

impl JobContext {
    /// 职位名称，缺失时为 "this role"
    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or("this role")
    }

    /// 公司名称，缺失时为 "your team"
    pub fn company_or_default(&self) -> &str {
        self.company.as_deref().unwrap_or("your team")
    }
}

impl std::fmt::Display for JobContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} @ {}",
            self.title.as_deref().unwrap_or("未知职位"),
            self.company.as_deref().unwrap_or("未知公司")
        )
    }
}
