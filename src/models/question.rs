use serde::{Deserialize, Serialize};

/// 问题意图
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionIntent {
    Qualification,
    Availability,
    Location,
    Legal,
    Compensation,
    Skills,
    CultureFit,
    Commitment,
    Education,
    Schedule,
    General,
}

impl QuestionIntent {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionIntent::Qualification => "qualification",
            QuestionIntent::Availability => "availability",
            QuestionIntent::Location => "location",
            QuestionIntent::Legal => "legal",
            QuestionIntent::Compensation => "compensation",
            QuestionIntent::Skills => "skills",
            QuestionIntent::CultureFit => "culture_fit",
            QuestionIntent::Commitment => "commitment",
            QuestionIntent::Education => "education",
            QuestionIntent::Schedule => "schedule",
            QuestionIntent::General => "general",
        }
    }
}

impl std::fmt::Display for QuestionIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 答案类型
///
/// 无法从问题文本推断时，原样保留表单控件类型（`Widget`）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnswerType {
    Numeric,
    Boolean,
    Descriptive,
    Choice,
    Date,
    Currency,
    Text,
    Widget(String),
}

impl AnswerType {
    pub fn as_str(&self) -> &str {
        match self {
            AnswerType::Numeric => "numeric",
            AnswerType::Boolean => "boolean",
            AnswerType::Descriptive => "descriptive",
            AnswerType::Choice => "choice",
            AnswerType::Date => "date",
            AnswerType::Currency => "currency",
            AnswerType::Text => "text",
            AnswerType::Widget(raw) => raw,
        }
    }

    /// 直接使用控件类型
    pub fn from_widget(widget_type: &str) -> Self {
        match widget_type.trim().to_ascii_lowercase().as_str() {
            "" | "text" => AnswerType::Text,
            other => AnswerType::from(other.to_string()),
        }
    }
}

impl From<String> for AnswerType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "numeric" => AnswerType::Numeric,
            "boolean" => AnswerType::Boolean,
            "descriptive" => AnswerType::Descriptive,
            "choice" => AnswerType::Choice,
            "date" => AnswerType::Date,
            "currency" => AnswerType::Currency,
            "text" => AnswerType::Text,
            _ => AnswerType::Widget(value),
        }
    }
}

impl From<AnswerType> for String {
    fn from(value: AnswerType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for AnswerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 建议答案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AnswerValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnswerValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// 填入表单时使用的文本
    pub fn to_form_value(&self) -> String {
        match self {
            AnswerValue::Bool(true) => "Yes".to_string(),
            AnswerValue::Bool(false) => "No".to_string(),
            AnswerValue::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            AnswerValue::Number(n) => n.to_string(),
            AnswerValue::Text(s) => s.clone(),
        }
    }
}

impl std::fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_form_value())
    }
}

/// 可选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub label: String,
    pub value: String,
}

impl QuestionOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// 问题分析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAnalysis {
    pub intent: QuestionIntent,
    pub answer_type: AnswerType,
    pub suggested_answer: AnswerValue,
    /// 0.0 - 1.0
    pub confidence: f64,
    /// 仅用于审计，不做程序解析
    pub reasoning: String,
}

/// 从页面上提取的筛选问题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningQuestion {
    /// 问题文本
    pub text: String,
    /// 控件类型（text / textarea / select / radio / checkbox / number / date ...）
    pub widget_type: String,
    /// 控件的 name 属性（radio / checkbox 用于定位选项）
    #[serde(default)]
    pub field_name: Option<String>,
    /// 定位输入控件的 CSS 选择器
    pub selector: String,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
}
