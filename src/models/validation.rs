use serde::{Deserialize, Serialize};

/// 无法定位字段时使用的字段名
pub const UNKNOWN_FIELD: &str = "unknown";

/// 字段级校验错误
///
/// 每次检测都会重新生成；同一次 `check_for_errors` 内按 `field_name` 去重。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field_name: String,
    pub error_message: String,
    /// 由调用方递增
    pub retry_count: u32,
    pub correction_attempted: bool,
}

impl ValidationError {
    pub fn new(field_name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            error_message: error_message.into(),
            retry_count: 0,
            correction_attempted: false,
        }
    }

    pub fn is_unknown_field(&self) -> bool {
        self.field_name == UNKNOWN_FIELD
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.field_name, self.error_message)
    }
}
