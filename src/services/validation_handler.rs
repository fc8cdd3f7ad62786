//! 校验纠错服务 - 业务能力层
//!
//! 检测填写后的字段级校验错误，给出可自动修正的值并重新填写。
//! 每次调用只做一次尝试，重试次数由调用方按 `max_retries` 控制。

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ValidationConfig;
use crate::infrastructure::{first_visible, FormPage, Probe};
use crate::models::validation::UNKNOWN_FIELD;
use crate::models::ValidationError;

/// 错误提示容器
pub const ERROR_CONTAINER_SELECTORS: &[&str] = &[
    ".error-message",
    ".field-error",
    ".invalid-feedback",
    ".help-block.error",
    "[role='alert']",
    LEAF_ERROR_CONTAINER,
];

/// 类名含 error 的叶子提示元素；包住表单控件或标签的 `.has-error` 一类外层容器不算
pub const LEAF_ERROR_CONTAINER: &str =
    "[class*='error']:not(input):not(select):not(textarea):not(:has(input, select, textarea, label))";

/// 带错误状态标记的输入控件
pub const INVALID_FIELD_SELECTORS: &[&str] = &[
    "input[aria-invalid='true']",
    "select[aria-invalid='true']",
    "textarea[aria-invalid='true']",
    "input.error",
    "input.is-invalid",
    "select.is-invalid",
    "textarea.is-invalid",
];

const FIELD_SELECTOR: &str = "input, select, textarea";
const SIBLING_ERROR_SELECTOR: &str =
    ".error-message, .field-error, .invalid-feedback, [class*='error']:not(:has(input, select, textarea, label))";
const DEFAULT_FIELD_MESSAGE: &str = "Invalid value";

/// 可自动修正的字段类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionKind {
    Phone,
    Email,
    Url,
    Date,
}

/// 字段名关键字 → 修正类别，按顺序匹配
const CORRECTION_KEYWORDS: &[(&str, CorrectionKind)] = &[
    ("phone", CorrectionKind::Phone),
    ("mobile", CorrectionKind::Phone),
    ("telephone", CorrectionKind::Phone),
    ("email", CorrectionKind::Email),
    ("e-mail", CorrectionKind::Email),
    ("url", CorrectionKind::Url),
    ("website", CorrectionKind::Url),
    ("linkedin", CorrectionKind::Url),
    ("portfolio", CorrectionKind::Url),
    ("github", CorrectionKind::Url),
    ("date", CorrectionKind::Date),
];

impl CorrectionKind {
    /// 根据字段名（忽略大小写的子串）判断修正类别
    pub fn for_field(field_name: &str) -> Option<Self> {
        let name = field_name.to_lowercase();
        CORRECTION_KEYWORDS
            .iter()
            .find(|(keyword, _)| name.contains(keyword))
            .map(|(_, kind)| *kind)
    }

    pub fn apply(self, value: &str) -> String {
        match self {
            CorrectionKind::Phone => format_phone_number(value),
            CorrectionKind::Email => normalize_email(value),
            CorrectionKind::Url => ensure_url_protocol(value),
            CorrectionKind::Date => format_date(value),
        }
    }
}

/// 电话号码格式化
///
/// 10 位数字 → `(AAA) BBB-CCCC`；以 1 开头的 11 位去掉首位后同样格式化；
/// 其他长度原样返回，因此重复调用结果不变。
pub fn format_phone_number(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    let digits = match digits.len() {
        10 => &digits[..],
        11 if digits.starts_with('1') => &digits[1..],
        _ => return phone.to_string(),
    };
    format!("({}) {}-{}", &digits[0..3], &digits[3..6], &digits[6..10])
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn ensure_url_protocol(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

// TODO: 识别 MM/DD/YYYY 与 YYYY-MM-DD 的提示文案后再做转换，目前原样返回
pub fn format_date(date: &str) -> String {
    date.to_string()
}

/// 校验纠错服务
///
/// 职责：
/// - 检测页面上的字段级校验错误
/// - 根据字段名给出修正值
/// - 重新填写单个字段（每次调用一次）
pub struct ValidationHandler {
    config: ValidationConfig,
}

impl ValidationHandler {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// 同一字段允许调用方重试的最大次数
    pub fn max_retries(&self) -> u32 {
        self.config.max_retries
    }

    /// 检测页面上的校验错误
    ///
    /// 两轮检测：错误提示容器、带错误标记的输入控件。结果按 `field_name` 去重，先出现的保留。
    pub async fn check_for_errors<P: FormPage>(&self, page: &P) -> Vec<ValidationError> {
        let mut errors = self.scan_error_containers(page).await;
        errors.extend(self.scan_invalid_fields(page).await);

        let mut seen = std::collections::HashSet::new();
        errors.retain(|e| seen.insert(e.field_name.clone()));

        if !errors.is_empty() {
            info!("检测到 {} 个校验错误", errors.len());
            for e in &errors {
                debug!("  {}", e);
            }
        }
        errors
    }

    async fn scan_error_containers<P: FormPage>(&self, page: &P) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for selector in ERROR_CONTAINER_SELECTORS {
            let elements = match page.query_all(selector).await {
                Ok(elements) => elements,
                Err(e) => {
                    debug!("错误容器查询失败 {}: {}", selector, e);
                    continue;
                }
            };
            for element in elements {
                if !matches!(page.is_visible(&element).await, Ok(true)) {
                    continue;
                }
                let message = match page.inner_text(&element).await {
                    Ok(Some(text)) if !text.trim().is_empty() => text.trim().to_string(),
                    _ => continue,
                };
                let field_name = self.resolve_container_field(page, &element).await;
                errors.push(ValidationError::new(field_name, message));
            }
        }
        errors
    }

    /// 错误容器关联的字段：data-field 属性，或同级输入控件的 name / id
    async fn resolve_container_field<P: FormPage>(&self, page: &P, element: &P::Element) -> String {
        if let Ok(Some(field)) = page.attribute(element, "data-field").await {
            if !field.trim().is_empty() {
                return field;
            }
        }
        for attr in ["name", "id"] {
            if let Ok(Some(value)) = page.sibling_attribute(element, FIELD_SELECTOR, attr).await {
                if !value.trim().is_empty() {
                    return value;
                }
            }
        }
        UNKNOWN_FIELD.to_string()
    }

    async fn scan_invalid_fields<P: FormPage>(&self, page: &P) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for selector in INVALID_FIELD_SELECTORS {
            let fields = match page.query_all(selector).await {
                Ok(fields) => fields,
                Err(e) => {
                    debug!("错误字段查询失败 {}: {}", selector, e);
                    continue;
                }
            };
            for field in fields {
                if !matches!(page.is_visible(&field).await, Ok(true)) {
                    continue;
                }
                let field_name = self.resolve_field_name(page, &field).await;
                let message = self.resolve_field_message(page, &field).await;
                errors.push(ValidationError::new(field_name, message));
            }
        }
        errors
    }

    async fn resolve_field_name<P: FormPage>(&self, page: &P, field: &P::Element) -> String {
        for attr in ["name", "id", "aria-label"] {
            if let Ok(Some(value)) = page.attribute(field, attr).await {
                if !value.trim().is_empty() {
                    return value;
                }
            }
        }
        UNKNOWN_FIELD.to_string()
    }

    /// 错误信息：aria-describedby 指向的元素，或同级的错误提示
    async fn resolve_field_message<P: FormPage>(&self, page: &P, field: &P::Element) -> String {
        if let Ok(Some(described_by)) = page.attribute(field, "aria-describedby").await {
            for id in described_by.split_whitespace() {
                let selector = format!("[id=\"{}\"]", escape_attr(id));
                let Ok(targets) = page.query_all(&selector).await else {
                    continue;
                };
                for target in targets {
                    if let Ok(Some(text)) = page.inner_text(&target).await {
                        if !text.trim().is_empty() {
                            return text.trim().to_string();
                        }
                    }
                }
            }
        }
        if let Ok(Some(text)) = page.sibling_text(field, SIBLING_ERROR_SELECTOR).await {
            if !text.trim().is_empty() {
                return text.trim().to_string();
            }
        }
        DEFAULT_FIELD_MESSAGE.to_string()
    }

    /// 给出修正值
    ///
    /// 只根据字段名分派；返回 None 表示没有可用的自动修正，调用方应视为不可重试。
    pub fn suggest_correction(
        &self,
        field_name: &str,
        original_value: &str,
        error_message: &str,
    ) -> Option<String> {
        let kind = CorrectionKind::for_field(field_name)?;
        let corrected = kind.apply(original_value);
        debug!(
            "字段 {} 修正 ({:?}): {:?} → {:?} (错误: {})",
            field_name, kind, original_value, corrected, error_message
        );
        Some(corrected)
    }

    /// 读取字段当前的值
    pub async fn current_value<P: FormPage>(
        &self,
        page: &P,
        field_name: &str,
        field_selector: Option<&str>,
    ) -> Option<String> {
        let field = self.locate_field(page, field_name, field_selector).await.found()?;
        page.input_value(&field).await.ok().flatten()
    }

    /// 用修正值重新填写字段（一次尝试）
    ///
    /// 找不到字段或交互失败都返回 false。
    pub async fn retry_field<P: FormPage>(
        &self,
        page: &P,
        field_name: &str,
        corrected_value: &str,
        field_selector: Option<&str>,
    ) -> bool {
        let Probe::Found(field) = self.locate_field(page, field_name, field_selector).await else {
            warn!("⚠️ 未找到字段 {}，无法重新填写", field_name);
            return false;
        };

        let result = async {
            page.click(&field).await?;
            page.clear(&field).await?;
            page.fill(&field, corrected_value).await?;
            Ok::<(), anyhow::Error>(())
        }
        .await;

        if let Err(e) = result {
            warn!("⚠️ 重新填写字段 {} 失败: {}", field_name, e);
            return false;
        }

        sleep(std::time::Duration::from_millis(self.config.settle_delay_ms)).await;
        info!("✓ 已重新填写字段 {}", field_name);
        true
    }

    async fn locate_field<P: FormPage>(
        &self,
        page: &P,
        field_name: &str,
        field_selector: Option<&str>,
    ) -> Probe<P::Element> {
        match field_selector {
            Some(selector) => first_visible(page, &[selector]).await,
            None => first_visible(page, field_candidates(field_name).as_slice()).await,
        }
    }
}

impl Default for ValidationHandler {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

/// 基于 name / id 的字段候选选择器
pub fn field_candidates(field_name: &str) -> Vec<String> {
    let name = escape_attr(field_name);
    vec![
        format!("input[name=\"{}\"]", name),
        format!("select[name=\"{}\"]", name),
        format!("textarea[name=\"{}\"]", name),
        format!("[id=\"{}\"]", name),
        format!("[name*=\"{}\"]", name),
    ]
}

fn escape_attr(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_based_error_selectors_skip_wrappers() {
        const WRAPPER_GUARD: &str = ":not(:has(input, select, textarea, label))";
        let class_based: Vec<&&str> = ERROR_CONTAINER_SELECTORS
            .iter()
            .filter(|s| s.starts_with("[class*="))
            .collect();
        assert_eq!(class_based, vec![&LEAF_ERROR_CONTAINER]);
        assert!(LEAF_ERROR_CONTAINER.ends_with(WRAPPER_GUARD));
        assert!(SIBLING_ERROR_SELECTOR.ends_with(&format!("[class*='error']{}", WRAPPER_GUARD)));
    }

    #[test]
    fn phone_formats_ten_and_eleven_digits() {
        assert_eq!(format_phone_number("5551234567"), "(555) 123-4567");
        assert_eq!(format_phone_number("+1 555.123.4567"), "(555) 123-4567");
        assert_eq!(format_phone_number("15551234567"), "(555) 123-4567");
    }

    #[test]
    fn phone_leaves_other_lengths_untouched() {
        assert_eq!(format_phone_number("12345"), "12345");
        assert_eq!(format_phone_number("25551234567"), "25551234567");
        let formatted = format_phone_number("5551234567");
        assert_eq!(format_phone_number(&formatted), formatted);
    }

    #[test]
    fn url_gets_https_only_when_missing() {
        assert_eq!(ensure_url_protocol("example.com"), "https://example.com");
        assert_eq!(ensure_url_protocol("http://example.com"), "http://example.com");
    }

    #[test]
    fn correction_kind_follows_field_name() {
        assert_eq!(CorrectionKind::for_field("MobilePhone"), Some(CorrectionKind::Phone));
        assert_eq!(CorrectionKind::for_field("linkedin_profile"), Some(CorrectionKind::Url));
        assert_eq!(CorrectionKind::for_field("start_date"), Some(CorrectionKind::Date));
        assert_eq!(CorrectionKind::for_field("first_name"), None);
    }

    #[test]
    fn field_candidates_escape_quotes() {
        let candidates = field_candidates("a\"b");
        assert_eq!(candidates[0], "input[name=\"a\\\"b\"]");
    }
}
