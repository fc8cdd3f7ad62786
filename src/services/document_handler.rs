//! 文档上传服务 - 业务能力层
//!
//! 上传简历 / 求职信：优先自定义文档，累计失败达到阈值后改用默认文档上传一次。
//!
//! ## 反自动化约束
//! 绝不把隐藏的文件输入框改成可见。只允许：
//! 1. 点击可见的上传触发控件，再通过原生文件选择框选择文件；
//! 2. 兜底：直接使用本来就可见的文件输入框。

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::UploadConfig;
use crate::infrastructure::{first_visible, FormPage, Probe};
use crate::models::{DocumentSource, DocumentType, DocumentUploadResult};

/// 通用上传候选，排除指向求职信的控件
pub const GENERIC_UPLOAD_BUTTON: &str =
    "button[aria-label*='upload' i]:not([aria-label*='cover' i])";
pub const GENERIC_SELECT_FILES: &str =
    "[data-automation-id='select-files']:not([aria-label*='cover' i]):not([id*='cover' i])";
pub const GENERIC_FILE_INPUT: &str =
    "input[type='file']:not([name*='cover' i]):not([id*='cover' i]):not([aria-label*='cover' i])";

const RESUME_TRIGGERS: &[&str] = &[
    "button[aria-label*='resume' i]",
    "button[aria-label*='cv' i]",
    "[data-testid*='resume' i] button",
    "[data-automation-id*='resume' i] button",
    "label[for*='resume' i]",
    GENERIC_UPLOAD_BUTTON,
    GENERIC_SELECT_FILES,
];

const COVER_LETTER_TRIGGERS: &[&str] = &[
    "button[aria-label*='cover' i]",
    "[data-testid*='cover' i] button",
    "[data-automation-id*='cover' i] button",
    "label[for*='cover' i]",
];

const RESUME_INPUTS: &[&str] = &[
    "input[type='file'][name*='resume' i]",
    "input[type='file'][id*='resume' i]",
    "input[type='file'][name*='cv' i]",
    GENERIC_FILE_INPUT,
];

const COVER_LETTER_INPUTS: &[&str] = &[
    "input[type='file'][name*='cover' i]",
    "input[type='file'][id*='cover' i]",
];

/// 上传成功的标识
pub const UPLOADED_NAME_SELECTORS: &[&str] = &[
    ".file-name",
    "[class*='file-name']",
    "[class*='filename']",
    "[class*='uploaded']",
];

pub const UPLOAD_SUCCESS_SELECTORS: &[&str] = &[
    "[class*='upload-success']",
    "[class*='success']",
    "[data-automation-id='file-upload-successful']",
];

impl DocumentType {
    /// 可见的上传触发控件候选
    pub fn trigger_selectors(self) -> &'static [&'static str] {
        match self {
            DocumentType::Resume => RESUME_TRIGGERS,
            DocumentType::CoverLetter => COVER_LETTER_TRIGGERS,
        }
    }

    /// 文件输入框候选
    pub fn input_selectors(self) -> &'static [&'static str] {
        match self {
            DocumentType::Resume => RESUME_INPUTS,
            DocumentType::CoverLetter => COVER_LETTER_INPUTS,
        }
    }
}

/// 上传前准备好的文件
///
/// 字节来源会写入临时文件，持有者被丢弃时文件随之删除（任何返回路径都成立）。
struct StagedDocument {
    path: PathBuf,
    /// 结果中记录的文档标识：路径，或字节来源的原始文件名
    label: String,
    _temp: Option<NamedTempFile>,
}

impl StagedDocument {
    fn stage(source: &DocumentSource, document_type: DocumentType) -> std::io::Result<Self> {
        match source {
            DocumentSource::Path(path) => Ok(Self {
                path: path.clone(),
                label: path.display().to_string(),
                _temp: None,
            }),
            DocumentSource::Bytes { data, file_name } => {
                let suffix = Path::new(file_name)
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| format!(".{}", ext))
                    .unwrap_or_default();
                let mut temp = tempfile::Builder::new()
                    .prefix(&format!("{}_", document_type.as_str()))
                    .suffix(&suffix)
                    .tempfile()?;
                temp.write_all(data)?;
                temp.flush()?;
                debug!("已写入临时文件: {}", temp.path().display());
                Ok(Self {
                    path: temp.path().to_path_buf(),
                    label: file_name.clone(),
                    _temp: Some(temp),
                })
            }
        }
    }
}

/// 文档上传服务
///
/// 职责：
/// - 按"自定义优先、失败回退默认"的策略上传文档
/// - 只走用户可触发的上传路径
/// - 任何失败都记录在 DocumentUploadResult 中，不向外抛出
pub struct CustomDocumentHandler {
    config: UploadConfig,
}

impl CustomDocumentHandler {
    pub fn new(config: UploadConfig) -> Self {
        if !config.fallback_reachable() {
            warn!(
                "⚠️ fallback_after_failures ({}) 大于 max_retries ({})，默认文档回退永远不会触发",
                config.fallback_after_failures, config.max_retries
            );
        }
        Self { config }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// 上传简历
    pub async fn upload_custom_resume<P: FormPage>(
        &self,
        page: &P,
        source: &DocumentSource,
        default_path: Option<&Path>,
    ) -> DocumentUploadResult {
        self.upload_document(page, DocumentType::Resume, source, default_path)
            .await
    }

    /// 上传求职信
    pub async fn upload_custom_cover_letter<P: FormPage>(
        &self,
        page: &P,
        source: &DocumentSource,
        default_path: Option<&Path>,
    ) -> DocumentUploadResult {
        self.upload_document(page, DocumentType::CoverLetter, source, default_path)
            .await
    }

    /// 上传策略
    ///
    /// 1. 自定义文档最多尝试 `max_retries` 次；
    /// 2. 某次失败后累计次数达到 `fallback_after_failures`（或只剩最后一次机会）且提供了默认文档：
    ///    停止自定义尝试，上传一次默认文档，结果 `is_custom = false`（无论成功与否）；
    ///    `retry_count` 始终不超过 `max_retries`；
    /// 3. 用尽次数仍未触发回退：`success = false, is_custom = true`。
    pub async fn upload_document<P: FormPage>(
        &self,
        page: &P,
        document_type: DocumentType,
        source: &DocumentSource,
        default_path: Option<&Path>,
    ) -> DocumentUploadResult {
        let staged = match StagedDocument::stage(source, document_type) {
            Ok(staged) => staged,
            Err(e) => {
                error!("❌ 无法准备{}临时文件: {}", document_type.label(), e);
                return match default_path {
                    Some(default) => {
                        self.upload_fallback(page, document_type, default, 0).await
                    }
                    None => DocumentUploadResult {
                        success: false,
                        document_type,
                        document_used: String::new(),
                        is_custom: true,
                        error_message: Some(format!("无法准备临时文件: {}", e)),
                        retry_count: 0,
                    },
                };
            }
        };
        let custom_path = staged.path.as_path();

        let mut last_error = None;
        for attempt in 1..=self.config.max_retries {
            info!(
                "📎 上传自定义{} (第 {}/{} 次): {}",
                document_type.label(),
                attempt,
                self.config.max_retries,
                custom_path.display()
            );

            if self.upload_file(page, document_type, custom_path).await {
                info!("✓ 自定义{}上传成功", document_type.label());
                return DocumentUploadResult {
                    success: true,
                    document_type,
                    document_used: staged.label.clone(),
                    is_custom: true,
                    error_message: None,
                    retry_count: attempt,
                };
            }

            warn!("⚠️ 自定义{}第 {} 次上传失败", document_type.label(), attempt);
            last_error = Some(format!("自定义{}上传失败 {} 次", document_type.label(), attempt));

            if self.should_fall_back(attempt) {
                if let Some(default) = default_path {
                    return self
                        .upload_fallback(page, document_type, default, attempt)
                        .await;
                }
            }
        }

        error!(
            "❌ 自定义{}上传 {} 次均失败，且没有可用的默认文档",
            document_type.label(),
            self.config.max_retries
        );
        DocumentUploadResult {
            success: false,
            document_type,
            document_used: staged.label.clone(),
            is_custom: true,
            error_message: last_error,
            retry_count: self.config.max_retries,
        }
    }

    /// 本次失败后是否改用默认文档
    ///
    /// 默认文档的那一次尝试也计入 `max_retries`：达到失败阈值，或只剩最后一次机会时回退。
    /// 回退阈值不可达时从不回退；`max_retries == 1` 时没有余量，也不回退。
    fn should_fall_back(&self, failed_attempts: u32) -> bool {
        if !self.config.fallback_reachable() || failed_attempts >= self.config.max_retries {
            return false;
        }
        failed_attempts >= self.config.fallback_after_failures
            || failed_attempts + 1 == self.config.max_retries
    }

    /// 默认文档只尝试一次
    async fn upload_fallback<P: FormPage>(
        &self,
        page: &P,
        document_type: DocumentType,
        default_path: &Path,
        custom_attempts: u32,
    ) -> DocumentUploadResult {
        info!(
            "🔁 改用默认{}: {}",
            document_type.label(),
            default_path.display()
        );
        let success = self.upload_file(page, document_type, default_path).await;
        if success {
            info!("✓ 默认{}上传成功", document_type.label());
        } else {
            error!("❌ 默认{}上传失败", document_type.label());
        }
        DocumentUploadResult {
            success,
            document_type,
            document_used: default_path.display().to_string(),
            is_custom: false,
            error_message: (!success).then(|| format!("默认{}上传失败", document_type.label())),
            retry_count: custom_attempts + 1,
        }
    }

    /// 当前页面是否提供了该类文档的上传控件
    pub async fn has_upload_control<P: FormPage>(&self, page: &P, document_type: DocumentType) -> bool {
        first_visible(page, document_type.trigger_selectors()).await.is_found()
            || first_visible(page, document_type.input_selectors()).await.is_found()
    }

    /// 上传单个文件
    ///
    /// 先走"可见触发控件 + 原生文件选择框"，失败再尝试本来就可见的文件输入框。
    /// 之后检查上传确认标识；没有标识时也视为成功。
    pub async fn upload_file<P: FormPage>(
        &self,
        page: &P,
        document_type: DocumentType,
        file_path: &Path,
    ) -> bool {
        let mut uploaded = false;

        if let Probe::Found(trigger) = first_visible(page, document_type.trigger_selectors()).await {
            match page
                .choose_file_via(&trigger, file_path, self.config.chooser_timeout())
                .await
            {
                Ok(()) => uploaded = true,
                Err(e) => debug!("通过文件选择框上传失败: {}", e),
            }
        } else {
            debug!("未找到可见的{}上传控件", document_type.label());
        }

        if !uploaded {
            if let Probe::Found(input) = first_visible(page, document_type.input_selectors()).await {
                match page.set_files_on_visible_input(&input, file_path).await {
                    Ok(()) => uploaded = true,
                    Err(e) => debug!("通过可见文件输入框上传失败: {}", e),
                }
            }
        }

        if !uploaded {
            return false;
        }

        sleep(self.config.confirm_delay()).await;
        if !self.upload_confirmed(page, file_path).await {
            debug!("未发现上传确认标识，按成功处理: {}", file_path.display());
        }
        true
    }

    /// 上传确认：文件名标识、成功文案、或 title 中包含文件名
    async fn upload_confirmed<P: FormPage>(&self, page: &P, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if !file_name.is_empty() {
            for selector in UPLOADED_NAME_SELECTORS {
                let Ok(elements) = page.query_all(selector).await else {
                    continue;
                };
                for element in &elements {
                    if let Ok(Some(text)) = page.inner_text(element).await {
                        if text.contains(&file_name) {
                            debug!("上传确认: 文件名标识");
                            return true;
                        }
                    }
                }
            }
        }

        if first_visible(page, UPLOAD_SUCCESS_SELECTORS).await.is_found() {
            debug!("上传确认: 成功标识");
            return true;
        }

        if !file_name.is_empty() {
            let selector = format!("[title*=\"{}\"]", file_name.replace('"', "\\\""));
            if matches!(page.query_all(&selector).await, Ok(found) if !found.is_empty()) {
                debug!("上传确认: title 属性");
                return true;
            }
        }

        false
    }
}

impl Default for CustomDocumentHandler {
    fn default() -> Self {
        Self::new(UploadConfig::default())
    }
}
