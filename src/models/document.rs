use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// 文档类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Resume,
    CoverLetter,
}

impl DocumentType {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Resume => "resume",
            DocumentType::CoverLetter => "cover_letter",
        }
    }

    /// 日志显示名
    pub fn label(self) -> &'static str {
        match self {
            DocumentType::Resume => "简历",
            DocumentType::CoverLetter => "求职信",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 文档来源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Path,
    Bytes,
}

impl SourceType {
    /// 解析来源类型，无法识别时直接报错（属于调用方编程错误）
    pub fn parse(source_type: &str) -> AppResult<Self> {
        match source_type.trim().to_ascii_lowercase().as_str() {
            "path" | "file" => Ok(SourceType::Path),
            "bytes" | "content" => Ok(SourceType::Bytes),
            _ => Err(AppError::UnknownSourceType {
                source_type: source_type.to_string(),
            }),
        }
    }
}

/// 待上传的文档
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// 已存在的文件
    Path(PathBuf),
    /// 原始字节，上传前写入临时文件
    Bytes { data: Vec<u8>, file_name: String },
}

impl DocumentSource {
    /// 按来源类型字符串组装文档来源
    pub fn from_parts(
        source_type: &str,
        path: Option<PathBuf>,
        data: Option<Vec<u8>>,
        file_name: Option<String>,
    ) -> AppResult<Self> {
        match SourceType::parse(source_type)? {
            SourceType::Path => path.map(DocumentSource::Path).ok_or_else(|| {
                AppError::MissingDocumentData {
                    source_type: source_type.to_string(),
                    missing: "path",
                }
            }),
            SourceType::Bytes => {
                let data = data.ok_or_else(|| AppError::MissingDocumentData {
                    source_type: source_type.to_string(),
                    missing: "data",
                })?;
                Ok(DocumentSource::Bytes {
                    data,
                    file_name: file_name.unwrap_or_else(|| "document.pdf".to_string()),
                })
            }
        }
    }

    pub fn source_type(&self) -> SourceType {
        match self {
            DocumentSource::Path(_) => SourceType::Path,
            DocumentSource::Bytes { .. } => SourceType::Bytes,
        }
    }
}

impl From<PathBuf> for DocumentSource {
    fn from(path: PathBuf) -> Self {
        DocumentSource::Path(path)
    }
}

impl From<&Path> for DocumentSource {
    fn from(path: &Path) -> Self {
        DocumentSource::Path(path.to_path_buf())
    }
}

/// 文档上传结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUploadResult {
    pub success: bool,
    pub document_type: DocumentType,
    /// 实际上传的文件
    pub document_used: String,
    /// 只有默认文档被实际使用时为 false
    pub is_custom: bool,
    pub error_message: Option<String>,
    /// 自定义与默认文档的上传次数之和
    pub retry_count: u32,
}

impl std::fmt::Display for DocumentUploadResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} ({}, 尝试 {} 次)",
            self.document_type,
            if self.success { "上传成功" } else { "上传失败" },
            if self.is_custom { "自定义" } else { "默认" },
            self.retry_count
        )
    }
}
