//! 错误类型
//!
//! 组件对外的公开操作不会因为页面环境问题返回错误（返回 `bool` / `Option` / 结果记录），
//! 这里只收录调用方编程错误、配置错误以及编排层的致命错误。

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 未知的文档来源类型
    #[error("未知的文档来源类型: {source_type} (可选: path, bytes)")]
    UnknownSourceType { source_type: String },

    /// 来源类型对应的数据缺失
    #[error("文档来源 {source_type} 缺少数据: {missing}")]
    MissingDocumentData {
        source_type: String,
        missing: &'static str,
    },

    /// 申请计划文件无效
    #[error("申请计划文件无效 ({path}): {reason}")]
    InvalidPlan { path: String, reason: String },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),

    /// 文件读写错误
    #[error("文件错误 ({path}): {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 启动浏览器失败
    #[error("启动浏览器失败: {0}")]
    LaunchFailed(String),
    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    NavigationFailed {
        url: String,
        #[source]
        source: chromiumoxide::error::CdpError,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: &'static str,
    },
}

impl AppError {
    /// 创建文件错误
    pub fn file(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File {
            path: path.into(),
            source,
        }
    }

    /// 创建计划文件错误
    pub fn invalid_plan(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        AppError::InvalidPlan {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
