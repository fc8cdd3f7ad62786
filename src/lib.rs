//! # Job Apply Submit
//!
//! 一个用于自动填写并提交多页职位申请表单的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `FormPage` - 页面原子能力抽象（查询、可见性、点击、填写、上传）
//! - `ChromePage` - 基于 chromiumoxide 的实现，唯一的 page owner
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理当前这一页
//! - `PageNavigator` - 页面状态识别与翻页
//! - `ValidationHandler` - 校验错误检测与修正
//! - `CustomDocumentHandler` - 简历 / 求职信上传与默认文档回退
//! - `QuestionAnalyzer` - 筛选问题分析（纯函数）
//! - `LlmService` - 低置信度问题的 AI 兜底
//! - `OutcomeWriter` - 写 outcomes.jsonl 能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次申请"的完整处理流程
//! - `ApplicationCtx` - 上下文封装（申请序号 + URL + 职位）
//! - `ApplicationFlow` - 逐页编排（纠错 → 上传 → 作答 → 翻页 / 提交）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量申请处理器，管理浏览器资源
//! - `orchestrator/application_processor` - 单个申请处理器，管理页面与结果
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromePage, FormPage, Probe};
pub use orchestrator::App;
pub use services::{
    AnswerEscalation, CustomDocumentHandler, LlmService, OutcomeWriter, PageNavigator,
    QuestionAnalyzer, ValidationHandler,
};
pub use workflow::{ApplicationCtx, ApplicationFlow};
