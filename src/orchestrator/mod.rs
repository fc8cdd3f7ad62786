//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责申请计划的调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量申请处理器
//! - 管理应用生命周期（初始化、运行）
//! - 加载申请计划（ApplicationPlan）
//! - 管理浏览器资源（Browser）
//! - 输出全局统计信息
//!
//! ### `application_processor` - 单个申请处理器
//! - 为申请打开独立页面（ChromePage）
//! - 委托 ApplicationFlow 处理表单
//! - 写入申请结果
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<ApplicationTarget>)
//!     ↓
//! application_processor (处理单个 ApplicationTarget)
//!     ↓
//! workflow::ApplicationFlow (逐页处理表单)
//!     ↓
//! services (能力层：navigator / validation / documents / analyzer / llm)
//!     ↓
//! infrastructure (基础设施：FormPage / ChromePage)
//! ```

pub mod application_processor;
pub mod batch_processor;

pub use application_processor::process_application;
pub use batch_processor::App;
