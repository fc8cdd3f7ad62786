use serde::{Deserialize, Serialize};

/// 页面位置识别所用的方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageIndicator {
    /// 文本中的 "Step X of Y" 之类的计数
    StepCounter,
    /// 进度条的无障碍标签
    ProgressBar,
    /// 分页圆点 / 步骤指示器
    StepDots,
    /// 只能从按钮推断，没有页码
    ButtonInference,
}

/// 当前页面信息
///
/// 每次调用 `detect_current_page` 都会新建，不做持久化。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    /// 当前页码（从 1 开始）
    pub page_number: u32,
    /// 总页数（未知时为 None）
    pub total_pages: Option<u32>,
    pub has_next: bool,
    pub is_final: bool,
    /// 识别方法，按识别顺序排列
    pub indicators: Vec<PageIndicator>,
}

impl Default for PageInfo {
    fn default() -> Self {
        Self {
            page_number: 1,
            total_pages: None,
            has_next: false,
            is_final: false,
            indicators: Vec::new(),
        }
    }
}

impl std::fmt::Display for PageInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.total_pages {
            Some(total) => write!(f, "第 {}/{} 页", self.page_number, total)?,
            None => write!(f, "第 {} 页", self.page_number)?,
        }
        if self.is_final {
            write!(f, " (最后一页)")?;
        }
        Ok(())
    }
}

/// 导航按钮类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NavigationButtonKind {
    Next,
    Continue,
    Submit,
    /// 能识别，但永远不会被选作前进按钮
    Back,
    Unknown,
}

impl NavigationButtonKind {
    /// 是否可以用于前进
    pub fn is_forward(self) -> bool {
        match self {
            NavigationButtonKind::Next
            | NavigationButtonKind::Continue
            | NavigationButtonKind::Submit => true,
            NavigationButtonKind::Back | NavigationButtonKind::Unknown => false,
        }
    }
}
