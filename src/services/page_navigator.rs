//! 翻页服务 - 业务能力层
//!
//! 负责判断当前处于多页表单的第几页、是否还有下一页，以及找到并点击正确的导航按钮。
//! 导航失败只返回 `false`，是否重试由调用方决定。

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::config::NavigatorConfig;
use crate::infrastructure::{first_visible, FormPage, Probe, POLL_INTERVAL};
use crate::models::{NavigationButtonKind, PageIndicator, PageInfo};

/// 页码计数的合理上限，超出视为误匹配（例如日期 "12/2024"）
const MAX_PLAUSIBLE_PAGES: u32 = 50;

/// 导航按钮候选
///
/// `text` 为 Some 时还要求按钮文本（或 value 属性）包含该词（忽略大小写）。
#[derive(Debug, Clone, Copy)]
pub struct ButtonCandidate {
    pub selector: &'static str,
    pub text: Option<&'static str>,
}

const fn by_selector(selector: &'static str) -> ButtonCandidate {
    ButtonCandidate {
        selector,
        text: None,
    }
}

const fn by_text(selector: &'static str, text: &'static str) -> ButtonCandidate {
    ButtonCandidate {
        selector,
        text: Some(text),
    }
}

pub const NEXT_BUTTONS: &[ButtonCandidate] = &[
    by_selector("[data-automation-id='bottom-navigation-next-button']"),
    by_selector("button[aria-label*='next' i]"),
    by_selector("[data-testid*='next' i]"),
    by_text("button", "next"),
    by_text("a[role='button']", "next"),
    by_text("input[type='button']", "next"),
];

pub const CONTINUE_BUTTONS: &[ButtonCandidate] = &[
    by_selector("button[aria-label*='continue' i]"),
    by_selector("[data-testid*='continue' i]"),
    by_text("button", "continue"),
    by_text("a[role='button']", "continue"),
    by_text("input[type='submit']", "continue"),
];

pub const SUBMIT_BUTTONS: &[ButtonCandidate] = &[
    by_selector("[data-automation-id='submit-button']"),
    by_selector("button[aria-label*='submit' i]"),
    by_text("button", "submit"),
    by_text("input[type='submit']", "submit"),
    by_text("button[type='submit']", "apply"),
];

/// 前进按钮的优先级：Next → Continue → Submit
///
/// 同时存在 Continue 和 Submit 时（例如可跳过的最后一步）必须选 Continue。
const FORWARD_TIERS: &[(NavigationButtonKind, &[ButtonCandidate])] = &[
    (NavigationButtonKind::Next, NEXT_BUTTONS),
    (NavigationButtonKind::Continue, CONTINUE_BUTTONS),
    (NavigationButtonKind::Submit, SUBMIT_BUTTONS),
];

pub const PROGRESS_SELECTORS: &[&str] = &[
    "[role='progressbar']",
    "progress",
    "[class*='progress']",
];

/// 分页圆点 / 步骤指示器的子项
pub const STEP_DOT_SELECTORS: &[&str] = &[
    "[class*='step-indicator'] > *",
    "[class*='stepper'] [class*='step']",
    ".progress-dots > *",
    ".wizard-steps > li",
    "[role='tablist'] [role='tab']",
];

pub const LOADING_SELECTORS: &[&str] = &[
    ".loading",
    ".spinner",
    "[class*='spinner']",
    "[class*='loading-overlay']",
    "[aria-busy='true']",
];

static STEP_COUNTER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bstep\s+(\d+)\s+of\s+(\d+)",
        r"(?i)\bpage\s+(\d+)\s+of\s+(\d+)",
        r"(?i)\bquestion\s+(\d+)\s+of\s+(\d+)",
        r"\b(\d+)\s*/\s*(\d+)\b",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static PROGRESS_LABEL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\D*?\bof\b\D*?(\d+)").ok());

static REVIEW_PHRASES: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)review\s+(your|and\s+submit)|confirm\s+(your\s+)?(application|details|submission)|ready\s+to\s+submit|summary\s+of\s+your\s+application",
    )
    .ok()
});

const FINAL_URL_TOKENS: &[&str] = &["review", "submit", "confirm"];

/// 翻页等待的结果，只用于日志与测试
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionState {
    pub network_idle: bool,
    pub loader_cleared: bool,
}

/// 翻页服务
///
/// 职责：
/// - 识别当前页码与总页数
/// - 按优先级查找前进按钮并翻页
/// - 不持有 page，不决定重试策略
pub struct PageNavigator {
    config: NavigatorConfig,
}

impl PageNavigator {
    pub fn new(config: NavigatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// 识别当前页面位置
    ///
    /// 依次尝试：文本计数 → 进度条标签 → 步骤圆点，第一个成功的策略生效；
    /// 都失败时页码保持 1、总页数未知。`has_next` / `is_final` 总是单独计算。
    pub async fn detect_current_page<P: FormPage>(&self, page: &P) -> PageInfo {
        let mut info = PageInfo::default();

        if let Some((current, total)) = self.detect_from_text(page).await {
            info.page_number = current;
            info.total_pages = Some(total);
            info.indicators.push(PageIndicator::StepCounter);
        } else if let Some((current, total)) = self.detect_from_progress(page).await {
            info.page_number = current;
            info.total_pages = Some(total);
            info.indicators.push(PageIndicator::ProgressBar);
        } else if let Some((current, total)) = self.detect_from_dots(page).await {
            info.page_number = current;
            info.total_pages = Some(total);
            info.indicators.push(PageIndicator::StepDots);
        } else {
            info.indicators.push(PageIndicator::ButtonInference);
        }

        info.has_next = self.next_button_visible(page).await;
        info.is_final = self.is_final_page(page).await;

        debug!("页面识别结果: {} {:?}", info, info.indicators);
        info
    }

    /// 策略 1：页面文本中的 "Step X of Y" / "Page X of Y" / "Question X of Y" / "X/Y"
    async fn detect_from_text<P: FormPage>(&self, page: &P) -> Option<(u32, u32)> {
        let text = match page.body_text().await {
            Ok(text) => text,
            Err(e) => {
                debug!("读取页面文本失败: {}", e);
                return None;
            }
        };
        STEP_COUNTER_PATTERNS
            .iter()
            .flat_map(|re| re.captures_iter(&text))
            .find_map(|caps| plausible_position(caps.get(1)?.as_str(), caps.get(2)?.as_str()))
    }

    /// 策略 2：进度条的 aria-label / aria-valuetext 中的 "N of M"
    async fn detect_from_progress<P: FormPage>(&self, page: &P) -> Option<(u32, u32)> {
        let re = PROGRESS_LABEL.as_ref()?;
        for selector in PROGRESS_SELECTORS {
            let Ok(elements) = page.query_all(selector).await else {
                continue;
            };
            for element in &elements {
                for attr in ["aria-label", "aria-valuetext"] {
                    let Ok(Some(label)) = page.attribute(element, attr).await else {
                        continue;
                    };
                    if let Some(position) = re
                        .captures(&label)
                        .and_then(|c| plausible_position(c.get(1)?.as_str(), c.get(2)?.as_str()))
                    {
                        return Some(position);
                    }
                }
            }
        }
        None
    }

    /// 策略 3：步骤圆点，数量为总页数，带 active / current 的为当前页
    async fn detect_from_dots<P: FormPage>(&self, page: &P) -> Option<(u32, u32)> {
        for selector in STEP_DOT_SELECTORS {
            let Ok(dots) = page.query_all(selector).await else {
                continue;
            };
            if dots.len() < 2 || dots.len() > MAX_PLAUSIBLE_PAGES as usize {
                continue;
            }
            for (index, dot) in dots.iter().enumerate() {
                if is_active_step(page, dot).await {
                    return Some((index as u32 + 1, dots.len() as u32));
                }
            }
        }
        None
    }

    /// 立即检查是否存在可见的 Next / Continue 按钮（不等待）
    async fn next_button_visible<P: FormPage>(&self, page: &P) -> bool {
        for candidates in [NEXT_BUTTONS, CONTINUE_BUTTONS] {
            if probe_candidates(page, candidates).await.is_found() {
                return true;
            }
        }
        false
    }

    /// 按 Next → Continue → Submit 的优先级查找第一个可见的前进按钮
    ///
    /// 每一档最多等待 `find_timeout`；都找不到时返回 `(None, Unknown)`。
    pub async fn find_navigation_button<P: FormPage>(
        &self,
        page: &P,
    ) -> (Option<P::Element>, NavigationButtonKind) {
        for (kind, candidates) in FORWARD_TIERS {
            let deadline = Instant::now() + self.config.find_timeout();
            loop {
                if let Probe::Found(button) = probe_candidates(page, candidates).await {
                    debug!("找到导航按钮: {:?}", kind);
                    return (Some(button), *kind);
                }
                if Instant::now() >= deadline {
                    break;
                }
                sleep(POLL_INTERVAL).await;
            }
        }
        debug!("未找到任何导航按钮");
        (None, NavigationButtonKind::Unknown)
    }

    /// 是否为最后一页
    ///
    /// 任一信号成立即可：可见的提交按钮、确认类文案、URL 中的 review / submit / confirm。
    pub async fn is_final_page<P: FormPage>(&self, page: &P) -> bool {
        if probe_candidates(page, SUBMIT_BUTTONS).await.is_found() {
            debug!("最后一页信号: 可见的提交按钮");
            return true;
        }

        if let (Some(re), Ok(text)) = (REVIEW_PHRASES.as_ref(), page.body_text().await) {
            if re.is_match(&text) {
                debug!("最后一页信号: 确认类文案");
                return true;
            }
        }

        match page.current_url().await {
            Ok(url) => {
                let url = url.to_lowercase();
                if FINAL_URL_TOKENS.iter().any(|token| url.contains(token)) {
                    debug!("最后一页信号: URL {}", url);
                    return true;
                }
            }
            Err(e) => debug!("读取 URL 失败: {}", e),
        }

        false
    }

    /// 按可见文字（或 value 属性）归类一个按钮
    pub async fn classify_button<P: FormPage>(&self, page: &P, button: &P::Element) -> NavigationButtonKind {
        kind_from_label(&element_label(page, button).await)
    }

    /// 查找按钮并翻到下一页
    pub async fn navigate_to_next<P: FormPage>(&self, page: &P) -> bool {
        let (button, kind) = self.find_navigation_button(page).await;
        match button {
            Some(button) => {
                info!("➡️ 点击 {:?} 按钮", kind);
                self.click_and_advance(page, &button).await
            }
            None => {
                warn!("⚠️ 未找到可用的导航按钮，无法翻页");
                false
            }
        }
    }

    /// 点击已找到的按钮，等待页面切换，并通过 URL 变化验证
    ///
    /// URL 未变化时（单页应用）额外等待一次后仍视为成功，无法严格证明切换已完成。
    pub async fn click_and_advance<P: FormPage>(&self, page: &P, button: &P::Element) -> bool {
        let url_before = page.current_url().await.unwrap_or_default();

        if let Err(e) = page.click(button).await {
            warn!("⚠️ 点击导航按钮失败: {}", e);
            return false;
        }

        self.wait_for_page_transition(page, self.config.transition_timeout())
            .await;

        let url_after = page.current_url().await.unwrap_or_default();
        if url_after != url_before {
            info!("✓ 已翻页: {}", url_after);
        } else {
            debug!("URL 未变化，按单页应用处理");
            sleep(self.config.settle_delay()).await;
        }
        true
    }

    /// 等待页面切换完成
    ///
    /// 网络空闲 → 加载指示器消失（没有指示器不算错误）→ 固定等待。超时只记录日志。
    pub async fn wait_for_page_transition<P: FormPage>(
        &self,
        page: &P,
        transition_timeout: std::time::Duration,
    ) -> TransitionState {
        let started = Instant::now();

        let network_idle = match timeout(
            transition_timeout,
            page.wait_for_network_idle(transition_timeout),
        )
        .await
        {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!("⚠️ 等待网络空闲失败，继续执行: {}", e);
                false
            }
            Err(_) => {
                warn!("⚠️ 等待网络空闲超时 ({:?})，继续执行", transition_timeout);
                false
            }
        };

        let remaining = transition_timeout.saturating_sub(started.elapsed());
        let loader_cleared = self.wait_for_loaders_hidden(page, remaining).await;
        if !loader_cleared {
            warn!("⚠️ 加载指示器在超时后仍可见，继续执行");
        }

        sleep(self.config.settle_delay()).await;

        TransitionState {
            network_idle,
            loader_cleared,
        }
    }

    async fn wait_for_loaders_hidden<P: FormPage>(
        &self,
        page: &P,
        limit: std::time::Duration,
    ) -> bool {
        let deadline = Instant::now() + limit;
        loop {
            if !first_visible(page, LOADING_SELECTORS).await.is_found() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

impl Default for PageNavigator {
    fn default() -> Self {
        Self::new(NavigatorConfig::default())
    }
}

/// 按顺序检查一组候选，返回第一个可见且文本匹配的元素
async fn probe_candidates<P: FormPage>(
    page: &P,
    candidates: &[ButtonCandidate],
) -> Probe<P::Element> {
    for candidate in candidates {
        let elements = match page.query_all(candidate.selector).await {
            Ok(elements) => elements,
            Err(e) => {
                debug!("选择器查询失败 {}: {}", candidate.selector, e);
                continue;
            }
        };
        for element in elements {
            if !matches!(page.is_visible(&element).await, Ok(true)) {
                continue;
            }
            match candidate.text {
                None => return Probe::Found(element),
                Some(word) => {
                    if element_label_contains(page, &element, word).await {
                        return Probe::Found(element);
                    }
                }
            }
        }
    }
    Probe::NotFound
}

async fn element_label_contains<P: FormPage>(page: &P, element: &P::Element, word: &str) -> bool {
    element_label(page, element).await.to_lowercase().contains(word)
}

async fn element_label<P: FormPage>(page: &P, element: &P::Element) -> String {
    match page.inner_text(element).await {
        Ok(Some(text)) if !text.trim().is_empty() => text,
        _ => page
            .attribute(element, "value")
            .await
            .ok()
            .flatten()
            .unwrap_or_default(),
    }
}

async fn is_active_step<P: FormPage>(page: &P, element: &P::Element) -> bool {
    if let Ok(Some(current)) = page.attribute(element, "aria-current").await {
        if current == "step" || current == "true" || current == "page" {
            return true;
        }
    }
    if let Ok(Some(selected)) = page.attribute(element, "aria-selected").await {
        if selected == "true" {
            return true;
        }
    }
    match page.attribute(element, "class").await {
        Ok(Some(class)) => class
            .split_whitespace()
            .map(str::to_lowercase)
            .any(|c| c.contains("active") || c.contains("current")),
        _ => false,
    }
}

/// 按按钮文字归类，Back 只用于识别
pub fn kind_from_label(label: &str) -> NavigationButtonKind {
    let label = label.to_lowercase();
    if label.contains("back") || label.contains("previous") {
        NavigationButtonKind::Back
    } else if label.contains("next") {
        NavigationButtonKind::Next
    } else if label.contains("continue") {
        NavigationButtonKind::Continue
    } else if label.contains("submit") || label.contains("apply") {
        NavigationButtonKind::Submit
    } else {
        NavigationButtonKind::Unknown
    }
}

fn plausible_position(current: &str, total: &str) -> Option<(u32, u32)> {
    let current: u32 = current.parse().ok()?;
    let total: u32 = total.parse().ok()?;
    (current >= 1 && current <= total && total <= MAX_PLAUSIBLE_PAGES).then_some((current, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_implausible_counters() {
        assert_eq!(plausible_position("2", "5"), Some((2, 5)));
        assert_eq!(plausible_position("0", "5"), None);
        assert_eq!(plausible_position("6", "5"), None);
        assert_eq!(plausible_position("12", "2024"), None);
    }

    #[test]
    fn step_counter_patterns_match_common_wording() {
        let text = "Apply now: Question 3 of 7";
        let found = STEP_COUNTER_PATTERNS
            .iter()
            .flat_map(|re| re.captures_iter(text))
            .find_map(|c| plausible_position(c.get(1)?.as_str(), c.get(2)?.as_str()));
        assert_eq!(found, Some((3, 7)));
    }

    #[test]
    fn classifies_labels_with_back_never_forward() {
        assert_eq!(kind_from_label("Save & Continue"), NavigationButtonKind::Continue);
        assert_eq!(kind_from_label("Submit application"), NavigationButtonKind::Submit);
        assert_eq!(kind_from_label("Previous"), NavigationButtonKind::Back);
        assert!(!kind_from_label("Back").is_forward());
        assert_eq!(kind_from_label("Upload"), NavigationButtonKind::Unknown);
    }
}
