//! 页面能力抽象 - 基础设施层
//!
//! 组件只依赖 [`FormPage`] 暴露的原子能力，不直接接触浏览器。
//! 同一个页面在一次申请过程中只被一个流程顺序驱动。

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::models::ScreeningQuestion;

/// 轮询间隔
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 一次元素探测的结果
///
/// "没找到" 是正常结果，不是错误。
#[derive(Debug)]
pub enum Probe<T> {
    Found(T),
    NotFound,
}

impl<T> Probe<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Probe::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Probe::Found(value) => Some(value),
            Probe::NotFound => None,
        }
    }
}

impl<T> From<Option<T>> for Probe<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Probe::Found(v),
            None => Probe::NotFound,
        }
    }
}

/// 表单页面的原子能力
///
/// 所有方法都可能因为页面本身的原因失败（元素脱离文档、瞬时不可见等），
/// 调用方负责把失败转换成结构化的负面结果。
#[async_trait]
pub trait FormPage: Send + Sync {
    /// 元素句柄
    type Element: Send + Sync;

    /// 渲染后的页面文本
    async fn body_text(&self) -> Result<String>;

    /// 当前 URL
    async fn current_url(&self) -> Result<String>;

    /// CSS 选择器查询
    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Element>>;

    /// 元素是否对用户可见
    async fn is_visible(&self, element: &Self::Element) -> Result<bool>;

    async fn attribute(&self, element: &Self::Element, name: &str) -> Result<Option<String>>;

    async fn inner_text(&self, element: &Self::Element) -> Result<Option<String>>;

    /// 输入控件当前的值
    async fn input_value(&self, element: &Self::Element) -> Result<Option<String>>;

    /// 同一父元素下第一个匹配 `sibling_selector` 的兄弟元素的属性
    async fn sibling_attribute(
        &self,
        element: &Self::Element,
        sibling_selector: &str,
        name: &str,
    ) -> Result<Option<String>>;

    /// 同一父元素下第一个匹配 `sibling_selector` 的兄弟元素的文本
    async fn sibling_text(
        &self,
        element: &Self::Element,
        sibling_selector: &str,
    ) -> Result<Option<String>>;

    async fn click(&self, element: &Self::Element) -> Result<()>;

    /// 清空输入控件
    async fn clear(&self, element: &Self::Element) -> Result<()>;

    /// 向输入控件键入文本
    async fn fill(&self, element: &Self::Element, value: &str) -> Result<()>;

    /// 选择下拉框选项
    async fn select_option(&self, element: &Self::Element, value: &str) -> Result<()>;

    /// 等待网络空闲，超时返回错误
    async fn wait_for_network_idle(&self, timeout: Duration) -> Result<()>;

    /// 点击可见的上传触发控件，并在原生文件选择框出现后选择文件
    async fn choose_file_via(
        &self,
        trigger: &Self::Element,
        file_path: &Path,
        timeout: Duration,
    ) -> Result<()>;

    /// 直接给一个已经可见的文件输入框设置文件，不修改其样式
    async fn set_files_on_visible_input(&self, input: &Self::Element, file_path: &Path)
        -> Result<()>;

    /// 提取页面上尚未填写的筛选问题
    async fn screening_questions(&self) -> Result<Vec<ScreeningQuestion>>;
}

/// 按顺序探测选择器，返回第一个可见元素
///
/// 单个选择器出错只记录日志，按未命中处理。
pub async fn first_visible<P, S>(page: &P, selectors: &[S]) -> Probe<P::Element>
where
    P: FormPage + ?Sized,
    S: AsRef<str> + Sync,
{
    for selector in selectors {
        let selector = selector.as_ref();
        let elements = match page.query_all(selector).await {
            Ok(elements) => elements,
            Err(e) => {
                debug!("选择器查询失败 {}: {}", selector, e);
                continue;
            }
        };
        for element in elements {
            match page.is_visible(&element).await {
                Ok(true) => return Probe::Found(element),
                Ok(false) => {}
                Err(e) => debug!("可见性检测失败 {}: {}", selector, e),
            }
        }
    }
    Probe::NotFound
}

/// 在超时时间内轮询，直到任一选择器出现可见元素
pub async fn wait_for_visible<P, S>(page: &P, selectors: &[S], timeout: Duration) -> Probe<P::Element>
where
    P: FormPage + ?Sized,
    S: AsRef<str> + Sync,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Probe::Found(element) = first_visible(page, selectors).await {
            return Probe::Found(element);
        }
        if Instant::now() >= deadline {
            return Probe::NotFound;
        }
        sleep(POLL_INTERVAL).await;
    }
}
