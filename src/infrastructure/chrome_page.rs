//! Chrome 页面 - 基础设施层
//!
//! 持有唯一的 page 资源，通过 CDP 实现 [`FormPage`]。
//! 所有交互都走用户可触发的路径：点击、键入、原生文件选择框。不会强制显示隐藏元素。

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::page::{
    EventFileChooserOpened, SetInterceptFileChooserDialogParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tokio::time::{sleep, timeout, Instant};
use tracing::debug;

use crate::infrastructure::form_page::{FormPage, POLL_INTERVAL};
use crate::models::ScreeningQuestion;

/// 资源数量保持不变多久视为网络空闲
const NETWORK_QUIET_WINDOW: Duration = Duration::from_millis(500);

const IS_VISIBLE_FN: &str = r#"function() {
    const style = window.getComputedStyle(this);
    if (style.display === 'none' || style.visibility === 'hidden' || style.opacity === '0') {
        return false;
    }
    const rect = this.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
}"#;

const INPUT_VALUE_FN: &str = r#"function() {
    return this.value === undefined || this.value === null ? null : String(this.value);
}"#;

const SELECT_TEXT_FN: &str = r#"function() {
    this.focus();
    if (typeof this.select === 'function') { this.select(); }
    return true;
}"#;

const NETWORK_SNAPSHOT_JS: &str = r#"({
    ready_state: document.readyState,
    resources: performance.getEntriesByType('resource').length
})"#;

/// 提取未填写的筛选问题
///
/// radio / checkbox 按 name 分组；问题文本依次取 label[for]、外层 label、aria-label、fieldset legend。
const SCREENING_QUESTIONS_JS: &str = r#"(() => {
    const visible = (el) => {
        const s = window.getComputedStyle(el);
        const r = el.getBoundingClientRect();
        return s.display !== 'none' && s.visibility !== 'hidden' && r.width > 0 && r.height > 0;
    };
    const clean = (t) => (t || '').replace(/\s+/g, ' ').trim();
    const labelFor = (el) => {
        if (el.id) {
            const l = document.querySelector('label[for="' + CSS.escape(el.id) + '"]');
            if (l) return clean(l.innerText);
        }
        const wrap = el.closest('label');
        if (wrap) return clean(wrap.innerText);
        if (el.getAttribute('aria-label')) return clean(el.getAttribute('aria-label'));
        const fs = el.closest('fieldset');
        if (fs) {
            const lg = fs.querySelector('legend');
            if (lg) return clean(lg.innerText);
        }
        return '';
    };
    const out = [];
    const seenGroups = new Set();
    const fields = document.querySelectorAll('form input, form select, form textarea');
    for (const el of fields) {
        const type = (el.tagName === 'INPUT' ? (el.type || 'text') : el.tagName).toLowerCase();
        if (['hidden', 'file', 'submit', 'button', 'reset', 'image', 'password', 'search'].includes(type)) continue;
        if (!visible(el) || el.disabled || el.readOnly) continue;
        if (type === 'radio' || type === 'checkbox') {
            const name = el.name;
            if (!name || seenGroups.has(name)) continue;
            seenGroups.add(name);
            const group = Array.from(document.querySelectorAll('input[name="' + CSS.escape(name) + '"]'));
            if (group.some((g) => g.checked)) continue;
            const fs = el.closest('fieldset');
            const legend = fs && fs.querySelector('legend');
            const groupText = legend ? clean(legend.innerText) : clean(el.getAttribute('aria-label'));
            const options = group.map((g) => ({ label: labelFor(g), value: g.value }));
            out.push({
                text: groupText || labelFor(el),
                widget_type: type,
                field_name: name,
                selector: 'input[name="' + CSS.escape(name) + '"]',
                options: type === 'radio' || group.length > 1 ? options : []
            });
            continue;
        }
        if (el.value && String(el.value).trim() !== '') continue;
        const text = labelFor(el);
        if (!text) continue;
        const selector = el.id
            ? '#' + CSS.escape(el.id)
            : (el.name ? el.tagName.toLowerCase() + '[name="' + CSS.escape(el.name) + '"]' : null);
        if (!selector) continue;
        const options = type === 'select'
            ? Array.from(el.options).filter((o) => o.value !== '').map((o) => ({ label: clean(o.text), value: o.value }))
            : [];
        out.push({ text, widget_type: type, field_name: el.name || null, selector, options });
    }
    return out;
})()"#;

#[derive(Debug, Deserialize)]
struct NetworkSnapshot {
    ready_state: String,
    resources: u64,
}

/// Chrome 页面
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 实现 FormPage 的全部原子能力
/// - 不认识申请流程
pub struct ChromePage {
    page: Page,
}

impl ChromePage {
    /// 创建新的 Chrome 页面
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 在元素上执行函数，返回原始值
    async fn call_on(&self, element: &Element, function: impl Into<String>) -> Result<Option<JsonValue>> {
        let returns = element.call_js_fn(function, false).await?;
        Ok(returns.result.value)
    }

    async fn call_on_string(
        &self,
        element: &Element,
        function: impl Into<String>,
    ) -> Result<Option<String>> {
        match self.call_on(element, function).await? {
            Some(JsonValue::String(s)) => Ok(Some(s)),
            Some(JsonValue::Null) | None => Ok(None),
            Some(other) => Ok(Some(other.to_string())),
        }
    }

    async fn set_intercept(&self, enabled: bool) -> Result<()> {
        self.page
            .execute(SetInterceptFileChooserDialogParams::new(enabled))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl FormPage for ChromePage {
    type Element = Element;

    async fn body_text(&self) -> Result<String> {
        self.eval_as::<Option<String>>("document.body ? document.body.innerText : null")
            .await
            .map(Option::unwrap_or_default)
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Element>> {
        Ok(self.page.find_elements(selector).await?)
    }

    async fn is_visible(&self, element: &Element) -> Result<bool> {
        Ok(matches!(
            self.call_on(element, IS_VISIBLE_FN).await?,
            Some(JsonValue::Bool(true))
        ))
    }

    async fn attribute(&self, element: &Element, name: &str) -> Result<Option<String>> {
        Ok(element.attribute(name).await?)
    }

    async fn inner_text(&self, element: &Element) -> Result<Option<String>> {
        Ok(element.inner_text().await?)
    }

    async fn input_value(&self, element: &Element) -> Result<Option<String>> {
        self.call_on_string(element, INPUT_VALUE_FN).await
    }

    async fn sibling_attribute(
        &self,
        element: &Element,
        sibling_selector: &str,
        name: &str,
    ) -> Result<Option<String>> {
        let function = format!(
            r#"function() {{
                const parent = this.parentElement;
                if (!parent) return null;
                const sibling = Array.from(parent.querySelectorAll({}))
                    .find((el) => el !== this);
                return sibling ? sibling.getAttribute({}) : null;
            }}"#,
            serde_json::to_string(sibling_selector)?,
            serde_json::to_string(name)?
        );
        self.call_on_string(element, function).await
    }

    async fn sibling_text(
        &self,
        element: &Element,
        sibling_selector: &str,
    ) -> Result<Option<String>> {
        let function = format!(
            r#"function() {{
                const parent = this.parentElement;
                if (!parent) return null;
                const sibling = Array.from(parent.querySelectorAll({}))
                    .find((el) => el !== this);
                return sibling ? (sibling.innerText || sibling.textContent || '').trim() : null;
            }}"#,
            serde_json::to_string(sibling_selector)?
        );
        self.call_on_string(element, function).await
    }

    async fn click(&self, element: &Element) -> Result<()> {
        element.click().await?;
        Ok(())
    }

    async fn clear(&self, element: &Element) -> Result<()> {
        self.call_on(element, SELECT_TEXT_FN).await?;
        element.press_key("Backspace").await?;
        Ok(())
    }

    async fn fill(&self, element: &Element, value: &str) -> Result<()> {
        element.focus().await?;
        element.type_str(value).await?;
        Ok(())
    }

    async fn select_option(&self, element: &Element, value: &str) -> Result<()> {
        let function = format!(
            r#"function() {{
                this.focus();
                this.value = {};
                this.dispatchEvent(new Event('input', {{ bubbles: true }}));
                this.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return this.value;
            }}"#,
            serde_json::to_string(value)?
        );
        let selected = self.call_on_string(element, function).await?;
        if selected.as_deref() != Some(value) {
            anyhow::bail!("下拉框中不存在选项: {}", value);
        }
        Ok(())
    }

    async fn wait_for_network_idle(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut last_count = None;
        let mut quiet_since = Instant::now();

        loop {
            let snapshot: NetworkSnapshot = self.eval_as(NETWORK_SNAPSHOT_JS).await?;
            if last_count != Some(snapshot.resources) {
                last_count = Some(snapshot.resources);
                quiet_since = Instant::now();
            }
            if snapshot.ready_state == "complete" && quiet_since.elapsed() >= NETWORK_QUIET_WINDOW {
                return Ok(());
            }
            if Instant::now() >= deadline {
                anyhow::bail!("等待网络空闲超时 ({:?})", timeout);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn choose_file_via(
        &self,
        trigger: &Element,
        file_path: &Path,
        chooser_timeout: Duration,
    ) -> Result<()> {
        let file = file_path
            .to_str()
            .ok_or_else(|| anyhow!("文件路径不是合法的 UTF-8: {}", file_path.display()))?
            .to_string();

        self.set_intercept(true).await?;
        let result = async {
            let mut events = self.page.event_listener::<EventFileChooserOpened>().await?;
            trigger.click().await?;

            let opened = timeout(chooser_timeout, events.next())
                .await
                .context("等待文件选择框超时")?
                .context("文件选择框事件流已关闭")?;
            let backend_node_id = opened
                .backend_node_id
                .clone()
                .context("文件选择框没有关联的输入节点")?;

            let params = SetFileInputFilesParams::builder()
                .files(vec![file])
                .backend_node_id(backend_node_id)
                .build()
                .map_err(anyhow::Error::msg)?;
            self.page.execute(params).await?;
            debug!("已通过原生文件选择框选择文件: {}", file_path.display());
            Ok::<(), anyhow::Error>(())
        }
        .await;

        if let Err(e) = self.set_intercept(false).await {
            debug!("关闭文件选择框拦截失败: {}", e);
        }
        result
    }

    async fn set_files_on_visible_input(&self, input: &Element, file_path: &Path) -> Result<()> {
        let file = file_path
            .to_str()
            .ok_or_else(|| anyhow!("文件路径不是合法的 UTF-8: {}", file_path.display()))?
            .to_string();
        let params = SetFileInputFilesParams::builder()
            .files(vec![file])
            .backend_node_id(input.backend_node_id.clone())
            .build()
            .map_err(anyhow::Error::msg)?;
        self.page.execute(params).await?;
        Ok(())
    }

    async fn screening_questions(&self) -> Result<Vec<ScreeningQuestion>> {
        self.eval_as(SCREENING_QUESTIONS_JS).await
    }
}
