//! 测试用的页面替身
//!
//! 元素按"精确匹配的选择器字符串"注册，点击 / 填写 / 上传都会被记录，便于断言。

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use job_apply_submit::models::ScreeningQuestion;
use job_apply_submit::FormPage;

/// 元素描述
#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    selectors: Vec<String>,
    visible: bool,
    text: Option<String>,
    value: Option<String>,
    attrs: HashMap<String, String>,
    sibling_attrs: HashMap<String, String>,
    sibling_text: Option<String>,
}

impl FakeElement {
    pub fn new(selectors: &[&str]) -> Self {
        Self {
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            visible: true,
            ..Default::default()
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn sibling_attr(mut self, name: &str, value: &str) -> Self {
        self.sibling_attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn sibling_text(mut self, text: &str) -> Self {
        self.sibling_text = Some(text.to_string());
        self
    }
}

/// 一次上传记录
#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub path: PathBuf,
    /// 上传时文件是否存在
    pub existed: bool,
    pub via_chooser: bool,
}

#[derive(Default)]
struct State {
    url: String,
    body_text: String,
    elements: Vec<FakeElement>,
    clicks: Vec<usize>,
    fills: Vec<(usize, String)>,
    selections: Vec<(usize, String)>,
    uploads: Vec<UploadRecord>,
    upload_attempts: Vec<PathBuf>,
    upload_failures_remaining: u32,
    failing_paths: Vec<PathBuf>,
    questions: Vec<ScreeningQuestion>,
    navigate_on_click: HashMap<usize, String>,
    hide_on_click: HashMap<usize, Vec<usize>>,
    show_on_click: HashMap<usize, Vec<usize>>,
    hide_on_fill: HashMap<usize, Vec<usize>>,
}

/// 页面替身
#[derive(Default)]
pub struct FakePage {
    state: Mutex<State>,
}

impl FakePage {
    pub fn new(url: &str) -> Self {
        let page = Self::default();
        page.state().url = url.to_string();
        page
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// 注册元素，返回句柄
    pub fn add(&self, element: FakeElement) -> usize {
        let mut state = self.state();
        state.elements.push(element);
        state.elements.len() - 1
    }

    pub fn set_body_text(&self, text: &str) {
        self.state().body_text = text.to_string();
    }

    pub fn set_url(&self, url: &str) {
        self.state().url = url.to_string();
    }

    pub fn set_questions(&self, questions: Vec<ScreeningQuestion>) {
        self.state().questions = questions;
    }

    /// 点击后跳转到新 URL
    pub fn navigate_on_click(&self, element: usize, url: &str) {
        self.state().navigate_on_click.insert(element, url.to_string());
    }

    /// 点击后隐藏一组元素（模拟翻页）
    pub fn hide_on_click(&self, element: usize, targets: &[usize]) {
        self.state().hide_on_click.insert(element, targets.to_vec());
    }

    /// 点击后显示一组元素（模拟翻页）
    pub fn show_on_click(&self, element: usize, targets: &[usize]) {
        self.state().show_on_click.insert(element, targets.to_vec());
    }

    /// 填写后隐藏一组元素（模拟前端校验通过）
    pub fn hide_on_fill(&self, element: usize, targets: &[usize]) {
        self.state().hide_on_fill.insert(element, targets.to_vec());
    }

    /// 接下来的 n 次上传都失败
    pub fn fail_next_uploads(&self, n: u32) {
        self.state().upload_failures_remaining = n;
    }

    /// 该路径的上传总是失败
    pub fn fail_uploads_of(&self, path: &Path) {
        self.state().failing_paths.push(path.to_path_buf());
    }

    pub fn clicks(&self) -> Vec<usize> {
        self.state().clicks.clone()
    }

    pub fn was_clicked(&self, element: usize) -> bool {
        self.state().clicks.contains(&element)
    }

    pub fn fills(&self) -> Vec<(usize, String)> {
        self.state().fills.clone()
    }

    pub fn selections(&self) -> Vec<(usize, String)> {
        self.state().selections.clone()
    }

    pub fn uploads(&self) -> Vec<UploadRecord> {
        self.state().uploads.clone()
    }

    /// 所有上传尝试的路径（含失败的）
    pub fn upload_attempts(&self) -> Vec<PathBuf> {
        self.state().upload_attempts.clone()
    }

    pub fn current_url_now(&self) -> String {
        self.state().url.clone()
    }

    pub fn value_of(&self, element: usize) -> Option<String> {
        self.state().elements[element].value.clone()
    }

    fn record_upload(&self, path: &Path, via_chooser: bool) -> Result<()> {
        let mut state = self.state();
        state.upload_attempts.push(path.to_path_buf());
        if state.upload_failures_remaining > 0 {
            state.upload_failures_remaining -= 1;
            bail!("模拟上传失败");
        }
        if state.failing_paths.iter().any(|p| p == path) {
            bail!("模拟上传失败: {}", path.display());
        }
        state.uploads.push(UploadRecord {
            path: path.to_path_buf(),
            existed: path.exists(),
            via_chooser,
        });
        Ok(())
    }
}

#[async_trait]
impl FormPage for FakePage {
    type Element = usize;

    async fn body_text(&self) -> Result<String> {
        Ok(self.state().body_text.clone())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state().url.clone())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<usize>> {
        Ok(self
            .state()
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.selectors.iter().any(|s| s == selector))
            .map(|(i, _)| i)
            .collect())
    }

    async fn is_visible(&self, element: &usize) -> Result<bool> {
        Ok(self.state().elements[*element].visible)
    }

    async fn attribute(&self, element: &usize, name: &str) -> Result<Option<String>> {
        Ok(self.state().elements[*element].attrs.get(name).cloned())
    }

    async fn inner_text(&self, element: &usize) -> Result<Option<String>> {
        Ok(self.state().elements[*element].text.clone())
    }

    async fn input_value(&self, element: &usize) -> Result<Option<String>> {
        Ok(self.state().elements[*element].value.clone())
    }

    async fn sibling_attribute(
        &self,
        element: &usize,
        _sibling_selector: &str,
        name: &str,
    ) -> Result<Option<String>> {
        Ok(self.state().elements[*element].sibling_attrs.get(name).cloned())
    }

    async fn sibling_text(&self, element: &usize, _sibling_selector: &str) -> Result<Option<String>> {
        Ok(self.state().elements[*element].sibling_text.clone())
    }

    async fn click(&self, element: &usize) -> Result<()> {
        let mut state = self.state();
        if !state.elements[*element].visible {
            bail!("元素不可见");
        }
        state.clicks.push(*element);
        if let Some(url) = state.navigate_on_click.get(element).cloned() {
            state.url = url;
        }
        for target in state.hide_on_click.get(element).cloned().unwrap_or_default() {
            state.elements[target].visible = false;
        }
        for target in state.show_on_click.get(element).cloned().unwrap_or_default() {
            state.elements[target].visible = true;
        }
        Ok(())
    }

    async fn clear(&self, element: &usize) -> Result<()> {
        self.state().elements[*element].value = Some(String::new());
        Ok(())
    }

    async fn fill(&self, element: &usize, value: &str) -> Result<()> {
        let mut state = self.state();
        state.elements[*element].value = Some(value.to_string());
        state.fills.push((*element, value.to_string()));
        for target in state.hide_on_fill.get(element).cloned().unwrap_or_default() {
            state.elements[target].visible = false;
        }
        Ok(())
    }

    async fn select_option(&self, element: &usize, value: &str) -> Result<()> {
        let mut state = self.state();
        state.elements[*element].value = Some(value.to_string());
        state.selections.push((*element, value.to_string()));
        Ok(())
    }

    async fn wait_for_network_idle(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn choose_file_via(&self, trigger: &usize, file_path: &Path, _timeout: Duration) -> Result<()> {
        self.state().clicks.push(*trigger);
        self.record_upload(file_path, true)
    }

    async fn set_files_on_visible_input(&self, _input: &usize, file_path: &Path) -> Result<()> {
        self.record_upload(file_path, false)
    }

    async fn screening_questions(&self) -> Result<Vec<ScreeningQuestion>> {
        // 已填写过的问题不再返回
        let state = self.state();
        Ok(state
            .questions
            .iter()
            .filter(|q| {
                !state.elements.iter().any(|e| {
                    e.selectors.iter().any(|s| *s == q.selector)
                        && e.value.as_deref().is_some_and(|v| !v.is_empty())
                })
            })
            .cloned()
            .collect())
    }
}
