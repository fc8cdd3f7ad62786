//! 申请处理流程 - 流程层
//!
//! 核心职责：定义"一次申请"的完整处理流程
//!
//! 每一页的处理顺序：
//! 1. 检查校验错误 → 可修正的字段修正后重填（每个字段最多 `max_retries` 次）
//! 2. 页面提供上传控件时上传简历 / 求职信（每类只上传一次）
//! 3. 提取筛选问题 → 分析 → 必要时转交 AI → 填写
//! 4. 再次检查校验错误
//! 5. 识别页面状态
//! 6. 查找导航按钮：提交按钮则提交，否则翻页
//!
//! 翻页失败或超过 `max_pages` 时停止，结果中记录卡在哪一页以及原因。

use std::collections::HashMap;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::{AnalyzerConfig, Config, FlowConfig};
use crate::infrastructure::{first_visible, FormPage, Probe};
use crate::models::{
    AnswerValue, AnsweredQuestion, ApplicantProfile, ApplicationOutcome, ApplicationTarget,
    DocumentPaths, DocumentSource, DocumentType, NavigationButtonKind, ScreeningQuestion,
    ValidationError,
};
use crate::services::question_analyzer::{
    match_boolean_option, match_numeric_option, match_text_option, middle_option,
};
use crate::services::{
    AnswerEscalation, CustomDocumentHandler, LlmService, PageNavigator, QuestionAnalyzer,
    ValidationHandler,
};
use crate::utils::logging::truncate_text;
use crate::workflow::application_ctx::ApplicationCtx;

/// 申请处理流程
///
/// - 编排完整的单次申请流程
/// - 决定何时纠错、何时上传、何时作答、何时翻页
/// - 不持有任何资源（page）
/// - 只依赖业务能力（services）
pub struct ApplicationFlow {
    navigator: PageNavigator,
    validation: ValidationHandler,
    documents: CustomDocumentHandler,
    analyzer_config: AnalyzerConfig,
    flow_config: FlowConfig,
    profile: ApplicantProfile,
    escalation: Option<Box<dyn AnswerEscalation>>,
    verbose_logging: bool,
}

impl ApplicationFlow {
    /// 创建新的申请处理流程
    ///
    /// 配置了 LLM API key 时启用 AI 兜底。
    pub fn new(config: &Config, profile: ApplicantProfile) -> Self {
        let escalation: Option<Box<dyn AnswerEscalation>> = if config.escalation_enabled() {
            Some(Box::new(LlmService::new(config)))
        } else {
            None
        };

        Self {
            navigator: PageNavigator::new(config.navigator.clone()),
            validation: ValidationHandler::new(config.validation.clone()),
            documents: CustomDocumentHandler::new(config.upload.clone()),
            analyzer_config: config.analyzer.clone(),
            flow_config: config.flow.clone(),
            profile,
            escalation,
            verbose_logging: config.verbose_logging,
        }
    }

    /// 替换 AI 兜底实现
    pub fn with_escalation(mut self, escalation: impl AnswerEscalation + 'static) -> Self {
        self.escalation = Some(Box::new(escalation));
        self
    }

    /// 处理一个申请，页面已导航到申请 URL
    pub async fn run<P: FormPage>(
        &self,
        page: &P,
        ctx: &ApplicationCtx,
        target: &ApplicationTarget,
    ) -> ApplicationOutcome {
        info!("{} 🚀 开始申请: {} ({})", ctx, ctx.job, ctx.url);

        let mut outcome = ApplicationOutcome::start(&target.url, target.job.clone());
        let analyzer = QuestionAnalyzer::new(
            self.profile.clone(),
            target.job.clone(),
            self.analyzer_config.clone(),
        );
        let mut resume_done = !target.resume.is_configured();
        let mut cover_letter_done = !target.cover_letter.is_configured();

        for round in 1..=self.flow_config.max_pages {
            outcome.pages_visited = round;
            info!("{} 📄 处理第 {} 页", ctx, round);

            // 1. 进入页面时已有的校验错误
            self.correct_validation_errors(page, ctx).await;

            // 2. 文档
            if !resume_done {
                resume_done = self
                    .upload_if_offered(page, ctx, DocumentType::Resume, &target.resume, &mut outcome)
                    .await;
            }
            if !cover_letter_done {
                cover_letter_done = self
                    .upload_if_offered(
                        page,
                        ctx,
                        DocumentType::CoverLetter,
                        &target.cover_letter,
                        &mut outcome,
                    )
                    .await;
            }

            // 3. 筛选问题
            self.answer_questions(page, ctx, &analyzer, &mut outcome).await;

            // 4. 作答后的校验错误
            outcome.unresolved_errors = self.correct_validation_errors(page, ctx).await;

            // 5. 页面状态
            let info = self.navigator.detect_current_page(page).await;
            info!("{} 📍 {}", ctx, info);
            let page_number = info.page_number;
            outcome.last_page = Some(info);

            // 6. 翻页 / 提交
            let (button, kind) = self.navigator.find_navigation_button(page).await;
            let Some(button) = button else {
                warn!("{} ⚠️ 未找到导航按钮", ctx);
                return outcome.finish_stalled(format!(
                    "卡在第 {} 页，原因: 未找到导航按钮",
                    page_number
                ));
            };

            if kind == NavigationButtonKind::Submit {
                return self.submit(page, ctx, &button, page_number, outcome).await;
            }

            info!("{} ➡️ 点击 {:?} 按钮", ctx, kind);
            if !self.navigator.click_and_advance(page, &button).await {
                return outcome.finish_stalled(format!(
                    "卡在第 {} 页，原因: 点击 {:?} 按钮失败",
                    page_number, kind
                ));
            }
        }

        warn!(
            "{} ⚠️ 已处理 {} 页仍未到达提交页",
            ctx, self.flow_config.max_pages
        );
        let page_number = outcome.last_page.as_ref().map_or(0, |p| p.page_number);
        outcome.finish_stalled(format!(
            "卡在第 {} 页，原因: 超过最大页数 {}",
            page_number, self.flow_config.max_pages
        ))
    }

    /// 点击提交，并以提交后是否出现校验错误判断结果
    async fn submit<P: FormPage>(
        &self,
        page: &P,
        ctx: &ApplicationCtx,
        button: &P::Element,
        page_number: u32,
        mut outcome: ApplicationOutcome,
    ) -> ApplicationOutcome {
        info!("{} 📤 提交申请", ctx);
        if !self.navigator.click_and_advance(page, button).await {
            return outcome.finish_stalled(format!("卡在第 {} 页，原因: 点击提交按钮失败", page_number));
        }

        let remaining = self.validation.check_for_errors(page).await;
        if !remaining.is_empty() {
            warn!("{} ⚠️ 提交后仍有 {} 个校验错误", ctx, remaining.len());
            outcome.unresolved_errors = remaining;
            return outcome.finish_stalled(format!(
                "卡在第 {} 页，原因: 提交后仍有校验错误",
                page_number
            ));
        }

        info!("{} ✅ 申请已提交", ctx);
        outcome.finish_submitted()
    }

    /// 检查并修正校验错误，返回仍未解决的错误
    ///
    /// 每个字段最多修正 `max_retries` 次；没有修正规则、修正后值不变、或字段名未知的错误直接上报。
    async fn correct_validation_errors<P: FormPage>(
        &self,
        page: &P,
        ctx: &ApplicationCtx,
    ) -> Vec<ValidationError> {
        let max_retries = self.validation.max_retries();
        let mut attempts: HashMap<String, u32> = HashMap::new();

        for _ in 0..=max_retries {
            let errors = self.validation.check_for_errors(page).await;
            if errors.is_empty() {
                return errors;
            }
            debug!("{} 发现 {} 个校验错误", ctx, errors.len());

            let mut corrected_any = false;
            let mut unresolved = Vec::new();

            for mut error in errors {
                let count = attempts.entry(error.field_name.clone()).or_insert(0);
                error.retry_count = *count;

                if error.is_unknown_field() || *count >= max_retries {
                    unresolved.push(error);
                    continue;
                }

                let current = self
                    .validation
                    .current_value(page, &error.field_name, None)
                    .await
                    .unwrap_or_default();
                let corrected = self.validation.suggest_correction(
                    &error.field_name,
                    &current,
                    &error.error_message,
                );

                match corrected {
                    Some(value) if value != current => {
                        *count += 1;
                        error.retry_count = *count;
                        error.correction_attempted = true;
                        if self
                            .validation
                            .retry_field(page, &error.field_name, &value, None)
                            .await
                        {
                            corrected_any = true;
                        } else {
                            unresolved.push(error);
                        }
                    }
                    _ => {
                        info!("{} ⚠️ 无法自动修正: {}", ctx, error);
                        unresolved.push(error);
                    }
                }
            }

            if !corrected_any {
                return unresolved;
            }
        }

        self.validation.check_for_errors(page).await
    }

    /// 页面提供了对应的上传控件时上传文档
    ///
    /// 返回该类文档是否已处理完毕（无论上传成功与否，只尝试一次）。
    async fn upload_if_offered<P: FormPage>(
        &self,
        page: &P,
        ctx: &ApplicationCtx,
        document_type: DocumentType,
        paths: &DocumentPaths,
        outcome: &mut ApplicationOutcome,
    ) -> bool {
        if !self.documents.has_upload_control(page, document_type).await {
            debug!("{} 本页没有{}上传控件", ctx, document_type.label());
            return false;
        }

        let result = match (&paths.custom, &paths.default) {
            (Some(custom), default) => {
                let source = DocumentSource::from(custom.clone());
                self.documents
                    .upload_document(page, document_type, &source, default.as_deref())
                    .await
            }
            (None, Some(default)) => {
                let source = DocumentSource::from(default.clone());
                let mut result = self
                    .documents
                    .upload_document(page, document_type, &source, None)
                    .await;
                result.is_custom = false;
                result
            }
            (None, None) => return true,
        };

        info!("{} {}", ctx, result);
        outcome.documents.push(result);
        true
    }

    /// 提取、分析并填写本页的筛选问题
    async fn answer_questions<P: FormPage>(
        &self,
        page: &P,
        ctx: &ApplicationCtx,
        analyzer: &QuestionAnalyzer,
        outcome: &mut ApplicationOutcome,
    ) {
        let questions = match page.screening_questions().await {
            Ok(questions) => questions,
            Err(e) => {
                warn!("{} ⚠️ 提取筛选问题失败: {}", ctx, e);
                return;
            }
        };
        if questions.is_empty() {
            return;
        }
        info!("{} ❓ 本页有 {} 个筛选问题", ctx, questions.len());

        for question in &questions {
            let analysis =
                analyzer.analyze_question(&question.text, &question.widget_type, Some(&question.options));

            if self.verbose_logging {
                info!(
                    "{} 问题: {} | 意图: {} | 类型: {} | 置信度: {:.2}",
                    ctx,
                    truncate_text(&question.text, 80),
                    analysis.intent,
                    analysis.answer_type,
                    analysis.confidence
                );
            }

            let mut answer = analysis.suggested_answer.clone();
            let mut escalated = false;
            if analyzer.requires_ai_assistance(&question.text, analysis.confidence) {
                match &self.escalation {
                    Some(escalation) => {
                        match escalation
                            .answer(question, &analysis, analyzer.profile(), analyzer.job())
                            .await
                        {
                            Ok(Some(value)) => {
                                debug!("{} 🤖 AI 答案: {}", ctx, value);
                                answer = value;
                                escalated = true;
                            }
                            Ok(None) => debug!("{} AI 未给出可用答案，保留分析结果", ctx),
                            Err(e) => warn!("{} ⚠️ AI 兜底失败: {}", ctx, e),
                        }
                    }
                    None => debug!("{} 未启用 AI 兜底，使用分析结果", ctx),
                }
            }

            let filled = match fill_answer(page, question, &answer).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(
                        "{} ⚠️ 填写问题失败 ({}): {}",
                        ctx,
                        truncate_text(&question.text, 40),
                        e
                    );
                    false
                }
            };

            outcome.answers.push(AnsweredQuestion {
                question_text: question.text.clone(),
                analysis,
                answer,
                escalated,
                filled,
            });
        }
    }
}

/// 把答案填入页面
async fn fill_answer<P: FormPage>(
    page: &P,
    question: &ScreeningQuestion,
    answer: &AnswerValue,
) -> Result<()> {
    match question.widget_type.as_str() {
        "radio" | "checkbox" => choose_option(page, question, answer).await,
        "select" => {
            let element = locate(page, &question.selector).await?;
            let value = option_value_for(question, answer)
                .ok_or_else(|| anyhow::anyhow!("没有可选的选项"))?;
            page.select_option(&element, &value).await
        }
        _ => {
            let element = locate(page, &question.selector).await?;
            page.click(&element).await?;
            page.clear(&element).await?;
            page.fill(&element, &answer.to_form_value()).await
        }
    }
}

/// 单选 / 复选：点击与答案对应的那个选项
async fn choose_option<P: FormPage>(
    page: &P,
    question: &ScreeningQuestion,
    answer: &AnswerValue,
) -> Result<()> {
    // 单个复选框（例如"我同意"）：false 表示保持不勾选
    if question.options.len() <= 1 {
        if answer.as_bool() == Some(false) {
            return Ok(());
        }
        let element = page
            .query_all(&question.selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("未找到选项: {}", question.selector))?;
        return page.click(&element).await;
    }

    let value = option_value_for(question, answer)
        .ok_or_else(|| anyhow::anyhow!("没有可选的选项"))?;
    let selector = format!(
        "{}[value=\"{}\"]",
        question.selector,
        value.replace('\\', "\\\\").replace('"', "\\\"")
    );
    let element = page
        .query_all(&selector)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("未找到选项: {}", selector))?;
    page.click(&element).await
}

async fn locate<P: FormPage>(page: &P, selector: &str) -> Result<P::Element> {
    match first_visible(page, &[selector]).await {
        Probe::Found(element) => Ok(element),
        Probe::NotFound => Err(anyhow::anyhow!("未找到输入控件: {}", selector)),
    }
}

/// 答案对应的选项 value；没有选项时直接使用答案文本
fn option_value_for(question: &ScreeningQuestion, answer: &AnswerValue) -> Option<String> {
    let options = &question.options;
    if options.is_empty() {
        return Some(answer.to_form_value());
    }

    let matched = match answer {
        AnswerValue::Bool(value) => match_boolean_option(*value, options),
        AnswerValue::Number(n) => match_numeric_option(*n, options)
            .or_else(|| match_text_option(&answer.to_form_value(), options)),
        AnswerValue::Text(text) => options
            .iter()
            .find(|o| o.value == *text)
            .or_else(|| match_text_option(text, options)),
    };

    matched
        .or_else(|| middle_option(options))
        .map(|o| o.value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionOption;

    fn radio(options: Vec<QuestionOption>) -> ScreeningQuestion {
        ScreeningQuestion {
            text: "Are you willing to relocate?".to_string(),
            widget_type: "radio".to_string(),
            field_name: Some("relocate".to_string()),
            selector: "input[name=\"relocate\"]".to_string(),
            options,
        }
    }

    #[test]
    fn boolean_answers_map_to_yes_no_options() {
        let q = radio(vec![
            QuestionOption::new("Yes", "1"),
            QuestionOption::new("No", "0"),
        ]);
        assert_eq!(option_value_for(&q, &AnswerValue::Bool(true)).as_deref(), Some("1"));
        assert_eq!(option_value_for(&q, &AnswerValue::Bool(false)).as_deref(), Some("0"));
    }

    #[test]
    fn text_answers_prefer_exact_value_then_label() {
        let q = radio(vec![
            QuestionOption::new("Remote", "r"),
            QuestionOption::new("Hybrid", "h"),
            QuestionOption::new("On-site", "o"),
        ]);
        assert_eq!(option_value_for(&q, &AnswerValue::Text("o".into())).as_deref(), Some("o"));
        assert_eq!(option_value_for(&q, &AnswerValue::Text("hybrid".into())).as_deref(), Some("h"));
        // 无法匹配时取中间项
        assert_eq!(option_value_for(&q, &AnswerValue::Text("Mars".into())).as_deref(), Some("h"));
    }

    #[test]
    fn free_text_questions_use_form_value() {
        let q = ScreeningQuestion {
            options: vec![],
            widget_type: "number".to_string(),
            ..radio(vec![])
        };
        assert_eq!(option_value_for(&q, &AnswerValue::Number(4.0)).as_deref(), Some("4"));
    }
}
