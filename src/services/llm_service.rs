//! LLM 服务 - 业务能力层
//!
//! 问题分析器置信度不足时的升级通道：把筛选问题交给兼容 OpenAI API 的模型作答。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{
    AnswerType, AnswerValue, ApplicantProfile, JobContext, QuestionAnalysis, ScreeningQuestion,
};
use crate::services::question_analyzer::match_text_option;

/// 升级作答通道
///
/// 返回 `Ok(None)` 表示无法给出更好的答案，调用方保留分析器的建议答案。
#[async_trait]
pub trait AnswerEscalation: Send + Sync {
    async fn answer(
        &self,
        question: &ScreeningQuestion,
        analysis: &QuestionAnalysis,
        profile: &ApplicantProfile,
        job: &JobContext,
    ) -> Result<Option<AnswerValue>>;
}

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 回答单个筛选问题
/// - 提供通用的 LLM 调用接口
/// - 不关心流程顺序
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 示例
    /// ```no_run
    /// # use job_apply_submit::services::LlmService;
    /// # async fn example(service: &LlmService) -> anyhow::Result<()> {
    /// let response = service
    ///     .send_to_llm("Are you willing to relocate?", Some("Answer briefly."))
    ///     .await?;
    /// println!("LLM 响应: {}", response);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn send_to_llm(&self, user_message: &str, system_message: Option<&str>) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.3)
            .max_tokens(512u32)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            anyhow::anyhow!("LLM API 调用失败: {}", e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("LLM 返回内容为空"))?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl AnswerEscalation for LlmService {
    async fn answer(
        &self,
        question: &ScreeningQuestion,
        analysis: &QuestionAnalysis,
        profile: &ApplicantProfile,
        job: &JobContext,
    ) -> Result<Option<AnswerValue>> {
        let (user_message, system_message) = build_answer_messages(question, analysis, profile, job);
        let response = self.send_to_llm(&user_message, Some(&system_message)).await?;
        Ok(parse_answer_response(&response, question, &analysis.answer_type))
    }
}

/// 构建作答消息，返回 (user_message, system_message)
fn build_answer_messages(
    question: &ScreeningQuestion,
    analysis: &QuestionAnalysis,
    profile: &ApplicantProfile,
    job: &JobContext,
) -> (String, String) {
    let system_message = "You fill in job application screening questions on behalf of an applicant. \
                          Answer truthfully from the applicant profile, stay positive, avoid extreme choices, \
                          and reply with the answer only."
        .to_string();

    let profile_json = serde_json::to_string_pretty(profile).unwrap_or_default();

    let options_block = if question.options.is_empty() {
        "(free text)".to_string()
    } else {
        question
            .options
            .iter()
            .map(|o| format!("- {}", o.label))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let format_hint = match analysis.answer_type {
        AnswerType::Boolean => "Reply with exactly Yes or No.",
        AnswerType::Numeric => "Reply with a single number.",
        _ if !question.options.is_empty() => "Reply with exactly one option label from the list.",
        _ => "Reply with at most three sentences.",
    };

    let user_message = format!(
        r#"Job: {}
Job description: {}

Applicant profile (JSON):
{}

Question: {}
Options:
{}

{}"#,
        job,
        job.description.as_deref().unwrap_or("(none)"),
        profile_json,
        question.text,
        options_block,
        format_hint
    );

    (user_message, system_message)
}

/// 解析作答响应
///
/// 有选项时必须落在某个选项上，否则视为无效答案。
fn parse_answer_response(
    response: &str,
    question: &ScreeningQuestion,
    answer_type: &AnswerType,
) -> Option<AnswerValue> {
    let response = response.trim().trim_matches(|c: char| c == '"' || c == '.');
    if response.is_empty() {
        return None;
    }

    match answer_type {
        AnswerType::Boolean => {
            let lower = response.to_lowercase();
            if lower.starts_with("yes") {
                Some(AnswerValue::Bool(true))
            } else if lower.starts_with("no") {
                Some(AnswerValue::Bool(false))
            } else {
                warn!("无法解析 LLM 布尔答案: '{}'", response);
                None
            }
        }
        _ if !question.options.is_empty() => {
            let matched = match_text_option(response, &question.options);
            if matched.is_none() {
                warn!("LLM 答案不在选项中: '{}'", response);
            }
            matched.map(|o| AnswerValue::Text(o.value.clone()))
        }
        AnswerType::Numeric => response
            .split_whitespace()
            .find_map(|word| word.trim_matches(|c: char| !c.is_ascii_digit() && c != '.').parse::<f64>().ok())
            .map(AnswerValue::Number),
        _ => Some(AnswerValue::Text(response.to_string())),
    }
}
