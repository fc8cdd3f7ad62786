use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppResult, ConfigError};

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 是否自行启动无头浏览器（否则连接已打开的浏览器）
    pub headless: bool,
    /// 无头模式下的浏览器可执行文件
    pub chrome_executable: Option<String>,
    /// 申请计划文件（TOML）
    pub plan_file: String,
    /// 申请结果输出文件（JSON Lines）
    pub outcome_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置（api_key 为空时不启用 AI 兜底） ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 组件配置 ---
    pub navigator: NavigatorConfig,
    pub validation: ValidationConfig,
    pub upload: UploadConfig,
    pub analyzer: AnalyzerConfig,
    pub flow: FlowConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            headless: false,
            chrome_executable: None,
            plan_file: "applications.toml".to_string(),
            outcome_file: "outcomes.jsonl".to_string(),
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            navigator: NavigatorConfig::default(),
            validation: ValidationConfig::default(),
            upload: UploadConfig::default(),
            analyzer: AnalyzerConfig::default(),
            flow: FlowConfig::default(),
        }
    }
}

impl Config {
    /// 从环境变量加载配置，未设置的项使用默认值
    ///
    /// 设置了但无法解析的值会返回 [`ConfigError::EnvVarParseFailed`]。
    pub fn from_env() -> AppResult<Self> {
        let d = Self::default();
        Ok(Self {
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT", d.browser_debug_port)?,
            headless: env_parse("HEADLESS", d.headless)?,
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(d.chrome_executable),
            plan_file: std::env::var("APPLICATION_PLAN").unwrap_or(d.plan_file),
            outcome_file: std::env::var("OUTCOME_FILE").unwrap_or(d.outcome_file),
            verbose_logging: env_parse("VERBOSE_LOGGING", d.verbose_logging)?,
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(d.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(d.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(d.llm_model_name),
            navigator: NavigatorConfig {
                find_timeout_ms: env_parse("NAV_FIND_TIMEOUT_MS", d.navigator.find_timeout_ms)?,
                transition_timeout_ms: env_parse(
                    "NAV_TRANSITION_TIMEOUT_MS",
                    d.navigator.transition_timeout_ms,
                )?,
                settle_delay_ms: env_parse("NAV_SETTLE_DELAY_MS", d.navigator.settle_delay_ms)?,
            },
            validation: ValidationConfig {
                max_retries: env_parse("VALIDATION_MAX_RETRIES", d.validation.max_retries)?,
                settle_delay_ms: env_parse("VALIDATION_SETTLE_MS", d.validation.settle_delay_ms)?,
            },
            upload: UploadConfig {
                max_retries: env_parse("UPLOAD_MAX_RETRIES", d.upload.max_retries)?,
                fallback_after_failures: env_parse(
                    "UPLOAD_FALLBACK_AFTER",
                    d.upload.fallback_after_failures,
                )?,
                chooser_timeout_ms: env_parse(
                    "UPLOAD_CHOOSER_TIMEOUT_MS",
                    d.upload.chooser_timeout_ms,
                )?,
                confirm_delay_ms: env_parse("UPLOAD_CONFIRM_DELAY_MS", d.upload.confirm_delay_ms)?,
            },
            analyzer: AnalyzerConfig {
                ai_confidence_threshold: env_parse(
                    "AI_CONFIDENCE_THRESHOLD",
                    d.analyzer.ai_confidence_threshold,
                )?,
                ai_max_question_chars: env_parse(
                    "AI_MAX_QUESTION_CHARS",
                    d.analyzer.ai_max_question_chars,
                )?,
            },
            flow: FlowConfig {
                max_pages: env_parse("FLOW_MAX_PAGES", d.flow.max_pages)?,
            },
        })
    }

    /// 是否启用 AI 兜底回答
    pub fn escalation_enabled(&self) -> bool {
        !self.llm_api_key.trim().is_empty()
    }
}

fn env_parse<T: FromStr>(var_name: &str, default: T) -> AppResult<T> {
    match std::env::var(var_name) {
        Ok(value) => value.trim().parse().map_err(|_| {
            ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: std::any::type_name::<T>(),
            }
            .into()
        }),
        Err(_) => Ok(default),
    }
}

/// 翻页组件配置
#[derive(Clone, Debug)]
pub struct NavigatorConfig {
    /// 每一档按钮候选的查找等待时间
    pub find_timeout_ms: u64,
    /// 翻页后等待页面稳定的最长时间
    pub transition_timeout_ms: u64,
    /// 固定的稳定等待
    pub settle_delay_ms: u64,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            find_timeout_ms: 2_000,
            transition_timeout_ms: 10_000,
            settle_delay_ms: 1_000,
        }
    }
}

impl NavigatorConfig {
    pub fn find_timeout(&self) -> Duration {
        Duration::from_millis(self.find_timeout_ms)
    }

    pub fn transition_timeout(&self) -> Duration {
        Duration::from_millis(self.transition_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// 校验纠错组件配置
#[derive(Clone, Debug)]
pub struct ValidationConfig {
    /// 同一字段允许调用方重试的最大次数
    pub max_retries: u32,
    /// 重新填写后等待前端校验重新执行的时间
    pub settle_delay_ms: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            settle_delay_ms: 1_000,
        }
    }
}

/// 文档上传组件配置
#[derive(Clone, Debug)]
pub struct UploadConfig {
    /// 自定义文档的最大上传次数
    pub max_retries: u32,
    /// 累计失败达到该次数后改用默认文档
    ///
    /// 前置条件：必须 `<= max_retries`，否则永远不会触发回退。该条件不会被自动修正。
    pub fallback_after_failures: u32,
    /// 等待原生文件选择框出现的时间
    pub chooser_timeout_ms: u64,
    /// 上传后等待确认标识的时间
    pub confirm_delay_ms: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            fallback_after_failures: 2,
            chooser_timeout_ms: 5_000,
            confirm_delay_ms: 2_000,
        }
    }
}

impl UploadConfig {
    /// 当前配置下回退是否可能触发
    pub fn fallback_reachable(&self) -> bool {
        self.fallback_after_failures <= self.max_retries
    }

    pub fn chooser_timeout(&self) -> Duration {
        Duration::from_millis(self.chooser_timeout_ms)
    }

    pub fn confirm_delay(&self) -> Duration {
        Duration::from_millis(self.confirm_delay_ms)
    }
}

/// 问题分析组件配置
#[derive(Clone, Debug)]
pub struct AnalyzerConfig {
    /// 置信度低于该值时需要 AI 协助
    pub ai_confidence_threshold: f64,
    /// 问题文本超过该长度（字符数）时需要 AI 协助
    pub ai_max_question_chars: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            ai_confidence_threshold: 0.6,
            ai_max_question_chars: 200,
        }
    }
}

/// 单次申请流程配置
#[derive(Clone, Debug)]
pub struct FlowConfig {
    /// 单次申请最多处理的页数
    pub max_pages: usize,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self { max_pages: 15 }
    }
}
