//! 筛选问题分析服务 - 业务能力层
//!
//! 纯函数组件：不做任何 I/O，相同的资料 / 职位上下文下结果确定。
//!
//! 流程：意图识别 → 答案类型推断 → 按意图给出答案 → 置信度评分 → 生成说明。
//! 置信度低或问题过长时由 [`QuestionAnalyzer::requires_ai_assistance`] 通知调用方转交 AI，
//! 本组件自身从不调用 AI。

use once_cell::sync::Lazy;
use phf::phf_set;
use regex::Regex;

use crate::config::AnalyzerConfig;
use crate::models::{
    AnswerType, AnswerValue, ApplicantProfile, JobContext, QuestionAnalysis, QuestionIntent,
    QuestionOption,
};

/// 意图关键字表，按顺序匹配，第一个命中的意图生效
///
/// 各组词汇并不互斥，顺序即优先级。
const INTENT_KEYWORDS: &[(QuestionIntent, &[&str])] = &[
    (
        QuestionIntent::Qualification,
        &[
            "experience",
            "years of",
            "qualif",
            "background in",
            "expertise",
            "track record",
        ],
    ),
    (
        QuestionIntent::Availability,
        &[
            "available",
            "availability",
            "start date",
            "notice period",
            "when can you start",
            "earliest",
        ],
    ),
    (
        QuestionIntent::Location,
        &[
            "relocat",
            "commute",
            "located",
            "location",
            "on-site",
            "onsite",
            "remote",
            "hybrid",
            "in the office",
        ],
    ),
    (
        QuestionIntent::Legal,
        &[
            "authorized",
            "authorization",
            "legally",
            "sponsor",
            "visa",
            "citizen",
            "work permit",
            "right to work",
            "eligible to work",
            "background check",
        ],
    ),
    (
        QuestionIntent::Compensation,
        &[
            "salary",
            "compensation",
            "expected pay",
            "pay rate",
            "hourly rate",
            "wage",
            "desired pay",
        ],
    ),
    (
        QuestionIntent::Skills,
        &[
            "skill",
            "proficient",
            "proficiency",
            "knowledge of",
            "familiar with",
            "programming",
            "software",
            "tools",
        ],
    ),
    (
        QuestionIntent::CultureFit,
        &[
            "culture",
            "team",
            "values",
            "why do you want",
            "motivat",
            "passion",
            "interest",
        ],
    ),
    (
        QuestionIntent::Commitment,
        &[
            "commit",
            "long-term",
            "long term",
            "full-time",
            "full time",
            "part-time",
            "overtime",
            "travel",
        ],
    ),
    (
        QuestionIntent::Education,
        &[
            "degree",
            "education",
            "bachelor",
            "master",
            "phd",
            "diploma",
            "graduat",
            "gpa",
            "certif",
        ],
    ),
    (
        QuestionIntent::Schedule,
        &[
            "schedule",
            "shift",
            "weekend",
            "hours",
            "night",
            "evening",
        ],
    ),
];

/// 含义明确、可提升置信度的关键词
static UNAMBIGUOUS_KEYWORDS: phf::Set<&'static str> = phf_set! {
    "yes",
    "years",
    "authorized",
    "eligible",
    "willing",
};

/// 论述类问题的提示语
static ESSAY_CUES: phf::Set<&'static str> = phf_set! {
    "describe",
    "explain",
    "tell us",
    "why do you",
};

const YES_WORDS: &[&str] = &["yes", "true", "y"];
const NO_WORDS: &[&str] = &["no", "false", "n"];

/// 没有资料时使用的工作年限
const DEFAULT_EXPERIENCE_YEARS: f64 = 3.0;

const BASE_CONFIDENCE: f64 = 0.5;
const KNOWN_INTENT_BONUS: f64 = 0.3;
const SHORT_QUESTION_BONUS: f64 = 0.1;
const KEYWORD_BONUS: f64 = 0.1;
const SHORT_QUESTION_CHARS: usize = 100;

static NUMBER: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").ok());

/// 日期类问题提示，按整词匹配（"candidate" 不算）
static DATE_CUE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"\b(?:date|when can you|what day)\b|\bmm/dd\b|\bdd/mm\b").ok()
});

/// 金额类问题提示：货币符号后紧跟数字，或整词
static CURRENCY_CUE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"[$€£]\s?\d|\b(?:salary|compensation|pay rate|usd)\b").ok()
});

/// 筛选问题分析服务
pub struct QuestionAnalyzer {
    profile: ApplicantProfile,
    job: JobContext,
    config: AnalyzerConfig,
}

impl QuestionAnalyzer {
    pub fn new(profile: ApplicantProfile, job: JobContext, config: AnalyzerConfig) -> Self {
        Self {
            profile,
            job,
            config,
        }
    }

    pub fn profile(&self) -> &ApplicantProfile {
        &self.profile
    }

    pub fn job(&self) -> &JobContext {
        &self.job
    }

    /// 分析一个筛选问题
    pub fn analyze_question(
        &self,
        question_text: &str,
        question_type: &str,
        options: Option<&[QuestionOption]>,
    ) -> QuestionAnalysis {
        let text = question_text.to_lowercase();
        let options = options.unwrap_or(&[]);

        let intent = detect_intent(&text);
        let answer_type = infer_answer_type(&text, question_type, options);
        let suggested_answer = self.answer_for(intent, &text, &answer_type, options);
        let confidence = score_confidence(intent, question_text, &text);
        let reasoning = reasoning_for(intent, &suggested_answer);

        QuestionAnalysis {
            intent,
            answer_type,
            suggested_answer,
            confidence,
            reasoning,
        }
    }

    /// 是否需要转交 AI
    ///
    /// 置信度低于阈值、问题过长、或属于论述类问题时返回 true。
    pub fn requires_ai_assistance(&self, question_text: &str, confidence: f64) -> bool {
        if confidence < self.config.ai_confidence_threshold {
            return true;
        }
        if question_text.chars().count() > self.config.ai_max_question_chars {
            return true;
        }
        let text = question_text.to_lowercase();
        ESSAY_CUES.iter().any(|cue| text.contains(cue))
    }

    /// 按意图分派答案策略
    fn answer_for(
        &self,
        intent: QuestionIntent,
        text: &str,
        answer_type: &AnswerType,
        options: &[QuestionOption],
    ) -> AnswerValue {
        match intent {
            QuestionIntent::Qualification => self.answer_qualification(text, answer_type, options),
            QuestionIntent::Availability => self.answer_availability(answer_type, options),
            QuestionIntent::Location => self.answer_location(answer_type, options),
            QuestionIntent::Legal => self.answer_legal(text, answer_type, options),
            QuestionIntent::Compensation => self.answer_compensation(answer_type, options),
            QuestionIntent::Skills => self.answer_skills(text, answer_type, options),
            QuestionIntent::CultureFit => self.answer_culture_fit(answer_type, options),
            QuestionIntent::Commitment => fallback_answer(
                answer_type,
                options,
                "Yes, I am fully committed to this position.",
            ),
            QuestionIntent::Education => self.answer_education(answer_type, options),
            QuestionIntent::Schedule => fallback_answer(
                answer_type,
                options,
                "Yes, I am flexible and can adapt to the required schedule.",
            ),
            QuestionIntent::General => fallback_answer(answer_type, options, "Yes"),
        }
    }

    fn answer_qualification(
        &self,
        text: &str,
        answer_type: &AnswerType,
        options: &[QuestionOption],
    ) -> AnswerValue {
        let years = self.profile.experience_years;
        if !options.is_empty() && *answer_type != AnswerType::Boolean {
            let target = years.unwrap_or(DEFAULT_EXPERIENCE_YEARS);
            if let Some(option) = match_numeric_option(target, options) {
                return AnswerValue::Text(option.value.clone());
            }
            return fallback_answer(answer_type, options, "");
        }
        match answer_type {
            AnswerType::Boolean => match (years, required_years(text)) {
                (Some(y), Some(required)) => AnswerValue::Bool(y >= required),
                (Some(y), None) => AnswerValue::Bool(y > 0.0),
                (None, _) => AnswerValue::Bool(true),
            },
            AnswerType::Numeric => AnswerValue::Number(years.unwrap_or(DEFAULT_EXPERIENCE_YEARS)),
            _ => match years {
                Some(y) => AnswerValue::Text(format!("{} years", format_number(y))),
                None => AnswerValue::Text(
                    "Yes, I have relevant experience for this role.".to_string(),
                ),
            },
        }
    }

    fn answer_availability(&self, answer_type: &AnswerType, options: &[QuestionOption]) -> AnswerValue {
        if let Some(availability) = self.profile.availability.as_deref() {
            if !options.is_empty() && *answer_type != AnswerType::Boolean {
                if let Some(option) = match_text_option(availability, options) {
                    return AnswerValue::Text(option.value.clone());
                }
            } else if !matches!(answer_type, AnswerType::Boolean) {
                return AnswerValue::Text(availability.to_string());
            }
        }
        fallback_answer(
            answer_type,
            options,
            "I can start within two weeks of an offer.",
        )
    }

    fn answer_location(&self, answer_type: &AnswerType, options: &[QuestionOption]) -> AnswerValue {
        let willing = self.profile.willing_to_relocate.unwrap_or(true);
        match answer_type {
            AnswerType::Boolean => AnswerValue::Bool(willing),
            _ if !options.is_empty() => {
                let wanted = if willing { YES_WORDS } else { NO_WORDS };
                match find_word_option(wanted, options) {
                    Some(option) => AnswerValue::Text(option.value.clone()),
                    None => fallback_answer(answer_type, options, ""),
                }
            }
            _ if willing => AnswerValue::Text(
                "Yes, I am open to relocating or commuting for this role.".to_string(),
            ),
            _ => AnswerValue::Text("I would prefer to work from my current location.".to_string()),
        }
    }

    /// 签证担保问题与工作许可问题方向相反
    fn answer_legal(&self, text: &str, answer_type: &AnswerType, options: &[QuestionOption]) -> AnswerValue {
        let affirmative = if text.contains("sponsor") {
            self.profile.need_sponsorship.unwrap_or(false)
        } else {
            self.profile.work_authorization.unwrap_or(true)
        };
        match answer_type {
            AnswerType::Boolean => AnswerValue::Bool(affirmative),
            _ if !options.is_empty() => {
                let wanted = if affirmative { YES_WORDS } else { NO_WORDS };
                match find_word_option(wanted, options) {
                    Some(option) => AnswerValue::Text(option.value.clone()),
                    None => fallback_answer(answer_type, options, ""),
                }
            }
            _ => AnswerValue::Text(if affirmative { "Yes" } else { "No" }.to_string()),
        }
    }

    fn answer_compensation(&self, answer_type: &AnswerType, options: &[QuestionOption]) -> AnswerValue {
        if let Some(salary) = self.profile.salary_expectation.as_deref() {
            if !options.is_empty() {
                let cleaned = salary.replace(',', "");
                let numeric = NUMBER
                    .as_ref()
                    .and_then(|re| re.find(&cleaned))
                    .and_then(|m| m.as_str().parse::<f64>().ok());
                let matched = numeric
                    .and_then(|n| match_numeric_option(n, options))
                    .or_else(|| match_text_option(salary, options));
                if let Some(option) = matched {
                    return AnswerValue::Text(option.value.clone());
                }
            } else if *answer_type == AnswerType::Numeric {
                if let Ok(n) = salary.replace([',', '$'], "").trim().parse::<f64>() {
                    return AnswerValue::Number(n);
                }
            } else if *answer_type != AnswerType::Boolean {
                return AnswerValue::Text(salary.to_string());
            }
        }
        fallback_answer(
            answer_type,
            options,
            "Negotiable, based on the overall compensation package.",
        )
    }

    fn answer_skills(&self, text: &str, answer_type: &AnswerType, options: &[QuestionOption]) -> AnswerValue {
        let mentioned = self.profile.skills_mentioned_in(text);
        match answer_type {
            AnswerType::Boolean => AnswerValue::Bool(true),
            _ if !options.is_empty() => {
                let matched = self
                    .profile
                    .skills
                    .iter()
                    .find_map(|skill| match_text_option(skill, options));
                match matched {
                    Some(option) => AnswerValue::Text(option.value.clone()),
                    None => fallback_answer(answer_type, options, ""),
                }
            }
            _ if !mentioned.is_empty() => AnswerValue::Text(format!(
                "Yes, I have hands-on experience with {}.",
                mentioned.join(", ")
            )),
            _ => fallback_answer(
                answer_type,
                options,
                "Yes, I have hands-on experience with the required tools.",
            ),
        }
    }

    fn answer_culture_fit(&self, answer_type: &AnswerType, options: &[QuestionOption]) -> AnswerValue {
        let sentence = format!(
            "I am excited to contribute to {} as {} and to grow with the team.",
            self.job.company_or_default(),
            with_article(self.job.title_or_default())
        );
        fallback_answer(answer_type, options, &sentence)
    }

    fn answer_education(&self, answer_type: &AnswerType, options: &[QuestionOption]) -> AnswerValue {
        if let Some(level) = self.profile.education_level.as_deref() {
            if !options.is_empty() && *answer_type != AnswerType::Boolean {
                if let Some(option) = match_text_option(level, options) {
                    return AnswerValue::Text(option.value.clone());
                }
            } else if *answer_type != AnswerType::Boolean {
                return AnswerValue::Text(level.to_string());
            }
        }
        fallback_answer(
            answer_type,
            options,
            "I hold the education required for this role.",
        )
    }
}

/// 意图识别：按关键字表顺序，第一个命中的意图生效
pub fn detect_intent(text_lower: &str) -> QuestionIntent {
    INTENT_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| contains_word_start(text_lower, k)))
        .map(|(intent, _)| *intent)
        .unwrap_or(QuestionIntent::General)
}

/// 答案类型推断
pub fn infer_answer_type(text_lower: &str, widget_type: &str, options: &[QuestionOption]) -> AnswerType {
    let widget = widget_type.trim().to_ascii_lowercase();

    if text_lower.contains("how many") || text_lower.contains("number of") {
        return AnswerType::Numeric;
    }
    if is_yes_no(options) {
        return AnswerType::Boolean;
    }
    if text_lower.contains("describe") || text_lower.contains("explain") {
        return AnswerType::Descriptive;
    }
    if !options.is_empty() && matches!(widget.as_str(), "select" | "radio" | "dropdown" | "combobox")
    {
        return AnswerType::Choice;
    }
    if cue_matches(&DATE_CUE, text_lower) {
        return AnswerType::Date;
    }
    if cue_matches(&CURRENCY_CUE, text_lower) {
        return AnswerType::Currency;
    }
    AnswerType::from_widget(&widget)
}

fn cue_matches(cue: &Lazy<Option<Regex>>, text_lower: &str) -> bool {
    cue.as_ref().is_some_and(|re| re.is_match(text_lower))
}

/// 关键字必须出现在词首："night" 不匹配 "fortnight"，"relocat" 仍匹配 "relocate"
fn contains_word_start(text_lower: &str, keyword: &str) -> bool {
    text_lower.match_indices(keyword).any(|(i, _)| {
        text_lower[..i]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}

/// 问题中要求的年限，例如 "5+ years" → 5
fn required_years(text_lower: &str) -> Option<f64> {
    if !text_lower.contains("year") {
        return None;
    }
    NUMBER
        .as_ref()?
        .find(text_lower)
        .and_then(|m| m.as_str().parse().ok())
}

/// 置信度评分
///
/// 基础 0.5；意图明确 +0.3；问题短于 100 字符 +0.1；包含明确关键词 +0.1；上限 1.0。
pub fn score_confidence(intent: QuestionIntent, question_text: &str, text_lower: &str) -> f64 {
    let mut confidence = BASE_CONFIDENCE;
    if intent != QuestionIntent::General {
        confidence += KNOWN_INTENT_BONUS;
    }
    if question_text.chars().count() < SHORT_QUESTION_CHARS {
        confidence += SHORT_QUESTION_BONUS;
    }
    if UNAMBIGUOUS_KEYWORDS.iter().any(|k| text_lower.contains(k)) {
        confidence += KEYWORD_BONUS;
    }
    confidence.min(1.0)
}

fn reasoning_for(intent: QuestionIntent, answer: &AnswerValue) -> String {
    match intent {
        QuestionIntent::Qualification => {
            format!("Qualification question; answered from experience: {}", answer)
        }
        QuestionIntent::Availability => {
            format!("Availability question; answered with start availability: {}", answer)
        }
        QuestionIntent::Location => {
            format!("Location question; answered from relocation preference: {}", answer)
        }
        QuestionIntent::Legal => {
            format!("Legal question; answered from work authorization status: {}", answer)
        }
        QuestionIntent::Compensation => {
            format!("Compensation question; answered with salary expectation: {}", answer)
        }
        QuestionIntent::Skills => format!("Skills question; answered from skill list: {}", answer),
        QuestionIntent::CultureFit => {
            format!("Culture fit question; answered with job-context sentence: {}", answer)
        }
        QuestionIntent::Commitment => {
            format!("Commitment question; answered affirmatively: {}", answer)
        }
        QuestionIntent::Education => {
            format!("Education question; answered from education level: {}", answer)
        }
        QuestionIntent::Schedule => {
            format!("Schedule question; answered with flexibility: {}", answer)
        }
        QuestionIntent::General => {
            format!("No specific intent detected; conservative default: {}", answer)
        }
    }
}

/// 保守默认答案：布尔取有利选项，枚举取中间项，文本取中性肯定句
fn fallback_answer(answer_type: &AnswerType, options: &[QuestionOption], text: &str) -> AnswerValue {
    if *answer_type == AnswerType::Boolean {
        return AnswerValue::Bool(true);
    }
    if let Some(option) = middle_option(options) {
        return AnswerValue::Text(option.value.clone());
    }
    if text.is_empty() {
        AnswerValue::Text("Yes".to_string())
    } else {
        AnswerValue::Text(text.to_string())
    }
}

/// 中间选项，刻意避开两端
pub fn middle_option(options: &[QuestionOption]) -> Option<&QuestionOption> {
    options.get(options.len() / 2)
}

/// 两个选项且分别为 yes / no
pub fn is_yes_no(options: &[QuestionOption]) -> bool {
    if options.len() != 2 {
        return false;
    }
    let normalized: Vec<String> = options
        .iter()
        .map(|o| o.label.trim().to_lowercase())
        .collect();
    let has_yes = normalized.iter().any(|l| YES_WORDS.contains(&l.as_str()));
    let has_no = normalized.iter().any(|l| NO_WORDS.contains(&l.as_str()));
    has_yes && has_no
}

fn find_word_option<'a>(words: &[&str], options: &'a [QuestionOption]) -> Option<&'a QuestionOption> {
    options.iter().find(|o| {
        let label = o.label.trim().to_lowercase();
        let first_word = label
            .split(|c: char| !c.is_alphanumeric())
            .next()
            .unwrap_or_default();
        words.contains(&first_word)
    })
}

/// 布尔答案对应的 Yes / No 选项
pub fn match_boolean_option(value: bool, options: &[QuestionOption]) -> Option<&QuestionOption> {
    find_word_option(if value { YES_WORDS } else { NO_WORDS }, options)
}

/// 数值区间匹配，例如 3 → "3-5 years"，12 → "10+ years"
pub fn match_numeric_option(value: f64, options: &[QuestionOption]) -> Option<&QuestionOption> {
    let re = NUMBER.as_ref()?;
    options.iter().find(|option| {
        let label = option.label.to_lowercase().replace(',', "");
        let numbers: Vec<f64> = re
            .find_iter(&label)
            .filter_map(|m| m.as_str().parse().ok())
            .collect();
        match numbers.as_slice() {
            [low, high, ..] => value >= *low && value <= *high,
            [only] => {
                if label.contains('+')
                    || label.contains("more than")
                    || label.contains("over")
                    || label.contains("at least")
                    || label.contains("or more")
                {
                    value >= *only
                } else if label.contains("less than")
                    || label.contains("under")
                    || label.contains("fewer than")
                {
                    value < *only
                } else {
                    (value - *only).abs() < f64::EPSILON
                }
            }
            [] => false,
        }
    })
}

/// 文本匹配：完全相同优先，其次互相包含（忽略大小写）
pub fn match_text_option<'a>(value: &str, options: &'a [QuestionOption]) -> Option<&'a QuestionOption> {
    let value = value.trim().to_lowercase();
    if value.is_empty() {
        return None;
    }
    options
        .iter()
        .find(|o| o.label.trim().to_lowercase() == value || o.value.trim().to_lowercase() == value)
        .or_else(|| {
            options.iter().find(|o| {
                let label = o.label.trim().to_lowercase();
                !label.is_empty() && (label.contains(&value) || value.contains(&label))
            })
        })
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn with_article(title: &str) -> String {
    if title == "this role" {
        return title.to_string();
    }
    let article = match title.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    };
    format!("{} {}", article, title)
}
