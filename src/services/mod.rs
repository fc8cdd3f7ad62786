pub mod document_handler;
pub mod llm_service;
pub mod outcome_writer;
pub mod page_navigator;
pub mod question_analyzer;
pub mod validation_handler;

pub use document_handler::CustomDocumentHandler;
pub use llm_service::{AnswerEscalation, LlmService};
pub use outcome_writer::OutcomeWriter;
pub use page_navigator::{PageNavigator, TransitionState};
pub use question_analyzer::QuestionAnalyzer;
pub use validation_handler::ValidationHandler;
