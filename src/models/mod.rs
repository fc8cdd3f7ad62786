pub mod document;
pub mod loaders;
pub mod outcome;
pub mod page;
pub mod profile;
pub mod question;
pub mod validation;

pub use document::{DocumentSource, DocumentType, DocumentUploadResult, SourceType};
pub use loaders::{
    load_application_plan, parse_application_plan, ApplicationPlan, ApplicationTarget,
    DocumentPaths,
};
pub use outcome::{AnsweredQuestion, ApplicationOutcome};
pub use page::{NavigationButtonKind, PageIndicator, PageInfo};
pub use profile::{ApplicantProfile, JobContext};
pub use question::{
    AnswerType, AnswerValue, QuestionAnalysis, QuestionIntent, QuestionOption, ScreeningQuestion,
};
pub use validation::ValidationError;
