pub mod plan_loader;

pub use plan_loader::{
    load_application_plan, parse_application_plan, ApplicationPlan, ApplicationTarget,
    DocumentPaths,
};
