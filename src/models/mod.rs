//! TestRail records and the local result vocabulary.

pub mod case_id;
pub mod page;
pub mod plan;
pub mod status;
pub mod test_case;
pub mod test_result;
pub mod test_suite;

// Re-export commonly used types
pub use case_id::{extract_case_id, validate_case_id};
pub use page::{Page, PageLinks};
pub use plan::{NewPlan, NewPlanEntry, Plan, PlanEntry, PlanEntryUpdate, Run};
pub use status::{ResultStatus, Status};
pub use test_case::{Test, TestCase};
pub use test_result::{
    NewResult, ResultForCase, ResultRecord, ResultTable, ResultsForCases, StatusComment,
};
pub use test_suite::{Project, Suite};
