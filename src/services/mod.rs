//! Validation, status mapping, reconciliation and upload.

pub mod reconcile;
pub mod status_map;
pub mod uploader;
pub mod validator;

pub use reconcile::{ReconcileRequest, ResultLogger, clean_plan_name};
pub use status_map::{StatusMap, StatusOverrides};
pub use uploader::{ResultUploader, UploadResult};
pub use validator::ParamValidator;
