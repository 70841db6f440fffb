//! TestRail E2E test suite.
//!
//! Drives the client, validator, reconciliation engine and uploader against
//! an in-process mock TestRail server. No external services are needed.
//!
//! Run with: cargo test --test testrail_e2e


mod test_gateway;
mod test_validator;
