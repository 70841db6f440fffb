//! TestRail synchronization library.
//!
//! Provides a typed client over the TestRail REST API and an engine that
//! uploads locally produced test results into TestRail plans and runs,
//! creating missing plans, runs and case memberships along the way.

pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod services;
