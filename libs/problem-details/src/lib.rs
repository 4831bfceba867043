//! Problem details data model
//!
//! Pure data types shared by the API behavior policy and whatever renders
//! responses onto the wire. It includes:
//! - RFC 7807 Problem Details (`ProblemDetails`, `ValidationProblemDetails`)
//! - Well-known client error templates (`ProblemDef`)
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod defs;
pub mod problem;

pub use defs::{CLIENT_ERRORS, ProblemDef};
pub use problem::{
    ABOUT_BLANK, APPLICATION_PROBLEM_JSON, ProblemDetails, RESERVED_MEMBERS, TRACE_ID_EXTENSION,
    VALIDATION_PROBLEM_TITLE, ValidationProblemDetails,
};
