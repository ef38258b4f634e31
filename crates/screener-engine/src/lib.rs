//! screener-engine
//!
//! The questionnaire wizard: per-question validation, the step controller
//! state machine, and the values a caller needs around it (settings,
//! version rollout, persistence seam, analytics-safe reports). Every
//! operation takes a snapshot and returns a new one; nothing here blocks or
//! keeps state between calls.

pub mod catalog;
pub mod error;
pub mod report;
pub mod session;
pub mod settings;
pub mod store;
pub mod validate;
