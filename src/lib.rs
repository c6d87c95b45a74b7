//! Lead Capture API Library
//!
//! Ingests web contact-form submissions and turns each one into CRM records
//! (contact, company, deal) plus two notification emails, while resisting
//! spam and tolerating partial failure of either downstream service.
//!
//! # Modules
//!
//! - `compose`: Deal naming and email body composition.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and the request orchestration.
//! - `hubspot`: CRM object API client.
//! - `lead`: Submission validation and normalization.
//! - `mailer`: Transactional-email dispatch with idempotency keys.
//! - `models`: Core data models and wire types.
//! - `rate_limit`: Per-client fixed-window rate limiting.

pub mod compose;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod hubspot;
pub mod lead;
pub mod mailer;
pub mod models;
pub mod rate_limit;
