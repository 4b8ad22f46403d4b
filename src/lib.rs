//! Profile Leads API Library
//!
//! Lead-capture and analytics backend for the profile-optimization landing
//! page, plus the client-core state machines that drive it: the three-step
//! optimize modal, the cookie-consent machine, and the consent-gated event
//! tracker.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `consent`: Cookie-consent state machine and analytics-state scrub.
//! - `db`: Database connection and pool management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `modal`: Lead submission flow (intent → form → confirmation).
//! - `models`: Core data models and the funnel event set.
//! - `store`: Swappable lead persistence (Postgres / in-memory).
//! - `tracker`: Consent-gated, fire-and-forget event tracker.
//! - `validation`: Shared form validation predicates.

pub mod config;
pub mod consent;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod modal;
pub mod models;
pub mod store;
pub mod tracker;
pub mod validation;
