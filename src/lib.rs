//! Founder profile engine: profile store, completion scoring and the
//! onboarding wizard behind a small dashboard API.

pub mod config;
pub mod error;
pub mod onboarding;
pub mod profile;
pub mod routes;
pub mod store;
pub mod sync;
