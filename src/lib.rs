//! Storefront client pieces: the authenticated offer lookup and the product
//! form submission pipeline, plus the HTTP plumbing they share.

pub mod config;
pub mod http;
pub mod metrics;
pub mod models;
pub mod security;
pub mod storefront;
pub mod submission;
