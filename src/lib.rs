//! PremiAds server library
//!
//! Moderation gateway, payment reconciliation and the participant API,
//! backed by a hosted Supabase project.

pub mod app;
pub mod auth;
pub mod baas;
pub mod config;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod middleware;
pub mod missions;
pub mod models;
pub mod moderation;
pub mod notifications;
pub mod payments;
pub mod raffles;
pub mod routes;
pub mod state;

pub use app::build_router;
