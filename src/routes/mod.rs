//! Route definitions for the PremiAds server

mod admin;
mod functions;
mod missions;
mod notifications;
mod raffles;

pub use admin::admin_routes;
pub use functions::{moderation_routes, payment_routes};
pub use missions::mission_routes;
pub use notifications::notification_routes;
pub use raffles::raffle_routes;
