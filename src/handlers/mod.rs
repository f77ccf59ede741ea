//! API handlers for PremiAds

mod admin;
mod missions;
mod moderation;
mod notifications;
mod payments;
mod raffles;

pub use admin::*;
pub use missions::*;
pub use moderation::*;
pub use notifications::*;
pub use payments::*;
pub use raffles::*;
