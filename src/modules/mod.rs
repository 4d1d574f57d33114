pub mod auth;
pub mod disputes;
pub mod jobs;
pub mod moderation;
pub mod payments;
