pub mod analytics;
pub mod auth;
pub mod checkins;
pub mod goals;
pub mod health;
pub mod insights;
pub mod journal;
pub mod oauth;
