pub mod aggregate;
pub mod sentiment;
pub mod streaks;
