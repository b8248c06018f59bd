pub mod checkin;
pub mod goal;
pub mod journal;
pub mod response;
pub mod user;
