pub mod checkin;
pub mod idcard;
pub mod registration;
