pub mod payment;
pub mod status;
pub mod user;
