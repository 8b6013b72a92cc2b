pub mod credentials;
pub mod password;
pub mod token;
