pub mod auth;
pub mod navigation;
pub mod permissions;
pub mod reports;
pub mod scanner;
pub mod users;
