pub mod access;
pub mod auth;
pub mod department;
pub mod permission;
pub mod report;
pub mod scan;
