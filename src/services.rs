pub mod auth;
pub mod document_service;
pub mod navigation;
pub mod permission_service;
pub mod qr_service;
pub mod report_service;
pub mod scanner_service;
pub mod user_service;
