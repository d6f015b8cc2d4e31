// Inbound HTTP surface: method dispatch and write authentication
pub mod auth;
pub mod credentials;
pub mod handlers;
