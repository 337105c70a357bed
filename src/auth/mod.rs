pub mod auth;
pub mod jwt;
pub mod kiosk;
pub mod middleware;
