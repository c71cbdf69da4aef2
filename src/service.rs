pub mod auth;
pub mod oauth;
pub mod status;
