pub mod auth;
pub mod error;
pub mod health;
pub mod page;
pub mod settings;
pub mod status;
pub mod ticket;
pub mod user;
