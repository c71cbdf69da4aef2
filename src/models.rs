pub mod health;
pub mod session;
pub mod settings;
pub mod status;
pub mod ticket;
pub mod user;
