pub mod postgres_repository;
pub mod session;
pub mod settings;
pub mod sqlite_repository;
pub mod ticket;
pub mod user;

use crate::database::session::SessionStore;
use crate::database::settings::SettingsRepository;
use crate::database::ticket::TicketRepository;
use crate::database::user::UserRepository;
use std::sync::Arc;

/// Everything the routes need from durable storage, whichever backend is wired in.
pub trait Repository: SessionStore + UserRepository + TicketRepository + SettingsRepository {}

impl<T> Repository for T where T: SessionStore + UserRepository + TicketRepository + SettingsRepository {}

pub type Store = Arc<dyn Repository>;
