use crate::auth::CurrentUser;
use crate::config::Config;
use crate::database::Store;
use crate::database::settings::SettingsRepository;
use crate::database::ticket::TicketRepository;
use crate::error::app_error::AppError;
use crate::models::ticket::DEFAULT_TICKET_LIMIT;
use crate::service::status::fetch_system_status;
use crate::views::{DashboardView, render_dashboard, render_login};
use rocket::response::Redirect;
use rocket::response::content::RawHtml;
use rocket::{Responder, State, get};

pub const LOGIN_PATH: &str = "/login";

#[derive(Responder)]
pub enum Page {
    Html(RawHtml<String>),
    Redirect(Redirect),
}

/// The dashboard itself; anonymous visitors are sent to the login page.
#[get("/")]
pub async fn dashboard(
    current_user: Result<CurrentUser, AppError>,
    store: &State<Store>,
    config: &State<Config>,
    http: &State<reqwest::Client>,
) -> Result<Page, AppError> {
    let user = match current_user {
        Ok(user) => user,
        Err(AppError::Unauthorized) => return Ok(Page::Redirect(Redirect::found(LOGIN_PATH))),
        Err(e) => return Err(e),
    };

    let (status, tickets, bot_enabled) = tokio::join!(
        fetch_system_status(http, &config.gateway),
        store.list_tickets(DEFAULT_TICKET_LIMIT),
        store.is_bot_enabled(),
    );
    let tickets = tickets?;

    Ok(Page::Html(render_dashboard(&DashboardView {
        user: &user,
        status: &status,
        tickets: &tickets,
        bot_enabled: bot_enabled?,
    })))
}

#[get("/login?<error>")]
pub async fn login(current_user: Option<CurrentUser>, error: Option<String>) -> Page {
    if current_user.is_some() {
        return Page::Redirect(Redirect::found("/"));
    }

    Page::Html(render_login(error.as_deref() == Some("unauthorized")))
}

pub fn routes() -> Vec<rocket::Route> {
    rocket::routes![dashboard, login]
}
