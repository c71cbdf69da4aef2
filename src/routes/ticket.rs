use crate::auth::CurrentUser;
use crate::database::Store;
use crate::database::ticket::TicketRepository;
use crate::database::user::UserRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::ticket::{
    AssignTicketRequest, CreateTicketRequest, TICKET_NOT_FOUND, Ticket, UpdateTicketStatusRequest, clamp_limit, parse_ticket_id,
};
use rocket::serde::json::Json;
use rocket::{State, get, patch, post};
use rocket_okapi::openapi;
use tracing::info;

fn ticket_not_found() -> AppError {
    AppError::NotFound(TICKET_NOT_FOUND.to_string())
}

/// List tickets, most recently updated first
#[openapi(tag = "Tickets")]
#[get("/tickets?<limit>")]
pub async fn list_tickets(store: &State<Store>, _current_user: CurrentUser, limit: Option<i64>) -> Result<Json<Vec<Ticket>>, AppError> {
    let tickets = store.list_tickets(clamp_limit(limit)).await?;
    Ok(Json(tickets))
}

/// Create a ticket; it starts open and assigned to the bot
#[openapi(tag = "Tickets")]
#[post("/tickets", data = "<payload>")]
pub async fn create_ticket(store: &State<Store>, current_user: CurrentUser, payload: JsonBody<CreateTicketRequest>) -> Result<Json<Ticket>, AppError> {
    let new_ticket = payload.into_inner().into_new_ticket()?;
    let ticket = store.create_ticket(&new_ticket, Some(current_user.id)).await?;

    info!(ticket_id = ticket.id, user_id = current_user.id, "ticket created");
    Ok(Json(ticket))
}

/// Hand a ticket to the bot or to a person
#[openapi(tag = "Tickets")]
#[patch("/tickets/<id>/assign", data = "<payload>")]
pub async fn assign_ticket(
    store: &State<Store>,
    current_user: CurrentUser,
    id: &str,
    payload: JsonBody<AssignTicketRequest>,
) -> Result<Json<Ticket>, AppError> {
    let id = parse_ticket_id(id)?;
    let assignment = payload.assignment()?;

    if let Some(user_id) = assignment.user_id
        && store.get_user_by_id(user_id).await?.is_none()
    {
        return Err(AppError::BadRequest("assigned user not found".to_string()));
    }

    let ticket = store.assign_ticket(id, &assignment).await?.ok_or_else(ticket_not_found)?;

    info!(
        ticket_id = ticket.id,
        user_id = current_user.id,
        assigned_to_type = ticket.assigned_to_type.as_str(),
        assigned_to_user_id = ?ticket.assigned_to_user_id,
        "ticket assigned"
    );
    Ok(Json(ticket))
}

/// Move a ticket through open, in_progress, resolved and closed
#[openapi(tag = "Tickets")]
#[patch("/tickets/<id>/status", data = "<payload>")]
pub async fn update_ticket_status(
    store: &State<Store>,
    current_user: CurrentUser,
    id: &str,
    payload: JsonBody<UpdateTicketStatusRequest>,
) -> Result<Json<Ticket>, AppError> {
    let id = parse_ticket_id(id)?;
    let status = payload.status()?;

    let ticket = store.update_ticket_status(id, status).await?.ok_or_else(ticket_not_found)?;

    info!(ticket_id = ticket.id, user_id = current_user.id, status = status.as_str(), "ticket status changed");
    Ok(Json(ticket))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![list_tickets, create_ticket, assign_ticket, update_ticket_status]
}
