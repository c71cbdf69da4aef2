use crate::database::postgres_repository::PostgresRepository;
use crate::database::sqlite_repository::SqliteRepository;
use crate::error::app_error::AppError;
use crate::models::ticket::{Assignment, NewTicket, TICKET_NOT_FOUND, Ticket, TicketRow, TicketStatus};
use chrono::Utc;

#[async_trait::async_trait]
pub trait TicketRepository: Send + Sync {
    /// Most recently updated first, ties broken by newest id.
    async fn list_tickets(&self, limit: i64) -> Result<Vec<Ticket>, AppError>;
    async fn get_ticket_by_id(&self, id: i64) -> Result<Option<Ticket>, AppError>;
    async fn create_ticket(&self, ticket: &NewTicket, created_by: Option<i64>) -> Result<Ticket, AppError>;
    /// `Ok(None)` when no ticket has this id.
    async fn assign_ticket(&self, id: i64, assignment: &Assignment) -> Result<Option<Ticket>, AppError>;
    /// `Ok(None)` when no ticket has this id.
    async fn update_ticket_status(&self, id: i64, status: TicketStatus) -> Result<Option<Ticket>, AppError>;
}

const TICKET_SELECT: &str = r#"
    SELECT t.id, t.external_id, t.customer_phone, t.order_number, t.summary, t.status,
           t.assigned_to_type, t.assigned_to_user_id,
           u.name AS assigned_to_name, u.email AS assigned_to_email,
           t.created_by_user_id, t.created_at, t.updated_at
    FROM tickets t
    LEFT JOIN users u ON t.assigned_to_type = 'human' AND t.assigned_to_user_id = u.id
"#;

fn map_insert_error(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::Conflict("ticket with this external_id already exists".to_string()),
        _ => AppError::db("Failed to create ticket", e),
    }
}

fn into_tickets(rows: Vec<TicketRow>) -> Result<Vec<Ticket>, AppError> {
    rows.into_iter().map(Ticket::try_from).collect()
}

fn created(ticket: Option<Ticket>) -> Result<Ticket, AppError> {
    ticket.ok_or_else(|| AppError::NotFound(TICKET_NOT_FOUND.to_string()))
}

#[async_trait::async_trait]
impl TicketRepository for PostgresRepository {
    async fn list_tickets(&self, limit: i64) -> Result<Vec<Ticket>, AppError> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!("{} ORDER BY t.updated_at DESC, t.id DESC LIMIT $1", TICKET_SELECT))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        into_tickets(rows)
    }

    async fn get_ticket_by_id(&self, id: i64) -> Result<Option<Ticket>, AppError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!("{} WHERE t.id = $1", TICKET_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Ticket::try_from).transpose()
    }

    async fn create_ticket(&self, ticket: &NewTicket, created_by: Option<i64>) -> Result<Ticket, AppError> {
        let now = Utc::now();
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO tickets (external_id, customer_phone, order_number, summary, status,
                                 assigned_to_type, assigned_to_user_id, created_by_user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 'open', 'bot', NULL, $5, $6, $6)
            RETURNING id
            "#,
        )
        .bind(&ticket.external_id)
        .bind(&ticket.customer_phone)
        .bind(&ticket.order_number)
        .bind(&ticket.summary)
        .bind(created_by)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        created(self.get_ticket_by_id(id).await?)
    }

    async fn assign_ticket(&self, id: i64, assignment: &Assignment) -> Result<Option<Ticket>, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE tickets
            SET assigned_to_type = $1, assigned_to_user_id = $2, updated_at = $3
            WHERE id = $4
            "#,
        )
        .bind(assignment.assignee_type.as_str())
        .bind(assignment.user_id)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_ticket_by_id(id).await
    }

    async fn update_ticket_status(&self, id: i64, status: TicketStatus) -> Result<Option<Ticket>, AppError> {
        let result = sqlx::query("UPDATE tickets SET status = $1, updated_at = $2 WHERE id = $3")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_ticket_by_id(id).await
    }
}

#[async_trait::async_trait]
impl TicketRepository for SqliteRepository {
    async fn list_tickets(&self, limit: i64) -> Result<Vec<Ticket>, AppError> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!("{} ORDER BY t.updated_at DESC, t.id DESC LIMIT ?", TICKET_SELECT))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        into_tickets(rows)
    }

    async fn get_ticket_by_id(&self, id: i64) -> Result<Option<Ticket>, AppError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!("{} WHERE t.id = ?", TICKET_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Ticket::try_from).transpose()
    }

    async fn create_ticket(&self, ticket: &NewTicket, created_by: Option<i64>) -> Result<Ticket, AppError> {
        let now = Utc::now();
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO tickets (external_id, customer_phone, order_number, summary, status,
                                 assigned_to_type, assigned_to_user_id, created_by_user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, 'open', 'bot', NULL, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&ticket.external_id)
        .bind(&ticket.customer_phone)
        .bind(&ticket.order_number)
        .bind(&ticket.summary)
        .bind(created_by)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        created(self.get_ticket_by_id(id).await?)
    }

    async fn assign_ticket(&self, id: i64, assignment: &Assignment) -> Result<Option<Ticket>, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE tickets
            SET assigned_to_type = ?, assigned_to_user_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(assignment.assignee_type.as_str())
        .bind(assignment.user_id)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_ticket_by_id(id).await
    }

    async fn update_ticket_status(&self, id: i64, status: TicketStatus) -> Result<Option<Ticket>, AppError> {
        let result = sqlx::query("UPDATE tickets SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_ticket_by_id(id).await
    }
}
