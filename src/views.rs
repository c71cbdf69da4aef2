use crate::auth::CurrentUser;
use crate::models::status::SystemStatus;
use crate::models::ticket::{AssigneeType, Ticket};
use rocket::response::content::RawHtml;

pub const TITLE: &str = "Team Dashboard";

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn page(title: &str, body_class: &str, body: &str) -> RawHtml<String> {
    RawHtml(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
</head>
<body class="{body_class}">
{body}
</body>
</html>"#,
        title = escape_html(title),
        body_class = body_class,
        body = body,
    ))
}

pub fn render_login(show_error: bool) -> RawHtml<String> {
    let error = if show_error {
        r#"<p class="error">Your account is not allowed to access this dashboard.</p>"#
    } else {
        ""
    };

    let body = format!(
        r#"  <main class="login-box">
    <h1>{TITLE}</h1>
    <p class="muted">Sign in with your team Google account to manage tickets and view system status.</p>
    {error}
    <a href="/auth/google" class="btn btn-google">Sign in with Google</a>
  </main>"#
    );

    page(&format!("Log in - {TITLE}"), "login-page", &body)
}

pub struct DashboardView<'a> {
    pub user: &'a CurrentUser,
    pub status: &'a SystemStatus,
    pub tickets: &'a [Ticket],
    pub bot_enabled: bool,
}

fn assignee_label(ticket: &Ticket) -> String {
    match ticket.assigned_to_type {
        AssigneeType::Bot => "Bot".to_string(),
        AssigneeType::Human => ticket
            .assigned_to_name
            .as_deref()
            .or(ticket.assigned_to_email.as_deref())
            .unwrap_or("Unassigned person")
            .to_string(),
    }
}

fn ticket_row(ticket: &Ticket) -> String {
    let order = ticket.order_number.as_deref().unwrap_or("-");
    let phone = ticket.customer_phone.as_deref().unwrap_or("-");

    format!(
        r#"        <tr data-ticket-id="{id}">
          <td>{id}</td>
          <td>{summary}</td>
          <td>{order} / {phone}</td>
          <td><span class="badge badge-{status}">{status}</span></td>
          <td>{assignee}</td>
          <td>{updated}</td>
        </tr>
"#,
        id = ticket.id,
        summary = escape_html(&ticket.summary),
        order = escape_html(order),
        phone = escape_html(phone),
        status = ticket.status.as_str(),
        assignee = escape_html(&assignee_label(ticket)),
        updated = ticket.updated_at.format("%Y-%m-%d %H:%M UTC"),
    )
}

pub fn render_dashboard(view: &DashboardView<'_>) -> RawHtml<String> {
    let (status_class, status_label) = if view.status.live { ("live", "Live") } else { ("down", "Down") };

    let sessions = view
        .status
        .sessions_count
        .map(|count| format!(r#"<div class="status-card"><strong>{count} sessions</strong></div>"#))
        .unwrap_or_default();

    let rows: String = if view.tickets.is_empty() {
        r#"        <tr><td colspan="6" class="muted">No tickets yet.</td></tr>
"#
        .to_string()
    } else {
        view.tickets.iter().map(ticket_row).collect()
    };

    let body = format!(
        r#"  <header class="header">
    <h1 class="logo">{TITLE}</h1>
    <div class="user-menu">
      <span class="user-name">{user}</span>
      <a href="/logout" class="btn btn-ghost">Log out</a>
    </div>
  </header>
  <main class="main">
    <section class="section status-section">
      <h2>System status</h2>
      <div class="status-card {status_class}"><strong>{status_label}</strong><p class="muted">{status_message}</p></div>
      {sessions}
    </section>
    <section class="section bot-control-section">
      <h2>Bot control</h2>
      <p id="bot-state" data-enabled="{bot_flag}">{bot_label}</p>
    </section>
    <section class="section">
      <h2>Tickets</h2>
      <table class="ticket-table">
        <thead>
          <tr><th>Id</th><th>Summary</th><th>Order / Customer</th><th>Status</th><th>Assigned to</th><th>Updated</th></tr>
        </thead>
        <tbody>
{rows}        </tbody>
      </table>
    </section>
  </main>"#,
        user = escape_html(view.user.display_name()),
        status_message = escape_html(&view.status.message),
        bot_flag = if view.bot_enabled { "1" } else { "0" },
        bot_label = if view.bot_enabled { "Bot is ON" } else { "Bot is OFF" },
    );

    page(&format!("Dashboard - {TITLE}"), "dashboard", &body)
}
