//! # Chatbot
//!
//! Every question gets a fresh snapshot of the whole dashboard:
//!
//! 1. Fetch the six collections concurrently. One failure fails the request.
//! 2. Render each document into its dark-theme HTML card. Missing fields show `-`.
//! 3. Empty collections render a fixed placeholder so the section never disappears.
//! 4. Concatenate under the dashboard heading in a fixed order.
//! 5. Send context + question to the completion API and return the reply untouched.
use directory::{
    Document, DocumentStore, Fields, StoreError,
    record::truthy,
    store::{EVENTS, FUNDRAISING, INTERNSHIPS, MENTORSHIP, NOTIFICATIONS, USERS},
};
use tracing::info;

use crate::{completion::ChatCompletion, error::AppError};

pub const SYSTEM_PROMPT: &str = "You are an AI Alumni Assistant. Present data clearly in HTML, using dark-themed cards, bold text, emojis, and line breaks. Be polite and conversational.";

pub const NO_EVENTS: &str = "<p>No upcoming events.</p>";
pub const NO_FUNDRAISING: &str = "<p>No fundraising campaigns.</p>";
pub const NO_INTERNSHIPS: &str = "<p>No internships available.</p>";
pub const NO_NOTIFICATIONS: &str = "<p>No notifications.</p>";
pub const NO_MENTORSHIP: &str = "<p>No mentorship programs.</p>";
pub const NO_DIRECTORY: &str = "<p>No alumni directory data.</p>";

#[derive(Debug, Default)]
pub struct Collections {
    pub events: Vec<Document>,
    pub fundraising: Vec<Document>,
    pub internships: Vec<Document>,
    pub notifications: Vec<Document>,
    pub mentorship: Vec<Document>,
    pub users: Vec<Document>,
}

pub async fn fetch_collections(store: &dyn DocumentStore) -> Result<Collections, StoreError> {
    let (events, fundraising, internships, notifications, users, mentorship) = tokio::try_join!(
        store.list(EVENTS),
        store.list(FUNDRAISING),
        store.list(INTERNSHIPS),
        store.list(NOTIFICATIONS),
        store.list(USERS),
        store.list(MENTORSHIP),
    )?;

    Ok(Collections {
        events,
        fundraising,
        internships,
        notifications,
        mentorship,
        users,
    })
}

fn or(fields: &Fields, key: &str, fallback: &str) -> String {
    fields
        .get(key)
        .and_then(truthy)
        .unwrap_or_else(|| fallback.to_string())
}

fn dash(fields: &Fields, key: &str) -> String {
    or(fields, key, "-")
}

fn render(documents: &[Document], empty: &str, card: fn(&Fields) -> String) -> String {
    if documents.is_empty() {
        return empty.to_string();
    }

    documents.iter().map(|d| card(&d.fields)).collect()
}

fn event_card(e: &Fields) -> String {
    format!(
        r#"
<div style="border:1px solid #2e86de; border-radius:10px; padding:10px; margin-bottom:10px; background-color:#1b2a41;">
  <h4 style="margin:0; color:#54a0ff;">📅 {}</h4>
  <p style="margin:5px 0; color:#dfe6e9;">
    <strong>Type:</strong> {}<br>
    <strong>Date:</strong> {}<br>
    <strong>Organizer:</strong> {}<br>
    {}
  </p>
</div>"#,
        dash(e, "title"),
        dash(e, "type"),
        dash(e, "date"),
        dash(e, "organizer"),
        dash(e, "description"),
    )
}

fn fundraising_card(f: &Fields) -> String {
    format!(
        r#"
<div style="border:1px solid #00b894; border-radius:10px; padding:10px; margin-bottom:10px; background-color:#1e2d24;">
  <h4 style="margin:0; color:#00cec9;">💰 {}</h4>
  <p style="margin:5px 0; color:#dfe6e9;">
    <strong>Raised:</strong> {} / {}<br>
    <strong>Purpose:</strong> {}<br>
    <strong>Deadline:</strong> {}
  </p>
</div>"#,
        dash(f, "title"),
        or(f, "raised", "0"),
        or(f, "goal", "0"),
        dash(f, "purpose"),
        dash(f, "deadline"),
    )
}

fn internship_card(i: &Fields) -> String {
    format!(
        r#"
<div style="border:1px solid #fdcb6e; border-radius:10px; padding:10px; margin-bottom:10px; background-color:#3e2d1f;">
  <h4 style="margin:0; color:#ffeaa7;">💼 {}</h4>
  <p style="margin:5px 0; color:#dfe6e9;">
    <strong>Company:</strong> {}<br>
    <strong>Duration:</strong> {}<br>
    {}
  </p>
</div>"#,
        dash(i, "title"),
        dash(i, "company"),
        dash(i, "duration"),
        dash(i, "description"),
    )
}

fn notification_card(n: &Fields) -> String {
    format!(
        r#"
<div style="border:1px solid #636e72; border-radius:10px; padding:10px; margin-bottom:10px; background-color:#2d3436;">
  <h4 style="margin:0; color:#b2bec3;">🔔 {}</h4>
  <p style="margin:5px 0; color:#dfe6e9;">
    {}<br>
    <strong>Date:</strong> {}
  </p>
</div>"#,
        dash(n, "title"),
        dash(n, "message"),
        dash(n, "date"),
    )
}

fn mentorship_card(m: &Fields) -> String {
    format!(
        r#"
<div style="border:1px solid #6c5ce7; border-radius:10px; padding:10px; margin-bottom:10px; background-color:#2b1e4a;">
  <h4 style="margin:0; color:#a29bfe;">🧑‍🏫 {}</h4>
  <p style="margin:5px 0; color:#dfe6e9;">
    <strong>Expertise:</strong> {}<br>
    <strong>Contact:</strong> {}
  </p>
</div>"#,
        dash(m, "mentorName"),
        dash(m, "expertise"),
        dash(m, "contact"),
    )
}

// Raw keys on purpose: the card shows what is stored, not the normalized view.
fn directory_card(u: &Fields) -> String {
    format!(
        r#"
<div style="border:1px solid #00cec9; border-radius:10px; padding:10px; margin-bottom:10px; background-color:#1e3c3c;">
  <h4 style="margin:0; color:#81ecec;">🎓 {}</h4>
  <p style="margin:5px 0; color:#dfe6e9;">
    <strong>Role:</strong> {}<br>
    <strong>College:</strong> {}<br>
    <strong>Profession:</strong> {}<br>
    <strong>Batch:</strong> {}<br>
    <strong>Grad Year:</strong> {}<br>
    <strong>Company:</strong> {}<br>
    <strong>City:</strong> {}<br>
    <strong>Email:</strong> {}
  </p>
</div>"#,
        dash(u, "name"),
        dash(u, "role"),
        dash(u, "college"),
        dash(u, "profession"),
        dash(u, "batch"),
        dash(u, "gradYear"),
        dash(u, "company"),
        dash(u, "city"),
        dash(u, "email"),
    )
}

pub fn build_context(collections: &Collections) -> String {
    format!(
        r#"
<h2>📢 Alumni Dashboard</h2>

<h3>📅 Events:</h3>
{}

<h3>💰 Fundraising:</h3>
{}

<h3>💼 Internships:</h3>
{}

<h3>🔔 Notifications:</h3>
{}

<h3>🧑‍🏫 Mentorship Programs:</h3>
{}

<h3>🎓 Alumni Directory:</h3>
{}
"#,
        render(&collections.events, NO_EVENTS, event_card),
        render(&collections.fundraising, NO_FUNDRAISING, fundraising_card),
        render(&collections.internships, NO_INTERNSHIPS, internship_card),
        render(&collections.notifications, NO_NOTIFICATIONS, notification_card),
        render(&collections.mentorship, NO_MENTORSHIP, mentorship_card),
        render(&collections.users, NO_DIRECTORY, directory_card),
    )
}

pub fn user_prompt(context: &str, message: &str) -> String {
    format!("Alumni database:\n{context}\n\nUser question: {message}")
}

pub async fn answer(
    store: &dyn DocumentStore,
    completion: &dyn ChatCompletion,
    message: &str,
) -> Result<String, AppError> {
    let collections = fetch_collections(store)
        .await
        .map_err(|e| AppError::Chatbot(Box::new(e)))?;

    let context = build_context(&collections);
    info!("Built chatbot context ({} bytes)", context.len());

    let reply = completion
        .complete(SYSTEM_PROMPT, &user_prompt(&context, message))
        .await?;

    Ok(reply)
}
