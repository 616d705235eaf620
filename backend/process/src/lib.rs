//! # Directory CLI
//!
//! Terminal front end for the alumni directory.
//!
//! ## Model
//!
//! - The server only hands out raw user documents
//! - Normalization, search, filters and sorting all happen here, through
//!   [`directory::DirectoryView`], exactly as a browser client would do them
//! - Admin mutations are checked locally first (role, required fields), then
//!   sent to the server, then the list is refetched
//!
//! ## Identity
//!
//! `--uid` / `--role` (or `ALUMNI_UID` / `ALUMNI_ROLE`) are forwarded as the
//! headers the authenticating proxy would normally set.
//!
//! ## Examples
//!
//! ```sh
//! process list --search san --member-role alumni --sort name --sort name
//! process list --options
//! process --uid u1 --role admin add --name Asha --email asha@alumni.org --member-role alumni
//! process --uid u1 --role admin import members.json
//! process ask "Which internships are open?"
//! ```
use anyhow::{Context, Result, bail};
use chrono::Utc;
use directory::{
    Actor, Criteria, DirectoryView, DocumentStore, Field, MemberForm,
    member::authorize,
    store::USERS,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::warn;

pub mod models;
pub mod utils;

use models::{ChatbotReply, ChatbotRequest, HttpStore, check};
use utils::{import_fields, import_id, render_options, render_table};

pub struct ListQuery {
    pub criteria: Criteria,
    pub sort: Vec<Field>,
    pub options: bool,
}

pub async fn list(store: &HttpStore, query: ListQuery) -> Result<String> {
    let mut view = DirectoryView::new();
    view.refresh(store).await?;

    view.set_criteria(query.criteria);
    for field in query.sort {
        view.sort_by(field);
    }

    if query.options {
        return Ok(render_options(view.options()));
    }

    let rows = view.visible();
    Ok(format!(
        "{}\n\n{} of {} members",
        render_table(&rows),
        rows.len(),
        view.records().len()
    ))
}

pub async fn add(store: &HttpStore, actor: Option<&Actor>, form: MemberForm) -> Result<String> {
    let mut view = DirectoryView::new();

    let id = view.save(store, actor, form, None, Utc::now()).await?;

    Ok(id)
}

/// Prefills the required fields from the stored member, then overlays `changes`.
pub async fn update(
    store: &HttpStore,
    actor: Option<&Actor>,
    id: &str,
    changes: MemberForm,
) -> Result<()> {
    authorize(actor)?;

    let mut view = DirectoryView::new();
    view.refresh(store).await?;

    let current = view
        .records()
        .iter()
        .find(|record| record.id == id)
        .with_context(|| format!("No member with id {id}"))?;

    let form = MemberForm {
        name: changes.name.or_else(|| Some(current.name.clone())),
        email: changes.email.or_else(|| Some(current.email.clone())),
        role: changes.role.or_else(|| Some(current.role.clone())),
        ..changes
    };

    view.save(store, actor, form, Some(id), Utc::now()).await?;

    Ok(())
}

pub async fn delete(store: &HttpStore, actor: Option<&Actor>, id: &str) -> Result<()> {
    let mut view = DirectoryView::new();

    view.delete(store, actor, id).await?;

    Ok(())
}

/// Bulk create from a JSON array of raw documents. Legacy keys are kept as-is;
/// normalization takes care of them on read.
pub async fn import(store: &HttpStore, actor: Option<&Actor>, raw: &str) -> Result<(usize, usize)> {
    let actor = authorize(actor)?;

    let documents: Vec<Value> = serde_json::from_str(raw).context("Import file is not a JSON array")?;
    let now = Utc::now();

    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    let mut created = 0;
    let mut failed = 0;

    for (index, document) in documents.into_iter().enumerate() {
        let Value::Object(fields) = document else {
            warn!("Skipping entry {index}: not an object");
            failed += 1;
            pb.inc(1);
            continue;
        };

        let id = import_id(&fields, now, index);
        pb.set_message(format!("Importing {id}"));

        match store
            .create(USERS, &id, import_fields(fields, &actor.uid, now))
            .await
        {
            Ok(()) => created += 1,
            Err(e) => {
                warn!("Failed to import {id}: {e}");
                failed += 1;
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Done");

    Ok((created, failed))
}

pub async fn ask(store: &HttpStore, message: &str) -> Result<String> {
    if message.trim().is_empty() {
        bail!("Message is required");
    }

    let res = store
        .client()
        .post(format!("{}/api/chatbot", store.base_url()))
        .json(&ChatbotRequest { message })
        .send()
        .await?;

    let reply: ChatbotReply = check(res).await?.json().await?;

    Ok(reply.reply)
}
