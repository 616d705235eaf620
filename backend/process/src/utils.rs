use chrono::{DateTime, Utc};
use directory::{
    Field, Fields, FilterOptions, MemberRecord,
    record::{CREATED_AT, CREATED_BY, MISSING},
};
use serde_json::Value;

const COLUMNS: [(&str, Option<Field>); 10] = [
    ("ID", None),
    ("Name", Some(Field::Name)),
    ("Email", Some(Field::Email)),
    ("Role", Some(Field::Role)),
    ("Profession", Some(Field::Profession)),
    ("College", Some(Field::College)),
    ("Batch", Some(Field::Batch)),
    ("Grad Year", Some(Field::GradYear)),
    ("Location", Some(Field::Location)),
    ("Company", Some(Field::Company)),
];

/// Cell text as the directory table shows it: identity columns verbatim,
/// everything else dashed when empty.
pub fn cell(record: &MemberRecord, field: Option<Field>) -> &str {
    match field {
        None => &record.id,
        Some(field @ (Field::Name | Field::Email | Field::Role)) => record.get(field),
        Some(field) => match record.get(field) {
            "" => MISSING,
            value => value,
        },
    }
}

pub fn render_table(rows: &[&MemberRecord]) -> String {
    let mut widths: Vec<usize> = COLUMNS.iter().map(|(title, _)| title.chars().count()).collect();

    for row in rows {
        for (width, (_, field)) in widths.iter_mut().zip(COLUMNS) {
            *width = (*width).max(cell(row, field).chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(text, &width)| format!("{text:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(COLUMNS.iter().map(|(title, _)| *title).collect())];

    for row in rows {
        out.push(line(COLUMNS.iter().map(|(_, field)| cell(row, *field)).collect()));
    }

    out.join("\n")
}

pub fn render_options(options: &FilterOptions) -> String {
    [
        ("Roles", &options.roles),
        ("Professions", &options.professions),
        ("Colleges", &options.colleges),
        ("Locations", &options.locations),
        ("Companies", &options.companies),
    ]
    .iter()
    .map(|(label, values)| format!("{label}: {}", values.join(", ")))
    .collect::<Vec<_>>()
    .join("\n")
}

/// Picks the import id: the document's own `id` when it has one, otherwise a
/// timestamp offset by its position so a batch never collides.
pub fn import_id(fields: &Fields, now: DateTime<Utc>, index: usize) -> String {
    match fields.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => (now.timestamp_millis() + index as i64).to_string(),
    }
}

/// Strips the id and stamps provenance unless the document already has it.
pub fn import_fields(mut fields: Fields, uid: &str, now: DateTime<Utc>) -> Fields {
    fields.remove("id");

    fields
        .entry(CREATED_AT)
        .or_insert_with(|| Value::String(now.to_rfc3339()));
    fields
        .entry(CREATED_BY)
        .or_insert_with(|| Value::String(uid.to_string()));

    fields
}
