//! # Member Records
//!
//! Raw user documents come from years of different forms and imports, so the
//! same attribute shows up under different keys. Normalization picks one value
//! per attribute from an ordered synonym list and coerces it to a string.
//!
//! ## Fallbacks
//! - gradYear, college, profession, batch: empty string
//! - location, company: `"-"`
//!
//! The asymmetry is kept on purpose. Filter option lists and equality filters
//! see the `"-"` literally, so changing it changes what users can filter on.
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{Document, Fields};

pub const MISSING: &str = "-";

pub const GRAD_YEAR_ALIASES: &[&str] = &[
    "gradYear",
    "graduateYear",
    "yearToGraduate",
    "year_to_graduate",
    "graduationYear",
    "grad_year",
];
pub const COLLEGE_ALIASES: &[&str] = &["college", "collegeName", "college_name", "institution"];
pub const PROFESSION_ALIASES: &[&str] = &["profession", "job", "occupation", "title"];
pub const BATCH_ALIASES: &[&str] = &["batch", "batchYear", "yearBatch", "batch_name"];
pub const LOCATION_ALIASES: &[&str] = &["location", "city"];
pub const COMPANY_ALIASES: &[&str] = &["company", "organization"];

pub const CREATED_AT: &str = "createdAt";
pub const CREATED_BY: &str = "createdBy";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Alumni,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Alumni, Role::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Alumni => "alumni",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown role: {s}"))
    }
}

/// The nine display fields of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Email,
    Role,
    Profession,
    College,
    Batch,
    GradYear,
    Location,
    Company,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Name,
        Field::Email,
        Field::Role,
        Field::Profession,
        Field::College,
        Field::Batch,
        Field::GradYear,
        Field::Location,
        Field::Company,
    ];

    /// Key used on the wire and in stored documents.
    pub fn key(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Role => "role",
            Field::Profession => "profession",
            Field::College => "college",
            Field::Batch => "batch",
            Field::GradYear => "gradYear",
            Field::Location => "location",
            Field::Company => "company",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown field: {s}"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub profession: String,
    pub college: String,
    pub batch: String,
    pub grad_year: String,
    pub location: String,
    pub company: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    /// Every other raw field, untouched.
    #[serde(flatten)]
    pub extra: Fields,
}

impl MemberRecord {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Role => &self.role,
            Field::Profession => &self.profession,
            Field::College => &self.college,
            Field::Batch => &self.batch,
            Field::GradYear => &self.grad_year,
            Field::Location => &self.location,
            Field::Company => &self.company,
        }
    }

    pub fn role_kind(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}

/// First alias whose value is present and not null. Empty strings count as present.
pub fn resolve_alias<'a>(fields: &'a Fields, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|alias| fields.get(*alias))
        .find(|value| !value.is_null())
}

/// String form of a value, `None` when it is null. Whole floats drop their
/// fraction and arrays join with commas, the way a browser prints them.
pub fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(display(other)),
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 0.0 => "0".to_string(),
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// String form of a value, `None` when it is falsy (null, "", 0, false).
pub fn truthy(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => stringify(other),
    }
}

fn pick(fields: &Fields, aliases: &[&str], fallback: &str) -> String {
    resolve_alias(fields, aliases)
        .and_then(truthy)
        .unwrap_or_else(|| fallback.to_string())
}

fn plain(fields: &Fields, key: &str) -> String {
    fields.get(key).and_then(truthy).unwrap_or_default()
}

pub fn normalize(document: &Document) -> MemberRecord {
    let fields = &document.fields;

    let grad_year = resolve_alias(fields, GRAD_YEAR_ALIASES)
        .and_then(stringify)
        .unwrap_or_default();

    let mut extra = fields.clone();
    for key in Field::ALL.iter().map(|field| field.key()) {
        extra.remove(key);
    }
    extra.remove("id");
    let created_at = extra.remove(CREATED_AT).as_ref().and_then(stringify);
    let created_by = extra.remove(CREATED_BY).as_ref().and_then(stringify);

    MemberRecord {
        id: document.id.clone(),
        name: plain(fields, "name"),
        email: plain(fields, "email"),
        role: plain(fields, "role"),
        profession: pick(fields, PROFESSION_ALIASES, ""),
        college: pick(fields, COLLEGE_ALIASES, ""),
        batch: pick(fields, BATCH_ALIASES, ""),
        grad_year,
        location: pick(fields, LOCATION_ALIASES, MISSING),
        company: pick(fields, COMPANY_ALIASES, MISSING),
        created_at,
        created_by,
        extra,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(id: &str, value: Value) -> Document {
        match value {
            Value::Object(fields) => Document::new(id, fields),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_grad_year_first_alias_wins() {
        let record = normalize(&doc(
            "1",
            json!({ "graduateYear": "2019", "gradYear": "2020", "grad_year": "2001" }),
        ));

        assert_eq!(record.grad_year, "2020");
    }

    #[test]
    fn test_grad_year_empty_string_blocks_later_aliases() {
        let record = normalize(&doc("1", json!({ "gradYear": "", "graduateYear": "2019" })));

        assert_eq!(record.grad_year, "");
    }

    #[test]
    fn test_grad_year_null_is_skipped() {
        let record = normalize(&doc("1", json!({ "gradYear": null, "graduateYear": "2019" })));

        assert_eq!(record.grad_year, "2019");
    }

    #[test]
    fn test_grad_year_number_becomes_string() {
        let record = normalize(&doc("1", json!({ "graduationYear": 2021 })));

        assert_eq!(record.grad_year, "2021");
    }

    #[test]
    fn test_grad_year_whole_float_drops_fraction() {
        let whole = normalize(&doc("1", json!({ "gradYear": 2020.0 })));
        let fractional = normalize(&doc("2", json!({ "gradYear": 2020.5 })));

        assert_eq!(whole.grad_year, "2020");
        assert_eq!(fractional.grad_year, "2020.5");
    }

    #[test]
    fn test_stringify_joins_arrays() {
        assert_eq!(stringify(&json!([2019, "2020", null])).as_deref(), Some("2019,2020,"));
        assert_eq!(stringify(&json!({ "y": 1 })).as_deref(), Some("[object Object]"));
        assert_eq!(stringify(&Value::Null), None);
    }

    #[test]
    fn test_grad_year_across_three_documents() {
        let records: Vec<MemberRecord> = [
            doc("a", json!({ "gradYear": "2020" })),
            doc("b", json!({ "graduateYear": "2019" })),
            doc("c", json!({ "yearToGraduate": "2018" })),
        ]
        .iter()
        .map(normalize)
        .collect();

        let years: Vec<&str> = records.iter().map(|r| r.grad_year.as_str()).collect();
        assert_eq!(years, ["2020", "2019", "2018"]);
    }

    #[test]
    fn test_asymmetric_fallbacks() {
        let record = normalize(&doc("1", json!({ "name": "Meera" })));

        assert_eq!(record.location, "-");
        assert_eq!(record.company, "-");
        assert_eq!(record.college, "");
        assert_eq!(record.profession, "");
        assert_eq!(record.batch, "");
        assert_eq!(record.grad_year, "");
    }

    #[test]
    fn test_empty_location_falls_back_to_dash() {
        let record = normalize(&doc("1", json!({ "location": "", "city": "Pune" })));

        assert_eq!(record.location, "-");
    }

    #[test]
    fn test_secondary_aliases() {
        let record = normalize(&doc(
            "1",
            json!({
                "institution": "IIT Bombay",
                "occupation": "Engineer",
                "batch_name": "B-12",
                "city": "Chennai",
                "organization": "Acme",
            }),
        ));

        assert_eq!(record.college, "IIT Bombay");
        assert_eq!(record.profession, "Engineer");
        assert_eq!(record.batch, "B-12");
        assert_eq!(record.location, "Chennai");
        assert_eq!(record.company, "Acme");
    }

    #[test]
    fn test_id_and_extra_fields_pass_through() {
        let record = normalize(&doc(
            "42",
            json!({
                "name": "Kiran",
                "linkedin": "kiran-k",
                "createdAt": "2025-01-01T00:00:00Z",
                "createdBy": "uid-1",
            }),
        ));

        assert_eq!(record.id, "42");
        assert_eq!(record.extra["linkedin"], "kiran-k");
        assert_eq!(record.created_at.as_deref(), Some("2025-01-01T00:00:00Z"));
        assert_eq!(record.created_by.as_deref(), Some("uid-1"));
        assert!(!record.extra.contains_key("name"));
    }

    #[test]
    fn test_field_parse() {
        assert_eq!("gradyear".parse::<Field>().unwrap(), Field::GradYear);
        assert_eq!("College".parse::<Field>().unwrap(), Field::College);
        assert!("salary".parse::<Field>().is_err());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("alumni".parse::<Role>().unwrap(), Role::Alumni);
        assert!("Alumni".parse::<Role>().is_err());
    }
}
