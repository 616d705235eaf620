//! # Member Management
//!
//! Admin-only create/update/delete of user documents.
//!
//! - Caller identity arrives as an explicit [`Actor`], never ambient state
//! - Only `role == "admin"` may mutate
//! - Name, email and role are required on every save
//! - New members get a timestamp-derived id plus `createdAt`/`createdBy`, which
//!   updates never touch
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::DirectoryError,
    record::{CREATED_AT, CREATED_BY, Field, Role, truthy},
    store::Fields,
};

/// Who is asking, as supplied by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub uid: String,
    pub role: String,
}

impl Actor {
    pub fn new(uid: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            role: role.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin.as_str()
    }
}

pub fn authorize(actor: Option<&Actor>) -> Result<&Actor, DirectoryError> {
    actor
        .filter(|actor| actor.is_admin())
        .ok_or(DirectoryError::Forbidden)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub college: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grad_year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

const REQUIRED: &str = "Name, Email, and Role are required.";
const UNKNOWN_ROLE: &str = "Role must be one of student, alumni, admin.";

/// Keys fixed when a member is created.
const IMMUTABLE: [&str; 3] = ["id", CREATED_AT, CREATED_BY];

const IDENTITY: [&str; 3] = ["name", "email", "role"];

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn check_role(role: &str) -> Result<(), DirectoryError> {
    role.parse::<Role>()
        .map(|_| ())
        .map_err(|_| DirectoryError::Invalid(UNKNOWN_ROLE.to_string()))
}

fn text(fields: &Fields, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(truthy)
        .filter(|v| !v.trim().is_empty())
}

/// Checks a raw document written under a caller-chosen id. Only the identity
/// fields are looked at; the rest stays an untyped bag.
pub fn validate_document(fields: &Fields) -> Result<(), DirectoryError> {
    match (text(fields, "name"), text(fields, "email"), text(fields, "role")) {
        (Some(_), Some(_), Some(role)) => check_role(&role),
        _ => Err(DirectoryError::Invalid(REQUIRED.to_string())),
    }
}

/// Drops the keys fixed at creation from a partial update. Identity fields the
/// update does carry must stay non-blank, and a role must be a known one.
pub fn sanitize_patch(mut fields: Fields) -> Result<Fields, DirectoryError> {
    for key in IMMUTABLE {
        fields.remove(key);
    }

    for key in IDENTITY {
        if fields.contains_key(key) && text(&fields, key).is_none() {
            return Err(DirectoryError::Invalid(REQUIRED.to_string()));
        }
    }

    if let Some(role) = text(&fields, "role") {
        check_role(&role)?;
    }

    Ok(fields)
}

impl MemberForm {
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::Role => &mut self.role,
            Field::Profession => &mut self.profession,
            Field::College => &mut self.college,
            Field::Batch => &mut self.batch,
            Field::GradYear => &mut self.grad_year,
            Field::Location => &mut self.location,
            Field::Company => &mut self.company,
        };

        *slot = Some(value.into());
    }

    pub fn validate(&self) -> Result<(), DirectoryError> {
        if !present(&self.name) || !present(&self.email) || !present(&self.role) {
            return Err(DirectoryError::Invalid(REQUIRED.to_string()));
        }

        match &self.role {
            Some(role) => check_role(role),
            None => Ok(()),
        }
    }

    /// Only the submitted fields, for a partial overwrite.
    pub fn into_update(self) -> Fields {
        match serde_json::to_value(self) {
            Ok(Value::Object(fields)) => fields,
            _ => Fields::new(),
        }
    }

    /// Submitted fields plus creation provenance.
    pub fn into_new_document(self, actor: &Actor, now: DateTime<Utc>) -> Fields {
        let mut fields = self.into_update();

        fields.insert(
            CREATED_AT.to_string(),
            Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        fields.insert(CREATED_BY.to_string(), Value::String(actor.uid.clone()));

        fields
    }
}

/// Milliseconds since the epoch, as a string.
pub fn new_member_id(now: DateTime<Utc>) -> String {
    now.timestamp_millis().to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn complete_form() -> MemberForm {
        MemberForm {
            name: Some("Nisha".to_string()),
            email: Some("nisha@alumni.org".to_string()),
            role: Some("alumni".to_string()),
            company: Some("Acme".to_string()),
            ..MemberForm::default()
        }
    }

    #[test]
    fn test_authorize_requires_admin() {
        let admin = Actor::new("u1", "admin");
        let alumni = Actor::new("u2", "alumni");

        assert!(authorize(Some(&admin)).is_ok());
        assert!(matches!(authorize(Some(&alumni)), Err(DirectoryError::Forbidden)));
        assert!(matches!(authorize(None), Err(DirectoryError::Forbidden)));
    }

    #[test]
    fn test_validate_missing_required() {
        let mut form = complete_form();
        form.email = Some("  ".to_string());

        let err = form.validate().unwrap_err();
        assert_eq!(err.to_string(), "Name, Email, and Role are required.");
    }

    #[test]
    fn test_validate_unknown_role() {
        let mut form = complete_form();
        form.role = Some("faculty".to_string());

        assert!(matches!(form.validate(), Err(DirectoryError::Invalid(_))));
    }

    #[test]
    fn test_update_carries_only_submitted_fields() {
        let mut form = MemberForm::default();
        form.set(Field::GradYear, "2022");

        let fields = form.into_update();

        assert_eq!(fields.len(), 1);
        assert_eq!(fields["gradYear"], "2022");
    }

    #[test]
    fn test_new_document_is_stamped() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let actor = Actor::new("admin-7", "admin");

        let fields = complete_form().into_new_document(&actor, now);

        assert_eq!(fields["createdBy"], "admin-7");
        assert_eq!(fields["createdAt"], "2025-03-01T12:00:00.000Z");
        assert_eq!(fields["company"], "Acme");
        assert!(!fields.contains_key("batch"));
        assert_eq!(new_member_id(now), "1740830400000");
    }

    #[test]
    fn test_document_fields_may_be_untyped() {
        let document = fields(json!({
            "name": "Asha",
            "email": "asha@alumni.org",
            "role": "alumni",
            "gradYear": 2015,
        }));

        assert!(validate_document(&document).is_ok());
    }

    #[test]
    fn test_document_requires_identity() {
        let blank = fields(json!({ "name": " ", "email": "a@x", "role": "alumni" }));
        let unknown = fields(json!({ "name": "A", "email": "a@x", "role": "superuser" }));

        assert_eq!(validate_document(&blank).unwrap_err().to_string(), REQUIRED);
        assert_eq!(validate_document(&unknown).unwrap_err().to_string(), UNKNOWN_ROLE);
    }

    #[test]
    fn test_patch_drops_provenance_and_id() {
        let patch = sanitize_patch(fields(json!({
            "id": "999",
            "createdAt": "1970-01-01",
            "createdBy": "mallory",
            "company": "Acme",
        })))
        .unwrap();

        assert_eq!(patch, fields(json!({ "company": "Acme" })));
    }

    #[test]
    fn test_patch_rejects_blank_identity_and_unknown_role() {
        for body in [
            json!({ "name": "" }),
            json!({ "email": null }),
            json!({ "role": "  " }),
        ] {
            assert_eq!(sanitize_patch(fields(body)).unwrap_err().to_string(), REQUIRED);
        }

        assert_eq!(
            sanitize_patch(fields(json!({ "role": "superuser" })))
                .unwrap_err()
                .to_string(),
            UNKNOWN_ROLE
        );
        assert!(sanitize_patch(fields(json!({ "role": "student", "batch": 7 }))).is_ok());
    }
}
