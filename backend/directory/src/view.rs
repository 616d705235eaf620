//! # Directory View
//!
//! Everything a directory screen holds between user actions: the full record
//! set, the active criteria and sort, and the option lists for the filter
//! dropdowns.
//!
//! The visible rows are always derived from the full set (filter, then sort).
//! Option lists only change when the record set does, so typing in the search
//! box never re-derives them.
//!
//! Mutations go out one at a time and are each followed by a full refetch.
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::{
    error::DirectoryError,
    member::{Actor, MemberForm, authorize, new_member_id},
    query::{Criteria, FilterOptions, SortState, filter, sort},
    record::{Field, MemberRecord, normalize},
    store::{Document, DocumentStore, USERS},
};

pub const LOAD_FAILED: &str = "Failed to load users.";
pub const SAVE_FAILED: &str = "Failed to save user.";
pub const DELETE_FAILED: &str = "Failed to delete user.";

#[derive(Debug, Default)]
pub struct DirectoryView {
    records: Vec<MemberRecord>,
    criteria: Criteria,
    sort: Option<SortState>,
    options: FilterOptions,
}

impl DirectoryView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, documents: &[Document]) {
        self.records = documents.iter().map(normalize).collect();
        self.options = FilterOptions::derive(&self.records);
    }

    pub fn records(&self) -> &[MemberRecord] {
        &self.records
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn sort_state(&self) -> Option<SortState> {
        self.sort
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.criteria.search = search.into();
    }

    pub fn set_filter(&mut self, field: Field, value: Option<String>) {
        self.criteria.set(field, value);
    }

    pub fn set_criteria(&mut self, criteria: Criteria) {
        self.criteria = criteria;
    }

    /// A column click: toggles direction on the active field, otherwise
    /// starts ascending on the new one.
    pub fn sort_by(&mut self, field: Field) -> SortState {
        let state = SortState::toggle(self.sort, field);
        self.sort = Some(state);

        state
    }

    pub fn visible(&self) -> Vec<&MemberRecord> {
        let mut rows = filter(&self.records, &self.criteria);

        if let Some(state) = self.sort {
            sort(&mut rows, state);
        }

        rows
    }

    /// Refetches the users collection. On failure the current list is kept.
    pub async fn refresh(&mut self, store: &dyn DocumentStore) -> Result<(), DirectoryError> {
        match store.list(USERS).await {
            Ok(documents) => {
                self.load(&documents);
                info!("Loaded {} users", self.records.len());

                Ok(())
            }
            Err(e) => {
                error!("Error fetching users: {e}");

                Err(DirectoryError::upstream(LOAD_FAILED)(e))
            }
        }
    }

    /// Creates a member, or updates `editing` in place. Returns the member id.
    pub async fn save(
        &mut self,
        store: &dyn DocumentStore,
        actor: Option<&Actor>,
        form: MemberForm,
        editing: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String, DirectoryError> {
        let actor = authorize(actor)?;
        form.validate()?;

        let result = match editing {
            Some(id) => store
                .update(USERS, id, form.into_update())
                .await
                .map(|_| id.to_string()),
            None => {
                let id = new_member_id(now);
                let created = store
                    .create(USERS, &id, form.into_new_document(actor, now))
                    .await;

                created.map(|_| id)
            }
        };

        let id = result.map_err(|e| {
            error!("Error saving user: {e}");
            DirectoryError::upstream(SAVE_FAILED)(e)
        })?;

        self.refetch(store).await;

        Ok(id)
    }

    pub async fn delete(
        &mut self,
        store: &dyn DocumentStore,
        actor: Option<&Actor>,
        id: &str,
    ) -> Result<(), DirectoryError> {
        authorize(actor)?;

        store.delete(USERS, id).await.map_err(|e| {
            error!("Error deleting user {id}: {e}");
            DirectoryError::upstream(DELETE_FAILED)(e)
        })?;

        self.refetch(store).await;

        Ok(())
    }

    async fn refetch(&mut self, store: &dyn DocumentStore) {
        if self.refresh(store).await.is_err() {
            warn!("Keeping stale directory after mutation");
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::{Value, json};

    use super::*;
    use crate::store::{Fields, MemoryStore, StoreError};

    fn doc(id: &str, value: Value) -> Document {
        match value {
            Value::Object(fields) => Document::new(id, fields),
            _ => panic!("expected object"),
        }
    }

    fn seeded() -> MemoryStore {
        MemoryStore::new().with_documents(
            USERS,
            vec![
                doc("1", json!({ "name": "Sanjay", "role": "alumni", "city": "Delhi", "gradYear": 2015 })),
                doc("2", json!({ "name": "Priya", "role": "student", "location": "San Jose" })),
                doc("3", json!({ "name": "Arun", "role": "alumni", "organization": "Acme" })),
            ],
        )
    }

    fn names(view: &DirectoryView) -> Vec<String> {
        view.visible().iter().map(|r| r.name.clone()).collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap()
    }

    struct BrokenStore;

    #[async_trait]
    impl DocumentStore for BrokenStore {
        async fn list(&self, _: &str) -> Result<Vec<Document>, StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }

        async fn get(&self, _: &str, _: &str) -> Result<Option<Document>, StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }

        async fn create(&self, _: &str, _: &str, _: Fields) -> Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }

        async fn update(&self, _: &str, _: &str, _: Fields) -> Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }

        async fn delete(&self, _: &str, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_refresh_normalizes_and_derives_options() {
        let store = seeded();
        let mut view = DirectoryView::new();

        view.refresh(&store).await.unwrap();

        assert_eq!(view.records().len(), 3);
        assert_eq!(view.records()[0].location, "Delhi");
        assert_eq!(view.records()[0].grad_year, "2015");
        assert_eq!(view.options().locations, ["Delhi", "San Jose", "-"]);
        assert_eq!(view.options().companies, ["-", "Acme"]);
    }

    #[tokio::test]
    async fn test_filters_recompute_from_full_set() {
        let store = seeded();
        let mut view = DirectoryView::new();
        view.refresh(&store).await.unwrap();

        view.set_search("san");
        assert_eq!(names(&view), ["Sanjay", "Priya"]);

        view.set_search("sanj");
        assert_eq!(names(&view), ["Sanjay"]);

        // widening the search brings excluded rows back
        view.set_search("");
        assert_eq!(view.visible().len(), 3);
    }

    #[tokio::test]
    async fn test_sort_survives_filter_changes() {
        let store = seeded();
        let mut view = DirectoryView::new();
        view.refresh(&store).await.unwrap();

        view.sort_by(Field::Name);
        view.sort_by(Field::Name);
        view.set_filter(Field::Role, Some("alumni".to_string()));

        assert_eq!(names(&view), ["Sanjay", "Arun"]);
    }

    #[tokio::test]
    async fn test_options_ignore_active_filters() {
        let store = seeded();
        let mut view = DirectoryView::new();
        view.refresh(&store).await.unwrap();

        view.set_filter(Field::Role, Some("student".to_string()));

        assert_eq!(view.visible().len(), 1);
        assert_eq!(view.options().roles, ["alumni", "student"]);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_list() {
        let mut view = DirectoryView::new();
        view.refresh(&seeded()).await.unwrap();

        let err = view.refresh(&BrokenStore).await.unwrap_err();

        assert_eq!(err.to_string(), LOAD_FAILED);
        assert_eq!(view.records().len(), 3);
    }

    #[tokio::test]
    async fn test_admin_creates_member_and_refetches() {
        let store = seeded();
        let mut view = DirectoryView::new();
        let admin = Actor::new("admin-1", "admin");
        let form = MemberForm {
            name: Some("Meera".to_string()),
            email: Some("meera@alumni.org".to_string()),
            role: Some("alumni".to_string()),
            ..MemberForm::default()
        };

        let id = view
            .save(&store, Some(&admin), form, None, now())
            .await
            .unwrap();

        assert_eq!(id, now().timestamp_millis().to_string());
        assert_eq!(view.records().len(), 4);

        let created = view.records().iter().find(|r| r.id == id).unwrap();
        assert_eq!(created.created_by.as_deref(), Some("admin-1"));
        assert_eq!(created.location, "-");
    }

    #[tokio::test]
    async fn test_update_keeps_provenance() {
        let store = MemoryStore::new().with_documents(
            USERS,
            vec![doc("9", json!({ "name": "Ravi", "email": "r@x.io", "role": "student", "createdBy": "root" }))],
        );
        let mut view = DirectoryView::new();
        let admin = Actor::new("admin-1", "admin");
        let form = MemberForm {
            name: Some("Ravi K".to_string()),
            email: Some("r@x.io".to_string()),
            role: Some("alumni".to_string()),
            ..MemberForm::default()
        };

        view.save(&store, Some(&admin), form, Some("9"), now())
            .await
            .unwrap();

        let record = &view.records()[0];
        assert_eq!(record.name, "Ravi K");
        assert_eq!(record.role, "alumni");
        assert_eq!(record.created_by.as_deref(), Some("root"));
    }

    #[tokio::test]
    async fn test_non_admin_cannot_mutate() {
        let store = seeded();
        let mut view = DirectoryView::new();
        let student = Actor::new("s-1", "student");

        let err = view.delete(&store, Some(&student), "1").await.unwrap_err();

        assert!(matches!(err, DirectoryError::Forbidden));
        assert_eq!(store.list(USERS).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_store() {
        let mut view = DirectoryView::new();
        let admin = Actor::new("admin-1", "admin");

        // BrokenStore would fail any call, so reaching it would change the error
        let err = view
            .save(&BrokenStore, Some(&admin), MemberForm::default(), None, now())
            .await
            .unwrap_err();

        assert!(matches!(err, DirectoryError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_delete_refetches() {
        let store = seeded();
        let mut view = DirectoryView::new();
        let admin = Actor::new("admin-1", "admin");
        view.refresh(&store).await.unwrap();

        view.delete(&store, Some(&admin), "2").await.unwrap();

        assert_eq!(names(&view), ["Sanjay", "Arun"]);
    }

    #[tokio::test]
    async fn test_store_failure_is_generic() {
        let mut view = DirectoryView::new();
        let admin = Actor::new("admin-1", "admin");

        let err = view.delete(&BrokenStore, Some(&admin), "1").await.unwrap_err();

        assert_eq!(err.to_string(), DELETE_FAILED);
    }
}
