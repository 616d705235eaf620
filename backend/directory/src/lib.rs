//! # Alumni Directory
//!
//! Client-side model of the alumni directory: turn inconsistently keyed user
//! documents into uniform records, then search, filter, sort and manage them.
//!
//! ## Flow
//!
//! - Fetch the whole `users` collection through a [`DocumentStore`]
//! - Normalize each document ([`record::normalize`])
//! - Derive filter option lists once per fetch
//! - Every keystroke or dropdown change re-projects the full set
//! - Admin mutations go straight to the store, then the list is refetched
//!
//! ## Errors
//!
//! Only two kinds. Validation errors are reported before any store call.
//! Store failures are logged and surfaced with a generic message.
pub mod error;
pub mod member;
pub mod query;
pub mod record;
pub mod store;
pub mod view;

pub use error::DirectoryError;
pub use member::{Actor, MemberForm};
pub use query::{Criteria, Direction, FilterOptions, SortState};
pub use record::{Field, MemberRecord, Role, normalize};
pub use store::{Document, DocumentStore, Fields, MemoryStore, StoreError};
pub use view::DirectoryView;
