use std::{cmp::Ordering, collections::HashSet};

use serde::{Deserialize, Serialize};

use crate::record::{Field, MemberRecord};

/// Fields the free-text search looks at. Role is only reachable through its
/// equality filter.
pub const SEARCHED_FIELDS: [Field; 8] = [
    Field::Name,
    Field::Email,
    Field::Profession,
    Field::College,
    Field::Batch,
    Field::GradYear,
    Field::Location,
    Field::Company,
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(default)]
    pub search: String,
    pub role: Option<String>,
    pub profession: Option<String>,
    pub college: Option<String>,
    pub location: Option<String>,
    pub company: Option<String>,
}

impl Criteria {
    pub fn search(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..Self::default()
        }
    }

    pub fn set(&mut self, field: Field, value: Option<String>) {
        let value = value.filter(|v| !v.is_empty());

        match field {
            Field::Role => self.role = value,
            Field::Profession => self.profession = value,
            Field::College => self.college = value,
            Field::Location => self.location = value,
            Field::Company => self.company = value,
            _ => {}
        }
    }

    fn equality_filters(&self) -> impl Iterator<Item = (Field, &str)> {
        [
            (Field::Role, &self.role),
            (Field::Profession, &self.profession),
            (Field::College, &self.college),
            (Field::Location, &self.location),
            (Field::Company, &self.company),
        ]
        .into_iter()
        .filter_map(|(field, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (field, v))
        })
    }

    pub fn matches(&self, record: &MemberRecord) -> bool {
        if !self.search.trim().is_empty() {
            let needle = self.search.to_lowercase();
            let hit = SEARCHED_FIELDS
                .iter()
                .any(|field| record.get(*field).to_lowercase().contains(&needle));

            if !hit {
                return false;
            }
        }

        self.equality_filters()
            .all(|(field, value)| record.get(field) == value)
    }
}

/// Projects the full record set through `criteria`. Always start from the
/// full set, never from a previous projection.
pub fn filter<'a>(records: &'a [MemberRecord], criteria: &Criteria) -> Vec<&'a MemberRecord> {
    records.iter().filter(|r| criteria.matches(r)).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn flip(self) -> Self {
        match self {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub field: Field,
    pub direction: Direction,
}

impl SortState {
    pub fn new(field: Field) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    /// Same field flips direction, a new field starts ascending.
    pub fn toggle(current: Option<SortState>, field: Field) -> SortState {
        match current {
            Some(state) if state.field == field => SortState {
                field,
                direction: state.direction.flip(),
            },
            _ => SortState::new(field),
        }
    }

    pub fn compare(&self, a: &MemberRecord, b: &MemberRecord) -> Ordering {
        let ordering = a
            .get(self.field)
            .to_lowercase()
            .cmp(&b.get(self.field).to_lowercase());

        match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

/// Stable: equal keys keep their relative order in both directions.
pub fn sort(records: &mut [&MemberRecord], state: SortState) {
    records.sort_by(|a, b| state.compare(a, b));
}

/// Distinct non-empty values of `field`, in first-seen order.
pub fn distinct_values(records: &[MemberRecord], field: Field) -> Vec<String> {
    let mut seen = HashSet::new();

    records
        .iter()
        .map(|r| r.get(field))
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub roles: Vec<String>,
    pub professions: Vec<String>,
    pub colleges: Vec<String>,
    pub locations: Vec<String>,
    pub companies: Vec<String>,
}

impl FilterOptions {
    pub fn derive(records: &[MemberRecord]) -> Self {
        Self {
            roles: distinct_values(records, Field::Role),
            professions: distinct_values(records, Field::Profession),
            colleges: distinct_values(records, Field::College),
            locations: distinct_values(records, Field::Location),
            companies: distinct_values(records, Field::Company),
        }
    }
}
