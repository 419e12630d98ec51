//! Repository trait definitions
//!
//! These traits define the contract for catalog and patron data access.
//! Implementations live in the infrastructure layer. Loan operations are not
//! behind a repository: they span several tables inside one transaction and
//! live in `services::loan_service`.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use super::DomainError;
use super::policy::{CopyStatus, PatronStatus};
use crate::models::PatronDto;

/// Distinguishes an absent field (leave unchanged) from an explicit `null`
/// (clear the column) when deserializing a patch.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Catalog entry as shown to every front-end
#[derive(Debug, Clone, Serialize)]
pub struct BookCopy {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub category_id: i32,
    pub category: String,
    pub synopsis: Option<String>,
    pub page_count: Option<i32>,
    pub copy_code: String,
    /// Effective status: LOANED whenever an active loan exists
    pub status: CopyStatus,
    pub available: bool,
    pub created_at: String,
}

/// Filter criteria for catalog queries
#[derive(Debug, Default, Clone, Deserialize)]
pub struct BookFilter {
    /// Substring of title or author
    pub search: Option<String>,
    /// Exact category name
    pub category: Option<String>,
    /// Effective status
    pub status: Option<CopyStatus>,
}

/// Input for registering a copy
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub category: String,
    pub synopsis: Option<String>,
    pub page_count: Option<i32>,
    pub copy_code: Option<String>,
}

/// Partial update of a catalog entry. `None` leaves a field unchanged.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    /// Category name
    pub category: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub synopsis: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub page_count: Option<Option<i32>>,
    pub copy_code: Option<String>,
    pub status: Option<CopyStatus>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.category.is_none()
            && self.synopsis.is_none()
            && self.page_count.is_none()
            && self.copy_code.is_none()
            && self.status.is_none()
    }
}

/// Repository trait for the catalog
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Find all copies matching the filter, ordered by title
    async fn find_all(&self, filter: BookFilter) -> Result<Vec<BookCopy>, DomainError>;

    /// Copies a patron can take right now
    async fn find_available(&self) -> Result<Vec<BookCopy>, DomainError>;

    /// Find a single copy by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<BookCopy>, DomainError>;

    /// Register a new copy
    async fn create(&self, input: NewBook) -> Result<BookCopy, DomainError>;

    /// Apply a patch inside one transaction
    async fn update(&self, id: i32, patch: BookPatch) -> Result<BookCopy, DomainError>;
}

/// Filter criteria for patron queries
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PatronFilter {
    /// Substring of name, email or registration number
    pub search: Option<String>,
    pub status: Option<PatronStatus>,
}

/// Input for registering a patron
#[derive(Debug, Clone)]
pub struct NewPatron {
    pub full_name: String,
    pub email: String,
    pub registration_number: String,
}

/// Partial update of a patron. `None` leaves a field unchanged.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PatronPatch {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub registration_number: Option<String>,
    pub status: Option<PatronStatus>,
}

impl PatronPatch {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.registration_number.is_none()
            && self.status.is_none()
    }
}

/// Repository trait for Patron entity
#[async_trait]
pub trait PatronRepository: Send + Sync {
    /// Find all patrons matching the filter, ordered by name
    async fn find_all(&self, filter: PatronFilter) -> Result<Vec<PatronDto>, DomainError>;

    /// Find a patron by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<PatronDto>, DomainError>;

    /// Find a patron by registration number
    async fn find_by_registration_number(
        &self,
        registration_number: &str,
    ) -> Result<Option<PatronDto>, DomainError>;

    /// Register a patron; registration number and email must be unused
    async fn create(&self, input: NewPatron) -> Result<PatronDto, DomainError>;

    /// Apply a patch inside one transaction
    async fn update(&self, id: i32, patch: PatronPatch) -> Result<PatronDto, DomainError>;
}

/// Category data for API responses
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

/// Repository trait for Category entity
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// All categories ordered by name
    async fn find_all(&self) -> Result<Vec<Category>, DomainError>;
}
