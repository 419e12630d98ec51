//! Application state containing repositories and shared resources

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::{BookRepository, CategoryRepository, PatronRepository};
use crate::infrastructure::{
    SeaOrmBookRepository, SeaOrmCategoryRepository, SeaOrmPatronRepository,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection, used directly by the loan services
    db: DatabaseConnection,
    /// Catalog repository
    pub book_repo: Arc<dyn BookRepository>,
    /// Patron repository
    pub patron_repo: Arc<dyn PatronRepository>,
    /// Category repository
    pub category_repo: Arc<dyn CategoryRepository>,
}

impl AppState {
    /// Create a new AppState with all repositories initialized
    pub fn new(db: DatabaseConnection) -> Self {
        let book_repo = Arc::new(SeaOrmBookRepository::new(db.clone()));
        let patron_repo = Arc::new(SeaOrmPatronRepository::new(db.clone()));
        let category_repo = Arc::new(SeaOrmCategoryRepository::new(db.clone()));

        Self {
            db,
            book_repo,
            patron_repo,
            category_repo,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl AsRef<DatabaseConnection> for AppState {
    fn as_ref(&self) -> &DatabaseConnection {
        &self.db
    }
}

// Implement FromRef to allow extracting DatabaseConnection from AppState
impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
