//! SeaORM implementation of BookRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashSet;

use crate::domain::policy::{self, CopyStatus, LoanStatus};
use crate::domain::{BookCopy, BookFilter, BookPatch, BookRepository, DomainError, NewBook};
use crate::models::book::{ActiveModel, Column, Entity as BookEntity, Model};
use crate::models::category::{self, Entity as CategoryEntity};
use crate::models::loan::{self, Entity as LoanEntity};

/// SeaORM-based implementation of BookRepository
pub struct SeaOrmBookRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// IDs of every copy currently out on an active loan
async fn loaned_book_ids<C: ConnectionTrait>(db: &C) -> Result<HashSet<i32>, DomainError> {
    let ids: Vec<i32> = LoanEntity::find()
        .select_only()
        .column(loan::Column::BookId)
        .filter(loan::Column::Status.eq(LoanStatus::Active.as_str()))
        .into_tuple()
        .all(db)
        .await?;

    Ok(ids.into_iter().collect())
}

fn to_book_copy(
    book: Model,
    category: Option<category::Model>,
    has_active_loan: bool,
) -> Result<BookCopy, DomainError> {
    let stored: CopyStatus = book
        .status
        .parse()
        .map_err(|_| DomainError::Database(format!("Invalid stored book status: {}", book.status)))?;
    let status = policy::effective_copy_status(stored, has_active_loan);

    Ok(BookCopy {
        id: book.id,
        title: book.title,
        author: book.author,
        category_id: book.category_id,
        category: category.map(|c| c.name).unwrap_or_default(),
        synopsis: book.synopsis,
        page_count: book.page_count,
        copy_code: book.copy_code,
        status,
        available: status == CopyStatus::Available,
        created_at: book.created_at,
    })
}

fn non_empty(value: &str, field: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

#[async_trait]
impl BookRepository for SeaOrmBookRepository {
    async fn find_all(&self, filter: BookFilter) -> Result<Vec<BookCopy>, DomainError> {
        let mut query = BookEntity::find().find_also_related(CategoryEntity);

        if let Some(q) = filter.search.as_deref().filter(|q| !q.is_empty()) {
            let cond = Condition::any()
                .add(Column::Title.contains(q))
                .add(Column::Author.contains(q));
            query = query.filter(cond);
        }

        if let Some(name) = filter.category.as_deref().filter(|n| !n.is_empty()) {
            query = query.filter(category::Column::Name.eq(name));
        }

        let rows = query
            .order_by_asc(Column::Title)
            .order_by_asc(Column::Author)
            .all(&self.db)
            .await?;

        let loaned = loaned_book_ids(&self.db).await?;

        let mut books = Vec::with_capacity(rows.len());
        for (book, category) in rows {
            let has_active_loan = loaned.contains(&book.id);
            let copy = to_book_copy(book, category, has_active_loan)?;
            if filter.status.map_or(true, |s| s == copy.status) {
                books.push(copy);
            }
        }

        Ok(books)
    }

    async fn find_available(&self) -> Result<Vec<BookCopy>, DomainError> {
        self.find_all(BookFilter {
            status: Some(CopyStatus::Available),
            ..Default::default()
        })
        .await
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<BookCopy>, DomainError> {
        let Some((book, category)) = BookEntity::find_by_id(id)
            .find_also_related(CategoryEntity)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let active_loans = LoanEntity::find()
            .filter(loan::Column::BookId.eq(id))
            .filter(loan::Column::Status.eq(LoanStatus::Active.as_str()))
            .count(&self.db)
            .await?;

        to_book_copy(book, category, active_loans > 0).map(Some)
    }

    async fn create(&self, input: NewBook) -> Result<BookCopy, DomainError> {
        non_empty(&input.title, "Title")?;
        non_empty(&input.author, "Author")?;

        let txn = self.db.begin().await?;

        let category = CategoryEntity::find()
            .filter(category::Column::Name.eq(&input.category))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                DomainError::Validation(format!("Category not found: {}", input.category))
            })?;

        let copy_code = match input.copy_code.filter(|c| !c.trim().is_empty()) {
            Some(code) => code,
            None => policy::generate_copy_code(
                &category.name,
                chrono::Utc::now().timestamp_millis(),
            ),
        };

        let taken = BookEntity::find()
            .filter(Column::CopyCode.eq(&copy_code))
            .count(&txn)
            .await?;
        if taken > 0 {
            return Err(DomainError::Conflict(format!(
                "Copy code already exists: {}",
                copy_code
            )));
        }

        let now = chrono::Utc::now().to_rfc3339();
        let new_book = ActiveModel {
            title: Set(input.title),
            author: Set(input.author),
            category_id: Set(category.id),
            synopsis: Set(input.synopsis),
            page_count: Set(input.page_count),
            copy_code: Set(copy_code),
            status: Set(CopyStatus::Available.as_str().to_owned()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let saved = new_book.insert(&txn).await?;
        txn.commit().await?;

        tracing::info!("Registered book copy {} ({})", saved.id, saved.copy_code);
        to_book_copy(saved, Some(category), false)
    }

    async fn update(&self, id: i32, patch: BookPatch) -> Result<BookCopy, DomainError> {
        if patch.is_empty() {
            return Err(DomainError::Validation("No fields to update".to_string()));
        }

        let txn = self.db.begin().await?;

        let existing = BookEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| DomainError::NotFound("Book".to_string()))?;

        let mut active: ActiveModel = existing.into();

        if let Some(title) = patch.title {
            non_empty(&title, "Title")?;
            active.title = Set(title);
        }
        if let Some(author) = patch.author {
            non_empty(&author, "Author")?;
            active.author = Set(author);
        }
        if let Some(name) = patch.category {
            let category = CategoryEntity::find()
                .filter(category::Column::Name.eq(&name))
                .one(&txn)
                .await?
                .ok_or_else(|| DomainError::Validation(format!("Category not found: {}", name)))?;
            active.category_id = Set(category.id);
        }
        if let Some(synopsis) = patch.synopsis {
            active.synopsis = Set(synopsis);
        }
        if let Some(page_count) = patch.page_count {
            active.page_count = Set(page_count);
        }
        if let Some(code) = patch.copy_code {
            non_empty(&code, "Copy code")?;
            let taken = BookEntity::find()
                .filter(Column::CopyCode.eq(&code))
                .filter(Column::Id.ne(id))
                .count(&txn)
                .await?;
            if taken > 0 {
                return Err(DomainError::Conflict(format!(
                    "Copy code already in use by another book: {}",
                    code
                )));
            }
            active.copy_code = Set(code);
        }
        if let Some(status) = patch.status {
            if !status.is_manual() {
                return Err(DomainError::Validation(
                    "LOANED is set by checking out a loan, not by editing the book".to_string(),
                ));
            }
            active.status = Set(status.as_str().to_owned());
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        active.update(&txn).await?;
        txn.commit().await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Book".to_string()))
    }
}
