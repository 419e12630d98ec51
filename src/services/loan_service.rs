//! Loan Service - loan lifecycle without the HTTP layer
//!
//! Every mutating operation runs in its own transaction; an early `?` drops
//! the transaction, which rolls it back. `today` is supplied by the caller.

use chrono::NaiveDate;
use sea_orm::*;
use serde::Serialize;
use std::str::FromStr;

use crate::domain::DomainError;
use crate::domain::policy::{self, CopyStatus, LoanStatus, PatronStatus, ReaderLevel};
use crate::models::book::{self, Entity as Book};
use crate::models::loan::{self, Entity as Loan};
use crate::models::loan_history::{self, Entity as LoanHistory};
use crate::models::patron::{self, Entity as Patron};

/// Receipt returned by a checkout
#[derive(Debug, Clone, Serialize)]
pub struct LoanReceipt {
    pub id: i32,
    pub patron_id: i32,
    pub patron_name: String,
    pub registration_number: String,
    pub book_id: i32,
    pub book_title: String,
    pub book_author: String,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub renewal_count: i32,
    pub status: LoanStatus,
}

/// Receipt returned by a renewal
#[derive(Debug, Clone, Serialize)]
pub struct RenewalReceipt {
    pub loan_id: i32,
    pub book_title: String,
    pub book_author: String,
    pub renewal_date: NaiveDate,
    pub new_due_date: NaiveDate,
    pub renewal_count: i32,
}

/// Receipt returned by a return: the archived history record plus display data
#[derive(Debug, Clone, Serialize)]
pub struct ReturnReceipt {
    pub history_id: i32,
    pub loan_id: i32,
    pub patron_id: i32,
    pub patron_name: String,
    pub registration_number: String,
    pub book_id: i32,
    pub book_title: String,
    pub book_author: String,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: NaiveDate,
    pub days_held: i64,
    pub renewal_count: i32,
    pub condition: String,
    pub notes: Option<String>,
    pub status: LoanStatus,
}

/// Reader classification of one patron
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub patron_id: i32,
    pub loan_count: u64,
    pub level: ReaderLevel,
}

fn stored<T: FromStr<Err = DomainError>>(value: &str) -> Result<T, DomainError> {
    value
        .parse()
        .map_err(|_| DomainError::Database(format!("Invalid stored value: {}", value)))
}

async fn has_active_loan<C: ConnectionTrait>(
    db: &C,
    book_id: i32,
    patron_id: Option<i32>,
) -> Result<bool, DomainError> {
    let mut query = Loan::find()
        .filter(loan::Column::BookId.eq(book_id))
        .filter(loan::Column::Status.eq(LoanStatus::Active.as_str()));
    if let Some(patron_id) = patron_id {
        query = query.filter(loan::Column::PatronId.eq(patron_id));
    }

    Ok(query.count(db).await? > 0)
}

/// Check out a book copy to a patron
pub async fn create_loan(
    db: &DatabaseConnection,
    patron_id: i32,
    book_id: i32,
    today: NaiveDate,
) -> Result<LoanReceipt, DomainError> {
    let txn = db.begin().await?;

    // 1. Patron must exist and be active
    let patron = Patron::find_by_id(patron_id)
        .one(&txn)
        .await?
        .ok_or_else(|| DomainError::NotFound("Patron".to_string()))?;

    if patron.status != PatronStatus::Active.as_str() {
        return Err(DomainError::PatronInactive(patron.status));
    }

    // 2. Copy must exist, not already be with this patron, and be available
    let book = Book::find_by_id(book_id)
        .one(&txn)
        .await?
        .ok_or_else(|| DomainError::NotFound("Book".to_string()))?;

    if has_active_loan(&txn, book_id, Some(patron_id)).await? {
        return Err(DomainError::DuplicateLoan);
    }

    let loaned = has_active_loan(&txn, book_id, None).await?;
    let status = policy::effective_copy_status(stored::<CopyStatus>(&book.status)?, loaned);
    if status != CopyStatus::Available {
        return Err(DomainError::CopyUnavailable(status.to_string()));
    }

    // 3. Create loan; the copy is LOANED from here on
    let now = chrono::Utc::now().to_rfc3339();
    let due_date = policy::due_date_from(today);
    let new_loan = loan::ActiveModel {
        patron_id: Set(patron_id),
        book_id: Set(book_id),
        loan_date: Set(today),
        due_date: Set(due_date),
        renewal_date: Set(None),
        renewal_count: Set(0),
        status: Set(LoanStatus::Active.as_str().to_owned()),
        return_date: Set(None),
        return_condition: Set(None),
        notes: Set(None),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    let saved = new_loan.insert(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        "Loan {} created: book {} to patron {}, due {}",
        saved.id,
        book_id,
        patron_id,
        due_date
    );

    Ok(LoanReceipt {
        id: saved.id,
        patron_id,
        patron_name: patron.full_name,
        registration_number: patron.registration_number,
        book_id,
        book_title: book.title,
        book_author: book.author,
        loan_date: saved.loan_date,
        due_date: saved.due_date,
        renewal_count: saved.renewal_count,
        status: LoanStatus::Active,
    })
}

/// Renew an active loan for a fresh window starting today
pub async fn renew_loan(
    db: &DatabaseConnection,
    loan_id: i32,
    today: NaiveDate,
) -> Result<RenewalReceipt, DomainError> {
    let txn = db.begin().await?;

    let (loan, book) = Loan::find_by_id(loan_id)
        .find_also_related(Book)
        .one(&txn)
        .await?
        .ok_or_else(|| DomainError::NotFound("Loan".to_string()))?;

    let renewal = policy::renew(stored(&loan.status)?, loan.renewal_count, today)?;

    let mut loan_active: loan::ActiveModel = loan.into();
    loan_active.due_date = Set(renewal.due_date);
    loan_active.renewal_date = Set(Some(renewal.renewal_date));
    loan_active.renewal_count = Set(renewal.renewal_count);
    loan_active.updated_at = Set(chrono::Utc::now().to_rfc3339());
    loan_active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        "Loan {} renewed ({}/{}), now due {}",
        loan_id,
        renewal.renewal_count,
        policy::MAX_RENEWALS,
        renewal.due_date
    );

    let (book_title, book_author) = book
        .map(|b| (b.title, b.author))
        .unwrap_or_else(|| ("Unknown".to_string(), "Unknown".to_string()));

    Ok(RenewalReceipt {
        loan_id,
        book_title,
        book_author,
        renewal_date: renewal.renewal_date,
        new_due_date: renewal.due_date,
        renewal_count: renewal.renewal_count,
    })
}

/// Return a loan: close it, archive it, and refresh the patron's counters
pub async fn return_loan(
    db: &DatabaseConnection,
    loan_id: i32,
    condition: Option<String>,
    notes: Option<String>,
    today: NaiveDate,
) -> Result<ReturnReceipt, DomainError> {
    let txn = db.begin().await?;

    // 1. Find Loan
    let loan = Loan::find_by_id(loan_id)
        .one(&txn)
        .await?
        .ok_or_else(|| DomainError::NotFound("Loan".to_string()))?;

    if loan.status != LoanStatus::Active.as_str() {
        return Err(DomainError::LoanAlreadyReturned);
    }

    let days_held = policy::days_held(loan.loan_date, today);
    let final_status = policy::final_status(loan.due_date, today);
    let condition = condition
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| policy::DEFAULT_RETURN_CONDITION.to_string());
    let notes = notes.filter(|n| !n.trim().is_empty()).or(loan.notes.clone());
    let now = chrono::Utc::now().to_rfc3339();

    // 2. Close the loan
    let mut loan_active: loan::ActiveModel = loan.clone().into();
    loan_active.status = Set(final_status.as_str().to_owned());
    loan_active.return_date = Set(Some(today));
    loan_active.return_condition = Set(Some(condition.clone()));
    loan_active.notes = Set(notes.clone());
    loan_active.updated_at = Set(now.clone());
    loan_active.update(&txn).await?;

    // 3. Archive it, with the copy's details as they are now
    let (book_title, book_author) = Book::find_by_id(loan.book_id)
        .one(&txn)
        .await?
        .map(|b| (b.title, b.author))
        .unwrap_or_else(|| ("Unknown".to_string(), "Unknown".to_string()));

    let record = loan_history::ActiveModel {
        loan_id: Set(loan.id),
        patron_id: Set(loan.patron_id),
        book_id: Set(loan.book_id),
        book_title: Set(book_title.clone()),
        book_author: Set(book_author.clone()),
        loan_date: Set(loan.loan_date),
        due_date: Set(loan.due_date),
        return_date: Set(today),
        days_held: Set(days_held as i32),
        renewal_count: Set(loan.renewal_count),
        return_condition: Set(condition.clone()),
        final_status: Set(final_status.as_str().to_owned()),
        notes: Set(notes.clone()),
        created_at: Set(now.clone()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    // 4. Patron counters and cached level
    let patron = Patron::find_by_id(loan.patron_id)
        .one(&txn)
        .await?
        .ok_or_else(|| DomainError::NotFound("Patron".to_string()))?;
    let classification = classify_in(&txn, patron.id, today).await?;

    let mut patron_active: patron::ActiveModel = patron.clone().into();
    patron_active.total_loans = Set(patron.total_loans + 1);
    patron_active.reader_level = Set(classification.level.as_str().to_owned());
    patron_active.updated_at = Set(now);
    patron_active.update(&txn).await?;

    txn.commit().await?;

    if final_status == LoanStatus::Overdue {
        tracing::warn!(
            "Loan {} returned late: due {}, returned {}",
            loan_id,
            loan.due_date,
            today
        );
    } else {
        tracing::info!("Loan {} returned after {} days", loan_id, days_held);
    }

    Ok(ReturnReceipt {
        history_id: record.id,
        loan_id,
        patron_id: patron.id,
        patron_name: patron.full_name,
        registration_number: patron.registration_number,
        book_id: loan.book_id,
        book_title,
        book_author,
        loan_date: loan.loan_date,
        due_date: loan.due_date,
        return_date: today,
        days_held,
        renewal_count: loan.renewal_count,
        condition,
        notes,
        status: final_status,
    })
}

/// Remove a copy from the catalog. Returns the deleted title.
pub async fn delete_book(db: &DatabaseConnection, book_id: i32) -> Result<String, DomainError> {
    let txn = db.begin().await?;

    let book = Book::find_by_id(book_id)
        .one(&txn)
        .await?
        .ok_or_else(|| DomainError::NotFound("Book".to_string()))?;

    if has_active_loan(&txn, book_id, None).await? {
        return Err(DomainError::CopyHasActiveLoans);
    }
    if book.status == CopyStatus::Loaned.as_str() {
        return Err(DomainError::CopyCurrentlyLoaned);
    }

    book::Entity::delete_by_id(book_id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!("Deleted book copy {} ({})", book_id, book.copy_code);
    Ok(book.title)
}

/// Loans (active or archived) a patron took since the start of the window
pub async fn count_loans_since<C: ConnectionTrait>(
    db: &C,
    patron_id: i32,
    since: NaiveDate,
) -> Result<u64, DomainError> {
    let active = Loan::find()
        .filter(loan::Column::PatronId.eq(patron_id))
        .filter(loan::Column::Status.eq(LoanStatus::Active.as_str()))
        .filter(loan::Column::LoanDate.gte(since))
        .count(db)
        .await?;

    let archived = LoanHistory::find()
        .filter(loan_history::Column::PatronId.eq(patron_id))
        .filter(loan_history::Column::LoanDate.gte(since))
        .count(db)
        .await?;

    Ok(active + archived)
}

async fn classify_in<C: ConnectionTrait>(
    db: &C,
    patron_id: i32,
    today: NaiveDate,
) -> Result<Classification, DomainError> {
    let since = policy::classification_window_start(today);
    let loan_count = count_loans_since(db, patron_id, since).await?;

    Ok(Classification {
        patron_id,
        loan_count,
        level: ReaderLevel::from_loan_count(loan_count),
    })
}

/// Reader level of a patron from the trailing classification window
pub async fn classify_patron(
    db: &DatabaseConnection,
    patron_id: i32,
    today: NaiveDate,
) -> Result<Classification, DomainError> {
    Patron::find_by_id(patron_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::NotFound("Patron".to_string()))?;

    classify_in(db, patron_id, today).await
}
