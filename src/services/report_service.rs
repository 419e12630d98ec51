//! Report Service - read-only views over loans, history and patrons
//!
//! Loan listings are streamed straight from the query cursor; callers decide
//! whether to collect them.

use chrono::NaiveDate;
use futures::{Stream, StreamExt};
use sea_orm::*;
use serde::Serialize;
use std::collections::HashMap;

use crate::domain::DomainError;
use crate::domain::policy::{self, LoanStatus, ReaderLevel, Situation};
use crate::models::book::{self, Entity as Book};
use crate::models::category;
use crate::models::loan::{self, Entity as Loan};
use crate::models::loan_history::{self, Entity as LoanHistory};
use crate::models::patron::{self, Entity as Patron};

/// Most recent events shown on a patron timeline
pub const TIMELINE_LIMIT: usize = 40;

#[derive(Debug, FromQueryResult)]
struct ActiveLoanRow {
    id: i32,
    patron_id: i32,
    patron_name: String,
    registration_number: String,
    patron_email: String,
    book_id: i32,
    book_title: String,
    book_author: String,
    category: String,
    copy_code: String,
    loan_date: NaiveDate,
    due_date: NaiveDate,
    renewal_date: Option<NaiveDate>,
    renewal_count: i32,
}

/// An active loan as shown on the circulation desk
#[derive(Debug, Clone, Serialize)]
pub struct ActiveLoanEntry {
    pub id: i32,
    pub patron_id: i32,
    pub patron_name: String,
    pub registration_number: String,
    pub patron_email: String,
    pub book_id: i32,
    pub book_title: String,
    pub book_author: String,
    pub category: String,
    pub copy_code: String,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub renewal_date: Option<NaiveDate>,
    pub renewal_count: i32,
    pub renewals_left: i32,
    pub days_overdue: i64,
    pub situation: Situation,
}

impl ActiveLoanEntry {
    fn from_row(row: ActiveLoanRow, today: NaiveDate) -> Self {
        Self {
            id: row.id,
            patron_id: row.patron_id,
            patron_name: row.patron_name,
            registration_number: row.registration_number,
            patron_email: row.patron_email,
            book_id: row.book_id,
            book_title: row.book_title,
            book_author: row.book_author,
            category: row.category,
            copy_code: row.copy_code,
            loan_date: row.loan_date,
            due_date: row.due_date,
            renewal_date: row.renewal_date,
            renewal_count: row.renewal_count,
            renewals_left: (policy::MAX_RENEWALS - row.renewal_count).max(0),
            days_overdue: policy::days_overdue(row.due_date, today),
            situation: policy::situation(row.due_date, today),
        }
    }
}

fn active_loan_query() -> Select<Loan> {
    Loan::find()
        .select_only()
        .column(loan::Column::Id)
        .column(loan::Column::PatronId)
        .column_as(patron::Column::FullName, "patron_name")
        .column(patron::Column::RegistrationNumber)
        .column_as(patron::Column::Email, "patron_email")
        .column(loan::Column::BookId)
        .column_as(book::Column::Title, "book_title")
        .column_as(book::Column::Author, "book_author")
        .column_as(category::Column::Name, "category")
        .column(book::Column::CopyCode)
        .column(loan::Column::LoanDate)
        .column(loan::Column::DueDate)
        .column(loan::Column::RenewalDate)
        .column(loan::Column::RenewalCount)
        .join(JoinType::InnerJoin, loan::Relation::Patron.def())
        .join(JoinType::InnerJoin, loan::Relation::Book.def())
        .join(JoinType::InnerJoin, book::Relation::Category.def())
        .filter(loan::Column::Status.eq(LoanStatus::Active.as_str()))
}

async fn stream_active<'a>(
    db: &'a DatabaseConnection,
    query: Select<Loan>,
    today: NaiveDate,
) -> Result<impl Stream<Item = Result<ActiveLoanEntry, DomainError>> + Send + 'a, DomainError> {
    let rows = query.into_model::<ActiveLoanRow>().stream(db).await?;

    Ok(rows.map(move |row| {
        row.map(|r| ActiveLoanEntry::from_row(r, today))
            .map_err(DomainError::from)
    }))
}

/// Every active loan, soonest due first
pub async fn active_loans<'a>(
    db: &'a DatabaseConnection,
    today: NaiveDate,
) -> Result<impl Stream<Item = Result<ActiveLoanEntry, DomainError>> + Send + 'a, DomainError> {
    let query = active_loan_query()
        .order_by_asc(loan::Column::DueDate)
        .order_by_desc(loan::Column::LoanDate);

    stream_active(db, query, today).await
}

/// Active loans past their due date, most overdue first
pub async fn overdue_loans<'a>(
    db: &'a DatabaseConnection,
    today: NaiveDate,
) -> Result<impl Stream<Item = Result<ActiveLoanEntry, DomainError>> + Send + 'a, DomainError> {
    let query = active_loan_query()
        .filter(loan::Column::DueDate.lt(today))
        .order_by_asc(loan::Column::DueDate)
        .order_by_desc(loan::Column::LoanDate);

    stream_active(db, query, today).await
}

/// Active loans of one patron, soonest due first
pub async fn patron_active_loans<'a>(
    db: &'a DatabaseConnection,
    patron_id: i32,
    today: NaiveDate,
) -> Result<impl Stream<Item = Result<ActiveLoanEntry, DomainError>> + Send + 'a, DomainError> {
    let query = active_loan_query()
        .filter(loan::Column::PatronId.eq(patron_id))
        .order_by_asc(loan::Column::DueDate);

    stream_active(db, query, today).await
}

/// One archived loan, as listed to administrators
#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct HistoryEntry {
    pub id: i32,
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
    pub days_held: i32,
    pub renewal_count: i32,
    pub return_condition: String,
    pub final_status: String,
    pub notes: Option<String>,
}

/// Every archived loan, most recently returned first
pub async fn loan_history<'a>(
    db: &'a DatabaseConnection,
) -> Result<impl Stream<Item = Result<HistoryEntry, DomainError>> + Send + 'a, DomainError> {
    let rows = LoanHistory::find()
        .select_only()
        .column(loan_history::Column::Id)
        .column(loan_history::Column::LoanId)
        .column(loan_history::Column::PatronId)
        .column_as(patron::Column::FullName, "patron_name")
        .column(patron::Column::RegistrationNumber)
        .column(loan_history::Column::BookId)
        .column(loan_history::Column::BookTitle)
        .column(loan_history::Column::BookAuthor)
        .column(loan_history::Column::LoanDate)
        .column(loan_history::Column::DueDate)
        .column(loan_history::Column::ReturnDate)
        .column(loan_history::Column::DaysHeld)
        .column(loan_history::Column::RenewalCount)
        .column(loan_history::Column::ReturnCondition)
        .column(loan_history::Column::FinalStatus)
        .column(loan_history::Column::Notes)
        .join(JoinType::InnerJoin, loan_history::Relation::Patron.def())
        .order_by_desc(loan_history::Column::ReturnDate)
        .order_by_desc(loan_history::Column::Id)
        .into_model::<HistoryEntry>()
        .stream(db)
        .await?;

    Ok(rows.map(|row| row.map_err(DomainError::from)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimelineEvent {
    Checkout,
    Return,
}

/// One event on a patron's reading timeline
#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub event: TimelineEvent,
    pub date: NaiveDate,
    pub loan_id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub book_author: String,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: String,
}

/// Checkout and return events of a patron, newest first, capped at
/// [`TIMELINE_LIMIT`]. Same-day events list the return first.
pub async fn patron_timeline(
    db: &DatabaseConnection,
    patron_id: i32,
) -> Result<Vec<TimelineEntry>, DomainError> {
    Patron::find_by_id(patron_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::NotFound("Patron".to_string()))?;

    let mut events = Vec::new();

    let active = Loan::find()
        .filter(loan::Column::PatronId.eq(patron_id))
        .filter(loan::Column::Status.eq(LoanStatus::Active.as_str()))
        .find_also_related(Book)
        .all(db)
        .await?;

    for (loan, book) in active {
        let (title, author) = book.map(|b| (b.title, b.author)).unwrap_or_default();
        events.push(TimelineEntry {
            event: TimelineEvent::Checkout,
            date: loan.loan_date,
            loan_id: loan.id,
            book_id: loan.book_id,
            book_title: title,
            book_author: author,
            due_date: loan.due_date,
            return_date: None,
            status: loan.status,
        });
    }

    let archived = LoanHistory::find()
        .filter(loan_history::Column::PatronId.eq(patron_id))
        .all(db)
        .await?;

    for record in archived {
        events.push(TimelineEntry {
            event: TimelineEvent::Checkout,
            date: record.loan_date,
            loan_id: record.loan_id,
            book_id: record.book_id,
            book_title: record.book_title.clone(),
            book_author: record.book_author.clone(),
            due_date: record.due_date,
            return_date: Some(record.return_date),
            status: record.final_status.clone(),
        });
        events.push(TimelineEntry {
            event: TimelineEvent::Return,
            date: record.return_date,
            loan_id: record.loan_id,
            book_id: record.book_id,
            book_title: record.book_title,
            book_author: record.book_author,
            due_date: record.due_date,
            return_date: Some(record.return_date),
            status: record.final_status,
        });
    }

    events.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| (b.event == TimelineEvent::Return).cmp(&(a.event == TimelineEvent::Return)))
            .then_with(|| b.loan_id.cmp(&a.loan_id))
    });
    events.truncate(TIMELINE_LIMIT);

    Ok(events)
}

/// Reading statistics of a single patron
#[derive(Debug, Clone, Serialize)]
pub struct PatronStats {
    pub patron_id: i32,
    pub full_name: String,
    pub total_loans: i32,
    pub active_loans: u64,
    pub overdue_loans: u64,
    pub returned_loans: u64,
    pub late_returns: u64,
    pub recent_loans: u64,
    pub reader_level: ReaderLevel,
    pub achievements: i32,
}

pub async fn patron_stats(
    db: &DatabaseConnection,
    patron_id: i32,
    today: NaiveDate,
) -> Result<PatronStats, DomainError> {
    let patron = Patron::find_by_id(patron_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::NotFound("Patron".to_string()))?;

    let active = Loan::find()
        .filter(loan::Column::PatronId.eq(patron_id))
        .filter(loan::Column::Status.eq(LoanStatus::Active.as_str()));
    let active_loans = active.clone().count(db).await?;
    let overdue_loans = active
        .filter(loan::Column::DueDate.lt(today))
        .count(db)
        .await?;

    let archived = LoanHistory::find().filter(loan_history::Column::PatronId.eq(patron_id));
    let returned_loans = archived.clone().count(db).await?;
    let late_returns = archived
        .filter(loan_history::Column::FinalStatus.eq(LoanStatus::Overdue.as_str()))
        .count(db)
        .await?;

    let since = policy::classification_window_start(today);
    let recent_loans = super::loan_service::count_loans_since(db, patron_id, since).await?;

    Ok(PatronStats {
        patron_id,
        full_name: patron.full_name,
        total_loans: patron.total_loans,
        active_loans,
        overdue_loans,
        returned_loans,
        late_returns,
        recent_loans,
        reader_level: ReaderLevel::from_loan_count(recent_loans),
        achievements: patron.achievements,
    })
}

#[derive(Default, Clone, Copy)]
struct StatCounts {
    active: u64,
    overdue: u64,
    returned: u64,
    late: u64,
    recent: u64,
}

/// Statistics for every patron, ordered by name
pub async fn all_patron_stats(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<Vec<PatronStats>, DomainError> {
    let since = policy::classification_window_start(today);

    let active: Vec<(i32, NaiveDate, NaiveDate)> = Loan::find()
        .select_only()
        .column(loan::Column::PatronId)
        .column(loan::Column::LoanDate)
        .column(loan::Column::DueDate)
        .filter(loan::Column::Status.eq(LoanStatus::Active.as_str()))
        .into_tuple()
        .all(db)
        .await?;

    let archived: Vec<(i32, NaiveDate, String)> = LoanHistory::find()
        .select_only()
        .column(loan_history::Column::PatronId)
        .column(loan_history::Column::LoanDate)
        .column(loan_history::Column::FinalStatus)
        .into_tuple()
        .all(db)
        .await?;

    let mut counts: HashMap<i32, StatCounts> = HashMap::new();
    for (patron_id, loan_date, due_date) in active {
        let entry = counts.entry(patron_id).or_default();
        entry.active += 1;
        if due_date < today {
            entry.overdue += 1;
        }
        if loan_date >= since {
            entry.recent += 1;
        }
    }
    for (patron_id, loan_date, final_status) in archived {
        let entry = counts.entry(patron_id).or_default();
        entry.returned += 1;
        if final_status == LoanStatus::Overdue.as_str() {
            entry.late += 1;
        }
        if loan_date >= since {
            entry.recent += 1;
        }
    }

    let patrons = Patron::find()
        .order_by_asc(patron::Column::FullName)
        .all(db)
        .await?;

    Ok(patrons
        .into_iter()
        .map(|p| {
            let c = counts.get(&p.id).copied().unwrap_or_default();
            PatronStats {
                patron_id: p.id,
                full_name: p.full_name,
                total_loans: p.total_loans,
                active_loans: c.active,
                overdue_loans: c.overdue,
                returned_loans: c.returned,
                late_returns: c.late,
                recent_loans: c.recent,
                reader_level: ReaderLevel::from_loan_count(c.recent),
                achievements: p.achievements,
            }
        })
        .collect())
}

/// One line of the readers report
#[derive(Debug, Clone, Serialize)]
pub struct ReaderReportEntry {
    pub patron_id: i32,
    pub full_name: String,
    pub registration_number: String,
    pub loan_count: u64,
    pub returned: u64,
    pub returned_late: u64,
    pub level: ReaderLevel,
}

/// Classify every patron over the trailing window, busiest readers first
pub async fn readers_report(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<Vec<ReaderReportEntry>, DomainError> {
    let since = policy::classification_window_start(today);

    let active: Vec<i32> = Loan::find()
        .select_only()
        .column(loan::Column::PatronId)
        .filter(loan::Column::Status.eq(LoanStatus::Active.as_str()))
        .filter(loan::Column::LoanDate.gte(since))
        .into_tuple()
        .all(db)
        .await?;

    let archived: Vec<(i32, String)> = LoanHistory::find()
        .select_only()
        .column(loan_history::Column::PatronId)
        .column(loan_history::Column::FinalStatus)
        .filter(loan_history::Column::LoanDate.gte(since))
        .into_tuple()
        .all(db)
        .await?;

    // (loans, returned, late)
    let mut counts: HashMap<i32, (u64, u64, u64)> = HashMap::new();
    for patron_id in active {
        counts.entry(patron_id).or_default().0 += 1;
    }
    for (patron_id, final_status) in archived {
        let entry = counts.entry(patron_id).or_default();
        entry.0 += 1;
        entry.1 += 1;
        if final_status == LoanStatus::Overdue.as_str() {
            entry.2 += 1;
        }
    }

    let patrons = Patron::find()
        .order_by_asc(patron::Column::FullName)
        .all(db)
        .await?;

    let mut report: Vec<ReaderReportEntry> = patrons
        .into_iter()
        .map(|p| {
            let (loan_count, returned, returned_late) =
                counts.get(&p.id).copied().unwrap_or_default();
            ReaderReportEntry {
                patron_id: p.id,
                full_name: p.full_name,
                registration_number: p.registration_number,
                loan_count,
                returned,
                returned_late,
                level: ReaderLevel::from_loan_count(loan_count),
            }
        })
        .collect();

    // stable: ties keep name order
    report.sort_by(|a, b| b.loan_count.cmp(&a.loan_count));

    Ok(report)
}
