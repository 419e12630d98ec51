//! Domain error types
//!
//! These errors are framework-agnostic and represent business-level failures.
//! The HTTP layer maps [`ErrorKind`] to a status code.

use std::fmt;

/// Broad category of a failure, used to pick the response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Forbidden,
    NotFound,
    StateConflict,
    Conflict,
    Persistence,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Missing or malformed input
    Validation(String),
    /// Entity absent
    NotFound(String),
    /// Patron account is not ACTIVE; carries the current status
    PatronInactive(String),
    /// Copy cannot be loaned; carries its effective status
    CopyUnavailable(String),
    /// Patron already holds an active loan for this copy
    DuplicateLoan,
    /// Renewal attempted on a loan that is no longer active
    LoanNotActive,
    /// Return attempted on a loan that was already closed
    LoanAlreadyReturned,
    /// Loan has used all of its renewals
    RenewalLimitExceeded,
    /// Stored copy status still reads LOANED
    CopyCurrentlyLoaned,
    /// An active loan references the copy
    CopyHasActiveLoans,
    /// Unique field already taken
    Conflict(String),
    /// Database/persistence error
    Database(String),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Validation(_) => ErrorKind::Validation,
            DomainError::NotFound(_) => ErrorKind::NotFound,
            DomainError::PatronInactive(_) => ErrorKind::Forbidden,
            DomainError::CopyUnavailable(_)
            | DomainError::DuplicateLoan
            | DomainError::LoanNotActive
            | DomainError::LoanAlreadyReturned
            | DomainError::RenewalLimitExceeded
            | DomainError::CopyCurrentlyLoaned
            | DomainError::CopyHasActiveLoans => ErrorKind::StateConflict,
            DomainError::Conflict(_) => ErrorKind::Conflict,
            DomainError::Database(_) => ErrorKind::Persistence,
        }
    }

    /// Human-readable message shown to the calling UI.
    pub fn message(&self) -> String {
        match self {
            DomainError::Validation(msg) | DomainError::Conflict(msg) => msg.clone(),
            DomainError::NotFound(what) => format!("{} not found", what),
            DomainError::PatronInactive(status) => format!(
                "Patron account is {}; borrowing is not allowed",
                status.to_lowercase()
            ),
            DomainError::CopyUnavailable(status) => {
                format!("Book copy is not available. Current status: {}", status)
            }
            DomainError::DuplicateLoan => "Patron already holds this book copy".to_string(),
            DomainError::LoanNotActive => "Loan is not active".to_string(),
            DomainError::LoanAlreadyReturned => "Loan has already been returned".to_string(),
            DomainError::RenewalLimitExceeded => {
                "Renewal limit reached: a loan can be renewed at most 3 times".to_string()
            }
            DomainError::CopyCurrentlyLoaned => {
                "Cannot delete a book copy that is currently loaned".to_string()
            }
            DomainError::CopyHasActiveLoans => {
                "Cannot delete a book copy with active loans".to_string()
            }
            DomainError::Database(_) => "Internal server error".to_string(),
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::Database(msg) => write!(f, "Database error: {}", msg),
            other => write!(f, "{}", other.message()),
        }
    }
}

impl std::error::Error for DomainError {}

// Conversion from SeaORM errors (used in infrastructure layer)
impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Database(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_conflicts_share_a_kind() {
        assert_eq!(DomainError::DuplicateLoan.kind(), ErrorKind::StateConflict);
        assert_eq!(
            DomainError::RenewalLimitExceeded.kind(),
            ErrorKind::StateConflict
        );
        assert_eq!(
            DomainError::PatronInactive("SUSPENDED".into()).kind(),
            ErrorKind::Forbidden
        );
    }

    #[test]
    fn database_detail_stays_out_of_the_message() {
        let err = DomainError::Database("disk I/O error".into());
        assert_eq!(err.message(), "Internal server error");
        assert_eq!(err.to_string(), "Database error: disk I/O error");
    }
}
