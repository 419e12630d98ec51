//! Loan policy rules
//!
//! Pure date and state rules shared by the loan service and the reports.
//! Nothing here touches the database; every function takes `today` explicitly.

use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DomainError;

/// Length of a loan (and of every renewal window), in days.
pub const LOAN_PERIOD_DAYS: i64 = 7;
/// Maximum number of renewals per loan.
pub const MAX_RENEWALS: i32 = 3;
/// Trailing window used for reader classification.
pub const CLASSIFICATION_WINDOW_MONTHS: u32 = 6;
/// Condition recorded when a return does not state one.
pub const DEFAULT_RETURN_CONDITION: &str = "GOOD";

macro_rules! string_enum {
    ($name:ident, $label:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(DomainError::Validation(format!(
                        "Invalid {}: {}",
                        $label, other
                    ))),
                }
            }
        }
    };
}

string_enum!(LoanStatus, "loan status" {
    Active => "ACTIVE",
    Returned => "RETURNED",
    Overdue => "OVERDUE",
});

string_enum!(CopyStatus, "book status" {
    Available => "AVAILABLE",
    Loaned => "LOANED",
    Unavailable => "UNAVAILABLE",
    Maintenance => "MAINTENANCE",
    Reserved => "RESERVED",
});

string_enum!(PatronStatus, "patron status" {
    Active => "ACTIVE",
    Suspended => "SUSPENDED",
    Inactive => "INACTIVE",
});

string_enum!(ReaderLevel, "reader level" {
    Beginner => "BEGINNER",
    Regular => "REGULAR",
    Active => "ACTIVE",
    Extreme => "EXTREME",
});

string_enum!(Situation, "situation" {
    Overdue => "OVERDUE",
    OnTime => "ON_TIME",
});

impl ReaderLevel {
    /// Level for a number of loans taken inside the classification window.
    pub fn from_loan_count(count: u64) -> Self {
        match count {
            0..=5 => ReaderLevel::Beginner,
            6..=10 => ReaderLevel::Regular,
            11..=20 => ReaderLevel::Active,
            _ => ReaderLevel::Extreme,
        }
    }
}

impl CopyStatus {
    /// Whether an admin may store this status on a copy. LOANED is derived
    /// from the loans table and never written directly.
    pub fn is_manual(&self) -> bool {
        !matches!(self, CopyStatus::Loaned)
    }
}

/// Due date for a loan (or renewal) starting on `day`.
pub fn due_date_from(day: NaiveDate) -> NaiveDate {
    day + Duration::days(LOAN_PERIOD_DAYS)
}

/// Outcome of a successful renewal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renewal {
    pub due_date: NaiveDate,
    pub renewal_date: NaiveDate,
    pub renewal_count: i32,
}

/// Apply the renewal rule. The new window always starts today; renewals
/// never extend the previous due date.
pub fn renew(
    status: LoanStatus,
    renewal_count: i32,
    today: NaiveDate,
) -> Result<Renewal, DomainError> {
    if status != LoanStatus::Active {
        return Err(DomainError::LoanNotActive);
    }
    if renewal_count >= MAX_RENEWALS {
        return Err(DomainError::RenewalLimitExceeded);
    }

    Ok(Renewal {
        due_date: due_date_from(today),
        renewal_date: today,
        renewal_count: renewal_count + 1,
    })
}

/// Whole days between checkout and `today`.
pub fn days_held(loan_date: NaiveDate, today: NaiveDate) -> i64 {
    (today - loan_date).num_days().max(0)
}

/// Status a loan closes with. Returning on the due date is on time.
pub fn final_status(due_date: NaiveDate, today: NaiveDate) -> LoanStatus {
    if today > due_date {
        LoanStatus::Overdue
    } else {
        LoanStatus::Returned
    }
}

pub fn days_overdue(due_date: NaiveDate, today: NaiveDate) -> i64 {
    (today - due_date).num_days().max(0)
}

pub fn situation(due_date: NaiveDate, today: NaiveDate) -> Situation {
    if days_overdue(due_date, today) > 0 {
        Situation::Overdue
    } else {
        Situation::OnTime
    }
}

/// First loan date counted by the classification window.
pub fn classification_window_start(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_months(Months::new(CLASSIFICATION_WINDOW_MONTHS))
        .unwrap_or(NaiveDate::MIN)
}

/// Status a copy shows to patrons: an active loan always wins over the
/// stored manual flag.
pub fn effective_copy_status(stored: CopyStatus, has_active_loan: bool) -> CopyStatus {
    if has_active_loan {
        CopyStatus::Loaned
    } else {
        stored
    }
}

/// Copy code used when the catalog entry does not provide one:
/// first three letters of the category and the last six digits of `millis`.
pub fn generate_copy_code(category: &str, millis: i64) -> String {
    let prefix: String = category.chars().take(3).collect::<String>().to_uppercase();
    format!("{}-{:06}", prefix, millis.rem_euclid(1_000_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + Duration::days(n)
    }

    #[test]
    fn loan_is_due_a_week_later() {
        assert_eq!(due_date_from(day(0)), day(7));
    }

    #[test]
    fn renewal_restarts_window_from_today() {
        let r = renew(LoanStatus::Active, 0, day(6)).unwrap();
        assert_eq!(r.due_date, day(13));
        assert_eq!(r.renewal_date, day(6));
        assert_eq!(r.renewal_count, 1);

        // late renewal still gets a full window
        let late = renew(LoanStatus::Active, 1, day(20)).unwrap();
        assert_eq!(late.due_date, day(27));
    }

    #[test]
    fn fourth_renewal_is_refused() {
        assert_eq!(
            renew(LoanStatus::Active, 3, day(1)),
            Err(DomainError::RenewalLimitExceeded)
        );
        assert_eq!(
            renew(LoanStatus::Returned, 0, day(1)),
            Err(DomainError::LoanNotActive)
        );
    }

    #[test]
    fn returning_on_due_date_is_on_time() {
        assert_eq!(final_status(day(7), day(7)), LoanStatus::Returned);
        assert_eq!(final_status(day(7), day(8)), LoanStatus::Overdue);
        assert_eq!(final_status(day(7), day(0)), LoanStatus::Returned);
    }

    #[test]
    fn days_held_counts_whole_days() {
        assert_eq!(days_held(day(0), day(0)), 0);
        assert_eq!(days_held(day(0), day(10)), 10);
    }

    #[test]
    fn overdue_days_never_negative() {
        assert_eq!(days_overdue(day(7), day(3)), 0);
        assert_eq!(days_overdue(day(7), day(10)), 3);
        assert_eq!(situation(day(7), day(7)), Situation::OnTime);
        assert_eq!(situation(day(7), day(9)), Situation::Overdue);
    }

    #[test]
    fn level_thresholds() {
        assert_eq!(ReaderLevel::from_loan_count(0), ReaderLevel::Beginner);
        assert_eq!(ReaderLevel::from_loan_count(5), ReaderLevel::Beginner);
        assert_eq!(ReaderLevel::from_loan_count(6), ReaderLevel::Regular);
        assert_eq!(ReaderLevel::from_loan_count(10), ReaderLevel::Regular);
        assert_eq!(ReaderLevel::from_loan_count(11), ReaderLevel::Active);
        assert_eq!(ReaderLevel::from_loan_count(20), ReaderLevel::Active);
        assert_eq!(ReaderLevel::from_loan_count(21), ReaderLevel::Extreme);
    }

    #[test]
    fn window_goes_back_six_calendar_months() {
        let today = NaiveDate::from_ymd_opt(2024, 8, 31).unwrap();
        assert_eq!(
            classification_window_start(today),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn active_loan_overrides_stored_status() {
        assert_eq!(
            effective_copy_status(CopyStatus::Available, true),
            CopyStatus::Loaned
        );
        assert_eq!(
            effective_copy_status(CopyStatus::Maintenance, false),
            CopyStatus::Maintenance
        );
    }

    #[test]
    fn statuses_parse_case_insensitively() {
        assert_eq!("active".parse::<PatronStatus>().unwrap(), PatronStatus::Active);
        assert_eq!("ON_TIME".parse::<Situation>().unwrap(), Situation::OnTime);
        assert!(matches!(
            "lost".parse::<CopyStatus>(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn generated_code_uses_category_prefix() {
        assert_eq!(generate_copy_code("Fiction", 1_712_345_678_901), "FIC-678901");
        assert_eq!(generate_copy_code("Art", 42), "ART-000042");
    }
}
