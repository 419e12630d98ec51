pub mod book;
pub mod category;
pub mod loan;
pub mod loan_history;
pub mod patron;

pub use patron::PatronDto;
