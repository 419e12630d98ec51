//! Repository implementations using SeaORM

pub mod book_repository;
pub mod category_repository;
pub mod patron_repository;

pub use book_repository::SeaOrmBookRepository;
pub use category_repository::SeaOrmCategoryRepository;
pub use patron_repository::SeaOrmPatronRepository;
