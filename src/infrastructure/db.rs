use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    // Run migrations manually (simple SQL)
    run_migrations(&db).await?;

    Ok(db)
}

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Categories are static reference data
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT
        )
        "#
        .to_owned(),
    ))
    .await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        INSERT OR IGNORE INTO categories (name, description) VALUES
            ('Fiction', 'Novels, short stories and other narrative prose'),
            ('Non-fiction', 'Essays, biographies and reportage'),
            ('Science', 'Natural and exact sciences'),
            ('Technology', 'Computing, engineering and applied sciences'),
            ('History', 'History and social sciences'),
            ('Poetry', 'Poetry collections and anthologies'),
            ('Comics', 'Comics, manga and graphic novels'),
            ('Textbooks', 'Course material and reference books')
        "#
        .to_owned(),
    ))
    .await?;

    // Catalog: one row per physical copy
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            category_id INTEGER NOT NULL,
            synopsis TEXT,
            page_count INTEGER,
            copy_code TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL DEFAULT 'AVAILABLE',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (category_id) REFERENCES categories(id)
        );
        CREATE INDEX IF NOT EXISTS idx_books_title ON books(title);
        CREATE INDEX IF NOT EXISTS idx_books_category_id ON books(category_id);
        "#
        .to_owned(),
    ))
    .await?;

    // Create patrons table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS patrons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            registration_number TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL DEFAULT 'ACTIVE',
            total_loans INTEGER NOT NULL DEFAULT 0,
            reader_level TEXT NOT NULL DEFAULT 'BEGINNER',
            achievements INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_patrons_full_name ON patrons(full_name);
        "#
        .to_owned(),
    ))
    .await?;

    // Loans are kept after their copy is deleted, so book_id carries no foreign key
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS loans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patron_id INTEGER NOT NULL,
            book_id INTEGER NOT NULL,
            loan_date TEXT NOT NULL,
            due_date TEXT NOT NULL,
            renewal_date TEXT,
            renewal_count INTEGER NOT NULL DEFAULT 0 CHECK (renewal_count BETWEEN 0 AND 3),
            status TEXT NOT NULL DEFAULT 'ACTIVE',
            return_date TEXT,
            return_condition TEXT,
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (patron_id) REFERENCES patrons(id)
        );
        CREATE INDEX IF NOT EXISTS idx_loans_patron_id ON loans(patron_id);
        CREATE INDEX IF NOT EXISTS idx_loans_book_id ON loans(book_id);
        CREATE INDEX IF NOT EXISTS idx_loans_status ON loans(status);
        "#
        .to_owned(),
    ))
    .await?;

    // A copy can only be out with one patron at a time
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_loans_one_active_per_book
        ON loans(book_id) WHERE status = 'ACTIVE'
        "#
        .to_owned(),
    ))
    .await?;

    // Archived loans snapshot the copy's title and author
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS loan_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            loan_id INTEGER NOT NULL,
            patron_id INTEGER NOT NULL,
            book_id INTEGER NOT NULL,
            book_title TEXT NOT NULL,
            book_author TEXT NOT NULL,
            loan_date TEXT NOT NULL,
            due_date TEXT NOT NULL,
            return_date TEXT NOT NULL,
            days_held INTEGER NOT NULL,
            renewal_count INTEGER NOT NULL DEFAULT 0,
            return_condition TEXT NOT NULL,
            final_status TEXT NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (patron_id) REFERENCES patrons(id)
        );
        CREATE INDEX IF NOT EXISTS idx_loan_history_patron_id ON loan_history(patron_id);
        CREATE INDEX IF NOT EXISTS idx_loan_history_loan_date ON loan_history(loan_date);
        "#
        .to_owned(),
    ))
    .await?;

    // History is append-only
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TRIGGER IF NOT EXISTS trg_loan_history_no_update
        BEFORE UPDATE ON loan_history
        BEGIN
            SELECT RAISE(ABORT, 'loan_history is append-only');
        END
        "#
        .to_owned(),
    ))
    .await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TRIGGER IF NOT EXISTS trg_loan_history_no_delete
        BEFORE DELETE ON loan_history
        BEGIN
            SELECT RAISE(ABORT, 'loan_history is append-only');
        END
        "#
        .to_owned(),
    ))
    .await?;

    Ok(())
}
