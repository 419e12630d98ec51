use crate::domain::policy::{CopyStatus, PatronStatus, ReaderLevel};
use crate::models::{book, category, patron};
use sea_orm::*;

const DEMO_PATRONS: [(&str, &str, &str); 4] = [
    ("Ana Souza", "ana.souza@example.org", "2023001"),
    ("Bruno Lima", "bruno.lima@example.org", "2023002"),
    ("Carla Mendes", "carla.mendes@example.org", "2023003"),
    ("Diego Rocha", "diego.rocha@example.org", "2023004"),
];

// (title, author, category, copy code, pages)
const DEMO_BOOKS: [(&str, &str, &str, &str, i32); 8] = [
    ("Dom Casmurro", "Machado de Assis", "Fiction", "FIC-000001", 256),
    ("Dom Casmurro", "Machado de Assis", "Fiction", "FIC-000002", 256),
    ("The Hobbit", "J.R.R. Tolkien", "Fiction", "FIC-000003", 310),
    ("A Brief History of Time", "Stephen Hawking", "Science", "SCI-000001", 212),
    ("The Pragmatic Programmer", "Andrew Hunt", "Technology", "TEC-000001", 352),
    ("Sapiens", "Yuval Noah Harari", "History", "HIS-000001", 443),
    ("Leaves of Grass", "Walt Whitman", "Poetry", "POE-000001", 145),
    ("Watchmen", "Alan Moore", "Comics", "COM-000001", 416),
];

/// Insert a few patrons and copies. Existing rows are left alone.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    let now = chrono::Utc::now().to_rfc3339();

    // 1. Patrons
    for (name, email, number) in DEMO_PATRONS {
        let exists = patron::Entity::find()
            .filter(patron::Column::RegistrationNumber.eq(number))
            .count(db)
            .await?;
        if exists > 0 {
            continue;
        }

        let row = patron::ActiveModel {
            full_name: Set(name.to_owned()),
            email: Set(email.to_owned()),
            registration_number: Set(number.to_owned()),
            status: Set(PatronStatus::Active.as_str().to_owned()),
            total_loans: Set(0),
            reader_level: Set(ReaderLevel::Beginner.as_str().to_owned()),
            achievements: Set(0),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        };

        row.insert(db).await?;
    }

    // 2. Copies
    for (title, author, category_name, code, pages) in DEMO_BOOKS {
        let exists = book::Entity::find()
            .filter(book::Column::CopyCode.eq(code))
            .count(db)
            .await?;
        if exists > 0 {
            continue;
        }

        let Some(category) = category::Entity::find()
            .filter(category::Column::Name.eq(category_name))
            .one(db)
            .await?
        else {
            tracing::warn!("Seed category {} missing, skipping {}", category_name, code);
            continue;
        };

        let copy = book::ActiveModel {
            title: Set(title.to_owned()),
            author: Set(author.to_owned()),
            category_id: Set(category.id),
            synopsis: Set(None),
            page_count: Set(Some(pages)),
            copy_code: Set(code.to_owned()),
            status: Set(CopyStatus::Available.as_str().to_owned()),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        };

        copy.insert(db).await?;
    }

    Ok(())
}
