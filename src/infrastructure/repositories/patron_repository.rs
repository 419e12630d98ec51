//! SeaORM implementation of PatronRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::domain::policy::{PatronStatus, ReaderLevel};
use crate::domain::{DomainError, NewPatron, PatronFilter, PatronPatch, PatronRepository};
use crate::models::PatronDto;
use crate::models::patron::{ActiveModel, Column, Entity as PatronEntity};

/// SeaORM-based implementation of PatronRepository
pub struct SeaOrmPatronRepository {
    db: DatabaseConnection,
}

impl SeaOrmPatronRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Fails with `Conflict` when another patron already uses `value` in `column`.
async fn ensure_unique<C: ConnectionTrait>(
    db: &C,
    column: Column,
    value: &str,
    except_id: Option<i32>,
    label: &str,
) -> Result<(), DomainError> {
    let mut query = PatronEntity::find().filter(column.eq(value));
    if let Some(id) = except_id {
        query = query.filter(Column::Id.ne(id));
    }

    if query.count(db).await? > 0 {
        return Err(DomainError::Conflict(format!(
            "{} already registered: {}",
            label, value
        )));
    }
    Ok(())
}

fn required(value: &str, field: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

#[async_trait]
impl PatronRepository for SeaOrmPatronRepository {
    async fn find_all(&self, filter: PatronFilter) -> Result<Vec<PatronDto>, DomainError> {
        let mut query = PatronEntity::find();

        if let Some(q) = filter.search.as_deref().filter(|q| !q.is_empty()) {
            let cond = Condition::any()
                .add(Column::FullName.contains(q))
                .add(Column::Email.contains(q))
                .add(Column::RegistrationNumber.contains(q));
            query = query.filter(cond);
        }

        if let Some(status) = filter.status {
            query = query.filter(Column::Status.eq(status.as_str()));
        }

        let patrons = query.order_by_asc(Column::FullName).all(&self.db).await?;

        Ok(patrons.into_iter().map(PatronDto::from).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<PatronDto>, DomainError> {
        let patron = PatronEntity::find_by_id(id).one(&self.db).await?;
        Ok(patron.map(PatronDto::from))
    }

    async fn find_by_registration_number(
        &self,
        registration_number: &str,
    ) -> Result<Option<PatronDto>, DomainError> {
        let patron = PatronEntity::find()
            .filter(Column::RegistrationNumber.eq(registration_number))
            .one(&self.db)
            .await?;
        Ok(patron.map(PatronDto::from))
    }

    async fn create(&self, input: NewPatron) -> Result<PatronDto, DomainError> {
        required(&input.full_name, "Full name")?;
        required(&input.email, "Email")?;
        required(&input.registration_number, "Registration number")?;

        let txn = self.db.begin().await?;

        ensure_unique(
            &txn,
            Column::RegistrationNumber,
            &input.registration_number,
            None,
            "Registration number",
        )
        .await?;
        ensure_unique(&txn, Column::Email, &input.email, None, "Email").await?;

        let now = chrono::Utc::now().to_rfc3339();
        let new_patron = ActiveModel {
            full_name: Set(input.full_name),
            email: Set(input.email),
            registration_number: Set(input.registration_number),
            status: Set(PatronStatus::Active.as_str().to_owned()),
            total_loans: Set(0),
            reader_level: Set(ReaderLevel::Beginner.as_str().to_owned()),
            achievements: Set(0),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let saved = new_patron.insert(&txn).await?;
        txn.commit().await?;

        tracing::info!("Registered patron {} ({})", saved.id, saved.registration_number);
        Ok(PatronDto::from(saved))
    }

    async fn update(&self, id: i32, patch: PatronPatch) -> Result<PatronDto, DomainError> {
        if patch.is_empty() {
            return Err(DomainError::Validation("No fields to update".to_string()));
        }

        let txn = self.db.begin().await?;

        let existing = PatronEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| DomainError::NotFound("Patron".to_string()))?;

        let mut active: ActiveModel = existing.into();

        if let Some(name) = patch.full_name {
            required(&name, "Full name")?;
            active.full_name = Set(name);
        }
        if let Some(email) = patch.email {
            required(&email, "Email")?;
            ensure_unique(&txn, Column::Email, &email, Some(id), "Email").await?;
            active.email = Set(email);
        }
        if let Some(number) = patch.registration_number {
            required(&number, "Registration number")?;
            ensure_unique(
                &txn,
                Column::RegistrationNumber,
                &number,
                Some(id),
                "Registration number",
            )
            .await?;
            active.registration_number = Set(number);
        }
        if let Some(status) = patch.status {
            active.status = Set(status.as_str().to_owned());
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        Ok(PatronDto::from(updated))
    }
}
