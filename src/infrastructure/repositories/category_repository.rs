//! SeaORM implementation of CategoryRepository

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};

use crate::domain::{Category, CategoryRepository, DomainError};
use crate::models::category::{Column, Entity as CategoryEntity};

pub struct SeaOrmCategoryRepository {
    db: DatabaseConnection,
}

impl SeaOrmCategoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CategoryRepository for SeaOrmCategoryRepository {
    async fn find_all(&self) -> Result<Vec<Category>, DomainError> {
        let categories = CategoryEntity::find()
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await?;

        Ok(categories
            .into_iter()
            .map(|c| Category {
                id: c.id,
                name: c.name,
                description: c.description,
            })
            .collect())
    }
}
