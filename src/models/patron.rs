use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "patrons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub full_name: String,
    #[sea_orm(unique)]
    pub email: String,
    /// Student registration number, used as the login key
    #[sea_orm(unique)]
    pub registration_number: String,
    pub status: String, // 'ACTIVE', 'SUSPENDED', 'INACTIVE'
    pub total_loans: i32,
    pub reader_level: String, // cached, recomputed on every return
    pub achievements: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::loan::Entity")]
    Loans,
    #[sea_orm(has_many = "super::loan_history::Entity")]
    History,
}

impl Related<super::loan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Loans.def()
    }
}

impl Related<super::loan_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::History.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// DTO for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatronDto {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    pub registration_number: String,
    pub status: String,
    pub total_loans: i32,
    pub reader_level: String,
    pub achievements: i32,
    pub created_at: String,
}

impl From<Model> for PatronDto {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            full_name: model.full_name,
            email: model.email,
            registration_number: model.registration_number,
            status: model.status,
            total_loans: model.total_loans,
            reader_level: model.reader_level,
            achievements: model.achievements,
            created_at: model.created_at,
        }
    }
}
