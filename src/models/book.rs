use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One physical, loanable copy in the catalog.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub author: String,
    pub category_id: i32,
    pub synopsis: Option<String>,
    pub page_count: Option<i32>,
    #[sea_orm(unique)]
    pub copy_code: String,
    /// Manual availability flag of this copy.
    /// Valid values: `AVAILABLE`, `UNAVAILABLE`, `MAINTENANCE`, `RESERVED`.
    /// `LOANED` is derived from an active loan and is not written here.
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    #[sea_orm(has_many = "super::loan::Entity")]
    Loans,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::loan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Loans.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
