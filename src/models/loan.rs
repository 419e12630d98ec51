use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "loans")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub patron_id: i32,
    pub book_id: i32,
    pub loan_date: Date,
    pub due_date: Date,
    pub renewal_date: Option<Date>,
    pub renewal_count: i32,
    pub status: String, // 'ACTIVE', 'RETURNED', 'OVERDUE'
    pub return_date: Option<Date>,
    pub return_condition: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::book::Entity",
        from = "Column::BookId",
        to = "super::book::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Book,
    #[sea_orm(
        belongs_to = "super::patron::Entity",
        from = "Column::PatronId",
        to = "super::patron::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Patron,
}

impl Related<super::book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Book.def()
    }
}

impl Related<super::patron::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Patron.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateLoanDto {
    pub patron_id: Option<i32>,
    pub book_id: Option<i32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ReturnLoanDto {
    pub condition: Option<String>,
    pub notes: Option<String>,
}
