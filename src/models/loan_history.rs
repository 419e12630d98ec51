use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only snapshot written when a loan is returned.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "loan_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub loan_id: i32,
    pub patron_id: i32,
    /// Id of the copy at return time. The copy may since have been deleted.
    pub book_id: i32,
    pub book_title: String,
    pub book_author: String,
    pub loan_date: Date,
    pub due_date: Date,
    pub return_date: Date,
    pub days_held: i32,
    pub renewal_count: i32,
    pub return_condition: String,
    pub final_status: String, // 'RETURNED', 'OVERDUE'
    pub notes: Option<String>,
    pub created_at: String,
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
