//! Book entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub author: String,

    /// Genre labels; never empty
    pub genres: Vec<String>,

    pub published_year: i32,

    /// Derived mean of the ratings of all reviews referencing this book,
    /// 0 when none exist. Recomputed on every review mutation.
    pub rating: f64,

    /// Cache of review ids referencing this book. The review rows are the
    /// source of truth; this list is updated in the same transaction as
    /// every review create/delete.
    pub review_refs: Vec<Uuid>,

    #[sea_orm(column_type = "Text", nullable)]
    pub cover_image: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
