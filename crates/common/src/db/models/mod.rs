//! SeaORM entity models
//!
//! Database entities for the Shelfwise catalog

mod book;
mod review;
mod user;

pub use book::{
    ActiveModel as BookActiveModel, Column as BookColumn, Entity as BookEntity, Model as Book,
};

pub use review::{
    ActiveModel as ReviewActiveModel, Column as ReviewColumn, Entity as ReviewEntity,
    Model as Review,
};

pub use user::{
    ActiveModel as UserActiveModel, Column as UserColumn, Entity as UserEntity, Model as User,
};
