//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.
//! Table and column names follow the Request Tracker schema.

pub mod group;
pub mod group_member;
pub mod user;

// Re-exports for public API convenience
pub use group::{ActiveModel as GroupActiveModel, Entity as GroupEntity};
pub use group_member::{ActiveModel as GroupMemberActiveModel, Entity as GroupMemberEntity};
pub use user::{ActiveModel as UserActiveModel, Entity as UserEntity};
