//! Repository layer - Data access abstraction
//!
//! Repositories provide an abstraction over the RT tables the sync reads
//! and writes, following the Repository pattern for clean separation of
//! concerns.

pub mod entities;
mod group_repository;
mod membership_repository;
mod user_repository;

pub use group_repository::{GroupRepository, GroupStore};
pub use membership_repository::{MembershipRepository, MembershipStore};
pub use user_repository::{UserRepository, UserStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use group_repository::MockGroupRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use membership_repository::MockMembershipRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
