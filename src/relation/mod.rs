//! Referential integrity across collections.
//!
//! The store has no foreign keys or cascades, so this module maintains the
//! reverse references by hand: customer writes move their id between
//! business types, and deletes of referenced entities are refused while
//! references remain.

mod backref;
mod customer;
mod guard;
mod industry;

pub use backref::{BackReferences, QueriedBackReferences, StoredBackReferences};
pub use customer::CustomerService;
pub use guard::DeleteGuards;
pub use industry::refresh_industry_stats;
