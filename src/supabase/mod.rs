pub mod client;
pub mod error;
pub mod query;
pub mod traits;

pub use client::{KeyRole, SupabaseClient};
pub use error::{QueryError, StoreError};
pub use query::{Column, Condition, FilterOp, OrderBy, Scope, SelectQuery, SortDirection, TableRef};
pub use traits::{IdentityAdmin, TableStore};
