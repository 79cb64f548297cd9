//! `echoes-core` — shared vocabulary for the gateway.
//!
//! Identifiers, table names and the row shapes the gateway writes. The provider
//! owns the schema; this crate only names the columns the gateway touches.

pub mod error;
pub mod id;
pub mod record;
pub mod table;

pub use error::{DomainError, DomainResult};
pub use id::{RecordId, UserId};
pub use record::{NewCall, NewEcho, NewProfile, NewResponse, ProfilePatch, RelationKey};
pub use table::{Row, Table};
