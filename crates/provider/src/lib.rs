//! `echoes-provider` — the external identity + database collaborator.
//!
//! The gateway only talks to the provider through the traits in this crate:
//! [`Database`] for table access, [`OAuthProvider`] for the redirect flow, and
//! [`echoes_auth::IdentityResolver`] for bearer tokens. Two implementations:
//!
//! - [`SupabaseClient`]: GoTrue + PostgREST over HTTP.
//! - [`InMemoryProvider`]: process-local tables for tests and local runs.

pub mod database;
pub mod error;
pub mod filter;
pub mod memory;
pub mod oauth;
pub mod supabase;

pub use database::Database;
pub use error::ProviderError;
pub use filter::Filter;
pub use memory::InMemoryProvider;
pub use oauth::{OAuthProvider, OAuthStart, Session};
pub use supabase::{SupabaseClient, SupabaseConfig};
