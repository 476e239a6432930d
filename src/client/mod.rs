//! # Store Client
//!
//! Typed access to the login, database selection and verified read/write
//! endpoints of the key-value store.

pub mod messages;
pub mod store_client;

pub use messages::{
    KeyValue, LoginResponse, UseDatabaseResponse, VerifiedGetResponse, VerifiedSetResponse,
};
pub use store_client::{StoreClient, StoreReply};
