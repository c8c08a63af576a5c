//! Data-access layer for the server manager API.
//!
//! The dashboard core only talks to [`ServerApi`]; [`HttpServerApi`] is the
//! production implementation and tests provide their own.

mod filter;
mod http;

pub use filter::filter_envelope;
pub use http::HttpServerApi;

use crate::error::ApiError;
use crate::model::{Empty, Envelope, ServerItem, ServerList, ServerRecord, StatusFilter};
use async_trait::async_trait;

/// Request/response operations consumed by the dashboard store.
///
/// Each call resolves exactly once, with either an envelope or an error.
#[async_trait]
pub trait ServerApi: Send + Sync {
    async fn list_servers(&self) -> Result<Envelope<ServerList>, ApiError>;

    async fn ping_server(&self, ip_address: &str) -> Result<Envelope<ServerItem>, ApiError>;

    /// Project `current` onto `status`. Filtering happens client-side unless
    /// an implementation overrides it.
    async fn filter_servers(
        &self,
        status: StatusFilter,
        current: &Envelope<ServerList>,
    ) -> Result<Envelope<ServerList>, ApiError> {
        Ok(filter_envelope(status, current))
    }

    async fn save_server(&self, server: &ServerRecord) -> Result<Envelope<ServerItem>, ApiError>;

    async fn delete_server(&self, id: i64) -> Result<Envelope<Empty>, ApiError>;
}
