//! Forwarding of `/accounts` to the Nibo API.
//!
//! ```text
//! GET /accounts ──▶ AccountsProxy ──┬─▶ ResponseCache (no query params, fresh entry)
//!                                   └─▶ Nibo GET /empresas/v1/accounts
//! ```
//!
//! Upstream failures are mapped by [`ProxyError`]:
//!
//! - status >= 400 → same status, `NIBO_ACCOUNTS_FETCH_FAILED`
//! - timeout → 504, `TIMEOUT`
//! - other transport errors → 502, `BAD_GATEWAY`

pub mod error;
pub mod proxy;
pub mod types;

pub use error::ProxyError;
pub use proxy::{ACCOUNTS_PATH, API_TOKEN_HEADER, AccountsProxy};
pub use types::{
    AccountsReply, QueryParams, ReplySource, UpstreamBody, UpstreamRequest, UpstreamResponse,
};
