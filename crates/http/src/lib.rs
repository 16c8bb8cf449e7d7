//! RepairDesk HTTP client
//!
//! Talks to the repair-shop backend using cookie credentials. Expired access
//! tokens are refreshed transparently: the first request that sees a 401
//! refreshes the session once, concurrent 401s wait for that refresh, and
//! every waiting request is replayed exactly once afterwards.

#[macro_use]
extern crate tracing;

pub mod client;
pub mod types;

pub use client::{
    AuthenticatedRequestClient, ClientBuilder,
    config::ClientConfig,
    error::{ClientError, RefreshError, Result},
    session::{Navigator, RouteTracker, SessionState},
    transport::{ApiRequest, ApiResponse, HttpTransport, Transport},
};
pub use types::UserProfile;
