//! Signals backend API
//!
//! Typed wire models, the REST client and the session context used for
//! authenticated requests.

pub mod client;
pub mod errors;
pub mod session;
pub mod types;

pub use client::{SignalsApi, SignalsClient};
pub use errors::{ApiError, ApiResult};
pub use session::{Session, SessionStore};
pub use types::{
    AuthResponse, AuthUser, ConnectRef, Credentials, HomeDetails, Instrument, Market, NewMarket,
    NewScript, NewSignal, ScriptSummary, Signal, SignalStatus, SignalType, SubscriptionDetails,
};
