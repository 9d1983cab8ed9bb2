//! Wire types for the signals backend
//!
//! Field names follow the backend's JSON (camelCase, with a few capitalized
//! relation keys such as `Market` and `Script`). Status and action strings
//! are kept verbatim when they fall outside the known vocabulary so that
//! filtering stays an exact string comparison.

use serde::{Deserialize, Serialize};

// ============================================================================
// Vocabulary
// ============================================================================

/// Call direction of a signal ("Buy" / "Sell")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum SignalType {
    Buy,
    Sell,
    /// Anything else the backend sends, kept as-is
    Other(String),
}

impl SignalType {
    pub fn as_str(&self) -> &str {
        match self {
            SignalType::Buy => "Buy",
            SignalType::Sell => "Sell",
            SignalType::Other(raw) => raw,
        }
    }
}

impl Default for SignalType {
    fn default() -> Self {
        SignalType::Other(String::new())
    }
}

impl From<Option<String>> for SignalType {
    fn from(raw: Option<String>) -> Self {
        match raw.as_deref() {
            Some("Buy") => SignalType::Buy,
            Some("Sell") => SignalType::Sell,
            _ => SignalType::Other(raw.unwrap_or_default()),
        }
    }
}

impl From<&str> for SignalType {
    fn from(raw: &str) -> Self {
        SignalType::from(Some(raw.to_string()))
    }
}

impl From<SignalType> for String {
    fn from(value: SignalType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a signal ("Open" / "Closed")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum SignalStatus {
    Open,
    Closed,
    Other(String),
}

impl SignalStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SignalStatus::Open => "Open",
            SignalStatus::Closed => "Closed",
            SignalStatus::Other(raw) => raw,
        }
    }
}

impl Default for SignalStatus {
    fn default() -> Self {
        SignalStatus::Other(String::new())
    }
}

impl From<Option<String>> for SignalStatus {
    fn from(raw: Option<String>) -> Self {
        match raw.as_deref() {
            Some("Open") => SignalStatus::Open,
            Some("Closed") => SignalStatus::Closed,
            _ => SignalStatus::Other(raw.unwrap_or_default()),
        }
    }
}

impl From<&str> for SignalStatus {
    fn from(raw: &str) -> Self {
        SignalStatus::from(Some(raw.to_string()))
    }
}

impl From<SignalStatus> for String {
    fn from(value: SignalStatus) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Read models
// ============================================================================

/// A buy/sell call with its target and stop-loss levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub id: u64,
    #[serde(rename = "type", default)]
    pub signal_type: SignalType,
    #[serde(default)]
    pub status: SignalStatus,
    #[serde(default)]
    pub stop_loss: f64,
    #[serde(default)]
    pub ltp: f64,
    #[serde(default)]
    pub target1: f64,
    #[serde(default)]
    pub target2: f64,
    #[serde(default)]
    pub target3: f64,
    #[serde(default)]
    pub buy_range: f64,
    /// ISO-8601 timestamp as sent by the backend
    #[serde(default)]
    pub created_at: String,
}

/// A tradable instrument ("script") and its most recent signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub is_favourite: bool,
    pub latest_signal: Option<Signal>,
}

/// Market category (e.g. Forex, Commodity, Stocks)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub id: u64,
    pub name: String,
}

/// Entry of the `scripts/ids` listing used by the signal form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSummary {
    pub id: u64,
    pub name: String,
    pub emoji: Option<String>,
}

/// Home aggregate for the logged-in user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeDetails {
    #[serde(default)]
    pub favourite_signals: FavouriteSignals,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FavouriteSignals {
    #[serde(default)]
    pub data: Vec<Instrument>,
}

/// One row of the admin subscription overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionDetails {
    #[serde(default)]
    pub days_left: i64,
    pub subscription_details: Subscription,
    pub user_details: SubscriberProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: u64,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(rename = "type", default)]
    pub plan: String,
    pub user_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberProfile {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "type", default)]
    pub role: String,
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub auth_type: String,
}

// ============================================================================
// Authentication
// ============================================================================

/// Sign-in request body
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// User record returned on sign-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "type", default)]
    pub role: String,
    pub profile_pic: Option<String>,
    #[serde(default)]
    pub auth_type: String,
}

/// Successful sign-in payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(alias = "accessToken")]
    pub token: String,
    pub user_data: AuthUser,
}

// ============================================================================
// Write models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Connect {
    pub id: u64,
}

/// Relation reference in the backend's `{ connect: { id } }` form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectRef {
    pub connect: Connect,
}

impl ConnectRef {
    pub fn id(id: u64) -> Self {
        Self {
            connect: Connect { id },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMarket {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewScript {
    pub name: String,
    #[serde(rename = "Market")]
    pub market: ConnectRef,
    /// Unified emoji code point sequence, empty when no icon was picked
    pub emoji: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSignal {
    #[serde(rename = "Script")]
    pub script: ConnectRef,
    pub ltp: f64,
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    pub target1: f64,
    pub target2: f64,
    pub target3: f64,
    pub status: SignalStatus,
    pub buy_range: f64,
    pub stop_loss: f64,
}

// ============================================================================
// Tests
// ============================================================================
