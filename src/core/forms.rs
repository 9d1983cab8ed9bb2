//! Form validation for login and the admin create screens
//!
//! Each form turns raw user input into a request body or a set of per-field
//! messages. Validation failures are data, not `Err`: callers render the
//! messages next to the offending fields and keep the input for retry.

use std::collections::BTreeMap;

use crate::api::types::{
    ConnectRef, Credentials, NewMarket, NewScript, NewSignal, SignalStatus, SignalType,
};

/// Field name → message, ordered by field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .iter()
            .map(|(field, msg)| format!("{}: {}", field, msg))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", joined)
    }
}

// ============================================================================
// Login
// ============================================================================

/// `local@domain.tld` where the tld is at least two ASCII letters
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    let host_ok = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ".-".contains(c));
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());

    local_ok && host_ok && tld_ok
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = self.email.trim();

        if !is_valid_email(email) {
            errors.add("email", "Email is not valid!");
        }
        if self.password.is_empty() {
            errors.add("password", "Password cannot be empty!");
        }

        errors.into_result(|| Credentials {
            username: email.to_string(),
            password: self.password.clone(),
        })
    }
}

// ============================================================================
// Market
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MarketForm {
    pub name: String,
}

impl MarketForm {
    pub fn validate(&self) -> Result<NewMarket, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "Market name cannot be empty!");
        }
        errors.into_result(|| NewMarket {
            name: name.to_string(),
        })
    }
}

// ============================================================================
// Script
// ============================================================================

/// Icon chosen for a script
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScriptIcon {
    #[default]
    None,
    /// Unified code point sequence, e.g. `1f4c8` or `1f1ee-1f1f3`
    Emoji { unified: String },
}

impl ScriptIcon {
    pub fn emoji(unified: impl Into<String>) -> Self {
        ScriptIcon::Emoji {
            unified: unified.into(),
        }
    }

    /// Hex code points separated by `-`
    pub fn is_valid(&self) -> bool {
        match self {
            ScriptIcon::None => true,
            ScriptIcon::Emoji { unified } => {
                !unified.is_empty()
                    && unified.split('-').all(|part| {
                        (1..=6).contains(&part.len())
                            && part.chars().all(|c| c.is_ascii_hexdigit())
                    })
            }
        }
    }

    /// Wire value, empty when no icon was picked
    pub fn unified(&self) -> &str {
        match self {
            ScriptIcon::None => "",
            ScriptIcon::Emoji { unified } => unified,
        }
    }

    /// Rendered glyph, `None` for no icon or an invalid sequence
    pub fn glyph(&self) -> Option<String> {
        if !self.is_valid() {
            return None;
        }
        match self {
            ScriptIcon::None => None,
            ScriptIcon::Emoji { unified } => unified
                .split('-')
                .map(|part| u32::from_str_radix(part, 16).ok().and_then(char::from_u32))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptForm {
    pub name: String,
    pub market_id: u64,
    pub icon: ScriptIcon,
}

impl ScriptForm {
    pub fn validate(&self) -> Result<NewScript, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = self.name.trim();

        if name.is_empty() {
            errors.add("name", "Script name cannot be empty!");
        }
        if self.market_id == 0 {
            errors.add("market", "Please select a market!");
        }
        if !self.icon.is_valid() {
            errors.add("emoji", "Emoji is not valid!");
        }

        errors.into_result(|| NewScript {
            name: name.to_string(),
            market: ConnectRef::id(self.market_id),
            emoji: self.icon.unified().to_string(),
        })
    }
}

// ============================================================================
// Signal
// ============================================================================

/// Raw signal input; numeric fields are kept as typed text
#[derive(Debug, Clone, Default)]
pub struct SignalForm {
    pub script_id: u64,
    pub action: String,
    pub status: String,
    pub ltp: String,
    pub buy_range: String,
    pub stop_loss: String,
    pub target1: String,
    pub target2: String,
    pub target3: String,
}

/// Empty input means zero
fn parse_price(errors: &mut FieldErrors, field: &'static str, raw: &str) -> f64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0.0;
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => {
            errors.add(field, format!("'{}' is not a valid price", raw));
            0.0
        }
    }
}

impl SignalForm {
    pub fn validate(&self) -> Result<NewSignal, FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.script_id == 0 {
            errors.add("script", "Please select a script!");
        }

        let signal_type = SignalType::from(self.action.trim());
        if matches!(signal_type, SignalType::Other(_)) {
            errors.add("type", "Type must be Buy or Sell");
        }

        let status = SignalStatus::from(self.status.trim());
        if matches!(status, SignalStatus::Other(_)) {
            errors.add("status", "Status must be Open or Closed");
        }

        let ltp = parse_price(&mut errors, "ltp", &self.ltp);
        let buy_range = parse_price(&mut errors, "buyRange", &self.buy_range);
        let stop_loss = parse_price(&mut errors, "stopLoss", &self.stop_loss);
        let target1 = parse_price(&mut errors, "target1", &self.target1);
        let target2 = parse_price(&mut errors, "target2", &self.target2);
        let target3 = parse_price(&mut errors, "target3", &self.target3);

        errors.into_result(|| NewSignal {
            script: ConnectRef::id(self.script_id),
            ltp,
            signal_type,
            target1,
            target2,
            target3,
            status,
            buy_range,
            stop_loss,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
