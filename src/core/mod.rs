//! Core module - signal filtering, time-bucket labels, form validation
//!
//! Everything here is pure: no I/O, no clock reads. Callers inject "now"
//! and the reference zone.
//!
//! Prefer importing from `crate::core`:
//! ```ignore
//! use crate::core::{partition, SignalFilter, format_created_at};
//! ```

pub mod filter;
pub mod forms;
pub mod time_bucket;

// Explicit re-exports for filter module
pub use filter::{
    closed_signals, open_signals, partition, SignalFilter, SignalPartition, TimeWindow,
    ACTION_CHOICES, MARKET_CHOICES,
};

// Explicit re-exports for time_bucket module
pub use time_bucket::{
    bucket_label, classify, format_created_at, format_day_month, parse_timestamp,
    reference_zone, unparseable, zone_from_minutes, TimeBucket, REFERENCE_OFFSET_MINUTES,
};

// Explicit re-exports for forms module
pub use forms::{
    is_valid_email, FieldErrors, LoginForm, MarketForm, ScriptForm, ScriptIcon, SignalForm,
};
