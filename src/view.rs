//! Display models shared by the one-shot commands and the dashboard
//!
//! Cards are built from the wire types plus an injected "now" and zone, so
//! the same text shows up on stdout and in the ratatui panels.

use chrono::{DateTime, FixedOffset, Utc};
use tracing::warn;

use crate::api::errors::ApiError;
use crate::api::types::{Instrument, SubscriptionDetails};
use crate::core::filter::SignalPartition;
use crate::core::time_bucket::{format_created_at, format_day_month, unparseable};

pub const NO_FAVOURITES: &str = "No Favourites";
pub const NO_OPEN_SIGNALS: &str = "No Open Signals";
pub const NO_CLOSED_SIGNALS: &str = "No Closed Signals";
pub const NO_SUBSCRIPTIONS: &str = "No Subscriptions";

// ============================================================================
// Signal card
// ============================================================================

/// One instrument with its latest signal, ready to print
#[derive(Debug, Clone, PartialEq)]
pub struct SignalCard {
    pub name: String,
    pub market: String,
    pub favourite: bool,
    /// Label/value pairs in display order
    pub fields: Vec<(&'static str, String)>,
    pub last_modified: String,
}

impl SignalCard {
    /// `None` when the instrument has no latest signal
    pub fn build(
        instrument: &Instrument,
        favourite: bool,
        now: DateTime<Utc>,
        zone: &FixedOffset,
    ) -> Option<Self> {
        let signal = instrument.latest_signal.as_ref()?;

        let status = match signal.status.as_str() {
            "" => "Open".to_string(),
            other => other.to_string(),
        };

        Some(Self {
            name: instrument.name.clone(),
            market: instrument.market.clone(),
            favourite,
            fields: vec![
                ("Call Type", signal.signal_type.to_string()),
                ("Call Status", status),
                ("Stoploss", signal.stop_loss.to_string()),
                ("LTP", signal.ltp.to_string()),
                ("Buy Range", signal.buy_range.to_string()),
                ("Target 1", signal.target1.to_string()),
                ("Target 2", signal.target2.to_string()),
                ("Target 3", signal.target3.to_string()),
            ],
            last_modified: format_created_at(&signal.created_at, now, zone),
        })
    }

    pub fn title(&self) -> String {
        let star = if self.favourite { "★" } else { "☆" };
        format!("{} [{}] {}", self.name, self.market, star)
    }

    pub fn footer(&self) -> String {
        format!("Last Modified on {}", self.last_modified)
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.fields.len() / 4 + 3);
        lines.push(self.title());
        for chunk in self.fields.chunks(4) {
            let row = chunk
                .iter()
                .map(|(label, value)| format!("{}: {}", label, value))
                .collect::<Vec<_>>()
                .join("  |  ");
            lines.push(format!("  {}", row));
        }
        lines.push(format!("  {}", self.footer()));
        lines
    }
}

fn render_section(
    heading: &str,
    empty: &str,
    instruments: &[&Instrument],
    favourite: impl Fn(&Instrument) -> bool,
    now: DateTime<Utc>,
    zone: &FixedOffset,
) -> String {
    let mut out = format!("== {} ==\n", heading);
    let cards: Vec<SignalCard> = instruments
        .iter()
        .copied()
        .filter_map(|inst| SignalCard::build(inst, favourite(inst), now, zone))
        .collect();

    if cards.is_empty() {
        out.push_str(empty);
        out.push('\n');
        return out;
    }

    for card in cards {
        for line in card.lines() {
            out.push_str(&line);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// `createdAt` values that cards will show raw
pub fn unparseable_created_at<'a>(
    instruments: impl IntoIterator<Item = &'a Instrument>,
) -> Vec<String> {
    unparseable(
        instruments
            .into_iter()
            .filter_map(|inst| inst.latest_signal.as_ref())
            .map(|signal| signal.created_at.as_str()),
    )
}

/// Subscription start/end dates that cards will show raw
pub fn unparseable_subscription_dates(rows: &[SubscriptionDetails]) -> Vec<String> {
    unparseable(rows.iter().flat_map(|row| {
        [
            row.subscription_details.start_date.as_str(),
            row.subscription_details.end_date.as_str(),
        ]
    }))
}

pub fn warn_unparseable(source: &str, raws: &[String]) {
    for raw in raws {
        warn!(source, date = %raw, "Unparseable date, shown as-is");
    }
}

/// Home screen favourites; every card is starred
pub fn render_favourites(favourites: &[Instrument], now: DateTime<Utc>, zone: &FixedOffset) -> String {
    warn_unparseable("favourites", &unparseable_created_at(favourites));
    let refs: Vec<&Instrument> = favourites.iter().collect();
    render_section("Favourites", NO_FAVOURITES, &refs, |_| true, now, zone)
}

/// Markets screen: open cards, then closed cards
pub fn render_partition(parts: &SignalPartition<'_>, now: DateTime<Utc>, zone: &FixedOffset) -> String {
    warn_unparseable(
        "signals",
        &unparseable_created_at(parts.open.iter().chain(&parts.closed).copied()),
    );
    let mut out = render_section(
        "Open Signals",
        NO_OPEN_SIGNALS,
        &parts.open,
        |inst| inst.is_favourite,
        now,
        zone,
    );
    out.push('\n');
    out.push_str(&render_section(
        "Closed Signals",
        NO_CLOSED_SIGNALS,
        &parts.closed,
        |inst| inst.is_favourite,
        now,
        zone,
    ));
    out
}

// ============================================================================
// Subscription card
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionCard {
    /// Upper-cased first letter of the subscriber's name
    pub initial: String,
    pub name: String,
    pub plan: String,
    pub days_left: i64,
    pub start: String,
    pub end: String,
}

impl SubscriptionCard {
    pub fn build(details: &SubscriptionDetails, zone: &FixedOffset) -> Self {
        let name = details.user_details.name.clone();
        let initial = name
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default();

        Self {
            initial,
            name,
            plan: details.subscription_details.plan.clone(),
            days_left: details.days_left,
            start: format_day_month(&details.subscription_details.start_date, zone),
            end: format_day_month(&details.subscription_details.end_date, zone),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("({}) {} [{}]", self.initial, self.name, self.plan),
            format!("  Days Left: {}", self.days_left),
            format!("  Subscription Start: {}", self.start),
            format!("  Subscription End: {}", self.end),
        ]
    }
}

pub fn render_subscriptions(rows: &[SubscriptionDetails], zone: &FixedOffset) -> String {
    warn_unparseable("subscriptions", &unparseable_subscription_dates(rows));
    let mut out = String::from("== Subscriptions ==\n");
    if rows.is_empty() {
        out.push_str(NO_SUBSCRIPTIONS);
        out.push('\n');
        return out;
    }
    for row in rows {
        for line in SubscriptionCard::build(row, zone).lines() {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Transient outcome message for a create action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    /// `"{Entity} created successfully"` or `"Error creating {entity}: {message}"`
    pub fn created(entity: &str, result: &Result<(), ApiError>) -> Self {
        match result {
            Ok(()) => Self::success(format!("{} created successfully", capitalize(entity))),
            Err(e) => Self::error(format!("Error creating {}: {}", entity, e.user_message())),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{Signal, SignalStatus, SignalType, SubscriberProfile, Subscription};
    use crate::core::filter::{partition, SignalFilter};
    use crate::core::time_bucket::{parse_timestamp, reference_zone};

    fn now() -> DateTime<Utc> {
        parse_timestamp("2024-06-15T09:30:00Z").unwrap()
    }

    fn gold(status: &str) -> Instrument {
        Instrument {
            id: 1,
            name: "GOLD".into(),
            market: "Commodity".into(),
            is_favourite: true,
            latest_signal: Some(Signal {
                id: 11,
                signal_type: SignalType::Buy,
                status: SignalStatus::from(status),
                stop_loss: 61800.0,
                ltp: 62150.5,
                target1: 62500.0,
                target2: 62800.0,
                target3: 63000.0,
                buy_range: 62100.0,
                created_at: "2024-06-15T08:00:00Z".into(),
            }),
        }
    }

    #[test]
    fn test_signal_card_fields() {
        let card = SignalCard::build(&gold("Open"), true, now(), &reference_zone()).unwrap();
        assert_eq!(card.title(), "GOLD [Commodity] ★");
        assert_eq!(card.fields[0], ("Call Type", "Buy".to_string()));
        assert_eq!(card.fields[2], ("Stoploss", "61800".to_string()));
        assert_eq!(card.fields[3], ("LTP", "62150.5".to_string()));
        assert_eq!(card.footer(), "Last Modified on Today 1:30 PM");
        assert_eq!(card.lines().len(), 4);
    }

    #[test]
    fn test_blank_status_shows_open() {
        let card = SignalCard::build(&gold(""), false, now(), &reference_zone()).unwrap();
        assert_eq!(card.fields[1], ("Call Status", "Open".to_string()));
    }

    #[test]
    fn test_card_requires_signal() {
        let mut inst = gold("Open");
        inst.latest_signal = None;
        assert!(SignalCard::build(&inst, false, now(), &reference_zone()).is_none());
    }

    #[test]
    fn test_empty_sections() {
        let zone = reference_zone();
        assert!(render_favourites(&[], now(), &zone).contains(NO_FAVOURITES));

        let list = vec![gold("Open")];
        let parts = partition(&list, &SignalFilter::default());
        let text = render_partition(&parts, now(), &zone);
        assert!(text.contains("GOLD [Commodity]"));
        assert!(text.contains(NO_CLOSED_SIGNALS));
        assert!(!text.contains(NO_OPEN_SIGNALS));
    }

    #[test]
    fn test_subscription_card() {
        let details = SubscriptionDetails {
            days_left: 12,
            subscription_details: Subscription {
                id: 3,
                start_date: "2024-05-01T00:00:00Z".into(),
                end_date: "2024-06-27T00:00:00Z".into(),
                is_active: true,
                plan: "PREMIUM".into(),
                user_id: 8,
            },
            user_details: SubscriberProfile {
                id: 8,
                name: "riya".into(),
                email: "riya@example.com".into(),
                role: "USER".into(),
                profile_picture: None,
                auth_type: "EMAIL".into(),
            },
        };
        let card = SubscriptionCard::build(&details, &reference_zone());
        assert_eq!(card.initial, "R");
        assert_eq!(card.start, "1st May");
        assert_eq!(card.end, "27th June");
        assert_eq!(card.lines()[1], "  Days Left: 12");
        assert!(render_subscriptions(&[], &reference_zone()).contains(NO_SUBSCRIPTIONS));
    }

    #[test]
    fn test_unparseable_created_at_skips_missing_signals() {
        let mut bad = gold("Open");
        if let Some(signal) = bad.latest_signal.as_mut() {
            signal.created_at = "sometime".into();
        }
        let mut bare = gold("Open");
        bare.latest_signal = None;

        let list = vec![gold("Open"), bad, bare];
        assert_eq!(unparseable_created_at(&list), vec!["sometime".to_string()]);
    }

    #[test]
    fn test_created_notifications() {
        let ok = Notification::created("script", &Ok(()));
        assert_eq!(ok.message, "Script created successfully");
        assert!(!ok.is_error());

        let err = Notification::created(
            "signal",
            &Err(ApiError::Backend {
                status: 400,
                message: "Script not found".into(),
            }),
        );
        assert_eq!(err.message, "Error creating signal: Script not found");
        assert!(err.is_error());
    }
}
