//! Open / closed signal partitioning
//!
//! Derives the two card lists of the markets screen from the last-fetched
//! instrument list. The source slice is never touched; the partition
//! borrows from it and is rebuilt on every render.
//!
//! Matching is exact and case-sensitive: status against "Open"/"Closed",
//! action against the signal's `type`, market against `instrument.market`.
//! Instruments without a latest signal are skipped.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Months, TimeZone, Utc};

use super::time_bucket::{parse_timestamp, week_start};
use crate::api::types::{Instrument, SignalStatus};

/// Markets offered as quick toggles on the markets screen
pub const MARKET_CHOICES: [&str; 3] = ["Commodity", "Forex", "Stocks"];

/// Actions offered by the action selector
pub const ACTION_CHOICES: [&str; 2] = ["Buy", "Sell"];

// ============================================================================
// Time window
// ============================================================================

/// Recency constraint on a signal's `createdAt`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    PastHour,
    Past6Hours,
    Past12Hours,
    Past24Hours,
    ThisWeek,
    ThisMonth,
    Last6Months,
    Last12Months,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 8] = [
        TimeWindow::PastHour,
        TimeWindow::Past6Hours,
        TimeWindow::Past12Hours,
        TimeWindow::Past24Hours,
        TimeWindow::ThisWeek,
        TimeWindow::ThisMonth,
        TimeWindow::Last6Months,
        TimeWindow::Last12Months,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TimeWindow::PastHour => "Past Hour",
            TimeWindow::Past6Hours => "Past 6 hours",
            TimeWindow::Past12Hours => "Past 12 hours",
            TimeWindow::Past24Hours => "Past 24 hours",
            TimeWindow::ThisWeek => "This Week",
            TimeWindow::ThisMonth => "This Month",
            TimeWindow::Last6Months => "Last 6 Months",
            TimeWindow::Last12Months => "Last 12 Months",
        }
    }

    /// Earliest instant inside the window
    pub fn since(&self, now: DateTime<Utc>, zone: &FixedOffset) -> DateTime<Utc> {
        let local_now = now.with_timezone(zone);
        let local_midnight = |date: chrono::NaiveDate| {
            date.and_hms_opt(0, 0, 0)
                .and_then(|naive| zone.from_local_datetime(&naive).single())
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or(now)
        };

        match self {
            TimeWindow::PastHour => now - Duration::hours(1),
            TimeWindow::Past6Hours => now - Duration::hours(6),
            TimeWindow::Past12Hours => now - Duration::hours(12),
            TimeWindow::Past24Hours => now - Duration::hours(24),
            TimeWindow::ThisWeek => local_midnight(week_start(local_now.date_naive())),
            TimeWindow::ThisMonth => local_midnight(
                local_now
                    .date_naive()
                    .with_day(1)
                    .unwrap_or_else(|| local_now.date_naive()),
            ),
            TimeWindow::Last6Months => now
                .checked_sub_months(Months::new(6))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            TimeWindow::Last12Months => now
                .checked_sub_months(Months::new(12))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }

    /// Next choice, `None` after the last one (back to "no constraint")
    pub fn cycle(current: Option<TimeWindow>) -> Option<TimeWindow> {
        match current {
            None => Some(TimeWindow::ALL[0]),
            Some(window) => {
                let idx = TimeWindow::ALL.iter().position(|w| *w == window)?;
                TimeWindow::ALL.get(idx + 1).copied()
            }
        }
    }
}

impl std::str::FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "past-hour" => Ok(TimeWindow::PastHour),
            "past-6-hours" => Ok(TimeWindow::Past6Hours),
            "past-12-hours" => Ok(TimeWindow::Past12Hours),
            "past-24-hours" => Ok(TimeWindow::Past24Hours),
            "this-week" => Ok(TimeWindow::ThisWeek),
            "this-month" => Ok(TimeWindow::ThisMonth),
            "last-6-months" => Ok(TimeWindow::Last6Months),
            "last-12-months" => Ok(TimeWindow::Last12Months),
            other => Err(format!(
                "unknown time window '{}' (expected past-hour, past-6-hours, past-12-hours, \
                 past-24-hours, this-week, this-month, last-6-months or last-12-months)",
                other
            )),
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// Filter
// ============================================================================

/// Current filter selection; `None` means no constraint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalFilter {
    pub market: Option<String>,
    pub action: Option<String>,
    /// Only signals created at or after this instant
    pub since: Option<DateTime<Utc>>,
}

impl SignalFilter {
    /// Build from raw selector values. Empty strings mean no constraint,
    /// and so does the action placeholder "All".
    pub fn new(market: impl Into<String>, action: impl Into<String>) -> Self {
        let market = market.into();
        let action = action.into();
        Self {
            market: (!market.is_empty()).then_some(market),
            action: (!action.is_empty() && action != "All").then_some(action),
            since: None,
        }
    }

    /// Restrict to a recency window evaluated at `now`
    pub fn within(mut self, window: TimeWindow, now: DateTime<Utc>, zone: &FixedOffset) -> Self {
        self.since = Some(window.since(now, zone));
        self
    }

    /// Selecting the active market again clears the market constraint
    pub fn toggle_market(&mut self, market: &str) {
        if self.market.as_deref() == Some(market) {
            self.market = None;
        } else {
            self.market = Some(market.to_string());
        }
    }

    /// All → Buy → Sell → All
    pub fn cycle_action(&mut self) {
        self.action = match self.action.as_deref() {
            None => Some(ACTION_CHOICES[0].to_string()),
            Some(current) => ACTION_CHOICES
                .iter()
                .position(|a| *a == current)
                .and_then(|idx| ACTION_CHOICES.get(idx + 1))
                .map(|a| a.to_string()),
        };
    }

    /// Market, action and window constraints (status is checked separately)
    fn admits(&self, instrument: &Instrument) -> bool {
        let Some(signal) = instrument.latest_signal.as_ref() else {
            return false;
        };

        if let Some(market) = &self.market {
            if instrument.market != *market {
                return false;
            }
        }

        if let Some(action) = &self.action {
            if signal.signal_type.as_str() != action.as_str() {
                return false;
            }
        }

        if let Some(since) = self.since {
            match parse_timestamp(&signal.created_at) {
                Some(created) if created >= since => {}
                _ => return false,
            }
        }

        true
    }

    pub fn matches(&self, instrument: &Instrument, status: &SignalStatus) -> bool {
        self.admits(instrument)
            && instrument
                .latest_signal
                .as_ref()
                .is_some_and(|signal| signal.status == *status)
    }
}

/// Open and closed subsets, both in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalPartition<'a> {
    pub open: Vec<&'a Instrument>,
    pub closed: Vec<&'a Instrument>,
}

impl<'a> SignalPartition<'a> {
    pub fn is_empty(&self) -> bool {
        self.open.is_empty() && self.closed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.open.len() + self.closed.len()
    }
}

pub fn open_signals<'a>(instruments: &'a [Instrument], filter: &SignalFilter) -> Vec<&'a Instrument> {
    instruments
        .iter()
        .filter(|inst| filter.matches(inst, &SignalStatus::Open))
        .collect()
}

pub fn closed_signals<'a>(
    instruments: &'a [Instrument],
    filter: &SignalFilter,
) -> Vec<&'a Instrument> {
    instruments
        .iter()
        .filter(|inst| filter.matches(inst, &SignalStatus::Closed))
        .collect()
}

/// Split `instruments` into open and closed cards in one pass
pub fn partition<'a>(instruments: &'a [Instrument], filter: &SignalFilter) -> SignalPartition<'a> {
    let mut result = SignalPartition::default();
    for inst in instruments {
        if !filter.admits(inst) {
            continue;
        }
        match inst.latest_signal.as_ref().map(|s| &s.status) {
            Some(SignalStatus::Open) => result.open.push(inst),
            Some(SignalStatus::Closed) => result.closed.push(inst),
            _ => {}
        }
    }
    result
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{Signal, SignalType};
    use crate::core::time_bucket::reference_zone;

    fn instrument(id: u64, market: &str, action: &str, status: &str) -> Instrument {
        instrument_at(id, market, action, status, "2024-06-15T08:00:00Z")
    }

    fn instrument_at(id: u64, market: &str, action: &str, status: &str, created: &str) -> Instrument {
        Instrument {
            id,
            name: format!("SCRIPT{}", id),
            market: market.to_string(),
            is_favourite: false,
            latest_signal: Some(Signal {
                id: id * 10,
                signal_type: SignalType::from(action),
                status: SignalStatus::from(status),
                stop_loss: 1.0,
                ltp: 2.0,
                target1: 3.0,
                target2: 4.0,
                target3: 5.0,
                buy_range: 2.5,
                created_at: created.to_string(),
            }),
        }
    }

    fn bare(id: u64, market: &str) -> Instrument {
        Instrument {
            id,
            name: format!("BARE{}", id),
            market: market.to_string(),
            is_favourite: false,
            latest_signal: None,
        }
    }

    fn ids(list: &[&Instrument]) -> Vec<u64> {
        list.iter().map(|i| i.id).collect()
    }

    fn sample() -> Vec<Instrument> {
        vec![
            instrument(1, "Commodity", "Buy", "Open"),
            instrument(2, "Forex", "Sell", "Closed"),
            bare(3, "Forex"),
            instrument(4, "Forex", "Buy", "Open"),
            instrument(5, "Stocks", "Sell", "Open"),
            instrument(6, "Commodity", "Buy", "Closed"),
            instrument(7, "Stocks", "Buy", "Pending"),
        ]
    }

    #[test]
    fn test_empty_filter_returns_full_partition_in_order() {
        let list = sample();
        let parts = partition(&list, &SignalFilter::new("", ""));
        assert_eq!(ids(&parts.open), vec![1, 4, 5]);
        assert_eq!(ids(&parts.closed), vec![2, 6]);
    }

    #[test]
    fn test_market_filter() {
        let list = sample();
        let parts = partition(&list, &SignalFilter::new("Forex", ""));
        assert_eq!(ids(&parts.open), vec![4]);
        assert_eq!(ids(&parts.closed), vec![2]);
    }

    #[test]
    fn test_action_filter() {
        let list = sample();
        let parts = partition(&list, &SignalFilter::new("", "Buy"));
        assert_eq!(ids(&parts.open), vec![1, 4]);
        assert_eq!(ids(&parts.closed), vec![6]);
    }

    #[test]
    fn test_combined_filter() {
        let list = sample();
        let parts = partition(&list, &SignalFilter::new("Commodity", "Buy"));
        assert_eq!(ids(&parts.open), vec![1]);
        assert_eq!(ids(&parts.closed), vec![6]);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let list = sample();
        assert!(partition(&list, &SignalFilter::new("forex", "")).is_empty());
        assert!(partition(&list, &SignalFilter::new("", "buy")).is_empty());
    }

    #[test]
    fn test_all_action_means_no_constraint() {
        assert_eq!(SignalFilter::new("", "All"), SignalFilter::default());
    }

    #[test]
    fn test_open_and_closed_helpers_agree_with_partition() {
        let list = sample();
        let filter = SignalFilter::new("", "Sell");
        let parts = partition(&list, &filter);
        assert_eq!(open_signals(&list, &filter), parts.open);
        assert_eq!(closed_signals(&list, &filter), parts.closed);
    }

    #[test]
    fn test_source_list_unchanged() {
        let list = sample();
        let before = list.clone();
        let _ = partition(&list, &SignalFilter::new("Stocks", "Sell"));
        assert_eq!(list, before);
    }

    #[test]
    fn test_toggle_market() {
        let mut filter = SignalFilter::default();
        filter.toggle_market("Forex");
        assert_eq!(filter.market.as_deref(), Some("Forex"));
        filter.toggle_market("Stocks");
        assert_eq!(filter.market.as_deref(), Some("Stocks"));
        filter.toggle_market("Stocks");
        assert!(filter.market.is_none());
    }

    #[test]
    fn test_cycle_action() {
        let mut filter = SignalFilter::default();
        filter.cycle_action();
        assert_eq!(filter.action.as_deref(), Some("Buy"));
        filter.cycle_action();
        assert_eq!(filter.action.as_deref(), Some("Sell"));
        filter.cycle_action();
        assert!(filter.action.is_none());
    }

    #[test]
    fn test_time_window_filter() {
        let zone = reference_zone();
        let now = parse_timestamp("2024-06-15T09:30:00Z").unwrap();
        let list = vec![
            instrument_at(1, "Forex", "Buy", "Open", "2024-06-15T09:00:00Z"),
            instrument_at(2, "Forex", "Buy", "Open", "2024-06-15T02:00:00Z"),
            instrument_at(3, "Forex", "Buy", "Closed", "2024-06-10T02:00:00Z"),
            instrument_at(4, "Forex", "Buy", "Closed", "garbage"),
        ];

        let hour = SignalFilter::default().within(TimeWindow::PastHour, now, &zone);
        assert_eq!(ids(&partition(&list, &hour).open), vec![1]);

        let day = SignalFilter::default().within(TimeWindow::Past24Hours, now, &zone);
        let parts = partition(&list, &day);
        assert_eq!(ids(&parts.open), vec![1, 2]);
        assert!(parts.closed.is_empty());

        let week = SignalFilter::default().within(TimeWindow::ThisWeek, now, &zone);
        let parts = partition(&list, &week);
        assert_eq!(ids(&parts.closed), vec![3]);
    }

    #[test]
    fn test_this_week_starts_sunday_midnight_local() {
        let zone = reference_zone();
        let now = parse_timestamp("2024-06-15T09:30:00Z").unwrap();
        // Sunday 2024-06-09 00:00 IST
        assert_eq!(
            TimeWindow::ThisWeek.since(now, &zone),
            parse_timestamp("2024-06-08T18:30:00Z").unwrap()
        );
        assert_eq!(
            TimeWindow::ThisMonth.since(now, &zone),
            parse_timestamp("2024-05-31T18:30:00Z").unwrap()
        );
    }

    #[test]
    fn test_time_window_cycle_and_parse() {
        assert_eq!(TimeWindow::cycle(None), Some(TimeWindow::PastHour));
        assert_eq!(
            TimeWindow::cycle(Some(TimeWindow::PastHour)),
            Some(TimeWindow::Past6Hours)
        );
        assert_eq!(TimeWindow::cycle(Some(TimeWindow::Last12Months)), None);
        assert_eq!("this-month".parse::<TimeWindow>(), Ok(TimeWindow::ThisMonth));
        assert!("fortnight".parse::<TimeWindow>().is_err());
    }

    // =========================================================================
    // Property-based tests (proptest)
    // =========================================================================
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_instrument() -> impl Strategy<Value = Instrument> {
            (
                0u64..1000,
                prop::sample::select(vec!["Commodity", "Forex", "Stocks", "forex"]),
                prop::sample::select(vec!["Buy", "Sell", "Hold", ""]),
                prop::sample::select(vec!["Open", "Closed", "Pending", "open", ""]),
                any::<bool>(),
            )
                .prop_map(|(id, market, action, status, has_signal)| {
                    if has_signal {
                        instrument(id, market, action, status)
                    } else {
                        bare(id, market)
                    }
                })
        }

        fn arb_filter() -> impl Strategy<Value = SignalFilter> {
            (
                prop::sample::select(vec!["", "Commodity", "Forex", "Stocks"]),
                prop::sample::select(vec!["", "All", "Buy", "Sell"]),
            )
                .prop_map(|(market, action)| SignalFilter::new(market, action))
        }

        proptest! {
            #[test]
            fn only_open_or_closed_and_disjoint(
                list in prop::collection::vec(arb_instrument(), 0..40),
                filter in arb_filter()
            ) {
                let parts = partition(&list, &filter);
                for inst in &parts.open {
                    prop_assert_eq!(&inst.latest_signal.as_ref().unwrap().status, &SignalStatus::Open);
                }
                for inst in &parts.closed {
                    prop_assert_eq!(&inst.latest_signal.as_ref().unwrap().status, &SignalStatus::Closed);
                }
                for open in &parts.open {
                    prop_assert!(!parts.closed.iter().any(|c| std::ptr::eq(*c, *open)));
                }
            }

            #[test]
            fn filtering_is_idempotent(
                list in prop::collection::vec(arb_instrument(), 0..40),
                filter in arb_filter()
            ) {
                let first = partition(&list, &filter);
                let open_again: Vec<Instrument> = first.open.iter().map(|i| (*i).clone()).collect();
                let closed_again: Vec<Instrument> = first.closed.iter().map(|i| (*i).clone()).collect();
                prop_assert_eq!(open_signals(&open_again, &filter).len(), first.open.len());
                prop_assert_eq!(closed_signals(&closed_again, &filter).len(), first.closed.len());
            }

            #[test]
            fn instruments_without_signal_never_appear(
                list in prop::collection::vec(arb_instrument(), 0..40),
                filter in arb_filter()
            ) {
                let parts = partition(&list, &filter);
                prop_assert!(parts.open.iter().chain(parts.closed.iter()).all(|i| i.latest_signal.is_some()));
            }

            #[test]
            fn empty_filter_preserves_order(list in prop::collection::vec(arb_instrument(), 0..40)) {
                let parts = partition(&list, &SignalFilter::default());
                let expected_open: Vec<*const Instrument> = list.iter()
                    .filter(|i| i.latest_signal.as_ref().map(|s| &s.status) == Some(&SignalStatus::Open))
                    .map(|i| i as *const Instrument)
                    .collect();
                let got_open: Vec<*const Instrument> = parts.open.iter().map(|i| *i as *const Instrument).collect();
                prop_assert_eq!(got_open, expected_open);
            }
        }
    }
}
