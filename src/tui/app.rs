//! Dashboard state
//!
//! Owned by the UI loop behind `Arc<Mutex<>>` so the log capture layer can
//! push entries. Fetch results arrive as [`FetchResult`] messages and are
//! applied here; nothing else mutates the data lists.
//!
//! Nothing in this module logs while `&mut self` is borrowed: the caller
//! holds the state lock then, and the log layer would drop the event.
//! [`DashboardState::apply`] hands back an [`ApplyOutcome`] to log after the
//! guard is released.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, warn};

use crate::api::errors::{ApiError, ApiResult};
use crate::api::types::{HomeDetails, Instrument, Market, SubscriptionDetails};
use crate::core::filter::{partition, SignalFilter, SignalPartition, TimeWindow};
use crate::view::{
    unparseable_created_at, unparseable_subscription_dates, warn_unparseable, Notification,
};

/// Maximum number of log entries to keep in memory
pub const MAX_LOG_ENTRIES: usize = 100;

/// How long a notification stays on screen
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

/// Single log entry for display
#[derive(Clone, Debug)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Markets,
    Admin,
}

impl Screen {
    pub const ALL: [Screen; 3] = [Screen::Home, Screen::Markets, Screen::Admin];

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Home => "Home",
            Screen::Markets => "Markets & Exchanges",
            Screen::Admin => "Admin",
        }
    }

    pub fn next(&self) -> Screen {
        match self {
            Screen::Home => Screen::Markets,
            Screen::Markets => Screen::Admin,
            Screen::Admin => Screen::Home,
        }
    }
}

/// Result of one background fetch
#[derive(Debug)]
pub enum DashboardUpdate {
    Home(ApiResult<HomeDetails>),
    Signals(ApiResult<Vec<Instrument>>),
    Markets(ApiResult<Vec<Market>>),
    Subscriptions(ApiResult<Vec<SubscriptionDetails>>),
}

impl DashboardUpdate {
    pub fn source(&self) -> &'static str {
        match self {
            DashboardUpdate::Home(_) => "favourites",
            DashboardUpdate::Signals(_) => "signals",
            DashboardUpdate::Markets(_) => "markets",
            DashboardUpdate::Subscriptions(_) => "subscriptions",
        }
    }
}

/// A fetch result tagged with the refresh that started it
#[derive(Debug)]
pub struct FetchResult {
    pub generation: u64,
    pub update: DashboardUpdate,
}

/// What [`DashboardState::apply`] did with a result
#[derive(Debug)]
pub enum ApplyOutcome {
    /// Data stored; `unparseable` lists dates the cards will show raw
    Stored {
        source: &'static str,
        unparseable: Vec<String>,
    },
    /// Fetch failed, panel emptied and notification raised
    Failed {
        source: &'static str,
        error: ApiError,
    },
    /// Result of a superseded refresh, dropped
    Stale {
        source: &'static str,
        generation: u64,
    },
}

impl ApplyOutcome {
    /// Emit the log lines for this outcome. Call without the state lock held.
    pub fn log(&self) {
        match self {
            ApplyOutcome::Stored {
                source,
                unparseable,
            } => warn_unparseable(source, unparseable),
            ApplyOutcome::Failed { source, error } => {
                warn!(source = *source, error = %error, "Fetch failed");
            }
            ApplyOutcome::Stale { source, generation } => {
                debug!(source = *source, generation = *generation, "Dropped stale fetch result");
            }
        }
    }
}

#[derive(Debug)]
pub struct DashboardState {
    pub screen: Screen,
    pub zone: FixedOffset,
    pub user_id: Option<u64>,

    // Last fetched data
    pub favourites: Vec<Instrument>,
    pub instruments: Vec<Instrument>,
    pub markets: Vec<Market>,
    pub subscriptions: Vec<SubscriptionDetails>,
    pub pending_fetches: usize,
    pub last_refresh: Option<DateTime<Utc>>,
    /// Bumped by every refresh; older results are stale
    pub generation: u64,

    // Markets screen selection
    pub filter: SignalFilter,
    pub window: Option<TimeWindow>,

    pub notification: Option<(Notification, Instant)>,

    // Logs (ring buffer)
    pub recent_logs: VecDeque<LogEntry>,
    pub dropped_logs_count: u64,

    // Control
    pub should_quit: bool,
    pub card_scroll: usize,
    pub log_scroll_offset: usize,
    pub show_debug_logs: bool,
}

impl DashboardState {
    pub fn new(zone: FixedOffset, user_id: Option<u64>) -> Self {
        Self {
            screen: Screen::Home,
            zone,
            user_id,
            favourites: Vec::new(),
            instruments: Vec::new(),
            markets: Vec::new(),
            subscriptions: Vec::new(),
            pending_fetches: 0,
            last_refresh: None,
            generation: 0,
            filter: SignalFilter::default(),
            window: None,
            notification: None,
            recent_logs: VecDeque::with_capacity(MAX_LOG_ENTRIES),
            dropped_logs_count: 0,
            should_quit: false,
            card_scroll: 0,
            log_scroll_offset: 0,
            show_debug_logs: false,
        }
    }

    /// Add a log entry with automatic rotation
    pub fn push_log(&mut self, entry: LogEntry) {
        if self.recent_logs.len() >= MAX_LOG_ENTRIES {
            self.recent_logs.pop_front();
        }
        self.recent_logs.push_back(entry);
    }

    pub fn is_loading(&self) -> bool {
        self.pending_fetches > 0
    }

    pub fn switch_to(&mut self, screen: Screen) {
        if self.screen != screen {
            self.screen = screen;
            self.card_scroll = 0;
        }
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notification = Some((notification, Instant::now()));
    }

    /// Current notification unless it has expired
    pub fn active_notification(&self) -> Option<&Notification> {
        self.notification
            .as_ref()
            .filter(|(_, at)| at.elapsed() < NOTIFICATION_TTL)
            .map(|(n, _)| n)
    }

    pub fn expire_notification(&mut self) {
        if self.active_notification().is_none() {
            self.notification = None;
        }
    }

    /// Filter selection with the window resolved at `now`
    pub fn effective_filter(&self, now: DateTime<Utc>) -> SignalFilter {
        match self.window {
            Some(window) => self.filter.clone().within(window, now, &self.zone),
            None => self.filter.clone(),
        }
    }

    /// Open/closed cards for the markets screen, recomputed per render
    pub fn signal_partition(&self, now: DateTime<Utc>) -> SignalPartition<'_> {
        partition(&self.instruments, &self.effective_filter(now))
    }

    pub fn toggle_market(&mut self, market: &str) {
        self.filter.toggle_market(market);
        self.card_scroll = 0;
    }

    pub fn cycle_action(&mut self) {
        self.filter.cycle_action();
        self.card_scroll = 0;
    }

    pub fn cycle_window(&mut self) {
        self.window = TimeWindow::cycle(self.window);
        self.card_scroll = 0;
    }

    /// Start a refresh of `fetches` sources, superseding any in flight.
    /// Returns the generation to tag its results with.
    pub fn begin_refresh(&mut self, fetches: usize) -> u64 {
        self.generation += 1;
        self.pending_fetches = fetches;
        self.generation
    }

    /// Apply one fetch result. A failed fetch empties its panel.
    pub fn apply(&mut self, result: FetchResult, now: DateTime<Utc>) -> ApplyOutcome {
        let FetchResult { generation, update } = result;
        let source = update.source();
        if generation != self.generation {
            return ApplyOutcome::Stale { source, generation };
        }
        self.pending_fetches = self.pending_fetches.saturating_sub(1);

        let failure = match update {
            DashboardUpdate::Home(result) => store(result, &mut self.favourites, |home| {
                home.favourite_signals.data
            }),
            DashboardUpdate::Signals(result) => store(result, &mut self.instruments, |list| list),
            DashboardUpdate::Markets(result) => store(result, &mut self.markets, |list| list),
            DashboardUpdate::Subscriptions(result) => {
                store(result, &mut self.subscriptions, |list| list)
            }
        };

        match failure {
            None => {
                self.last_refresh = Some(now);
                let unparseable = match source {
                    "favourites" => unparseable_created_at(&self.favourites),
                    "signals" => unparseable_created_at(&self.instruments),
                    "subscriptions" => unparseable_subscription_dates(&self.subscriptions),
                    _ => Vec::new(),
                };
                ApplyOutcome::Stored {
                    source,
                    unparseable,
                }
            }
            Some(error) => {
                self.notify(Notification::error(format!(
                    "Error fetching {}: {}",
                    source,
                    error.user_message()
                )));
                ApplyOutcome::Failed { source, error }
            }
        }
    }
}

fn store<T, V>(result: ApiResult<T>, slot: &mut Vec<V>, extract: impl FnOnce(T) -> Vec<V>) -> Option<ApiError> {
    match result {
        Ok(value) => {
            *slot = extract(value);
            None
        }
        Err(err) => {
            slot.clear();
            Some(err)
        }
    }
}
