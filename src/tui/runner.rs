//! Dashboard main loop
//!
//! Fetches run as independent tokio tasks and report back over an mpsc
//! channel; only this loop mutates [`DashboardState`]. Quitting cancels the
//! shared token so in-flight requests are dropped.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::{
    event::EventStream,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::app::{DashboardState, DashboardUpdate, FetchResult};
use super::event::{handle_events_async, EventResult};
use super::ui;
use crate::api::client::SignalsApi;
use crate::error::Result;

/// Capacity of the fetch result channel
const UPDATE_CHANNEL_CAPACITY: usize = 32;

/// Number of fetches started by [`spawn_refresh`]
pub const FETCHES_PER_REFRESH: usize = 4;

/// Start one task per dashboard data source, tagging results with
/// `generation`. Each task stops early when `cancel` fires; results that
/// arrive after the receiver is gone are discarded.
pub fn spawn_refresh(
    api: Arc<dyn SignalsApi>,
    tx: mpsc::Sender<FetchResult>,
    cancel: &CancellationToken,
    generation: u64,
) {
    debug!(generation, "Refreshing dashboard data");

    spawn_fetch(cancel, tx.clone(), generation, {
        let api = Arc::clone(&api);
        async move { DashboardUpdate::Home(api.home_details().await) }
    });
    spawn_fetch(cancel, tx.clone(), generation, {
        let api = Arc::clone(&api);
        async move { DashboardUpdate::Signals(api.latest_signals().await) }
    });
    spawn_fetch(cancel, tx.clone(), generation, {
        let api = Arc::clone(&api);
        async move { DashboardUpdate::Markets(api.list_markets().await) }
    });
    spawn_fetch(cancel, tx, generation, async move {
        DashboardUpdate::Subscriptions(api.subscription_details().await)
    });
}

fn spawn_fetch<F>(
    cancel: &CancellationToken,
    tx: mpsc::Sender<FetchResult>,
    generation: u64,
    fetch: F,
) where
    F: std::future::Future<Output = DashboardUpdate> + Send + 'static,
{
    let cancel = cancel.child_token();
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            update = fetch => {
                let _ = tx.send(FetchResult { generation, update }).await;
            }
        }
    });
}

/// Apply every result that has already arrived. Logging happens after the
/// state guard is dropped so the log panel receives it.
pub fn drain_updates(state: &Arc<Mutex<DashboardState>>, rx: &mut mpsc::Receiver<FetchResult>) {
    while let Ok(result) = rx.try_recv() {
        let outcome = match state.lock() {
            Ok(mut s) => s.apply(result, Utc::now()),
            Err(_) => continue,
        };
        outcome.log();
    }
}

/// Run the interactive dashboard until the user quits
pub async fn run_dashboard(
    api: Arc<dyn SignalsApi>,
    state: Arc<Mutex<DashboardState>>,
    refresh_every: Option<Duration>,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, api, &state, refresh_every).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    api: Arc<dyn SignalsApi>,
    state: &Arc<Mutex<DashboardState>>,
    refresh_every: Option<Duration>,
) -> Result<()> {
    let shutdown = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
    let mut events = EventStream::new();

    let mut in_flight = shutdown.child_token();

    // A new refresh cancels the previous one; anything already queued from
    // it is dropped by its generation.
    let mut refresh = |state: &Arc<Mutex<DashboardState>>| {
        let generation = match state.lock() {
            Ok(mut s) => s.begin_refresh(FETCHES_PER_REFRESH),
            Err(_) => return,
        };
        in_flight.cancel();
        in_flight = shutdown.child_token();
        spawn_refresh(Arc::clone(&api), tx.clone(), &in_flight, generation);
    };

    refresh(state);
    let mut last_refresh = Instant::now();
    info!("Dashboard started");

    loop {
        drain_updates(state, &mut rx);

        if let Ok(mut s) = state.lock() {
            s.expire_notification();
            terminal.draw(|frame| ui::draw(frame, &s, Utc::now()))?;
        }

        match handle_events_async(state, &shutdown, &mut events).await {
            EventResult::Quit => break,
            EventResult::Refresh => {
                refresh(state);
                last_refresh = Instant::now();
            }
            EventResult::Continue => {}
        }

        if let Some(every) = refresh_every {
            if last_refresh.elapsed() >= every {
                refresh(state);
                last_refresh = Instant::now();
            }
        }
    }

    shutdown.cancel();
    info!("Dashboard stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::errors::{ApiError, ApiResult};
    use crate::api::types::{
        AuthResponse, Credentials, HomeDetails, Instrument, Market, NewMarket, NewScript,
        NewSignal, ScriptSummary, SubscriptionDetails,
    };
    use crate::api::types::{Signal, SignalStatus, SignalType};
    use crate::core::time_bucket::reference_zone;
    use crate::tui::logging::TuiLayer;
    use async_trait::async_trait;
    use tracing_subscriber::layer::SubscriberExt;

    /// Backend stub; only the markets fetch is slow
    struct StubApi {
        delay: Duration,
    }

    #[async_trait]
    impl SignalsApi for StubApi {
        async fn sign_in(&self, _credentials: &Credentials) -> ApiResult<AuthResponse> {
            Err(ApiError::NotLoggedIn)
        }
        async fn list_markets(&self) -> ApiResult<Vec<Market>> {
            tokio::time::sleep(self.delay).await;
            Ok(vec![Market {
                id: 1,
                name: "Forex".into(),
            }])
        }
        async fn create_market(&self, _market: &NewMarket) -> ApiResult<()> {
            Ok(())
        }
        async fn list_scripts(&self) -> ApiResult<Vec<Instrument>> {
            Ok(Vec::new())
        }
        async fn list_script_ids(&self) -> ApiResult<Vec<ScriptSummary>> {
            Ok(Vec::new())
        }
        async fn create_script(&self, _script: &NewScript) -> ApiResult<()> {
            Ok(())
        }
        async fn create_signal(&self, _signal: &NewSignal) -> ApiResult<()> {
            Ok(())
        }
        async fn latest_signals(&self) -> ApiResult<Vec<Instrument>> {
            Err(ApiError::ConnectionFailed("refused".into()))
        }
        async fn home_details(&self) -> ApiResult<HomeDetails> {
            Err(ApiError::NotLoggedIn)
        }
        async fn subscription_details(&self) -> ApiResult<Vec<SubscriptionDetails>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_refresh_delivers_every_source() {
        let api: Arc<dyn SignalsApi> = Arc::new(StubApi {
            delay: Duration::ZERO,
        });
        let state = Arc::new(Mutex::new(DashboardState::new(reference_zone(), None)));
        let (tx, mut rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        let token = CancellationToken::new();

        let generation = state.lock().unwrap().begin_refresh(FETCHES_PER_REFRESH);
        spawn_refresh(api, tx, &token, generation);

        for _ in 0..FETCHES_PER_REFRESH {
            let result = rx.recv().await.unwrap();
            assert_eq!(result.generation, generation);
            state.lock().unwrap().apply(result, Utc::now());
        }

        let s = state.lock().unwrap();
        assert!(!s.is_loading());
        assert_eq!(s.markets.len(), 1);
        assert!(s.instruments.is_empty());
        assert!(s.notification.is_some());
    }

    #[tokio::test]
    async fn test_cancel_drops_in_flight_fetches() {
        let api: Arc<dyn SignalsApi> = Arc::new(StubApi {
            delay: Duration::from_secs(30),
        });
        let (tx, mut rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        let token = CancellationToken::new();

        spawn_refresh(api, tx, &token, 1);

        // Three fast sources answer, the slow markets fetch is still pending
        for _ in 0..3 {
            let result = rx.recv().await.unwrap();
            assert!(!matches!(result.update, DashboardUpdate::Markets(_)));
        }

        token.cancel();
        let next = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await;
        assert!(matches!(next, Ok(None)), "channel should close after cancellation");
    }

    fn markets(generation: u64, name: &str) -> FetchResult {
        FetchResult {
            generation,
            update: DashboardUpdate::Markets(Ok(vec![Market {
                id: 2,
                name: name.into(),
            }])),
        }
    }

    #[test]
    fn test_drain_updates_applies_ready_results() {
        let state = Arc::new(Mutex::new(DashboardState::new(reference_zone(), None)));
        let generation = state.lock().unwrap().begin_refresh(FETCHES_PER_REFRESH);
        let (tx, mut rx) = mpsc::channel(4);
        tx.try_send(markets(generation, "Stocks")).unwrap();

        drain_updates(&state, &mut rx);
        assert_eq!(state.lock().unwrap().markets[0].name, "Stocks");
    }

    #[test]
    fn test_drain_updates_skips_superseded_refresh() {
        let state = Arc::new(Mutex::new(DashboardState::new(reference_zone(), None)));
        let old = state.lock().unwrap().begin_refresh(FETCHES_PER_REFRESH);
        let current = state.lock().unwrap().begin_refresh(FETCHES_PER_REFRESH);
        let (tx, mut rx) = mpsc::channel(4);
        tx.try_send(markets(current, "Forex")).unwrap();
        tx.try_send(markets(old, "Commodity")).unwrap();

        drain_updates(&state, &mut rx);
        let s = state.lock().unwrap();
        assert_eq!(s.markets[0].name, "Forex");
        assert_eq!(s.pending_fetches, FETCHES_PER_REFRESH - 1);
    }

    #[test]
    fn test_fetch_failures_reach_log_panel() {
        let state = Arc::new(Mutex::new(DashboardState::new(reference_zone(), None)));
        let generation = state.lock().unwrap().begin_refresh(FETCHES_PER_REFRESH);
        let (tx, mut rx) = mpsc::channel(4);
        tx.try_send(FetchResult {
            generation,
            update: DashboardUpdate::Subscriptions(Err(ApiError::Unauthorized(
                "jwt expired".into(),
            ))),
        })
        .unwrap();
        tx.try_send(FetchResult {
            generation,
            update: DashboardUpdate::Signals(Ok(vec![Instrument {
                id: 1,
                name: "GOLD".into(),
                market: "Commodity".into(),
                is_favourite: false,
                latest_signal: Some(Signal {
                    id: 1,
                    signal_type: SignalType::Buy,
                    status: SignalStatus::Open,
                    stop_loss: 0.0,
                    ltp: 0.0,
                    target1: 0.0,
                    target2: 0.0,
                    target3: 0.0,
                    buy_range: 0.0,
                    created_at: "garbled".into(),
                }),
            }])),
        })
        .unwrap();

        let subscriber =
            tracing_subscriber::registry().with(TuiLayer::new(Arc::clone(&state)));
        tracing::subscriber::with_default(subscriber, || drain_updates(&state, &mut rx));

        let s = state.lock().unwrap();
        let messages: Vec<&str> = s.recent_logs.iter().map(|e| e.message.as_str()).collect();
        assert!(
            messages.iter().any(|m| m.starts_with("Fetch failed [source=subscriptions")),
            "Got: {:?}",
            messages
        );
        assert!(
            messages
                .iter()
                .any(|m| m.starts_with("Unparseable date, shown as-is [source=signals")),
            "Got: {:?}",
            messages
        );
        assert_eq!(
            s.active_notification().unwrap().message,
            "Error fetching subscriptions: Session expired, please log in again"
        );
    }
}
