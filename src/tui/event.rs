//! Async keyboard event handling for the dashboard
//!
//! Uses crossterm's EventStream for non-blocking, async-compatible input.
//! Does not block a tokio worker thread.

use std::sync::{Arc, Mutex};

use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::app::{DashboardState, Screen};
use crate::core::filter::MARKET_CHOICES;

/// Result of processing a single event poll cycle
#[derive(Debug, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    /// User asked for fresh data
    Refresh,
    Quit,
}

/// Poll for keyboard events with a 50ms timeout.
pub async fn handle_events_async(
    state: &Arc<Mutex<DashboardState>>,
    shutdown: &CancellationToken,
    event_stream: &mut EventStream,
) -> EventResult {
    let maybe_event =
        tokio::time::timeout(std::time::Duration::from_millis(50), event_stream.next()).await;

    match maybe_event {
        Err(_) => EventResult::Continue,
        // Stream ended (terminal closed)
        Ok(None) => {
            shutdown.cancel();
            EventResult::Quit
        }
        Ok(Some(Err(e))) => {
            warn!(error = %e, "Terminal I/O error during event polling");
            EventResult::Continue
        }
        Ok(Some(Ok(Event::Key(key)))) if key.kind == KeyEventKind::Press => {
            process_key_event(key.code, key.modifiers, state, shutdown)
        }
        Ok(Some(Ok(_))) => EventResult::Continue,
    }
}

/// Process a single key event and update state accordingly
pub fn process_key_event(
    code: KeyCode,
    modifiers: KeyModifiers,
    state: &Arc<Mutex<DashboardState>>,
    shutdown: &CancellationToken,
) -> EventResult {
    let Ok(mut s) = state.lock() else {
        return EventResult::Continue;
    };

    match code {
        // Quit: q or Ctrl+C
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
            s.should_quit = true;
            shutdown.cancel();
            EventResult::Quit
        }
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            s.should_quit = true;
            shutdown.cancel();
            EventResult::Quit
        }

        // Screens
        KeyCode::Char('1') => {
            s.switch_to(Screen::Home);
            EventResult::Continue
        }
        KeyCode::Char('2') => {
            s.switch_to(Screen::Markets);
            EventResult::Continue
        }
        KeyCode::Char('3') => {
            s.switch_to(Screen::Admin);
            EventResult::Continue
        }
        KeyCode::Tab => {
            let next = s.screen.next();
            s.switch_to(next);
            EventResult::Continue
        }

        // Markets screen filters
        KeyCode::Char('c') => {
            s.toggle_market(MARKET_CHOICES[0]);
            EventResult::Continue
        }
        KeyCode::Char('f') => {
            s.toggle_market(MARKET_CHOICES[1]);
            EventResult::Continue
        }
        KeyCode::Char('s') => {
            s.toggle_market(MARKET_CHOICES[2]);
            EventResult::Continue
        }
        KeyCode::Char('b') => {
            s.cycle_action();
            EventResult::Continue
        }
        KeyCode::Char('w') => {
            s.cycle_window();
            EventResult::Continue
        }

        KeyCode::Char('r') | KeyCode::Char('R') => EventResult::Refresh,

        // Scroll cards: j/k
        KeyCode::Char('j') => {
            s.card_scroll = s.card_scroll.saturating_add(1);
            EventResult::Continue
        }
        KeyCode::Char('k') => {
            s.card_scroll = s.card_scroll.saturating_sub(1);
            EventResult::Continue
        }

        // Scroll logs: arrows
        KeyCode::Down => {
            s.log_scroll_offset = s.log_scroll_offset.saturating_sub(1);
            EventResult::Continue
        }
        KeyCode::Up => {
            let max_offset = s.recent_logs.len().saturating_sub(1);
            if s.log_scroll_offset < max_offset {
                s.log_scroll_offset += 1;
            }
            EventResult::Continue
        }

        // Toggle debug logs
        KeyCode::Char('l') | KeyCode::Char('L') => {
            s.show_debug_logs = !s.show_debug_logs;
            super::logging::set_show_debug(s.show_debug_logs);
            EventResult::Continue
        }

        _ => EventResult::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::TimeWindow;
    use crate::core::time_bucket::reference_zone;
    use serial_test::serial;

    fn shared_state() -> Arc<Mutex<DashboardState>> {
        Arc::new(Mutex::new(DashboardState::new(reference_zone(), Some(1))))
    }

    fn press(state: &Arc<Mutex<DashboardState>>, token: &CancellationToken, code: KeyCode) -> EventResult {
        process_key_event(code, KeyModifiers::empty(), state, token)
    }

    #[test]
    fn test_process_quit_q() {
        let state = shared_state();
        let token = CancellationToken::new();

        let result = press(&state, &token, KeyCode::Char('q'));
        assert_eq!(result, EventResult::Quit);
        assert!(state.lock().unwrap().should_quit);
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_ctrl_c_quits_but_plain_c_toggles_commodity() {
        let state = shared_state();
        let token = CancellationToken::new();

        assert_eq!(press(&state, &token, KeyCode::Char('c')), EventResult::Continue);
        assert_eq!(state.lock().unwrap().filter.market.as_deref(), Some("Commodity"));
        assert!(!token.is_cancelled());

        let result = process_key_event(KeyCode::Char('c'), KeyModifiers::CONTROL, &state, &token);
        assert_eq!(result, EventResult::Quit);
    }

    #[test]
    fn test_screen_keys() {
        let state = shared_state();
        let token = CancellationToken::new();

        press(&state, &token, KeyCode::Char('3'));
        assert_eq!(state.lock().unwrap().screen, Screen::Admin);
        press(&state, &token, KeyCode::Tab);
        assert_eq!(state.lock().unwrap().screen, Screen::Home);
    }

    #[test]
    fn test_filter_keys() {
        let state = shared_state();
        let token = CancellationToken::new();

        press(&state, &token, KeyCode::Char('f'));
        press(&state, &token, KeyCode::Char('b'));
        press(&state, &token, KeyCode::Char('w'));
        {
            let s = state.lock().unwrap();
            assert_eq!(s.filter.market.as_deref(), Some("Forex"));
            assert_eq!(s.filter.action.as_deref(), Some("Buy"));
            assert_eq!(s.window, Some(TimeWindow::PastHour));
        }

        press(&state, &token, KeyCode::Char('f'));
        assert!(state.lock().unwrap().filter.market.is_none());
    }

    #[test]
    fn test_refresh_key() {
        let state = shared_state();
        let token = CancellationToken::new();
        assert_eq!(press(&state, &token, KeyCode::Char('r')), EventResult::Refresh);
    }

    #[test]
    fn test_process_scroll() {
        let state = shared_state();
        let token = CancellationToken::new();

        press(&state, &token, KeyCode::Char('j'));
        press(&state, &token, KeyCode::Char('j'));
        press(&state, &token, KeyCode::Char('k'));
        assert_eq!(state.lock().unwrap().card_scroll, 1);

        state.lock().unwrap().log_scroll_offset = 3;
        press(&state, &token, KeyCode::Down);
        assert_eq!(state.lock().unwrap().log_scroll_offset, 2);
    }

    #[test]
    #[serial(debug_flag)]
    fn test_debug_toggle() {
        let state = shared_state();
        let token = CancellationToken::new();

        press(&state, &token, KeyCode::Char('l'));
        assert!(state.lock().unwrap().show_debug_logs);
        press(&state, &token, KeyCode::Char('l'));
        assert!(!state.lock().unwrap().show_debug_logs);
    }
}
