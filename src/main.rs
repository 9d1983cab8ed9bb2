//! Arrow Signals terminal client - entry point
//!
//! One-shot subcommands print plain-text views to stdout; `dashboard` opens
//! the interactive screens.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use arrow_signals::api::{ApiError, Session, SessionStore, SignalsApi, SignalsClient};
use arrow_signals::config::{self, AppConfig};
use arrow_signals::core::{
    partition, LoginForm, MarketForm, ScriptForm, ScriptIcon, SignalFilter, SignalForm,
    TimeWindow,
};
use arrow_signals::tui::{self, DashboardState, TuiLayer};
use arrow_signals::view::{self, Notification};

#[derive(Parser, Debug)]
#[command(name = "arrow_signals")]
#[command(about = "Terminal client for the Arrow Signals trading-signals backend")]
struct Cli {
    /// Configuration file (defaults are used when it does not exist)
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the session
    Login {
        #[arg(short, long)]
        email: String,
        /// Falls back to SIGNALS_PASSWORD
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Favourite instruments of the logged-in user
    Home,
    /// Open and closed signal cards
    Markets {
        /// Exact market name, e.g. Forex
        #[arg(long)]
        market: Option<String>,
        /// Buy, Sell or All
        #[arg(long)]
        action: Option<String>,
        /// past-hour, past-6-hours, ..., this-week, this-month, last-6-months, last-12-months
        #[arg(long)]
        window: Option<TimeWindow>,
    },
    /// Market ids and names
    ListMarkets,
    /// Script ids and names
    ListScripts,
    /// Subscription overview
    Subscriptions,
    CreateMarket {
        name: String,
    },
    CreateScript {
        name: String,
        #[arg(long)]
        market_id: u64,
        /// Unified emoji code points, e.g. 1f4c8
        #[arg(long)]
        emoji: Option<String>,
    },
    CreateSignal {
        #[arg(long)]
        script_id: u64,
        /// Buy or Sell
        #[arg(long = "type")]
        action: String,
        /// Open or Closed
        #[arg(long, default_value = "Open")]
        status: String,
        #[arg(long, default_value = "")]
        ltp: String,
        #[arg(long, default_value = "")]
        buy_range: String,
        #[arg(long, default_value = "")]
        stop_loss: String,
        #[arg(long, default_value = "")]
        target1: String,
        #[arg(long, default_value = "")]
        target2: String,
        #[arg(long, default_value = "")]
        target3: String,
    },
    /// Interactive dashboard
    Dashboard,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let dashboard_state = match cli.command {
        Command::Dashboard => {
            let state = Arc::new(Mutex::new(DashboardState::new(
                arrow_signals::core::reference_zone(),
                None,
            )));
            tracing_subscriber::registry()
                .with(config::logging::env_filter())
                .with(TuiLayer::new(Arc::clone(&state)))
                .init();
            Some(state)
        }
        _ => {
            config::init_logging();
            None
        }
    };

    let config = config::load_config_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let store = SessionStore::new(&config.session.path);
    // login overwrites and logout removes the file, so neither needs to read it
    let session = match cli.command {
        Command::Login { .. } | Command::Logout => None,
        _ => store.load_or_logged_out(),
    };

    let mut client = SignalsClient::new(&config.api)?;
    if let Some(session) = session.clone() {
        client = client.with_session(session);
    }

    let ok = match cli.command {
        Command::Login { email, password } => {
            let password = password
                .or_else(|| std::env::var("SIGNALS_PASSWORD").ok())
                .unwrap_or_default();
            login(&client, &store, &email, &password).await?
        }
        Command::Logout => {
            if store.clear()? {
                println!("Logged out");
            } else {
                println!("No active session");
            }
            true
        }
        Command::Home => home(&client, &config).await,
        Command::Markets {
            market,
            action,
            window,
        } => markets(&client, &config, market, action, window).await,
        Command::ListMarkets => list_markets(&client).await,
        Command::ListScripts => list_scripts(&client).await,
        Command::Subscriptions => subscriptions(&client, &config).await,
        Command::CreateMarket { name } => {
            let form = MarketForm { name };
            match form.validate() {
                Ok(body) => report("market", client.create_market(&body).await),
                Err(errors) => invalid(&errors),
            }
        }
        Command::CreateScript {
            name,
            market_id,
            emoji,
        } => {
            let form = ScriptForm {
                name,
                market_id,
                icon: emoji.map(ScriptIcon::emoji).unwrap_or_default(),
            };
            match form.validate() {
                Ok(body) => report("script", client.create_script(&body).await),
                Err(errors) => invalid(&errors),
            }
        }
        Command::CreateSignal {
            script_id,
            action,
            status,
            ltp,
            buy_range,
            stop_loss,
            target1,
            target2,
            target3,
        } => {
            let form = SignalForm {
                script_id,
                action,
                status,
                ltp,
                buy_range,
                stop_loss,
                target1,
                target2,
                target3,
            };
            match form.validate() {
                Ok(body) => report("signal", client.create_signal(&body).await),
                Err(errors) => invalid(&errors),
            }
        }
        Command::Dashboard => {
            let state = match dashboard_state {
                Some(state) => state,
                None => anyhow::bail!("dashboard state was not initialized"),
            };
            if let Ok(mut s) = state.lock() {
                s.zone = config.zone();
                s.user_id = session.as_ref().map(|s| s.user_id);
            }
            let refresh = (config.display.refresh_secs > 0)
                .then(|| Duration::from_secs(config.display.refresh_secs));
            tui::run_dashboard(Arc::new(client), state, refresh).await?;
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

async fn login(
    client: &SignalsClient,
    store: &SessionStore,
    email: &str,
    password: &str,
) -> anyhow::Result<bool> {
    let credentials = match LoginForm::new(email, password).validate() {
        Ok(credentials) => credentials,
        Err(errors) => {
            eprintln!("Invalid login form! Please fill in the form correctly!");
            return Ok(invalid(&errors));
        }
    };

    match client.sign_in(&credentials).await {
        Ok(resp) => {
            let session = Session::from(&resp);
            store.save(&session)?;
            info!(user_id = session.user_id, "Logged in");
            println!("Logged in as {} <{}>", resp.user_data.name, resp.user_data.email);
            Ok(true)
        }
        Err(e @ ApiError::SignInRejected(_)) => {
            warn!(error = %e, "Sign-in rejected");
            eprintln!("Un-Authorized: {}", e.user_message());
            Ok(false)
        }
        Err(e) => {
            error!(error = %e, "Sign-in failed");
            eprintln!("{}", e.user_message());
            Ok(false)
        }
    }
}

/// Log a fetch failure; the caller renders the empty view
fn fetch_failed(source: &str, err: &ApiError) {
    error!(source, error = %err, "Fetch failed");
    eprintln!("Error fetching {}: {}", source, err.user_message());
}

async fn home(client: &SignalsClient, config: &AppConfig) -> bool {
    let (favourites, ok) = match client.home_details().await {
        Ok(home) => (home.favourite_signals.data, true),
        Err(e) => {
            fetch_failed("favourites", &e);
            (Vec::new(), false)
        }
    };
    print!("{}", view::render_favourites(&favourites, Utc::now(), &config.zone()));
    ok
}

async fn markets(
    client: &SignalsClient,
    config: &AppConfig,
    market: Option<String>,
    action: Option<String>,
    window: Option<TimeWindow>,
) -> bool {
    let now = Utc::now();
    let zone = config.zone();
    let mut filter = SignalFilter::new(market.unwrap_or_default(), action.unwrap_or_default());
    if let Some(window) = window {
        filter = filter.within(window, now, &zone);
    }

    let (instruments, ok) = match client.latest_signals().await {
        Ok(list) => (list, true),
        Err(e) => {
            fetch_failed("signals", &e);
            (Vec::new(), false)
        }
    };

    let parts = partition(&instruments, &filter);
    print!("{}", view::render_partition(&parts, now, &zone));
    ok
}

async fn list_markets(client: &SignalsClient) -> bool {
    match client.list_markets().await {
        Ok(markets) => {
            for m in markets {
                println!("{:>5}  {}", m.id, m.name);
            }
            true
        }
        Err(e) => {
            fetch_failed("markets", &e);
            false
        }
    }
}

async fn list_scripts(client: &SignalsClient) -> bool {
    match client.list_script_ids().await {
        Ok(scripts) => {
            for s in scripts {
                let glyph = s
                    .emoji
                    .as_deref()
                    .and_then(|e| ScriptIcon::emoji(e).glyph())
                    .unwrap_or_default();
                println!("{:>5}  {} {}", s.id, s.name, glyph);
            }
            true
        }
        Err(e) => {
            fetch_failed("scripts", &e);
            false
        }
    }
}

async fn subscriptions(client: &SignalsClient, config: &AppConfig) -> bool {
    let (rows, ok) = match client.subscription_details().await {
        Ok(rows) => (rows, true),
        Err(e) => {
            fetch_failed("subscriptions", &e);
            (Vec::new(), false)
        }
    };
    print!("{}", view::render_subscriptions(&rows, &config.zone()));
    ok
}

fn report(entity: &str, result: Result<(), ApiError>) -> bool {
    if let Err(e) = &result {
        warn!(entity, error = %e, "Create failed");
    }
    let note = Notification::created(entity, &result);
    if note.is_error() {
        eprintln!("{}", note);
        false
    } else {
        println!("{}", note);
        true
    }
}

fn invalid(errors: &arrow_signals::core::FieldErrors) -> bool {
    for (field, message) in errors.iter() {
        eprintln!("  {}: {}", field, message);
    }
    false
}
