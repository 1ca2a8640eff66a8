//! authref - a terminal client for the auth reference backend.
//!
//! Log in with email and password, then fetch the authenticated user's
//! profile and show it as JSON.

mod app;
mod ui;

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use authref_core::{ApiClient, Config, Session};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::{profile_inner_area, render};

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name inside the log directory
const LOG_FILE: &str = "authref.log";

const USAGE: &str = "\
Usage: authref [--base-url <url>] [--whoami | --help]

  (no command)       Start the terminal UI
  --whoami           Prompt for credentials, log in and print your profile
  --base-url <url>   Backend to talk to (overrides config and AUTHREF_BASE_URL)
  --help             Show this message";

/// What the command line asked for
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Tui,
    WhoAmI,
    Help,
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    command: Command,
    base_url: Option<String>,
}

fn parse_args<I>(args: I) -> Result<Args>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = Args {
        command: Command::Tui,
        base_url: None,
    };

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--whoami" => parsed.command = Command::WhoAmI,
            "--help" | "-h" => parsed.command = Command::Help,
            "--base-url" => {
                let url = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--base-url needs a value"))?;
                parsed.base_url = Some(url);
            }
            other => anyhow::bail!("Unknown argument: {}\n\n{}", other, USAGE),
        }
    }
    Ok(parsed)
}

/// Initialize the tracing subscriber for logging.
///
/// The TUI owns the terminal, so it logs to a file; CLI commands log to
/// stderr. Use RUST_LOG to control the level (e.g., RUST_LOG=debug).
fn init_tracing(to_file: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if to_file {
        let dir = Config::log_dir().and_then(|dir| {
            std::fs::create_dir_all(&dir)?;
            Ok(dir)
        });
        if let Ok(dir) = dir {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            return Some(guard);
        }
    }

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
    None
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = parse_args(std::env::args().skip(1))?;
    if args.command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let _log_guard = init_tracing(args.command == Command::Tui);

    let mut config = Config::load().unwrap_or_else(|e| {
        warn!(error = %format!("{:#}", e), "Failed to load config, using defaults");
        let mut config = Config::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    });
    if let Some(url) = args.base_url {
        config.base_url = url;
    }

    match args.command {
        Command::WhoAmI => whoami(config).await,
        Command::Tui => run_tui(config).await,
        Command::Help => Ok(()),
    }
}

async fn run_tui(config: Config) -> Result<()> {
    info!(base_url = %config.base_url, "authref starting");

    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("authref shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Keep profile scrolling bounded by the current pane size
        let size = terminal.size()?;
        let pane = profile_inner_area(Rect::new(0, 0, size.width, size.height));
        app.set_profile_viewport(pane.width, pane.height);

        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout so finished requests show up promptly
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        // Apply results of finished requests
        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }

        // Let spawned requests make progress between polls
        tokio::task::yield_now().await;
    }
}

/// Log in from the command line and print the profile
async fn whoami(config: Config) -> Result<()> {
    let api = ApiClient::with_options(&config.base_url, &config.client_options())?;

    let email = prompt_email(config.email.as_deref())?;
    let password = match config.password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };

    let mut session = Session::new(email, password);
    session.login(&api).await?;
    session.fetch_profile(&api).await?;

    println!("{}", session.view().profile_text);
    Ok(())
}

fn prompt_email(default: Option<&str>) -> Result<String> {
    match default {
        Some(email) => print!("Email [{}]: ", email),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input).context("Failed to read email")?;
    Ok(email_from_input(&input, default))
}

/// A blank answer keeps the configured email
fn email_from_input(line: &str, default: Option<&str>) -> String {
    let input = line.trim();
    if input.is_empty() {
        default.unwrap_or_default().to_string()
    } else {
        input.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args_default_is_tui() {
        let parsed = args(&[]).unwrap();
        assert_eq!(parsed.command, Command::Tui);
        assert_eq!(parsed.base_url, None);
    }

    #[test]
    fn test_parse_args_whoami_with_base_url() {
        let parsed = args(&["--base-url", "http://api.test", "--whoami"]).unwrap();
        assert_eq!(parsed.command, Command::WhoAmI);
        assert_eq!(parsed.base_url.as_deref(), Some("http://api.test"));
    }

    #[test]
    fn test_email_from_input() {
        // Blank line falls back to the configured email
        assert_eq!(email_from_input("\n", Some("a@b.com")), "a@b.com");
        assert_eq!(email_from_input("   \n", Some("a@b.com")), "a@b.com");
        // No default configured
        assert_eq!(email_from_input("\n", None), "");
        // Typed input wins and is trimmed
        assert_eq!(email_from_input(" c@d.com\n", Some("a@b.com")), "c@d.com");
        assert_eq!(email_from_input("c@d.com\n", None), "c@d.com");
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(args(&["--base-url"]).is_err());
        assert!(args(&["--frobnicate"]).is_err());
    }
}
