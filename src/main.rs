use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use alloy::primitives::utils::parse_ether;
use alloy::primitives::Address;
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use keyboards::app::{App, StatusLevel, GRID_COLUMNS};
use keyboards::config;
use keyboards::domain::Screen;
use keyboards::infrastructure::ethereum::ProviderConfig;
use keyboards::infrastructure::runtime::{RuntimeBridge, RuntimeCommand, RuntimeEvent};
use keyboards::logging;

#[derive(Debug, Parser)]
#[command(
    name = "keyboards",
    version,
    about = "Browse, create and tip on-chain keyboards from the terminal"
)]
struct Args {
    /// HTTP JSON-RPC wallet endpoint (e.g. http://localhost:8545)
    #[arg(long)]
    rpc: Option<String>,

    /// WebSocket wallet endpoint (e.g. ws://localhost:8546)
    #[arg(long)]
    ws: Option<String>,

    /// IPC path (e.g. ~/.ethereum/geth.ipc). Unix only.
    #[arg(long)]
    ipc: Option<PathBuf>,

    /// Keyboards contract address
    #[arg(long)]
    contract: Option<String>,

    /// Tip amount in ether
    #[arg(long)]
    tip: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = config::load();

    let _log_guard = match config::log_dir() {
        Some(dir) => match logging::init(&dir, config.log_level()) {
            Ok(guard) => Some(guard),
            Err(err) => {
                eprintln!("logging disabled: {err:#}");
                None
            }
        },
        None => None,
    };

    let endpoint = endpoint_from_args_and_config(&args, &config)?;
    let contract: Address = args
        .contract
        .as_deref()
        .unwrap_or(config.contract())
        .trim()
        .parse()
        .context("Invalid contract address")?;
    let tip_input = args.tip.as_deref().unwrap_or(config.tip_amount());
    let tip_amount =
        parse_ether(tip_input.trim()).with_context(|| format!("Invalid tip amount {tip_input:?}"))?;

    tracing::info!(
        endpoint = ?endpoint.as_ref().map(ProviderConfig::display),
        %contract,
        %tip_amount,
        "starting"
    );

    // The provider is injected here; nothing downstream looks it up
    let runtime = RuntimeBridge::new(endpoint, contract)?;
    let app = App::new(contract, tip_amount);

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, &runtime);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %format!("{err:#}"), "exited with error");
        eprintln!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    runtime: &RuntimeBridge,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        pump_background(&mut app, runtime);
        terminal.draw(|f| keyboards::ui::draw(f, &app))?;
        if app.should_quit {
            let _ = runtime.send(RuntimeCommand::Shutdown);
            return Ok(());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                handle_key(&mut app, key);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}

fn pump_background(app: &mut App, runtime: &RuntimeBridge) {
    for event in runtime.poll_events() {
        match event {
            RuntimeEvent::ProviderReady { endpoint } => app.apply_provider_ready(endpoint),
            RuntimeEvent::ProviderMissing { reason } => app.apply_provider_missing(reason),
            RuntimeEvent::Accounts {
                interactive,
                accounts,
            } => app.apply_accounts(interactive, accounts),
            RuntimeEvent::KeyboardsLoaded { seq, keyboards } => {
                app.apply_keyboards(seq, keyboards);
            }
            RuntimeEvent::KeyboardsFailed { seq, message } => {
                app.apply_keyboards_failed(seq, message)
            }
            RuntimeEvent::Subscribed { epoch } => {
                tracing::debug!(epoch, "subscription live");
            }
            RuntimeEvent::SubscriptionFailed { epoch, message } => {
                app.apply_subscription_lost(epoch, Some(message))
            }
            RuntimeEvent::SubscriptionEnded { epoch } => app.apply_subscription_lost(epoch, None),
            RuntimeEvent::Contract { epoch, event } => app.apply_contract_event(epoch, event),
            RuntimeEvent::TxConfirmed { kind, hash } => app.apply_tx_confirmed(kind, hash),
            RuntimeEvent::TxFailed { kind, message } => app.apply_tx_failed(kind, message),
            RuntimeEvent::Error { message } => app.apply_error(message),
        }
    }

    for command in app.take_commands() {
        if let Err(err) = runtime.send(command) {
            app.set_status(format!("{err:#}"), StatusLevel::Error);
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // The alert blocks everything until dismissed
    if app.alert.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            app.dismiss_alert();
        }
        return;
    }

    if let Some(form) = app.create_form.as_mut() {
        match key.code {
            KeyCode::Esc => app.cancel_create_form(),
            KeyCode::Left => form.cycle_kind(false),
            KeyCode::Right => form.cycle_kind(true),
            KeyCode::Up => form.cycle_filter(false),
            KeyCode::Down => form.cycle_filter(true),
            KeyCode::Char(' ') => form.toggle_pbt(),
            KeyCode::Enter => {
                if let Err(err) = app.submit_create_form() {
                    app.set_status(err.to_string(), StatusLevel::Warn);
                }
            }
            _ => {}
        }
        return;
    }

    let on_grid = matches!(app.screen(), Screen::Grid(_));
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('c') => {
            // Failure already raised the alert
            let _ = app.connect_account();
        }
        KeyCode::Char('n') => app.open_create_form(),
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('t') | KeyCode::Enter if on_grid => {
            if let Err(err) = app.tip_selected() {
                app.set_status(err.to_string(), StatusLevel::Warn);
            }
        }
        KeyCode::Left | KeyCode::Char('h') => app.move_selection(-1),
        KeyCode::Right | KeyCode::Char('l') => app.move_selection(1),
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-(GRID_COLUMNS as isize)),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(GRID_COLUMNS as isize),
        _ => {}
    }
}

/// CLI flags take precedence over the config file. With neither, no wallet
/// provider is available.
fn endpoint_from_args_and_config(
    args: &Args,
    config: &config::Config,
) -> Result<Option<ProviderConfig>> {
    if let Some(ipc) = args.ipc.clone() {
        #[cfg(unix)]
        {
            return Ok(Some(ProviderConfig::Ipc(ipc)));
        }
        #[cfg(not(unix))]
        {
            let _ = ipc;
            return Err(anyhow::anyhow!("IPC is not supported on this platform"));
        }
    }
    if let Some(ws) = non_empty(args.ws.as_deref()) {
        return Ok(Some(ProviderConfig::WebSocket(ws.to_string())));
    }
    if let Some(rpc) = non_empty(args.rpc.as_deref()) {
        return Ok(Some(ProviderConfig::from_url(rpc)));
    }

    let Some(wallet) = config.wallet.as_ref() else {
        return Ok(None);
    };
    if let Some(label) = wallet.label() {
        tracing::info!(wallet = %label, "using wallet from config");
    }
    if let Some(ipc) = non_empty(wallet.ipc.as_deref()) {
        #[cfg(unix)]
        {
            return Ok(Some(ProviderConfig::Ipc(PathBuf::from(ipc))));
        }
        #[cfg(not(unix))]
        {
            let _ = ipc;
            return Err(anyhow::anyhow!("IPC is not supported on this platform"));
        }
    }
    Ok(non_empty(wallet.rpc.as_deref()).map(ProviderConfig::from_url))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
