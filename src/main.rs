use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    style::Print,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin, BufRead, Write},
    path::PathBuf,
};
use stint::{
    app::App,
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore, Overrides, MAX_MINUTES_LIMIT},
    export::write_csv,
    history::group_by_calendar_day,
    kv::SqliteKv,
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    store::{KvSessionStore, SessionStore},
    ui,
    util::{format_clock, format_day_heading, format_total},
};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_ENV: &str = "STINT_LOG";

/// terminal focus timer with a journal of past sessions
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal focus timer. Start a session, jot timestamped notes while it runs, and keep a day-by-day journal of how the time was spent."
)]
pub struct Cli {
    /// stop a session automatically after this many minutes
    #[clap(short = 'm', long, value_parser = clap::value_parser!(u32).range(1..=MAX_MINUTES_LIMIT as i64))]
    max_minutes: Option<u32>,

    /// journal database file (defaults to the state directory)
    #[clap(long)]
    db: Option<PathBuf>,

    /// do not ring the terminal bell when a session completes
    #[clap(long)]
    no_bell: bool,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
    /// print the journal grouped by day, newest first
    History,
    /// delete one session by id (an unknown id deletes nothing)
    Delete { id: String },
    /// delete every session
    Clear {
        /// skip the confirmation prompt
        #[clap(long)]
        yes: bool,
    },
    /// write the journal as CSV
    Export {
        /// file to write instead of stdout
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            max_minutes: self.max_minutes,
            bell: self.no_bell.then_some(false),
        }
    }
}

fn init_logging() -> Option<WorkerGuard> {
    let dir = AppDirs::log_dir()?;
    std::fs::create_dir_all(&dir).ok()?;
    let appender = tracing_appender::rolling::never(dir, "stint.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .try_init()
        .ok()?;
    Some(guard)
}

fn open_store(cli: &Cli) -> Result<KvSessionStore<SqliteKv>, Box<dyn Error>> {
    let path = match &cli.db {
        Some(p) => p.clone(),
        None => AppDirs::db_path().ok_or("could not resolve a state directory for the journal")?,
    };
    debug!(path = %path.display(), "opening journal");
    Ok(KvSessionStore::new(SqliteKv::open(path)?))
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let _guard = init_logging();

    let store = open_store(&cli)?;

    match &cli.command {
        Some(Command::History) => print_history(&store, &mut io::stdout().lock()),
        Some(Command::Delete { id }) => delete_session(&store, id, &mut io::stdout().lock()),
        Some(Command::Clear { yes }) => {
            let confirmed = *yes || confirm_clear(&store)?;
            clear_history(&store, confirmed, &mut io::stdout().lock())
        }
        Some(Command::Export { output }) => export_history(&store, output.as_deref()),
        None => {
            if !stdin().is_tty() {
                let mut cmd = Cli::command();
                cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
            }
            let config = FileConfigStore::new().load().with_overrides(&cli.overrides());
            info!(max_minutes = config.max_minutes, bell = config.bell, "starting timer");
            run_tui(App::new(config, Box::new(store)))
        }
    }
}

fn run_tui(mut app: App) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend + Write>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(app.config.tick_interval()),
    );

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        let event = runner.step();
        let transition = app.handle_event(event, Local::now());
        if transition.starts_ticking() {
            runner.start_ticking();
        }
        if transition.stops_ticking() {
            runner.stop_ticking();
        }

        if app.take_bell() {
            execute!(terminal.backend_mut(), Print("\x07"))?;
        }
        if app.should_quit {
            break;
        }
    }

    info!("timer closed");
    Ok(())
}

fn print_history<W: Write>(store: &dyn SessionStore, out: &mut W) -> Result<(), Box<dyn Error>> {
    let mut sessions = store.list_all()?;
    if sessions.is_empty() {
        writeln!(out, "No sessions yet")?;
        return Ok(());
    }
    sessions.reverse();

    for (i, group) in group_by_calendar_day(&sessions, &Local).iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        writeln!(
            out,
            "{}  ({} total)",
            format_day_heading(group.date),
            format_total(group.total_seconds())
        )?;
        for s in &group.sessions {
            let note = if s.note.is_empty() { "(no note)" } else { &s.note };
            writeln!(
                out,
                "  {}  {}  {}  [{}]",
                s.started_at.with_timezone(&Local).format("%H:%M"),
                format_clock(s.duration_seconds),
                note,
                s.id
            )?;
            for a in &s.annotations {
                writeln!(out, "        {}  {}", format_clock(a.offset_seconds), a.text)?;
            }
        }
    }
    Ok(())
}

fn delete_session<W: Write>(
    store: &dyn SessionStore,
    id: &str,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    if store.delete_by_id(id)? {
        info!(id, "session deleted from the command line");
        writeln!(out, "Deleted {}", id)?;
    } else {
        writeln!(out, "No session with id {}", id)?;
    }
    Ok(())
}

fn confirm_clear(store: &dyn SessionStore) -> Result<bool, Box<dyn Error>> {
    let count = store.list_all().map(|s| s.len()).unwrap_or(0);
    if !stdin().is_tty() {
        return Err("refusing to clear without --yes when stdin is not a tty".into());
    }
    print!("Delete all {} sessions? [y/N] ", count);
    io::stdout().flush()?;
    let mut answer = String::new();
    stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn clear_history<W: Write>(
    store: &dyn SessionStore,
    confirmed: bool,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    if !confirmed {
        writeln!(out, "Nothing deleted")?;
        return Ok(());
    }
    store.clear_all()?;
    info!("journal cleared from the command line");
    writeln!(out, "History cleared")?;
    Ok(())
}

fn export_history(
    store: &dyn SessionStore,
    output: Option<&std::path::Path>,
) -> Result<(), Box<dyn Error>> {
    let sessions = store.list_all()?;
    match output {
        Some(path) => write_csv(&sessions, File::create(path)?)?,
        None => write_csv(&sessions, io::stdout().lock())?,
    }
    debug!(count = sessions.len(), "journal exported");
    Ok(())
}
