use std::error::Error;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_subscriber::EnvFilter;

use otop_db::{DbHandle, MockDb, OracleDb};
use otop_tui::{App, DEFAULT_REFRESH_INTERVAL, InputEvent};

struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn enter() -> Result<Self, Box<dyn Error>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

fn map_event(event: &Event) -> Option<InputEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            Some(InputEvent::Key(key.code, key.modifiers))
        }
        Event::Resize(width, height) => Some(InputEvent::Resize(*width, *height)),
        _ => None,
    }
}

#[derive(Debug, Default, Clone)]
struct RuntimeOptions {
    conn: Option<String>,
    refresh: Option<u64>,
    demo_mode: bool,
    verbose: bool,
    quiet: bool,
}

fn parse_runtime_options() -> Result<RuntimeOptions, Box<dyn Error>> {
    let mut options = RuntimeOptions::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--conn" | "-c" => {
                let value = args.next().ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "--conn requires a user/password@host:port/service argument",
                    )
                })?;
                options.conn = Some(value);
            }
            "--refresh" | "-r" => {
                let value = args.next().ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "--refresh requires a whole number of seconds",
                    )
                })?;
                let seconds: u64 = value.parse().map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("invalid refresh interval: {value}"),
                    )
                })?;
                options.refresh = Some(seconds.max(1));
            }
            "--demo" => {
                options.demo_mode = true;
            }
            "-v" | "--verbose" => {
                options.verbose = true;
            }
            "-q" | "--quiet" => {
                options.quiet = true;
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("unknown argument: {other}"),
                )
                .into());
            }
        }
    }

    if !options.demo_mode
        && let Ok(value) = std::env::var("OTOP_DEMO")
    {
        options.demo_mode = matches!(value.trim(), "1" | "true" | "TRUE" | "True");
    }
    if options.refresh.is_none()
        && let Ok(value) = std::env::var("OTOP_REFRESH_INTERVAL")
        && let Ok(seconds) = value.trim().parse::<u64>()
    {
        options.refresh = Some(seconds.max(1));
    }

    Ok(options)
}

fn print_help() {
    println!("otop - terminal dashboard for live Oracle sessions, plans and SQL statistics");
    println!();
    println!("Usage:");
    println!("  otop --conn <user/password@host:port/service> [--refresh <seconds>]");
    println!("  otop --demo");
    println!();
    println!("Flags:");
    println!("  -c, --conn <string>     Oracle connection string");
    println!("  -r, --refresh <secs>    Refresh interval (default 5)");
    println!("      --demo              Use synthetic data, no database required");
    println!("  -v, --verbose           Debug-level logging on stderr");
    println!("  -q, --quiet             Error-level logging only");
    println!("  -h, --help              Show this help message");
    println!();
    println!("Environment:");
    println!("  OTOP_REFRESH_INTERVAL=<seconds>");
    println!("  OTOP_DEMO=true|false");
    println!("  OTOP_LOG / RUST_LOG     tracing filter directives");
}

/// Initialize the stderr tracing subscriber. Env filters win over flags;
/// the default stays at `warn` so the alternate screen is not disturbed.
fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = std::env::var("OTOP_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map_or_else(
            |_| EnvFilter::new(default_level),
            |directives| EnvFilter::new(directives),
        );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .compact()
        .init();
}

fn build_db_handle(options: &RuntimeOptions) -> Result<DbHandle, Box<dyn Error>> {
    if options.demo_mode {
        return Ok(Arc::new(MockDb::sample()));
    }
    let Some(conn) = options.conn.as_deref() else {
        eprintln!("error: --conn is required (or use --demo)");
        print_help();
        std::process::exit(1);
    };
    let db = OracleDb::connect(conn)?;
    Ok(Arc::new(db))
}

fn main() -> Result<(), Box<dyn Error>> {
    let options = match parse_runtime_options() {
        Ok(options) => options,
        Err(error) => {
            eprintln!("error: {error}");
            print_help();
            std::process::exit(1);
        }
    };
    init_tracing(options.verbose, options.quiet);

    let db = match build_db_handle(&options) {
        Ok(db) => db,
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    };
    let refresh_interval = options
        .refresh
        .map_or(DEFAULT_REFRESH_INTERVAL, Duration::from_secs);

    let mut terminal = TerminalGuard::enter()?;
    let mut app = App::new(db, refresh_interval);

    let result = run(&mut terminal.terminal, &mut app);
    app.shutdown();
    drop(terminal);

    result.map_err(Into::into)
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        app.pump_messages();
        terminal.draw(|frame| app.render(frame))?;

        if event::poll(Duration::from_millis(100))? {
            let event = event::read()?;
            if let Some(input) = map_event(&event) {
                let quit = app.handle_input(&input);
                if quit || app.should_quit() {
                    return Ok(());
                }
            }
        }
    }
}
