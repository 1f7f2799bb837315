//! Daybook command-line entry point.
//!
//! # Responsibility
//! - Exercise `daybook_core` against a local database and the live weather
//!   API without the mobile runtime.
//! - Keep output plain and line-oriented for quick local checks.

use clap::{Args, Parser, Subcommand};
use daybook_core::db::open_db;
use daybook_core::{
    default_log_level, init_logging, CalendarDate, CalendarViewModel, HttpWeatherClient,
    LocalNoteCache, Note, SqliteBlobStore, SqliteDocumentStore, TodoViewModel, WeatherConfig,
    WeatherViewModel,
};
use log::info;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(name = "daybook", version, long_about = None)]
#[command(about = "Calendar notes, todos and weather from the terminal")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "DAYBOOK_DB_PATH")]
    db: Option<PathBuf>,

    /// Directory for rolling log files; logging is off when unset
    #[arg(long, global = true, env = "DAYBOOK_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true, env = "DAYBOOK_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print core linkage information
    Ping,
    /// Calendar notes stored in the document store
    #[command(subcommand)]
    Notes(NotesCommand),
    /// Todo items
    #[command(subcommand)]
    Todo(TodoCommand),
    /// Notes kept in the device-local cache
    #[command(subcommand)]
    Cache(CacheCommand),
    /// Fetch the forecast for one location
    Weather(WeatherArgs),
}

#[derive(Subcommand, Debug)]
enum NotesCommand {
    /// List the notes of a day, sorted by time
    List {
        #[arg(long)]
        date: CalendarDate,
    },
    /// Add a note to a day
    Add {
        #[arg(long)]
        date: CalendarDate,
        /// Time as typed, e.g. `930` or `14:30`
        #[arg(long, default_value = "")]
        time: String,
        text: String,
    },
    /// List every day that has notes
    Marked,
}

#[derive(Subcommand, Debug)]
enum TodoCommand {
    /// List todos, optionally of one list
    List {
        #[arg(long)]
        list: Option<String>,
    },
    /// Add a todo
    Add {
        #[arg(long)]
        list: Option<String>,
        title: String,
    },
    /// Flip the done flag of a todo
    Toggle {
        id: uuid::Uuid,
        /// Current state of the flag
        #[arg(long, default_value_t = false)]
        done: bool,
    },
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    /// Print every cached note
    List,
    /// Append a note to the cache
    Add {
        #[arg(long)]
        date: CalendarDate,
        #[arg(long, default_value = "")]
        time: String,
        text: String,
    },
    /// Remove the note at `index` on `date`
    Remove {
        #[arg(long)]
        date: CalendarDate,
        index: usize,
    },
}

#[derive(Args, Debug)]
struct WeatherArgs {
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,
    #[arg(long, allow_negative_numbers = true)]
    lon: f64,
    /// One-call endpoint
    #[arg(long, env = "DAYBOOK_WEATHER_API_URL")]
    api_url: String,
    #[arg(long, env = "DAYBOOK_WEATHER_API_KEY", hide_env_values = true)]
    api_key: String,
    /// Icon asset prefix
    #[arg(long, env = "DAYBOOK_WEATHER_ICONS_URL")]
    icons_url: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("daybook: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult {
    if let Some(log_dir) = &cli.log_dir {
        let level = cli
            .log_level
            .clone()
            .unwrap_or_else(|| default_log_level().to_string());
        init_logging(&level, &log_dir.to_string_lossy())?;
    }
    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("daybook.sqlite3"));
    info!("event=cli_start module=cli status=ok");

    match cli.command {
        Command::Ping => {
            println!("daybook_core ping={}", daybook_core::ping());
            println!("daybook_core version={}", daybook_core::core_version());
            Ok(())
        }
        Command::Notes(command) => run_notes(&db_path, command),
        Command::Todo(command) => run_todo(&db_path, command),
        Command::Cache(command) => run_cache(&db_path, command),
        Command::Weather(args) => run_weather(args),
    }
}

fn run_notes(db_path: &Path, command: NotesCommand) -> CliResult {
    let conn = open_db(db_path)?;
    let store = SqliteDocumentStore::try_new(&conn)?;
    let mut calendar = CalendarViewModel::new(&store)?;

    match command {
        NotesCommand::List { date } => {
            for note in calendar.sorted_notes(date) {
                print_note(&note);
            }
        }
        NotesCommand::Add { date, time, text } => {
            calendar.select_date(date);
            let id = calendar.save_note(&text, &time)?;
            println!("{id}");
        }
        NotesCommand::Marked => {
            for (date, notes) in calendar.notes() {
                println!("{date} {}", notes.len());
            }
        }
    }
    Ok(())
}

fn run_todo(db_path: &Path, command: TodoCommand) -> CliResult {
    let conn = open_db(db_path)?;
    let store = SqliteDocumentStore::try_new(&conn)?;

    match command {
        TodoCommand::List { list } => {
            let mut todos = TodoViewModel::new(&store, list.as_deref())?;
            if list.is_some() {
                println!("# {}", todos.load_list_name()?);
            }
            for todo in todos.todos() {
                let mark = if todo.done { "x" } else { " " };
                println!("[{mark}] {} {}", todo.id, todo.title);
            }
        }
        TodoCommand::Add { list, title } => {
            let mut todos = TodoViewModel::new(&store, list.as_deref())?;
            println!("{}", todos.add_todo(&title)?);
        }
        TodoCommand::Toggle { id, done } => {
            let mut todos = TodoViewModel::new(&store, None)?;
            todos.toggle_done(id, done)?;
        }
    }
    Ok(())
}

fn run_cache(db_path: &Path, command: CacheCommand) -> CliResult {
    let conn = open_db(db_path)?;
    let blobs = SqliteBlobStore::try_new(&conn)?;
    let cache = LocalNoteCache::new(&blobs);

    let notes = match command {
        CacheCommand::List => cache.load()?,
        CacheCommand::Add { date, time, text } => {
            let time = daybook_core::format_time_input(&time);
            cache.append(Note::new(date, time, text))?
        }
        CacheCommand::Remove { date, index } => cache.remove_at(date, index)?,
    };
    for note in notes.values().flatten() {
        print_note(note);
    }
    Ok(())
}

fn run_weather(args: WeatherArgs) -> CliResult {
    let mut config = WeatherConfig::new(args.api_url, args.api_key);
    if let Some(icons_url) = args.icons_url {
        config.icons_url = icons_url;
    }
    let mut weather = WeatherViewModel::new(HttpWeatherClient::new(config));
    let snapshot = weather.load(args.lat, args.lon)?;

    let current = &snapshot.current;
    let describe = |conditions: Option<&daybook_core::model::weather::Conditions>| {
        conditions
            .map(|c| c.description.clone())
            .unwrap_or_default()
    };
    println!(
        "now {:.0}°C (feels {:.0}°C) {}",
        current.temp,
        current.feels_like,
        describe(current.primary_conditions())
    );
    let icon = current.primary_conditions().map(|c| c.icon.clone());
    for hour in &snapshot.hourly {
        println!(
            "hour {} {:.0}°C {}",
            format_unix(hour.dt, "%H:%M"),
            hour.temp,
            describe(hour.primary_conditions())
        );
    }
    for day in &snapshot.daily {
        println!(
            "day {} {:.0}°C (feels {:.0}°C) {}",
            format_unix(day.dt, "%a %d.%m."),
            day.temp.day,
            day.feels_like.day,
            describe(day.primary_conditions())
        );
    }
    if let Some(icon) = icon {
        println!("icon {}", weather.source().config().icon_url(&icon));
    }
    Ok(())
}

fn print_note(note: &Note) {
    let time = if note.time.is_empty() { "--:--" } else { note.time.as_str() };
    println!("{} {time} {}", note.date, note.text);
}

fn format_unix(seconds: i64, pattern: &str) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp(seconds, 0)
        .map(|at| at.format(pattern).to_string())
        .unwrap_or_else(|| seconds.to_string())
}
