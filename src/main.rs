use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{Level, info, warn};

use talentscout::ai::{ChatCompletionsClient, LanguageModel};
use talentscout::config::Config;
use talentscout::conversation::Interviewer;
use talentscout::session::{Session, SessionStore};
use talentscout::tech_stack::{MatchMode, TechCatalog};
use talentscout::{tui, validate};

#[derive(Parser)]
#[command(name = "talentscout")]
#[command(about = "Conversational candidate screening - collect details and run a short technical interview")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct InterviewArgs {
    /// Model name or alias (overrides TALENTSCOUT_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// JSON file with a custom technology catalog
    #[arg(long)]
    tech_catalog: Option<PathBuf>,

    /// How technologies are matched in the candidate's text
    #[arg(long, value_enum, default_value = "word-boundary")]
    match_mode: MatchMode,

    /// Write the finished session as JSON to this path
    #[arg(long)]
    transcript_out: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a screening conversation on stdin/stdout
    Chat {
        #[command(flatten)]
        args: InterviewArgs,
    },

    /// Run a screening conversation in a full-screen terminal UI
    Tui {
        #[command(flatten)]
        args: InterviewArgs,
    },

    /// Show which technologies are recognised in some text
    Extract {
        /// Free-form text, e.g. "Python, Django, PostgreSQL"
        text: String,

        /// JSON file with a custom technology catalog
        #[arg(long)]
        tech_catalog: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "word-boundary")]
        match_mode: MatchMode,
    },

    /// Run one field validator against a value
    Check {
        #[arg(value_enum)]
        field: CheckField,

        value: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CheckField {
    Email,
    Phone,
    Experience,
    Name,
    Position,
    Location,
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

/// The TUI owns the terminal, so its logs default to a file in the data directory.
fn default_log_path() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "talentscout")?;
    let dir = dirs.data_dir();
    std::fs::create_dir_all(dir).ok()?;
    Some(dir.join("talentscout.log"))
}

fn load_catalog(path: Option<&Path>, mode: MatchMode) -> Result<TechCatalog> {
    let catalog = match path {
        Some(p) => TechCatalog::from_json_file(p)?,
        None => TechCatalog::default(),
    };
    Ok(catalog.with_mode(mode))
}

fn build_client(args: &InterviewArgs) -> Result<ChatCompletionsClient> {
    let mut config = Config::from_env()?;
    if let Some(model) = &args.model {
        config = config.with_model(model)?;
    }
    let client = ChatCompletionsClient::new(&config)?;
    if !client.is_configured() {
        warn!("TOGETHER_API_KEY is not set; question generation will fail until it is configured");
    }
    info!(model = client.model_name(), url = %config.api_url, "Language model configured");
    Ok(client)
}

fn export_session(session: &Session, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        session.export_json(path)?;
        println!("Session saved to: {}", path.display());
    }
    Ok(())
}

fn run_repl(interviewer: &Interviewer, session: &mut Session) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    println!("{}\n", session.transcript[0].content);

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let reply = session.respond(input, interviewer);
        println!("\n{}\n", reply);

        if session.is_ended() {
            break;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_file = match (&cli.log_file, &cli.command) {
        (Some(path), _) => Some(path.clone()),
        (None, Commands::Tui { .. }) => default_log_path(),
        (None, _) => None,
    };
    init_logging(cli.verbose, log_file.as_deref())?;

    match cli.command {
        Commands::Chat { args } => {
            let client = build_client(&args)?;
            let catalog = load_catalog(args.tech_catalog.as_deref(), args.match_mode)?;
            let interviewer = Interviewer::new(&client, &catalog);

            let mut store = SessionStore::new();
            let id = store.create();
            let session = store.get_or_create(&id);
            info!(session = %session.id, "Session started");

            run_repl(&interviewer, session)?;
            export_session(session, args.transcript_out.as_deref())?;
        }

        Commands::Tui { args } => {
            let client = build_client(&args)?;
            let catalog = load_catalog(args.tech_catalog.as_deref(), args.match_mode)?;
            let interviewer = Interviewer::new(&client, &catalog);

            let session = tui::run_chat(&interviewer)?;
            export_session(&session, args.transcript_out.as_deref())?;
        }

        Commands::Extract {
            text,
            tech_catalog,
            match_mode,
        } => {
            let catalog = load_catalog(tech_catalog.as_deref(), match_mode)?;
            let techs = catalog.extract(&text);
            if techs.is_empty() {
                println!("No technologies recognised.");
            } else {
                for (i, tech) in techs.iter().enumerate() {
                    println!("{:>2}. {}", i + 1, tech);
                }
            }
        }

        Commands::Check { field, value } => {
            let valid = match field {
                CheckField::Email => validate::validate_email(value.trim()),
                CheckField::Phone => validate::validate_phone(value.trim()),
                CheckField::Experience => validate::validate_experience(value.trim()),
                CheckField::Name => validate::validate_min_length(&value, validate::MIN_NAME_LEN),
                CheckField::Position => {
                    validate::validate_min_length(&value, validate::MIN_POSITION_LEN)
                }
                CheckField::Location => {
                    validate::validate_min_length(&value, validate::MIN_LOCATION_LEN)
                }
            };
            println!("{}", if valid { "valid" } else { "invalid" });
        }
    }

    Ok(())
}
