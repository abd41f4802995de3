use anyhow::Result;
use clap::{Parser, Subcommand};
use planner_application::{AppContext, Overrides};
use planner_infrastructure::{ConfigService, PlannerPaths};
use std::path::PathBuf;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "planner")]
#[command(about = "Study Planner CLI - sign in and talk to the study planner API", long_about = None)]
struct Cli {
    /// API base URL (overrides STUDY_PLANNER_API_URL and config.toml)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Session storage file (defaults to storage.json in the config directory)
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in with it
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami {
        /// Confirm the stored credential with the server first
        #[arg(long)]
        verify: bool,
    },
    /// GET a path and print the JSON response
    Get {
        path: String,
        /// Query parameter as key=value (repeatable, order is kept)
        #[arg(short = 'q', long = "query", value_parser = commands::parse_key_value)]
        query: Vec<(String, String)>,
    },
    /// POST JSON to a path
    Post {
        path: String,
        #[arg(long)]
        data: Option<String>,
    },
    /// PUT JSON to a path
    Put {
        path: String,
        #[arg(long)]
        data: Option<String>,
    },
    /// PATCH JSON to a path
    Patch {
        path: String,
        #[arg(long)]
        data: Option<String>,
    },
    /// DELETE a path
    Delete { path: String },
    /// Upload a file as multipart form data
    Upload {
        path: String,
        file: PathBuf,
        /// Extra form field as key=value (repeatable)
        #[arg(short = 'f', long = "field", value_parser = commands::parse_key_value)]
        fields: Vec<(String, String)>,
    },
    /// List courses
    Courses,
    /// List assignments
    Assignments,
    /// List the weekly class schedule
    Schedule,
    /// List study sessions
    Sessions,
    /// Show the credit-weighted grade point average of graded courses
    Gpa,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_service = ConfigService::new(PlannerPaths::new(None));
    let config = config_service.get_config();
    let _log_guard = logging::init(config_service.paths(), config.logging.level_or_default());

    let context = AppContext::bootstrap(
        &config_service,
        Overrides {
            api_url: cli.api_url,
            timeout_ms: cli.timeout_ms,
            storage_file: cli.storage,
        },
    )?;

    commands::run(&context, cli.command).await
}
