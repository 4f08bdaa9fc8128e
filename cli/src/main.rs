mod profile;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use insight_session::api::{admin, agent, projects, subscription, upload};
use insight_session::{ApiError, ConfigError, SessionConfig};
use insight_session::types::{Role, Tier};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::profile::Profile;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{}", .0.message())]
    Api(#[from] ApiError),
    #[error("failed to read {path}: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("not signed in; run `insight login`")]
    NotSignedIn,
    #[error("no user with email {0}")]
    UserNotFound(String),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "insight", about = "InsightAgent terminal client")]
struct Cli {
    /// Backend origin; overrides INSIGHT_API_URL.
    #[arg(long)]
    api_url: Option<String>,

    /// Directory holding the stored session.
    #[arg(long, env = "INSIGHT_PROFILE_DIR")]
    profile_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "INSIGHT_PASSWORD", hide_env_values = true)]
        password: String,
        /// Page to return to after signing in.
        #[arg(long)]
        from: Option<String>,
    },
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "INSIGHT_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        name: Option<String>,
    },
    Logout,
    Whoami,
    Projects(ProjectsCommand),
    Upload {
        project_id: String,
        file: PathBuf,
    },
    DropTable {
        project_id: String,
        table: String,
    },
    Query {
        project_id: String,
        question: String,
    },
    Preview {
        project_id: String,
        table: String,
        #[arg(long, default_value_t = agent::DEFAULT_PREVIEW_LIMIT)]
        limit: u32,
    },
    Usage,
    Plans,
    Admin(AdminCommand),
}

#[derive(Args, Debug)]
struct ProjectsCommand {
    #[command(subcommand)]
    command: ProjectsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProjectsSubcommand {
    List,
    Create { name: String },
    Get { id: String },
    Rename { id: String, name: String },
    Delete { id: String },
}

#[derive(Args, Debug)]
struct AdminCommand {
    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Subcommand, Debug)]
enum AdminSubcommand {
    Stats,
    Users {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = admin::DEFAULT_PAGE_SIZE)]
        limit: u32,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        tier: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },
    SetTier { email: String, tier: String },
    SetRole { email: String, role: String },
    DeleteUser { email: String },
}

impl Command {
    /// The app page this command acts from.
    fn location(&self) -> String {
        match self {
            Self::Login { from: Some(from), .. } => login_location(from),
            Self::Login { .. } => "/login".to_owned(),
            Self::Register { .. } => "/register".to_owned(),
            Self::Logout | Self::Whoami => "/".to_owned(),
            Self::Projects(_) => "/projects".to_owned(),
            Self::Upload { project_id, .. }
            | Self::DropTable { project_id, .. }
            | Self::Query { project_id, .. }
            | Self::Preview { project_id, .. } => format!("/projects/{project_id}"),
            Self::Usage => "/usage".to_owned(),
            Self::Plans => "/pricing".to_owned(),
            Self::Admin(_) => "/admin".to_owned(),
        }
    }

    /// Whether navigations caused by this command are worth reporting. A
    /// logout always lands on the login page, which says nothing new.
    fn reports_navigation(&self) -> bool {
        !matches!(self, Self::Logout)
    }
}

fn login_location(from: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("from", from)
        .finish();
    format!("/login?{query}")
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = SessionConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config.api_origin = url.trim_end_matches('/').to_owned();
        config.validate()?;
    }
    let dir = cli.profile_dir.unwrap_or_else(profile::default_profile_dir);

    let profile = Profile::open(&config, &dir, &cli.command.location())?;
    let report = cli.command.reports_navigation();
    let result = execute(&profile, cli.command).await;
    if report {
        profile.report_navigation(&config.login_path);
    }
    result
}

async fn execute(profile: &Profile, command: Command) -> Result<(), CliError> {
    let session = &profile.session;
    let client = profile.client();
    match command {
        Command::Login { email, password, .. } => {
            let user = session.login(&email, &password).await?;
            print_json(&user)
        }
        Command::Register { email, password, name } => {
            let user = session.register(&email, &password, name.as_deref()).await?;
            print_json(&user)
        }
        Command::Logout => {
            session.logout();
            eprintln!("signed out");
            Ok(())
        }
        Command::Whoami => {
            session.start().await;
            let user = session.user().ok_or(CliError::NotSignedIn)?;
            print_json(&user)
        }
        Command::Projects(cmd) => run_projects(profile, cmd.command).await,
        Command::Upload { project_id, file } => {
            let bytes = std::fs::read(&file).map_err(|source| CliError::ReadFile { path: file.clone(), source })?;
            let file_name = file
                .file_name()
                .map_or_else(|| "upload.csv".to_owned(), |name| name.to_string_lossy().into_owned());
            print_json(&upload::upload_file(client, &project_id, &file_name, bytes).await?)
        }
        Command::DropTable { project_id, table } => {
            upload::delete_table(client, &project_id, &table).await?;
            eprintln!("deleted table {table}");
            Ok(())
        }
        Command::Query { project_id, question } => print_json(&agent::query(client, &project_id, &question).await?),
        Command::Preview { project_id, table, limit } => {
            print_json(&agent::preview_table(client, &project_id, &table, limit).await?)
        }
        Command::Usage => print_json(&subscription::usage(client).await?),
        Command::Plans => print_json(&subscription::plans(client).await?),
        Command::Admin(cmd) => run_admin(profile, cmd.command).await,
    }
}

async fn run_projects(profile: &Profile, command: ProjectsSubcommand) -> Result<(), CliError> {
    let client = profile.client();
    match command {
        ProjectsSubcommand::List => print_json(&projects::list(client).await?),
        ProjectsSubcommand::Create { name } => print_json(&projects::create(client, &name).await?),
        ProjectsSubcommand::Get { id } => print_json(&projects::get(client, &id).await?),
        ProjectsSubcommand::Rename { id, name } => print_json(&projects::rename(client, &id, &name).await?),
        ProjectsSubcommand::Delete { id } => {
            projects::delete(client, &id).await?;
            eprintln!("deleted project {id}");
            Ok(())
        }
    }
}

async fn run_admin(profile: &Profile, command: AdminSubcommand) -> Result<(), CliError> {
    let client = profile.client();
    match command {
        AdminSubcommand::Stats => print_json(&admin::stats(client).await?),
        AdminSubcommand::Users { page, limit, search, tier, role } => {
            let query = admin::UserQuery {
                page,
                limit,
                search,
                tier: tier.as_deref().map(parse_tier),
                role: role.as_deref().map(parse_role),
            };
            print_json(&admin::list(client, query).await?)
        }
        AdminSubcommand::SetTier { email, tier } => {
            let user = find_user(profile, &email).await?;
            admin::set_tier(client, &user, &parse_tier(&tier)).await?;
            eprintln!("updated tier for {email}");
            Ok(())
        }
        AdminSubcommand::SetRole { email, role } => {
            let user = find_user(profile, &email).await?;
            admin::set_role(client, &user, &parse_role(&role)).await?;
            eprintln!("updated role for {email}");
            Ok(())
        }
        AdminSubcommand::DeleteUser { email } => {
            let user = find_user(profile, &email).await?;
            admin::delete(client, &user).await?;
            eprintln!("deleted user {email}");
            Ok(())
        }
    }
}

/// Tier names are upper-case on the wire; accept any case on the command line.
fn parse_tier(raw: &str) -> Tier {
    Tier::from(raw.to_ascii_uppercase())
}

fn parse_role(raw: &str) -> Role {
    Role::from(raw.to_ascii_uppercase())
}

/// Id of the user registered under `email`.
async fn find_user(profile: &Profile, email: &str) -> Result<String, CliError> {
    admin::find_by_email(profile.client(), email)
        .await?
        .map(|user| user.id)
        .ok_or_else(|| CliError::UserNotFound(email.to_owned()))
}

fn print_json(value: &impl Serialize) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
