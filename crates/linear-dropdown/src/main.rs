use std::env;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use linear_dropdown_core::auth::{AuthData, FileCredentialStore};
use linear_dropdown_core::graphql::{LinearGraphqlClient, LABEL_PAGE_SIZE};
use linear_dropdown_core::host::{FileCursorStore, RequestContext};
use linear_dropdown_core::services::labels::{LabelOption, LabelService, LABEL_TRIGGER};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_PROFILE: &str = "default";

#[derive(Parser, Debug)]
#[command(author, version, about = "Populate Linear dropdowns from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage the stored Linear API key
    #[command(subcommand)]
    Auth(AuthCommand),
    /// Fetch label options for a team, one page per call
    Labels(LabelArgs),
    /// Print the label trigger definition as JSON
    Describe,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Store a personal API key for a profile
    Login(LoginArgs),
    /// Forget stored credentials for a profile
    Logout(LogoutArgs),
}

#[derive(Args, Debug)]
struct LoginArgs {
    /// Personal API key, sent verbatim as the authorization header
    #[arg(long = "api-key")]
    api_key: String,
    /// Profile name for stored credentials
    #[arg(long, default_value = DEFAULT_PROFILE)]
    profile: String,
}

#[derive(Args, Debug)]
struct LogoutArgs {
    /// Profile name for stored credentials
    #[arg(long, default_value = DEFAULT_PROFILE)]
    profile: String,
}

#[derive(Args, Debug)]
struct LabelArgs {
    /// Profile name for stored credentials
    #[arg(long, default_value = DEFAULT_PROFILE)]
    profile: String,
    /// Team whose labels should be listed
    #[arg(long = "team-id")]
    team_id: Option<String>,
    /// Use the team of this issue when no team is given
    #[arg(long = "issue-id")]
    issue_id: Option<String>,
    /// Page number; anything above 0 continues from the stored cursor
    #[arg(long, default_value_t = 0)]
    page: u32,
    /// Pagination session name (defaults to one per team or issue)
    #[arg(long)]
    session: Option<String>,
    /// Keep requesting pages until the last one
    #[arg(long)]
    all: bool,
    /// Forget the session's stored cursor before fetching
    #[arg(long)]
    reset: bool,
    /// Output raw JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Auth(cmd) => match cmd {
            AuthCommand::Login(args) => auth_login(args)?,
            AuthCommand::Logout(args) => auth_logout(args)?,
        },
        Commands::Labels(args) => labels(args).await?,
        Commands::Describe => {
            println!("{}", serde_json::to_string_pretty(&LABEL_TRIGGER)?);
        }
    }
    Ok(())
}

fn auth_login(args: LoginArgs) -> Result<()> {
    let store = FileCredentialStore::with_default_locator()
        .context("unable to initialise credential store")?;
    store
        .save(&args.profile, &AuthData::new_api_key(args.api_key))
        .context("failed to store API key")?;
    println!("Personal API key stored for profile '{}'.", args.profile);
    Ok(())
}

fn auth_logout(args: LogoutArgs) -> Result<()> {
    let store = FileCredentialStore::with_default_locator()
        .context("unable to initialise credential store")?;
    store
        .delete(&args.profile)
        .context("failed to remove stored credentials")?;
    println!("Deleted credentials for profile '{}'.", args.profile);
    Ok(())
}

/// `LINEAR_API_KEY` takes precedence over the stored profile.
fn load_auth(profile: &str) -> Result<AuthData> {
    if let Ok(key) = env::var("LINEAR_API_KEY") {
        if !key.trim().is_empty() {
            debug!("using API key from LINEAR_API_KEY");
            return Ok(AuthData::new_api_key(key));
        }
    }

    let store = FileCredentialStore::with_default_locator()
        .context("unable to initialise credential store")?;
    store
        .load(profile)
        .context("failed to read stored credentials")?
        .ok_or_else(|| {
            anyhow!(
                "no credentials stored for profile '{}'; run `linear-dropdown auth login --api-key <KEY>`",
                profile
            )
        })
}

fn build_client(auth: &AuthData) -> Result<LinearGraphqlClient> {
    let client = match env::var("LINEAR_GRAPHQL_ENDPOINT") {
        Ok(endpoint) if !endpoint.trim().is_empty() => {
            LinearGraphqlClient::with_endpoint(auth, &endpoint)
                .context("invalid LINEAR_GRAPHQL_ENDPOINT")?
        }
        _ => LinearGraphqlClient::from_auth(auth)
            .context("failed to build GraphQL client")?,
    };
    Ok(client)
}

async fn labels(args: LabelArgs) -> Result<()> {
    let auth = load_auth(&args.profile)?;
    let service = LabelService::new(build_client(&auth)?);

    let session = args.session.clone().unwrap_or_else(|| default_session(&args));
    let cursor = FileCursorStore::with_default_locator(session.as_str())
        .context("unable to initialise cursor store")?;
    if args.reset {
        cursor.clear().context("failed to reset cursor")?;
        info!(%session, "cursor reset");
    }

    let mut ctx = RequestContext::new(auth);
    if let Some(team_id) = &args.team_id {
        ctx = ctx.with_input("teamId", team_id.as_str());
    }
    if let Some(issue_id) = &args.issue_id {
        ctx = ctx.with_input("issueIdToUpdate", issue_id.as_str());
    }

    let mut page = args.page;
    let mut options = Vec::new();
    loop {
        info!(%session, page, "requesting label page");
        let batch = match service.perform(&ctx.clone().with_page(page), &cursor).await {
            Ok(batch) => batch,
            Err(err) if err.is_halted() => bail!("{err}"),
            Err(err) => return Err(err).context("label lookup failed"),
        };
        let last_page = batch.len() < LABEL_PAGE_SIZE;
        options.extend(batch);
        if !args.all || last_page {
            break;
        }
        page += 1;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&options)?);
    } else {
        render_options(&options);
    }
    Ok(())
}

fn default_session(args: &LabelArgs) -> String {
    match (&args.team_id, &args.issue_id) {
        (Some(team_id), _) => format!("labels-team-{team_id}"),
        (None, Some(issue_id)) => format!("labels-issue-{issue_id}"),
        (None, None) => "labels".to_owned(),
    }
}

fn render_options(options: &[LabelOption]) {
    if options.is_empty() {
        println!("No labels found.");
        return;
    }
    let width = options.iter().map(|option| option.id.len()).max().unwrap_or(0);
    for option in options {
        println!("{:<width$}  {}", option.id, option.name, width = width);
    }
}
