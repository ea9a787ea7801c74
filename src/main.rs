mod artifact;
mod cli;
mod config;
mod dir_walk;
mod locate;
mod project_diff;
mod prompt;
mod reconcile;
mod remote;
mod report;
mod text_diff;

use anyhow::{Context as _, bail};
use chrono::Utc;
use cli::{
    ActionCommand, ApiCommand, Cli, Command, ConfigCommand, Credentials, HttpMethod, LogLevel,
    ProjectCommand,
};
use config::Config;
use project_diff::{CompareOptions, ProjectComparator};
use prompt::TerminalSink;
use remote::RemoteStore;
use remote::http::{ApiClient, HttpRemote, Session};
use std::fmt as stdfmt;
use std::io::{IsTerminal, stderr, stdout};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use text_diff::{DiffEngine, DiffOptions, RenderStyle};
use tracing::{Event, Level, Subscriber, error, info, warn};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

struct HxExitCode;

impl HxExitCode {
    /// Exit code used when the compared sides are not in sync.
    fn differences_found() -> ExitCode {
        ExitCode::from(1)
    }

    /// Exit code used for errors (login failure, I/O errors, invalid arguments, etc.).
    fn any_error() -> ExitCode {
        ExitCode::from(255)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_level);

    let result = Context::load(cli.config, cli.base_url).and_then(|mut ctx| match cli.command {
        Command::Login { credentials } => handle_login(&mut ctx, credentials),
        Command::Action(ActionCommand::Diff {
            dir,
            project,
            pause,
            no_pause,
            credentials,
        }) => handle_action_diff(&mut ctx, dir, project, pause_flag(pause, no_pause), credentials),
        Command::Project(ProjectCommand::Diff {
            project_a,
            project_b,
            large_value_threshold,
            credentials,
        }) => handle_project_diff(
            &mut ctx,
            &project_a,
            &project_b,
            large_value_threshold,
            credentials,
        ),
        Command::Api(ApiCommand::Call {
            uri,
            method,
            body,
            auth,
            credentials,
        }) => handle_api_call(&mut ctx, &uri, method, body, auth, credentials),
        Command::Config(command) => handle_config(&ctx, command),
    });

    match result {
        Ok(exit_code) => exit_code,
        Err(err) => {
            error!("{err:#}");
            HxExitCode::any_error()
        }
    }
}

fn pause_flag(pause: bool, no_pause: bool) -> Option<bool> {
    match (pause, no_pause) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Config and global overrides shared by all commands.
struct Context {
    config_path: PathBuf,
    config: Config,
    base_url: Option<String>,
}

impl Context {
    fn load(config_path: Option<PathBuf>, base_url: Option<String>) -> anyhow::Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => Config::default_path()?,
        };
        let config = Config::load(&config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?;
        Ok(Context {
            config_path,
            config,
            base_url,
        })
    }

    fn client(&self) -> anyhow::Result<ApiClient> {
        let base_url = self
            .base_url
            .as_deref()
            .unwrap_or(&self.config.settings.base_url);
        let timeout = Duration::from_secs(self.config.settings.timeout_secs);
        Ok(ApiClient::new(base_url, timeout)?)
    }

    /// Log in, asking for whatever the flags and config do not provide.
    fn login(
        &mut self,
        client: &ApiClient,
        credentials: Credentials,
    ) -> anyhow::Result<(Session, String)> {
        let email = match credentials.email.or_else(|| self.config.last_login_user.clone()) {
            Some(email) => email,
            None => prompt::prompt_line("Email: ")?,
        };
        if email.is_empty() {
            bail!("No login email given");
        }

        let stored = self
            .config
            .user(&email)
            .and_then(|u| u.password.clone());
        let password = match credentials.password.or(stored) {
            Some(password) => password,
            None => prompt::prompt_password(&format!("Password for {email}: "))?,
        };

        info!("Logging in to {} as {email}", client.base_url());
        let session = client.login(&email, &password)?;
        self.config.remember_login(&email);
        Ok((session, email))
    }

    fn resolve_project(&self, project: Option<String>) -> anyhow::Result<String> {
        let project = match project.or_else(|| self.config.last_used_project.clone()) {
            Some(project) => project,
            None => prompt::prompt_line("Project ID: ")?,
        };
        if project.is_empty() {
            bail!("No project ID given");
        }
        match self.config.project(&project).and_then(|p| p.display_id.as_deref()) {
            Some(display_id) => info!("Using project {project} ({display_id})"),
            None => info!("Using project {project}"),
        }
        Ok(project)
    }

    fn diff_engine(&self) -> DiffEngine {
        let style = if stdout().is_terminal() {
            RenderStyle::Ansi
        } else {
            RenderStyle::Plain
        };
        DiffEngine::new(DiffOptions {
            style,
            timeout: Duration::from_millis(self.config.settings.diff_timeout_ms),
        })
    }

    /// Failing to save the config does not change the outcome of a command.
    fn save(&self) {
        if let Err(e) = self.config.save(&self.config_path) {
            warn!(
                "Failed to save config {}: {e}",
                self.config_path.display()
            );
        }
    }
}

fn handle_login(ctx: &mut Context, credentials: Credentials) -> anyhow::Result<ExitCode> {
    let client = ctx.client()?;
    let (session, email) = ctx.login(&client, credentials)?;
    ctx.save();

    info!("Logged in as {email}");
    println!("{}", session.token());
    Ok(ExitCode::SUCCESS)
}

fn handle_action_diff(
    ctx: &mut Context,
    dir: PathBuf,
    project: Option<String>,
    pause: Option<bool>,
    credentials: Credentials,
) -> anyhow::Result<ExitCode> {
    let client = ctx.client()?;
    let (session, email) = ctx.login(&client, credentials)?;
    let project_id = ctx.resolve_project(project)?;
    let remote = HttpRemote::new(client, session);

    let mut artifacts = remote
        .list_actions(&project_id)
        .with_context(|| format!("Failed to list actions of project {project_id}"))?;
    artifacts.extend(
        remote
            .list_functions(&project_id)
            .with_context(|| format!("Failed to list functions of project {project_id}"))?,
    );
    info!(
        "Comparing {} actions and functions of project {project_id} with {}",
        artifacts.len(),
        dir.display()
    );

    let engine = ctx.diff_engine();
    let mut sink = TerminalSink::new(pause.unwrap_or(ctx.config.settings.pause_on_diff));
    let summary = reconcile::reconcile(&remote, &project_id, &artifacts, &dir, &engine, &mut sink)?;

    report::print_reconciliation_summary(&summary);

    ctx.config.remember_project(&project_id, &email, Utc::now());
    ctx.save();

    if summary.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(HxExitCode::differences_found())
    }
}

fn handle_project_diff(
    ctx: &mut Context,
    project_a: &str,
    project_b: &str,
    large_value_threshold: Option<usize>,
    credentials: Credentials,
) -> anyhow::Result<ExitCode> {
    let client = ctx.client()?;
    let (session, _) = ctx.login(&client, credentials)?;
    let remote = HttpRemote::new(client, session);

    let engine = ctx.diff_engine();
    let options = CompareOptions {
        large_value_threshold: large_value_threshold
            .unwrap_or(ctx.config.settings.large_value_threshold),
    };
    let comparison = ProjectComparator::new(&remote, &engine, options).compare(project_a, project_b)?;

    report::print_comparison(&comparison, project_a, project_b);
    ctx.save();

    if comparison.has_differences() {
        Ok(HxExitCode::differences_found())
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn handle_api_call(
    ctx: &mut Context,
    uri: &str,
    method: HttpMethod,
    body: Option<String>,
    auth: bool,
    credentials: Credentials,
) -> anyhow::Result<ExitCode> {
    let client = ctx.client()?;
    let session = if auth {
        let (session, _) = ctx.login(&client, credentials)?;
        ctx.save();
        Some(session)
    } else {
        None
    };

    let response = match method {
        HttpMethod::Get => {
            if body.is_some() {
                warn!("Ignoring request body for GET");
            }
            client.get(uri, &[], session.as_ref())?
        }
        HttpMethod::Post => client.post(uri, body.unwrap_or_default(), session.as_ref())?,
    };

    info!("HTTP {}", response.status);
    println!("{}", pretty_body(&response.body));

    if (200..300).contains(&response.status) {
        Ok(ExitCode::SUCCESS)
    } else {
        error!("Request failed with HTTP {}", response.status);
        Ok(HxExitCode::differences_found())
    }
}

/// JSON objects and arrays are pretty-printed, anything else is returned as is.
fn pretty_body(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) if value.is_object() || value.is_array() => {
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.to_string())
        }
        _ => body.to_string(),
    }
}

fn handle_config(ctx: &Context, command: ConfigCommand) -> anyhow::Result<ExitCode> {
    match command {
        ConfigCommand::Path => println!("{}", ctx.config_path.display()),
        ConfigCommand::Show => print!("{}", ctx.config.masked().to_toml()?),
    }
    Ok(ExitCode::SUCCESS)
}

fn init_tracing(verbose: u8, log_level: Option<LogLevel>) {
    let stderr_is_terminal = stderr().is_terminal();
    let formatter = EmojiFormatter { stderr_is_terminal };

    let level = match (log_level, verbose) {
        (Some(level), _) => Some(level.as_str()),
        (None, 0) => None,
        (None, 1) => Some("info"),
        (None, _) => Some("debug"),
    };

    // Dependencies stay at warn so -vv does not drown in HTTP client noise.
    let filter = match level {
        Some(level) => EnvFilter::new(format!("warn,hxutil={level}")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let fmt_layer = tracing_fmt::layer()
        .event_format(formatter)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

struct EmojiFormatter {
    stderr_is_terminal: bool,
}

impl<S, N> FormatEvent<S, N> for EmojiFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        if self.stderr_is_terminal {
            match *event.metadata().level() {
                Level::DEBUG => write!(writer, "🔍 ")?,
                Level::INFO => write!(writer, "ℹ️ ")?,
                Level::WARN => write!(writer, "⚠️  ")?,
                Level::ERROR => write!(writer, "❌️ ")?,
                _ => {}
            }
        } else {
            match *event.metadata().level() {
                Level::DEBUG => writer.write_str("DEBUG: ")?,
                Level::INFO => writer.write_str("INFO: ")?,
                Level::WARN => writer.write_str("WARN: ")?,
                Level::ERROR => writer.write_str("ERROR: ")?,
                _ => {}
            }
        }

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
