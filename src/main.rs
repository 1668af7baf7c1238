//! access-cli -- command line front end for the Access identity service.
//!
//! Loads the configuration, performs `/sdk-init`, runs one command and prints
//! the JSON response on stdout.

use std::path::PathBuf;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

use access_sdk::config::AccessConfig;
use access_sdk::{
    AccessClient, ChangePasswordInput, ForgotPasswordInput, GetApplicationInput,
    GetOrganizationInput, GetUserInput, LoginInput, LogoutInput, RefreshTokenInput,
    RegisterInput, ResetPasswordInput,
};

// ---------------------------------------------------------------------------
// CLI argument parsing (minimal, no clap dependency)
// ---------------------------------------------------------------------------

struct CliArgs {
    config_path: PathBuf,
    command: String,
    payload: Option<String>,
}

fn parse_args() -> CliArgs {
    let mut args = std::env::args().skip(1);
    let mut config_path = PathBuf::from("access.toml");
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                if let Some(path) = args.next() {
                    config_path = PathBuf::from(path);
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("access-cli {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            other if other.starts_with('-') && other.len() > 1 => {
                eprintln!("Unknown argument: {other}");
                eprintln!("Run with --help for usage information.");
                std::process::exit(1);
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let Some(command) = positional.next() else {
        print_usage();
        std::process::exit(1);
    };
    let payload = positional.next();
    if let Some(extra) = positional.next() {
        eprintln!("Unexpected argument: {extra}");
        std::process::exit(1);
    }

    CliArgs {
        config_path,
        command,
        payload,
    }
}

fn print_usage() {
    println!(
        "\
access-cli {version} -- Access identity service client

USAGE:
    access-cli [OPTIONS] <COMMAND> [JSON | @FILE]

COMMANDS:
    init               Run /sdk-init and print the stored context (secret masked)
    login              Sign in
    logout             Sign out
    register           Create an account
    refresh            Exchange a refresh token
    get-user           Fetch the current user
    get-organization   Fetch the organization
    get-application    Fetch the application
    change-password    Change the password
    forgot-password    Start a password reset
    reset-password     Finish a password reset

OPTIONS:
    -c, --config <PATH>    Path to configuration file [default: access.toml]
    -h, --help             Print this help message
    -V, --version          Print version information

ENVIRONMENT:
    RUST_LOG               Override log level (e.g. RUST_LOG=debug)
    ACCESS_CONFIG          Alternative to --config flag
    ACCESS_*               Per-field overrides (ACCESS_BASE_URL, ACCESS_CLIENT_ID, ...)
",
        version = env!("CARGO_PKG_VERSION")
    );
}

/// Read the request body: inline JSON, `@path` to a JSON file, or `{}`.
fn read_payload(raw: Option<&str>) -> anyhow::Result<Value> {
    let text = match raw {
        None => return Ok(Value::Object(Default::default())),
        Some(arg) => match arg.strip_prefix('@') {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read request body from {path}"))?,
            None => arg.to_string(),
        },
    };
    serde_json::from_str(&text).context("Request body is not valid JSON")
}

/// Context for display, with the client secret masked.
fn redacted_context(data: &Map<String, Value>) -> Value {
    let mut data = data.clone();
    if let Some(secret) = data.get_mut("client_secret") {
        if secret.as_str().is_some_and(|s| !s.is_empty()) {
            *secret = Value::String("***".into());
        }
    }
    Value::Object(data)
}

fn input<T: DeserializeOwned>(command: &str, payload: Value) -> anyhow::Result<T> {
    serde_json::from_value(payload).with_context(|| format!("Invalid input for `{command}`"))
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?
        .block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    let cli = parse_args();

    // Allow ACCESS_CONFIG env var as alternative to --config flag
    let config_path = std::env::var("ACCESS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or(cli.config_path);

    let config = AccessConfig::load(&config_path)?;
    init_tracing(&config);

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        base_url = %config.base_url,
        overridden = config.env_overrides.all().len(),
        "Starting access-cli"
    );

    let payload = read_payload(cli.payload.as_deref())?;
    let client = AccessClient::init(config).await?;
    let command = cli.command.as_str();

    let response = match command {
        "init" => redacted_context(client.context().data()),
        "login" => client.login(&input::<LoginInput>(command, payload)?).await?,
        "logout" => client.logout(&input::<LogoutInput>(command, payload)?).await?,
        "register" => client.register(&input::<RegisterInput>(command, payload)?).await?,
        "refresh" => {
            client
                .refresh_token(input::<RefreshTokenInput>(command, payload)?)
                .await?
        }
        "get-user" => client.get_user(&input::<GetUserInput>(command, payload)?).await?,
        "get-organization" => {
            client
                .get_organization(&input::<GetOrganizationInput>(command, payload)?)
                .await?
        }
        "get-application" => {
            client
                .get_application(&input::<GetApplicationInput>(command, payload)?)
                .await?
        }
        "change-password" => {
            client
                .change_password(&input::<ChangePasswordInput>(command, payload)?)
                .await?
        }
        "forgot-password" => {
            client
                .forgot_password(&input::<ForgotPasswordInput>(command, payload)?)
                .await?
        }
        "reset-password" => {
            client
                .reset_password(&input::<ResetPasswordInput>(command, payload)?)
                .await?
        }
        other => anyhow::bail!("Unknown command `{other}`. Run with --help for usage information."),
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tracing initialization
// ---------------------------------------------------------------------------

fn init_tracing(config: &AccessConfig) {
    // RUST_LOG env var takes precedence over config file
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.logging.level;
        EnvFilter::new(format!("access_sdk={level},access_cli={level},warn"))
    });

    // Logs go to stderr so stdout stays pure JSON.
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false);

    if config.logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
