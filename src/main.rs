use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use damayanti_client::client::RequestOptions;
use damayanti_client::config::{load_config, print_schema};
use damayanti_client::models::{LoginRequest, RequestResult};
use damayanti_client::resources::{Page, ReportFilters, ResourceError, SensorDataFilters};
use damayanti_client::session::{is_authenticated, token_expiry, TracingNavigator};
use damayanti_client::startup::start;
use damayanti_client::state::AppState;
use damayanti_client::theme::ThemeMode;
use damayanti_client::utils::logger::init_logging;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

#[derive(Parser)]
#[command(name = "damayanti")]
#[command(about = "Command-line client for the Damayanti school API")]
#[command(version)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "./config.yaml")]
    config: PathBuf,

    /// Print the configuration JSON schema and exit
    #[arg(long)]
    print_schema: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Exchange credentials for an access token and store it
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored access token
    Logout,
    /// Show whether a valid session is stored
    Status,
    /// Send an arbitrary request to the API
    Request {
        /// GET, POST, PUT, PATCH or DELETE
        method: String,
        /// Path relative to the API base URL, e.g. /students
        path: String,
        /// JSON request body
        #[arg(long)]
        data: Option<String>,
        /// Extra header as "Name: value"; may be repeated
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        /// Do not send the Authorization header
        #[arg(long)]
        no_auth: bool,
    },
    /// List students
    Students {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// List containers
    Containers {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// List sensor readings
    SensorData {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
        #[arg(long)]
        container_id: Option<String>,
        #[arg(long)]
        date_from: Option<String>,
        #[arg(long)]
        date_to: Option<String>,
    },
    /// List reports
    Reports {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
        #[arg(long)]
        student_id: Option<String>,
        #[arg(long)]
        container_id: Option<String>,
    },
    /// Show, set ("light"/"dark") or toggle the theme preference
    Theme { mode: Option<String> },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if args.print_schema {
        if let Err(e) = print_schema() {
            eprintln!("Error printing schema: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
    debug!("Loaded configuration: {:?}", config);

    let state = match start(Arc::new(config), Arc::new(TracingNavigator)).await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Error starting client: {}", e);
            std::process::exit(1);
        }
    };

    let code = match args.command {
        Some(command) => run(command, &state).await,
        None => status(&state).await,
    };
    std::process::exit(code);
}

async fn run(command: Command, state: &AppState) -> i32 {
    match command {
        Command::Login { email, password } => {
            let outcome = state
                .session
                .login(&LoginRequest::new(email, password))
                .await;
            print_json(&outcome);
            if outcome.success {
                0
            } else {
                1
            }
        }
        Command::Logout => {
            state.session.logout().await;
            print_json(&state.session.state());
            0
        }
        Command::Status => status(state).await,
        Command::Request {
            method,
            path,
            data,
            headers,
            no_auth,
        } => {
            let result = request(state, &method, &path, data.as_deref(), &headers, no_auth).await;
            let code = if result.is_success() { 0 } else { 1 };
            print_json(&result);
            code
        }
        Command::Students { limit, offset } => {
            report(state.students().list(Page { limit, offset }).await)
        }
        Command::Containers { limit, offset } => {
            report(state.containers().list(Page { limit, offset }).await)
        }
        Command::SensorData {
            limit,
            offset,
            container_id,
            date_from,
            date_to,
        } => {
            let filters = SensorDataFilters {
                page: Page { limit, offset },
                container_id,
                date_from,
                date_to,
            };
            report(state.sensor_data().list(&filters).await)
        }
        Command::Reports {
            limit,
            offset,
            student_id,
            container_id,
        } => {
            let filters = ReportFilters {
                page: Page { limit, offset },
                student_id,
                container_id,
            };
            report(state.reports().list(&filters).await)
        }
        Command::Theme { mode } => theme(state, mode.as_deref()).await,
    }
}

async fn status(state: &AppState) -> i32 {
    let session = state.session.state();
    let expires_at = session
        .token
        .as_deref()
        .and_then(|token| token_expiry(token).ok());
    print_json(&serde_json::json!({
        "is_authenticated": session.is_authenticated,
        "persisted_token_valid": is_authenticated(state.storage.as_ref()).await,
        "persistent": state.session.is_persistent(),
        "expires_at": expires_at,
        "api": state.client.base_url(),
    }));
    0
}

async fn request(
    state: &AppState,
    method: &str,
    path: &str,
    data: Option<&str>,
    headers: &[String],
    no_auth: bool,
) -> RequestResult<Value> {
    let body: Option<Value> = match data.map(serde_json::from_str).transpose() {
        Ok(body) => body,
        Err(e) => return RequestResult::failure(format!("Invalid --data JSON: {}", e)),
    };

    let mut options = RequestOptions::new();
    for header in headers {
        match header.split_once(':') {
            Some((name, value)) => options = options.header(name.trim(), value.trim()),
            None => return RequestResult::failure(format!("Invalid header '{}'", header)),
        }
    }
    if no_auth {
        options = options.without_auth();
    }

    let client = &state.client;
    match method.to_uppercase().as_str() {
        "GET" => client.get(path, options).await,
        "POST" => client.post(path, body.as_ref(), options).await,
        "PUT" => client.put(path, body.as_ref(), options).await,
        "PATCH" => client.patch(path, body.as_ref(), options).await,
        "DELETE" => client.delete(path, options).await,
        other => RequestResult::failure(format!("Unsupported method '{}'", other)),
    }
}

async fn theme(state: &AppState, mode: Option<&str>) -> i32 {
    state.theme.init(false).await;
    let mode = match mode {
        None => state.theme.mode(),
        Some("toggle") => state.theme.toggle().await,
        Some(raw) => match raw.parse::<ThemeMode>() {
            Ok(mode) => {
                state.theme.set_mode(mode).await;
                mode
            }
            Err(e) => {
                eprintln!("{}", e);
                return 1;
            }
        },
    };
    print_json(&mode);
    0
}

fn report<T: Serialize>(result: Result<T, ResourceError>) -> i32 {
    match result {
        Ok(value) => {
            print_json(&value);
            0
        }
        Err(ResourceError::Validation(errors)) => {
            eprintln!("Validation failed:");
            for (field, problem) in errors {
                eprintln!("  {}: {}", field, problem);
            }
            1
        }
        Err(ResourceError::Api(error)) => {
            eprintln!("{}", error);
            1
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to render output: {}", e),
    }
}
