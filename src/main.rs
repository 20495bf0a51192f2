use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use vantage_client::models::{
    AttachChartRequest, ChartCreateRequest, ChartPosition, DataSourceCreateRequest,
    DashboardCreateRequest, DatasetCreateRequest, LoginRequest, PageQuery, QueryRequest,
    RegisterRequest,
};
use vantage_client::notify::init_notice_bus;
use vantage_client::{ApiClient, ApiError, ClientConfig, FileTokenStore, Role, SessionManager, TokenStore};

#[derive(Parser, Debug)]
#[command(author, version, about = "vantage dashboard client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and store the session tokens
    Login {
        username: String,
        /// Password; falls back to VANTAGE_PASSWORD
        #[arg(long)]
        password: Option<String>,
    },
    /// Drop the stored session
    Logout,
    /// Create an account (does not log in)
    Register {
        username: String,
        email: String,
        #[arg(long)]
        password: Option<String>,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long)]
        role: Option<Role>,
    },
    /// Show the current user and their grants
    Whoami,
    /// Show local token state without calling the server
    Status,
    /// Data source operations
    Datasource {
        #[command(subcommand)]
        command: DatasourceCommands,
    },
    /// Dataset operations
    Dataset {
        #[command(subcommand)]
        command: DatasetCommands,
    },
    /// Chart operations
    Chart {
        #[command(subcommand)]
        command: ChartCommands,
    },
    /// Dashboard operations
    Dashboard {
        #[command(subcommand)]
        command: DashboardCommands,
    },
}

#[derive(Subcommand, Debug)]
enum DatasourceCommands {
    List {
        #[arg(long)]
        page: Option<i64>,
        #[arg(long)]
        per_page: Option<i64>,
    },
    Get {
        id: Uuid,
    },
    Create {
        name: String,
        /// Backend kind, e.g. postgresql, mysql, s3
        #[arg(long = "type")]
        kind: String,
        #[arg(long)]
        description: Option<String>,
        /// Connection parameters as a JSON object
        #[arg(long)]
        params: Option<String>,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(Subcommand, Debug)]
enum DatasetCommands {
    List {
        #[arg(long)]
        page: Option<i64>,
    },
    Get {
        id: Uuid,
    },
    Create {
        name: String,
        #[arg(long)]
        source_id: Uuid,
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        table: Option<String>,
    },
    /// Fetch the first rows of a dataset
    Preview {
        id: Uuid,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Run an ad-hoc SQL query against a data source
    Query {
        source_id: Uuid,
        sql: String,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(Subcommand, Debug)]
enum ChartCommands {
    List {
        #[arg(long)]
        page: Option<i64>,
        #[arg(long)]
        dataset: Option<Uuid>,
    },
    Get {
        id: Uuid,
    },
    Create {
        name: String,
        #[arg(long)]
        dataset_id: Uuid,
        #[arg(long = "type")]
        chart_type: String,
    },
    /// Fetch the chart's series data
    Data {
        id: Uuid,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(Subcommand, Debug)]
enum DashboardCommands {
    List {
        #[arg(long)]
        page: Option<i64>,
    },
    Get {
        id: Uuid,
    },
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Place a chart on a dashboard
    Attach {
        dashboard_id: Uuid,
        chart_id: Uuid,
        #[arg(long, default_value_t = 0)]
        x: i64,
        #[arg(long, default_value_t = 0)]
        y: i64,
        #[arg(long, default_value_t = 4)]
        width: i64,
        #[arg(long, default_value_t = 3)]
        height: i64,
    },
    Detach {
        dashboard_id: Uuid,
        chart_id: Uuid,
    },
    Delete {
        id: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env();
    init_tracing();

    let cli = Cli::parse();

    let config = ClientConfig::from_env()?;
    let store = Arc::new(FileTokenStore::new(config.credentials_path.clone()));
    let (bus, mut notices) = init_notice_bus();
    let client = ApiClient::with_notice_bus(&config, store.clone(), bus)?;
    let session = SessionManager::new(client.clone());

    let outcome = run(cli.command, &client, &session, store.as_ref()).await;

    // surface the notices the client published while the command ran
    while let Ok(notice) = notices.try_recv() {
        eprintln!("{}", notice.message);
    }

    if let Err(err) = &outcome {
        if let Some(api_err) = err.downcast_ref::<ApiError>() {
            if api_err.is_session_expired() {
                eprintln!("Run `vantage login` to start a new session.");
            }
        }
    }

    outcome
}

async fn run(
    command: Commands,
    client: &ApiClient,
    session: &SessionManager,
    store: &dyn TokenStore,
) -> anyhow::Result<()> {
    match command {
        Commands::Login { username, password } => {
            let password = resolve_password(password)?;
            let user = session.login(&LoginRequest { username, password }).await?;
            println!("Logged in as {} ({})", user.display_name(), user.role);
        }
        Commands::Logout => {
            session.logout().await?;
            println!("Logged out");
        }
        Commands::Register {
            username,
            email,
            password,
            first_name,
            last_name,
            role,
        } => {
            let password = resolve_password(password)?;
            session
                .register(&RegisterRequest {
                    username: username.clone(),
                    email,
                    password,
                    first_name,
                    last_name,
                    role,
                })
                .await?;
            println!("Registered {username}. Log in to start a session.");
        }
        Commands::Whoami => match session.check_auth().await? {
            Some(user) => {
                print_json(&user)?;
                let grants: Vec<&str> = user.role.grants().iter().map(|p| p.as_str()).collect();
                println!("grants: {}", grants.join(", "));
            }
            None => println!("Not logged in."),
        },
        Commands::Status => {
            match store.access_token().await? {
                Some(token) => match vantage_client::jwt::peek_claims(&token) {
                    Ok(claims) => {
                        let state = if vantage_client::jwt::is_expired(&token) {
                            "expired"
                        } else {
                            "valid"
                        };
                        println!("access token: {state} (subject {}, expires at {})", claims.sub, claims.exp);
                    }
                    Err(_) => println!("access token: stored (opaque)"),
                },
                None => println!("access token: none"),
            }
            let refresh = store.refresh_token().await?;
            println!("refresh token: {}", if refresh.is_some() { "stored" } else { "none" });
        }
        Commands::Datasource { command } => run_datasource(command, client).await?,
        Commands::Dataset { command } => run_dataset(command, client).await?,
        Commands::Chart { command } => run_chart(command, client).await?,
        Commands::Dashboard { command } => run_dashboard(command, client).await?,
    }

    Ok(())
}

async fn run_datasource(command: DatasourceCommands, client: &ApiClient) -> anyhow::Result<()> {
    match command {
        DatasourceCommands::List { page, per_page } => {
            let page = PageQuery { page, per_page };
            print_json(&client.list_data_sources(page).await?)?;
        }
        DatasourceCommands::Get { id } => print_json(&client.get_data_source(id).await?)?,
        DatasourceCommands::Create {
            name,
            kind,
            description,
            params,
        } => {
            let connection_params = params
                .map(|raw| serde_json::from_str(&raw))
                .transpose()
                .context("--params must be valid JSON")?;
            let created = client
                .create_data_source(&DataSourceCreateRequest {
                    name,
                    description,
                    kind,
                    connection_params,
                })
                .await?;
            print_json(&created)?;
        }
        DatasourceCommands::Delete { id } => {
            client.delete_data_source(id).await?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}

async fn run_dataset(command: DatasetCommands, client: &ApiClient) -> anyhow::Result<()> {
    match command {
        DatasetCommands::List { page } => {
            print_json(&client.list_datasets(PageQuery { page, per_page: None }).await?)?;
        }
        DatasetCommands::Get { id } => print_json(&client.get_dataset(id).await?)?,
        DatasetCommands::Create {
            name,
            source_id,
            query,
            table,
        } => {
            let created = client
                .create_dataset(&DatasetCreateRequest {
                    name,
                    description: None,
                    source_id,
                    schema: None,
                    query,
                    table_name: table,
                    tags: None,
                })
                .await?;
            print_json(&created)?;
        }
        DatasetCommands::Preview { id, limit } => {
            let table = client.preview_dataset(id, limit).await?;
            print_table(&table)?;
        }
        DatasetCommands::Query { source_id, sql } => {
            let table = client.execute_query(&QueryRequest { source_id, query: sql }).await?;
            print_table(&table)?;
        }
        DatasetCommands::Delete { id } => {
            client.delete_dataset(id).await?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}

async fn run_chart(command: ChartCommands, client: &ApiClient) -> anyhow::Result<()> {
    match command {
        ChartCommands::List { page, dataset } => {
            let page = PageQuery { page, per_page: None };
            print_json(&client.list_charts(page, dataset).await?)?;
        }
        ChartCommands::Get { id } => print_json(&client.get_chart(id).await?)?,
        ChartCommands::Create {
            name,
            dataset_id,
            chart_type,
        } => {
            let created = client
                .create_chart(&ChartCreateRequest {
                    name,
                    description: None,
                    dataset_id,
                    chart_type,
                    configuration: None,
                    query_params: None,
                })
                .await?;
            print_json(&created)?;
        }
        ChartCommands::Data { id } => print_json(&client.chart_data(id).await?)?,
        ChartCommands::Delete { id } => {
            client.delete_chart(id).await?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}

async fn run_dashboard(command: DashboardCommands, client: &ApiClient) -> anyhow::Result<()> {
    match command {
        DashboardCommands::List { page } => {
            print_json(&client.list_dashboards(PageQuery { page, per_page: None }).await?)?;
        }
        DashboardCommands::Get { id } => print_json(&client.get_dashboard(id).await?)?,
        DashboardCommands::Create { name, description } => {
            let created = client
                .create_dashboard(&DashboardCreateRequest {
                    name,
                    description,
                    layout: None,
                    filters: None,
                    theme: None,
                    is_public: None,
                })
                .await?;
            print_json(&created)?;
        }
        DashboardCommands::Attach {
            dashboard_id,
            chart_id,
            x,
            y,
            width,
            height,
        } => {
            let placed = client
                .attach_chart(
                    dashboard_id,
                    &AttachChartRequest {
                        chart_id,
                        position: ChartPosition { x, y, width, height },
                    },
                )
                .await?;
            print_json(&placed)?;
        }
        DashboardCommands::Detach {
            dashboard_id,
            chart_id,
        } => {
            client.detach_chart(dashboard_id, chart_id).await?;
            println!("Removed chart {chart_id} from dashboard {dashboard_id}");
        }
        DashboardCommands::Delete { id } => {
            client.delete_dashboard(id).await?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}

fn resolve_password(flag: Option<String>) -> anyhow::Result<String> {
    flag.or_else(|| std::env::var("VANTAGE_PASSWORD").ok())
        .context("provide --password or set VANTAGE_PASSWORD")
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_table(table: &vantage_client::models::TableData) -> anyhow::Result<()> {
    println!("{}", table.columns.join(" | "));
    for row in &table.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| match cell {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        println!("{}", cells.join(" | "));
    }
    println!("({} rows)", table.row_count());
    Ok(())
}

fn load_env() {
    // Try to load env from CWD; fall back to the crate-local `.env` when the
    // binary runs from a different working directory.
    if dotenvy::dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
