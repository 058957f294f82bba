//! API Gateway Publisher CLI
//!
//! Command-line interface for rendering a service's Swagger document for AWS
//! API Gateway and publishing it as a new deployment.

use anyhow::{anyhow, Context, Result};
use apigw_publisher_common::{
    AuthMode, RenderConfig, DEFAULT_AUTHORIZER_CONTEXT_HEADER, DEFAULT_AUTHORIZER_CONTEXT_KEY,
    DEFAULT_CONNECTION_TYPE,
};
use apigw_publisher_gateway::{publish, AwsApiGateway, AwsSettings, ImportMode};
use apigw_publisher_parser::{Swagger, SwaggerFetcher, SwaggerParser, DEFAULT_FETCH_TIMEOUT};
use apigw_publisher_renderer::{render_document, to_json, RenderSummary};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "apigw-publisher")]
#[command(version, about = "Render Swagger 2.0 documents for AWS API Gateway and publish them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format
    #[arg(long, global = true, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a Swagger document without publishing it
    #[command(after_help = "EXAMPLES:\n  \
        # Render a local document to stdout\n  \
        apigw-publisher render --file swagger.json --gateway-name api-gw-dev\n\n  \
        # Render the live document with CORS and an API key authorizer\n  \
        apigw-publisher render \\\n    \
        --url http://internal-api.dev.example.com/account-service/v2/api-docs \\\n    \
        --gateway-name api-gw-dev \\\n    \
        --auth-type apiKey --auth-name wave-api-gw-dev --auth-url arn:aws:... \\\n    \
        --cors-enabled \\\n    \
        --output rendered.json")]
    Render {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        render: RenderArgs,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch, render, import and deploy
    #[command(after_help = "EXAMPLES:\n  \
        # Everything from the environment (a .env file is honoured)\n  \
        apigw-publisher publish\n\n  \
        # Explicit target\n  \
        apigw-publisher publish \\\n    \
        --url http://internal-api.dev.example.com/account-service/v2/api-docs \\\n    \
        --gateway-name api-gw-dev \\\n    \
        --rest-api-id a1b2c3d4 \\\n    \
        --stage dev")]
    Publish {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        render: RenderArgs,

        #[command(flatten)]
        target: TargetArgs,
    },
}

/// Where the vanilla document comes from
#[derive(Args)]
struct SourceArgs {
    /// URL the service serves its Swagger document on
    #[arg(long, env = "SWAGGER_URL")]
    url: Option<String>,

    /// Local Swagger document (JSON or YAML), takes precedence over --url
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Fetch timeout in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = DEFAULT_FETCH_TIMEOUT.as_secs())]
    fetch_timeout: u64,
}

#[derive(Args)]
struct RenderArgs {
    /// API Gateway display name, forced onto the document title
    #[arg(long, env = "API_GATEWAY_NAME")]
    gateway_name: String,

    /// Backend base URL (defaults to the document's host + basePath)
    #[arg(long, env = "ENDPOINT_URL")]
    endpoint_url: Option<String>,

    /// Authorizer mode: none, apiKey or oauth2
    #[arg(long, env = "AUTH_TYPE", default_value = "none")]
    auth_type: AuthMode,

    /// Security scheme name of the custom authorizer
    #[arg(long, env = "AUTH_NAME", default_value = "")]
    auth_name: String,

    /// Invocation URI of the custom authorizer
    #[arg(long, env = "AUTH_URL", default_value = "")]
    auth_url: String,

    /// Backend header filled from the authorizer context (empty to disable)
    #[arg(long, env = "AUTH_CONTEXT_HEADER", default_value = DEFAULT_AUTHORIZER_CONTEXT_HEADER)]
    auth_context_header: String,

    /// Authorizer context value forwarded in that header
    #[arg(long, env = "AUTH_CONTEXT_KEY", default_value = DEFAULT_AUTHORIZER_CONTEXT_KEY)]
    auth_context_key: String,

    /// Add a CORS preflight operation to every path
    #[arg(long, env = "CORS_ENABLED")]
    cors_enabled: bool,

    /// Comma-separated headers forwarded to the backend
    #[arg(long, env = "CUSTOM_HEADERS")]
    custom_headers: Option<String>,

    /// VPC link id for private integrations
    #[arg(long, env = "VPC_LINK_ID")]
    vpc_link_id: Option<String>,

    /// Integration connection type
    #[arg(long, env = "CONNECTION_TYPE", default_value = DEFAULT_CONNECTION_TYPE)]
    connection_type: String,
}

/// Which API and stage to publish to
#[derive(Args)]
struct TargetArgs {
    /// REST API id to import into
    #[arg(long, env = "API_GATEWAY_ID")]
    rest_api_id: String,

    /// Stage to deploy
    #[arg(long, env = "STAGE_NAME")]
    stage: String,

    /// AWS region (default chain, then eu-west-1)
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    /// Role ARN to assume before calling API Gateway
    #[arg(long, env = "ASSUME_ROLE")]
    assume_role: Option<String>,

    /// Import mode: merge or overwrite
    #[arg(long, env = "IMPORT_MODE", default_value = "merge")]
    import_mode: ImportMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human readable lines
    Text,
    /// One JSON object per event
    Json,
}

/// Pipeline stage, named in failure logs
#[derive(Debug, Clone, Copy)]
enum Stage {
    Config,
    Fetch,
    Render,
    Publish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Config => write!(f, "config"),
            Stage::Fetch => write!(f, "fetch"),
            Stage::Render => write!(f, "render"),
            Stage::Publish => write!(f, "publish"),
        }
    }
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.verbose);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{} Failed to start async runtime: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli)) {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(format: LogFormat, verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Render {
            source,
            render,
            output,
        } => render_command(&source, &render, output.as_deref(), cli.verbose).await,
        Commands::Publish {
            source,
            render,
            target,
        } => publish_command(&source, &render, &target, cli.verbose).await,
    }
}

async fn render_command(
    source: &SourceArgs,
    render: &RenderArgs,
    output: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let config = at_stage(Stage::Config, render.to_config())?;
    let mut doc = at_stage(Stage::Fetch, load_document(source).await)?;

    let summary = render_document(&mut doc, &config);
    let body = at_stage(
        Stage::Render,
        to_json(&doc).context("Failed to serialize rendered document"),
    )?;
    print_summary(&summary, verbose);

    match output {
        Some(path) => {
            std::fs::write(path, &body)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("\n{} Wrote {}", "✓".green(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&body).context("Failed to write to stdout")?;
            stdout.write_all(b"\n").context("Failed to write to stdout")?;
        }
    }

    Ok(())
}

async fn publish_command(
    source: &SourceArgs,
    render: &RenderArgs,
    target: &TargetArgs,
    verbose: bool,
) -> Result<()> {
    let config = at_stage(Stage::Config, render.to_config())?;
    if verbose {
        eprintln!("  REST API: {}", target.rest_api_id);
        eprintln!("  Stage: {}", target.stage);
        eprintln!("  Import mode: {}", target.import_mode);
    }

    let mut doc = at_stage(Stage::Fetch, load_document(source).await)?;

    eprintln!("{} Rendering for API Gateway...", "→".cyan());
    let summary = render_document(&mut doc, &config);
    let body = at_stage(
        Stage::Render,
        to_json(&doc).context("Failed to serialize rendered document"),
    )?;
    print_summary(&summary, verbose);

    eprintln!(
        "{} Publishing to {} ({})...",
        "→".cyan(),
        target.rest_api_id.yellow(),
        target.stage.yellow()
    );
    let gateway = AwsApiGateway::connect(&AwsSettings {
        region: target.region.clone(),
        assume_role: target.assume_role.clone(),
        import_mode: target.import_mode,
    })
    .await;
    let (imported, deployed) = at_stage(
        Stage::Publish,
        publish(&gateway, &body, &target.rest_api_id, &target.stage).await,
    )?;

    eprintln!("\n{}", "✓ Publish complete!".green().bold());
    println!("  REST API: {}", imported.rest_api_id);
    if let Some(name) = &imported.name {
        println!("  Name: {}", name);
    }
    println!("  Stage: {}", deployed.stage);
    println!(
        "  Deployment: {}",
        deployed.deployment_id.as_deref().unwrap_or("unknown")
    );

    Ok(())
}

impl RenderArgs {
    fn to_config(&self) -> Result<RenderConfig> {
        let mut config = RenderConfig::new(self.gateway_name.trim())
            .with_auth(self.auth_type, self.auth_name.trim(), self.auth_url.trim())
            .with_authorizer_context(self.auth_context_header.trim(), self.auth_context_key.trim())
            .with_cors(self.cors_enabled)
            .with_connection_type(self.connection_type.as_str())
            .with_custom_headers(
                self.custom_headers
                    .as_deref()
                    .map(RenderConfig::parse_header_list)
                    .unwrap_or_default(),
            );
        if let Some(url) = non_blank(self.endpoint_url.as_deref()) {
            config = config.with_endpoint_url(url);
        }
        if let Some(id) = non_blank(self.vpc_link_id.as_deref()) {
            config = config.with_vpc_link(id);
        }

        config.validate().context("Invalid render configuration")?;
        Ok(config)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

async fn load_document(source: &SourceArgs) -> Result<Swagger> {
    if let Some(path) = &source.file {
        eprintln!("{} Loading swagger file: {}", "→".cyan(), path.display());
        let parser = SwaggerParser::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        return Ok(parser.into_spec());
    }

    let url = non_blank(source.url.as_deref())
        .ok_or_else(|| anyhow!("Either --file or --url (SWAGGER_URL) is required"))?;
    eprintln!("{} Fetching swagger from: {}", "→".cyan(), url);
    let fetcher = SwaggerFetcher::new(Duration::from_secs(source.fetch_timeout))
        .context("Failed to build HTTP client")?;
    fetcher
        .fetch(url)
        .await
        .with_context(|| format!("Failed to fetch swagger from {}", url))
}

/// Attach the stage to a failure and log it
fn at_stage<T, E>(stage: Stage, result: std::result::Result<T, E>) -> Result<T>
where
    E: Into<anyhow::Error>,
{
    result.map_err(|e| {
        let err = e.into().context(format!("{} stage failed", stage));
        error!(stage = %stage, error = %format!("{:#}", err), "Aborting");
        err
    })
}

fn print_summary(summary: &RenderSummary, verbose: bool) {
    eprintln!(
        "{} Published {} paths, skipped {}",
        "✓".green(),
        summary.published_paths.len(),
        summary.skipped_paths.len()
    );
    eprintln!(
        "{} Integrated {} operations",
        "✓".green(),
        summary.integrated_operations
    );
    if !summary.unsecured_operations.is_empty() {
        eprintln!(
            "{} {} operations without authorization",
            "!".yellow().bold(),
            summary.unsecured_operations.len()
        );
    }

    if verbose {
        for path in &summary.skipped_paths {
            eprintln!("  • skipped {}", path.yellow());
        }
        for operation in &summary.unsecured_operations {
            eprintln!("  • unsecured {}", operation.yellow());
        }
        for name in &summary.removed_definitions {
            eprintln!("  • removed model {}", name.cyan());
        }
        for (from, to) in &summary.renamed_definitions {
            eprintln!("  • renamed model {} → {}", from.cyan(), to.cyan());
        }
        if summary.cors_paths > 0 {
            eprintln!("  • CORS preflight on {} paths", summary.cors_paths);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_render_args_build_config() {
        let cli = Cli::try_parse_from([
            "apigw-publisher",
            "render",
            "--file",
            "swagger.json",
            "--gateway-name",
            "api-gw-dev",
            "--auth-type",
            "apiKey",
            "--auth-name",
            "wave-api-gw-dev",
            "--auth-url",
            "arn:aws:lambda:auth",
            "--custom-headers",
            "organisation-id, X-JWT-Assertion, Organisation-Id",
            "--auth-context-header",
            "X-Principal",
            "--connection-type",
            "vpc_link",
            "--vpc-link-id",
            "vl-1",
            "--cors-enabled",
        ])
        .unwrap();

        let Commands::Render { render, source, .. } = cli.command else {
            panic!("expected render command");
        };
        assert_eq!(source.file, Some(PathBuf::from("swagger.json")));

        let config = render.to_config().unwrap();
        assert_eq!(config.gateway_name, "api-gw-dev");
        assert_eq!(config.auth_mode, AuthMode::ApiKey);
        assert!(config.cors_enabled);
        assert_eq!(config.custom_headers, vec!["organisation-id", "X-JWT-Assertion"]);
        assert_eq!(
            config.authorizer_context(),
            Some(("X-Principal", "context.authorizer.stringKey"))
        );
        assert_eq!(config.vpc_link_id.as_deref(), Some("vl-1"));
        assert_eq!(config.normalized_connection_type(), "VPC_LINK");
    }

    #[test]
    fn test_missing_authorizer_is_rejected() {
        let cli = Cli::try_parse_from([
            "apigw-publisher",
            "render",
            "--gateway-name",
            "api-gw-dev",
            "--auth-type",
            "oauth2",
            "--auth-name",
            "jwt",
        ])
        .unwrap();

        let Commands::Render { render, .. } = cli.command else {
            panic!("expected render command");
        };
        let err = render.to_config().unwrap_err();
        assert!(format!("{:#}", err).contains("AUTH_URL"));
    }
}
