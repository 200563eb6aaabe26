use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use fintrack_core::{FanoutSink, TracingSink};
use fintrack_server::network::TlsConfig;
use fintrack_server::service::middleware::MetricsSink;
use fintrack_server::{App, NetworkConfig, NetworkModule, ServerConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

/// Fintrack personal finance HTTP server.
#[derive(Parser, Debug)]
#[command(name = "fintrack-server", version, about)]
struct Cli {
    /// Bind address.
    #[arg(long, env = "FINTRACK_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Listen port. 0 picks a free port.
    #[arg(long, env = "FINTRACK_PORT", default_value_t = 8080)]
    port: u16,

    /// HMAC secret for session tokens. Empty means a per-process secret.
    #[arg(long, env = "FINTRACK_JWT_SECRET", default_value = "", hide_env_values = true)]
    jwt_secret: String,

    /// Session token lifetime in seconds.
    #[arg(long, env = "FINTRACK_TOKEN_TTL_SECS", default_value_t = 3_600)]
    token_ttl_secs: u64,

    /// Timeout for a single business operation, in milliseconds.
    #[arg(long, env = "FINTRACK_OPERATION_TIMEOUT_MS", default_value_t = 30_000)]
    operation_timeout_ms: u64,

    /// Minimum accepted password length, in characters.
    #[arg(long, env = "FINTRACK_MIN_PASSWORD_LEN", default_value_t = 8)]
    min_password_len: usize,

    /// Argon2 memory cost in KiB.
    #[arg(long, env = "FINTRACK_PASSWORD_MEMORY_KIB", default_value_t = 19_456)]
    password_memory_kib: u32,

    /// Argon2 iteration count.
    #[arg(long, env = "FINTRACK_PASSWORD_ITERATIONS", default_value_t = 2)]
    password_iterations: u32,

    /// Timeout for a whole HTTP request, in seconds.
    #[arg(long, env = "FINTRACK_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,

    /// Allowed CORS origins, comma separated. `*` allows any origin.
    #[arg(long, env = "FINTRACK_CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    cors_origins: Vec<String>,

    /// PEM certificate chain; enables TLS together with `--tls-key`.
    #[arg(long, env = "FINTRACK_TLS_CERT", requires = "tls_key")]
    tls_cert: Option<PathBuf>,

    /// PEM private key for TLS.
    #[arg(long, env = "FINTRACK_TLS_KEY", requires = "tls_cert")]
    tls_key: Option<PathBuf>,

    /// Serve Prometheus metrics on this port.
    #[arg(long, env = "FINTRACK_METRICS_PORT")]
    metrics_port: Option<u16>,

    /// Log output format.
    #[arg(long, env = "FINTRACK_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

impl Cli {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            default_operation_timeout_ms: self.operation_timeout_ms,
            jwt_secret: self.jwt_secret.clone(),
            token_ttl_secs: self.token_ttl_secs,
            min_password_len: self.min_password_len,
            password_memory_kib: self.password_memory_kib,
            password_iterations: self.password_iterations,
        }
    }

    fn network_config(&self) -> NetworkConfig {
        let tls = match (&self.tls_cert, &self.tls_key) {
            (Some(cert_path), Some(key_path)) => Some(TlsConfig {
                cert_path: cert_path.clone(),
                key_path: key_path.clone(),
            }),
            _ => None,
        };
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            tls,
            cors_origins: self.cors_origins.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..NetworkConfig::default()
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    if let Some(port) = cli.metrics_port {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .map_err(|e| anyhow::anyhow!("failed to install Prometheus exporter: {e}"))?;
        info!(%addr, "Prometheus metrics listener started");
    }

    let sink = FanoutSink::new()
        .with(Arc::new(TracingSink))
        .with(Arc::new(MetricsSink));
    let app = App::in_memory(cli.server_config(), Arc::new(sink))?;

    let mut network = NetworkModule::new(cli.network_config(), &app);
    let port = network.start().await?;
    info!(port, "fintrack-server started");

    network.serve(shutdown_signal()).await?;
    info!("fintrack-server stopped");
    Ok(())
}
