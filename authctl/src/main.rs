use std::io::Write;
use std::sync::Arc;

use auth_core::config::ClientConfig;
use auth_core::observability::{init_tracing, shutdown_tracing};
use authctl::cli::{execute, retry_hint, Cli, Command, CommandContext};
use authctl::{
    AuthApi, AuthorizationClient, CredentialStore, FileCredentialStore, GrpcAuthApi, Prompter,
    SessionManager, StdinPrompter,
};
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let config = match cli.config.as_deref() {
        Some(path) => ClientConfig::load_from(path),
        None => ClientConfig::load(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to read configuration: {}", e))?;

    init_tracing(
        "authctl",
        &config.log_level,
        config.json_logs,
        config.otlp_endpoint.as_deref(),
    );
    debug!(endpoint = %config.endpoint, credential_path = %config.credential_path.display(), "Configuration loaded");

    let store: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::new(config.credential_path.clone()));
    let api: Arc<dyn AuthApi> = Arc::new(GrpcAuthApi::from_config(&config, store.clone())?);
    let prompter: Arc<dyn Prompter> = Arc::new(StdinPrompter);

    let ctx = CommandContext {
        session: SessionManager::new(
            api.clone(),
            store,
            prompter,
            config.identity_provider_url.clone(),
        ),
        authz: AuthorizationClient::new(api),
    };

    let Command::Auth { command } = cli.command;
    let mut stdout = std::io::stdout().lock();
    let result = execute(command, &ctx, &mut stdout).await;
    stdout.flush()?;

    if let Err(err) = &result {
        if let Some(hint) = retry_hint(err) {
            eprintln!("hint: {}", hint);
        }
    }

    shutdown_tracing();
    result
}
