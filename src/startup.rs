use crate::commands::Shell;
use crate::components::{AuthGate, ComponentManager};
use crate::config::Config;
use crate::context::AppContext;
use crate::error::Error;
use crate::firebase;
use crate::navigation::{self, RouteStack};
use crate::shutdown;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration.
///
/// Logs go to stderr so they do not interleave with the rendered screens.
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Config(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Initialize the client and run the terminal shell until it exits
pub async fn start_app(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    let (options, session_file) = {
        let config_read = config.read().await;

        rust_i18n::set_locale(&config_read.locale);
        info!("Setting locale to {}", config_read.locale);

        (config_read.firebase.clone(), config_read.session_file.clone())
    };

    // Idempotent; a second call hands back the same app
    let app = firebase::initialize_app(options)?;
    let auth = app.auth();
    auth.set_persistence(session_file).await;

    let navigator = navigation::shared(RouteStack::new());
    let ctx = AppContext::from_app(Arc::clone(&config), &app, navigator);

    // Register components
    let mut component_manager = ComponentManager::new();
    component_manager.register(AuthGate::new());
    let component_manager = Arc::new(component_manager);

    component_manager.init_all(&ctx).await?;

    // Resolves the initial auth state, which lets the gate place the first screen
    if let Err(e) = auth.restore_session().await {
        warn!("Failed to restore session: {:?}", e);
    }

    // Create shutdown channel
    let (shutdown_send, shutdown_recv) = oneshot::channel();

    // Spawn signal handler task
    let shutdown_components = Arc::clone(&component_manager);
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, shutdown_components).await;
    });

    info!("Starting shell...");
    let result = Shell::new(ctx, tokio::io::stdin()).run(shutdown_recv).await;

    component_manager.shutdown_all().await?;
    result.map_err(Into::into)
}
