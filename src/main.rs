/// Gym Desk server binary
use anyhow::Context;
use gym_desk::{config::LoggingConfig, jobs::JobScheduler, server, AppContext, GymConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (reads .env first)
    let config = GymConfig::from_env().context("failed to load configuration")?;

    init_tracing(&config.logging);

    print_banner(&config.branding.gym_name);

    let ctx = AppContext::new(config)
        .await
        .context("failed to initialize application context")?;
    let ctx = Arc::new(ctx);

    // Start background jobs
    let scheduler = Arc::new(JobScheduler::new(Arc::clone(&ctx)));
    scheduler.start();

    server::serve((*ctx).clone()).await.context("server error")?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level)
        .unwrap_or_else(|_| EnvFilter::new("gym_desk=debug,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn print_banner(gym_name: &str) {
    println!(
        r#"
   ______                   ____            __
  / ____/_  ______ ___     / __ \___  _____/ /__
 / / __/ / / / __ `__ \   / / / / _ \/ ___/ //_/
/ /_/ / /_/ / / / / / /  / /_/ /  __(__  ) ,<
\____/\__, /_/ /_/ /_/  /_____/\___/____/_/|_|
     /____/

        {} admin backend v{}
        "#,
        gym_name,
        env!("CARGO_PKG_VERSION")
    );
}
