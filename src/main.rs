use anyhow::Result;
use followiz_bridge::{bootstrap, config};

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing();
    bootstrap::init_env();

    let config = config::load()?;
    let bind_address = config.server.bind_address();

    tracing::info!("Preparing database at {}...", config.database.path);
    let app = bootstrap::build_app(config).await?;

    bootstrap::serve("Followiz tracker", &bind_address, app).await?;
    Ok(())
}
