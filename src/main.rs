use algo_tutor::config::GatewayConfig;
use algo_tutor::gateway::{build_app, llm::LlmClient, AppState};
use dotenv::dotenv;

type MainResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> MainResult {
    // A missing .env is fine, the variables may come from the environment.
    let dotenv_loaded = dotenv().is_ok();

    pretty_env_logger::init();
    log::info!("Starting quiz AI helper...");
    if !dotenv_loaded {
        log::debug!("No .env file found");
    }

    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return Err(e.into());
        }
    };

    let llm = LlmClient::from_config(&config)?;
    let app = build_app(AppState::new(llm));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    log::info!(
        "Listening on {} (model {}, upstream {})",
        listener.local_addr()?,
        config.model,
        config.upstream_url
    );

    axum::serve(listener, app).await?;
    Ok(())
}
