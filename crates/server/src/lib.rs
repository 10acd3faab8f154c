pub mod config;
pub mod error;
pub mod routes;
pub mod session;

use axum::Router;
use db::DBService;
use services::services::{
    auth::AuthService, geocode::GeocodeClient, suitability::SuitabilityService,
    weather_api::WeatherApiClient,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub auth: AuthService,
    pub weather: WeatherApiClient,
    pub geocode: GeocodeClient,
    pub suitability: SuitabilityService,
}

impl AppState {
    pub fn new(
        db: DBService,
        auth: AuthService,
        weather: WeatherApiClient,
        geocode: GeocodeClient,
    ) -> Self {
        let suitability = SuitabilityService::new(db.pool.clone(), weather.clone());
        Self {
            db,
            auth,
            weather,
            geocode,
            suitability,
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::router(&state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let db = DBService::new(&config.database_url).await?;
    let auth = AuthService::new(config.jwt_secret.clone());
    let weather = WeatherApiClient::new(config.weatherapi_key.clone())?;
    let geocode = GeocodeClient::new()?;
    let state = AppState::new(db, auth, weather, geocode);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app_router(state)).await?;
    Ok(())
}
