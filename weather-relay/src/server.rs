//! Inbound HTTP surface: `GET /weather`, the legacy `GET /weather/{place}`,
//! the same pair under `/api`, and a liveness probe.

use actix_web::{
    HttpRequest, HttpResponse, HttpServer, ResponseError,
    error::QueryPayloadError,
    http::{StatusCode, header},
    middleware::Logger,
    web,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info};

use weather_core::{
    Config, QueryParams, Relay, WeatherError, WeatherQuery, provider::provider_from_config,
};

/// Error envelope: `{ "status": 404, "error": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    pub error: String,
}

/// Adapter turning a [`WeatherError`] into an HTTP response.
#[derive(Debug)]
pub struct ApiError(WeatherError);

impl From<WeatherError> for ApiError {
    fn from(value: WeatherError) -> Self {
        Self(value)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code().as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        if let WeatherError::Unavailable { detail } = &self.0 {
            error!(%detail, "upstream unavailable");
        }
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorBody {
            status: status.as_u16(),
            error: self.0.user_message(),
        })
    }
}

async fn weather_by_query(
    relay: web::Data<Relay>,
    params: web::Query<QueryParams>,
) -> Result<HttpResponse, ApiError> {
    let query = WeatherQuery::from_params(&params)?;
    relay_query(&relay, &query).await
}

/// Legacy path form kept for older clients.
async fn weather_by_path(
    relay: web::Data<Relay>,
    place: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let params = QueryParams {
        place: Some(place.into_inner()),
        ..QueryParams::default()
    };
    let query = WeatherQuery::from_params(&params)?;
    relay_query(&relay, &query).await
}

async fn relay_query(relay: &Relay, query: &WeatherQuery) -> Result<HttpResponse, ApiError> {
    let result = relay.forward_uncancellable(query).await?;
    Ok(HttpResponse::Ok()
        .content_type(header::ContentType::json())
        .body(result.into_body()))
}

async fn live() -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::from(WeatherError::InvalidQuery(err.to_string())).into()
}

fn weather_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/weather", web::get().to(weather_by_query))
        .route("/weather/{place}", web::get().to(weather_by_path));
}

/// Register every route. The relay itself is supplied as app data.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(query_error))
        .route("/health/live", web::get().to(live))
        .configure(weather_routes)
        .service(web::scope("/api").configure(weather_routes));
}

/// Build the relay from config and serve until shutdown.
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let provider = provider_from_config(config)?;
    let relay = web::Data::new(Relay::new(provider));

    let bind_address = config.bind_address().to_string();
    let port = config.port();

    let server = HttpServer::new(move || {
        actix_web::App::new()
            .app_data(relay.clone())
            .wrap(Logger::default())
            .configure(routes)
    })
    .bind((bind_address.as_str(), port))
    .with_context(|| format!("Failed to bind {bind_address}:{port}"))?;

    info!(address = %bind_address, port, "weather relay listening");
    server.run().await.context("Weather relay server stopped with an error")
}
