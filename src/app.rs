use crate::config::Config;
use crate::envelope::Envelope;
use crate::error::{ApiError, UNEXPECTED_ERROR};
use crate::models::{MovieDetail, MovieSummary};
use crate::tmdb::{MovieList, TmdbApi, TmdbClient, TmdbError};
use anyhow::{Context, Result};
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::{any::Any, sync::Arc};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info};

/// Listings never return more than this many movies.
pub const LIST_LIMIT: usize = 20;
/// TMDB only serves pages 1 through 500.
pub const MAX_PAGE: u32 = 500;

const INVALID_PAGE: &str = "Page must be between 1 and 500";
const INVALID_ID: &str = "Invalid movie id";
const QUERY_REQUIRED: &str = "Search query is required";
const MOVIE_NOT_FOUND: &str = "Movie not found";
const ENDPOINT_NOT_FOUND: &str = "Endpoint not found";
const INVALID_PARAMS: &str = "Invalid query parameters";

#[derive(Clone)]
pub struct AppState {
    pub tmdb: Arc<dyn TmdbApi>,
}

impl AppState {
    pub fn new(tmdb: Arc<dyn TmdbApi>) -> Self {
        Self { tmdb }
    }
}

// `page` stays a string so a bad value is reported as a page error, not a rejection.
#[derive(Debug, Deserialize)]
struct PageParams {
    page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: Option<String>,
    page: Option<String>,
}

type ApiResult<T> = std::result::Result<Json<Envelope<T>>, ApiError>;

pub async fn run_server(config: Config) -> Result<()> {
    let tmdb: Arc<dyn TmdbApi> = Arc::new(TmdbClient::new(&config)?);
    info!(
        "Proxying TMDB at {} (timeout {:?})",
        config.tmdb_base_url, config.upstream_timeout
    );

    let app = build_router(AppState::new(tmdb));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/movies/popular",
            get(popular_movies).fallback(method_not_allowed),
        )
        .route(
            "/api/movies/top-rated",
            get(top_rated_movies).fallback(method_not_allowed),
        )
        .route(
            "/api/movies/now-playing",
            get(now_playing_movies).fallback(method_not_allowed),
        )
        .route(
            "/api/movies/search",
            get(search_movies).fallback(method_not_allowed),
        )
        .route(
            "/api/movies/:id",
            get(movie_detail).fallback(method_not_allowed),
        )
        .route("/health", get(health).fallback(method_not_allowed))
        .fallback(endpoint_not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn popular_movies(
    State(state): State<AppState>,
    params: std::result::Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Vec<MovieSummary>> {
    list_movies(&state, MovieList::Popular, params).await
}

async fn top_rated_movies(
    State(state): State<AppState>,
    params: std::result::Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Vec<MovieSummary>> {
    list_movies(&state, MovieList::TopRated, params).await
}

async fn now_playing_movies(
    State(state): State<AppState>,
    params: std::result::Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Vec<MovieSummary>> {
    list_movies(&state, MovieList::NowPlaying, params).await
}

async fn list_movies(
    state: &AppState,
    list: MovieList,
    params: std::result::Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Vec<MovieSummary>> {
    let Query(params) = params.map_err(|_| ApiError::Validation(INVALID_PARAMS.to_string()))?;
    let page = validate_page(params.page.as_deref())?;

    let mut movies = state
        .tmdb
        .list_movies(list, page)
        .await
        .map_err(|e| upstream_failure(&format!("{list} movies"), e))?;
    movies.truncate(LIST_LIMIT);

    debug!(list = %list, page, count = movies.len(), "Served movie list");
    Ok(Json(Envelope::ok(movies).with_page(page)))
}

async fn search_movies(
    State(state): State<AppState>,
    params: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Vec<MovieSummary>> {
    let Query(params) = params.map_err(|_| ApiError::Validation(INVALID_PARAMS.to_string()))?;
    let query = params
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::Validation(QUERY_REQUIRED.to_string()))?;
    let page = validate_page(params.page.as_deref())?;

    let movies = state
        .tmdb
        .search_movies(&query, page)
        .await
        .map_err(|e| upstream_failure("movie search", e))?;

    debug!(query = %query, page, count = movies.len(), "Served search");
    Ok(Json(Envelope::ok(movies).with_query(query).with_page(page)))
}

async fn movie_detail(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> ApiResult<MovieDetail> {
    let id = match id {
        Ok(Path(id)) if id > 0 => id,
        _ => return Err(ApiError::Validation(INVALID_ID.to_string())),
    };

    match state.tmdb.fetch_movie(id).await {
        Ok(movie) => Ok(Json(Envelope::ok(movie))),
        Err(TmdbError::NotFound) => {
            info!(movie_id = id, "TMDB has no such movie");
            Err(ApiError::NotFound(MOVIE_NOT_FOUND.to_string()))
        }
        Err(e) => Err(upstream_failure(&format!("movie {id}"), e)),
    }
}

async fn endpoint_not_found() -> ApiError {
    ApiError::NotFound(ENDPOINT_NOT_FOUND.to_string())
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Missing or blank means page 1.
fn validate_page(page: Option<&str>) -> std::result::Result<u32, ApiError> {
    let page = match page.map(str::trim).filter(|p| !p.is_empty()) {
        Some(raw) => raw.parse::<u32>().ok(),
        None => Some(1),
    };
    match page {
        Some(p @ 1..=MAX_PAGE) => Ok(p),
        _ => Err(ApiError::Validation(INVALID_PAGE.to_string())),
    }
}

fn upstream_failure(what: &str, err: TmdbError) -> ApiError {
    if err.is_timeout() {
        error!("TMDB timed out fetching {}", what);
    } else {
        error!("TMDB failed fetching {}: {}", what, err);
    }
    ApiError::from(err)
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {}", detail);
    ApiError::Internal(UNEXPECTED_ERROR.to_string()).into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
