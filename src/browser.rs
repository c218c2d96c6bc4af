//! Client for the proxy's movie endpoints, as used by the `movie_browser` binary.
//!
//! Every call resolves to a [`ViewState`]: an error message to show, an
//! explicit "no results" state, or the data. An empty result list is
//! `Empty`, never an error.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::envelope::Envelope;
use crate::models::{MovieDetail, MovieSummary};

pub const POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";
pub const OVERVIEW_PREVIEW_CHARS: usize = 150;

const CONNECT_FAILED: &str = "Failed to connect to the server";

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Error(String),
    Empty,
    Loaded(T),
}

#[derive(Debug, Clone)]
pub struct MovieBrowser {
    client: Client,
    base_url: String,
}

impl MovieBrowser {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn popular(&self, page: u32) -> ViewState<Vec<MovieSummary>> {
        let url = format!("{}/api/movies/popular?page={page}", self.base_url);
        list_state(self.get_envelope(&url).await, "Failed to fetch movies")
    }

    /// Returns `None` without calling the proxy when the term is blank.
    pub async fn search(&self, term: &str, page: u32) -> Option<ViewState<Vec<MovieSummary>>> {
        let term = term.trim();
        if term.is_empty() {
            return None;
        }
        let url = format!(
            "{}/api/movies/search?query={}&page={page}",
            self.base_url,
            urlencoding::encode(term)
        );
        Some(list_state(self.get_envelope(&url).await, "No movies found"))
    }

    pub async fn movie(&self, id: i64) -> ViewState<MovieDetail> {
        let url = format!("{}/api/movies/{id}", self.base_url);
        envelope_state(self.get_envelope(&url).await, "Movie not found")
    }

    async fn get_envelope<T: DeserializeOwned>(&self, url: &str) -> Option<Envelope<T>> {
        let res = match self.client.get(url).send().await {
            Ok(res) => res,
            Err(e) => {
                debug!("Request to {} failed: {}", url, e);
                return None;
            }
        };
        match res.json::<Envelope<T>>().await {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                debug!("Response from {} was not an envelope: {}", url, e);
                None
            }
        }
    }
}

/// Turns an envelope (or the lack of one) into what the view should show.
pub fn envelope_state<T>(envelope: Option<Envelope<T>>, fallback: &str) -> ViewState<T> {
    match envelope {
        None => ViewState::Error(CONNECT_FAILED.to_string()),
        Some(Envelope {
            success: true,
            data: Some(data),
            ..
        }) => ViewState::Loaded(data),
        Some(envelope) => ViewState::Error(envelope.error.unwrap_or_else(|| fallback.to_string())),
    }
}

pub fn list_state<T>(envelope: Option<Envelope<Vec<T>>>, fallback: &str) -> ViewState<Vec<T>> {
    match envelope_state(envelope, fallback) {
        ViewState::Loaded(items) if items.is_empty() => ViewState::Empty,
        other => other,
    }
}

/// Shortens an overview for list display; the full text stays in the data.
pub fn truncate_overview(overview: &str) -> String {
    if overview.chars().count() <= OVERVIEW_PREVIEW_CHARS {
        return overview.to_string();
    }
    let head: String = overview.chars().take(OVERVIEW_PREVIEW_CHARS).collect();
    format!("{head}...")
}

pub fn format_runtime(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

pub fn poster_url(poster_path: &str) -> String {
    format!("{POSTER_BASE}{poster_path}")
}
