use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;

use crate::config::Config;
use crate::models::{MovieDetail, MovieSummary, TmdbMovieDetail, TmdbPage};

const MAX_ERROR_BODY_CHARS: usize = 200;

/// Failure talking to TMDB. `NotFound` is kept apart so callers can tell
/// "no such movie" from "TMDB is broken".
#[derive(Debug, thiserror::Error)]
pub enum TmdbError {
    #[error("TMDB resource not found")]
    NotFound,
    #[error("TMDB responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("TMDB request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("TMDB response could not be parsed: {0}")]
    Decode(#[source] serde_json::Error),
}

impl TmdbError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TmdbError::Transport(e) if e.is_timeout())
    }
}

impl From<reqwest::Error> for TmdbError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest includes the request URL in its message, and ours carries the API key.
        TmdbError::Transport(err.without_url())
    }
}

/// Which TMDB movie list to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieList {
    Popular,
    TopRated,
    NowPlaying,
}

impl MovieList {
    fn path(self) -> &'static str {
        match self {
            MovieList::Popular => "movie/popular",
            MovieList::TopRated => "movie/top_rated",
            MovieList::NowPlaying => "movie/now_playing",
        }
    }
}

impl fmt::Display for MovieList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MovieList::Popular => "popular",
            MovieList::TopRated => "top-rated",
            MovieList::NowPlaying => "now-playing",
        };
        f.write_str(name)
    }
}

#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn list_movies(&self, list: MovieList, page: u32) -> Result<Vec<MovieSummary>, TmdbError>;
    async fn search_movies(&self, query: &str, page: u32) -> Result<Vec<MovieSummary>, TmdbError>;
    async fn fetch_movie(&self, id: i64) -> Result<MovieDetail, TmdbError>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let user_agent = format!("movie-proxy/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .timeout(config.upstream_timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            base_url: config.tmdb_base_url.trim_end_matches('/').to_string(),
            api_key: config.tmdb_api_key.clone(),
        })
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> String {
        let mut url = format!(
            "{}/{}?api_key={}",
            self.base_url,
            path,
            urlencoding::encode(&self.api_key)
        );
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, TmdbError> {
        let res = self.client.get(url).send().await?;
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TmdbError::NotFound);
        }
        let text = res.text().await?;
        if !status.is_success() {
            return Err(TmdbError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }
        serde_json::from_str(&text).map_err(TmdbError::Decode)
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn list_movies(&self, list: MovieList, page: u32) -> Result<Vec<MovieSummary>, TmdbError> {
        let url = self.url(list.path(), &[("page", page.to_string())]);
        let data: TmdbPage = self.get_json(&url).await?;
        Ok(data.results.into_iter().map(MovieSummary::from).collect())
    }

    async fn search_movies(&self, query: &str, page: u32) -> Result<Vec<MovieSummary>, TmdbError> {
        let url = self.url(
            "search/movie",
            &[("query", query.to_string()), ("page", page.to_string())],
        );
        let data: TmdbPage = self.get_json(&url).await?;
        Ok(data.results.into_iter().map(MovieSummary::from).collect())
    }

    async fn fetch_movie(&self, id: i64) -> Result<MovieDetail, TmdbError> {
        let url = self.url(&format!("movie/{id}"), &[]);
        let data: TmdbMovieDetail = self.get_json(&url).await?;
        Ok(data.into())
    }
}

/// Picks TMDB's `status_message` out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        status_message: Option<String>,
    }

    if let Ok(ErrorBody {
        status_message: Some(msg),
    }) = serde_json::from_str::<ErrorBody>(body)
    {
        return msg;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client(base: &str) -> TmdbClient {
        TmdbClient::new(&Config {
            tmdb_base_url: base.to_string(),
            tmdb_api_key: "k&y".to_string(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            upstream_timeout: Duration::from_secs(1),
        })
        .expect("client")
    }

    #[test]
    fn joins_base_url_with_or_without_trailing_slash() {
        let a = client("https://api.themoviedb.org/3/");
        let b = client("https://api.themoviedb.org/3");
        assert_eq!(
            a.url("movie/popular", &[]),
            "https://api.themoviedb.org/3/movie/popular?api_key=k%26y"
        );
        assert_eq!(a.url("movie/popular", &[]), b.url("movie/popular", &[]));
    }

    #[test]
    fn encodes_query_parameters() {
        let c = client("https://api.themoviedb.org/3/");
        let url = c.url(
            "search/movie",
            &[("query", "fast & furious".to_string()), ("page", "2".to_string())],
        );
        assert!(url.ends_with("&query=fast%20%26%20furious&page=2"), "{url}");
    }

    #[test]
    fn error_message_prefers_status_message() {
        let body = r#"{"status_code":7,"status_message":"Invalid API key: You must be granted a valid key.","success":false}"#;
        assert_eq!(
            error_message(body),
            "Invalid API key: You must be granted a valid key."
        );
        assert_eq!(error_message("  "), "empty response body");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn list_paths_match_tmdb_endpoints() {
        assert_eq!(MovieList::Popular.path(), "movie/popular");
        assert_eq!(MovieList::TopRated.path(), "movie/top_rated");
        assert_eq!(MovieList::NowPlaying.path(), "movie/now_playing");
        assert_eq!(MovieList::TopRated.to_string(), "top-rated");
    }
}
