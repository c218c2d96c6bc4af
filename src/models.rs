use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Movie as returned by listings and search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetail {
    #[serde(flatten)]
    pub summary: MovieSummary,
    pub homepage: Option<String>,
    pub runtime_minutes: Option<u32>,
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// A movie record as TMDB sends it in list and search results.
#[derive(Debug, Deserialize)]
pub struct TmdbMovie {
    pub id: i64,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub poster_path: Option<String>,
    #[serde(default, deserialize_with = "tmdb_date")]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub popularity: Option<f64>,
}

/// `GET /movie/{id}` payload.
#[derive(Debug, Deserialize)]
pub struct TmdbMovieDetail {
    #[serde(flatten)]
    pub movie: TmdbMovie,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub homepage: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<Genre>,
}

/// Paged envelope TMDB uses for lists and search.
#[derive(Debug, Deserialize)]
pub struct TmdbPage {
    pub results: Vec<TmdbMovie>,
}

impl From<TmdbMovie> for MovieSummary {
    fn from(m: TmdbMovie) -> Self {
        Self {
            id: m.id,
            title: m.title,
            overview: m.overview,
            poster_path: m.poster_path,
            release_date: m.release_date,
            vote_average: m.vote_average,
            popularity: m.popularity,
        }
    }
}

impl From<TmdbMovieDetail> for MovieDetail {
    fn from(d: TmdbMovieDetail) -> Self {
        Self {
            summary: d.movie.into(),
            homepage: d.homepage,
            runtime_minutes: d.runtime,
            genres: d.genres,
        }
    }
}

// TMDB sends "" rather than null for some missing strings.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `YYYY-MM-DD`, with blank or null meaning no date. Anything else fails the
/// whole payload instead of silently dropping the date.
fn tmdb_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match blank_as_none(deserializer)? {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
