//! Call TMDB through the proxy's own client and print the mapped JSON.
//! Usage:
//!   cargo run --bin tmdb_probe -- popular|top-rated|now-playing [page]
//!   cargo run --bin tmdb_probe -- search <query> [page]
//!   cargo run --bin tmdb_probe -- movie <tmdb_id>
//! Requires TMDB_BASE_URL and TMDB_API_KEY in the environment (.env supported).

use anyhow::{anyhow, bail, Context, Result};
use dotenvy::dotenv;
use movie_proxy::config::Config;
use movie_proxy::tmdb::{MovieList, TmdbApi, TmdbClient};
use serde_json::Value;
use std::env;

fn parse_page(arg: Option<&String>) -> Result<u32> {
    match arg {
        Some(p) => p.parse().context("page must be a positive number"),
        None => Ok(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().skip(1).collect();
    let kind = args
        .first()
        .ok_or_else(|| anyhow!("usage: tmdb_probe <popular|top-rated|now-playing|search|movie> ..."))?;

    let config = Config::from_env()?;
    let client = TmdbClient::new(&config)?;

    let output: Value = match kind.as_str() {
        "popular" | "top-rated" | "now-playing" => {
            let list = match kind.as_str() {
                "popular" => MovieList::Popular,
                "top-rated" => MovieList::TopRated,
                _ => MovieList::NowPlaying,
            };
            let page = parse_page(args.get(1))?;
            let movies = client.list_movies(list, page).await?;
            eprintln!("{} {} movies on page {}", movies.len(), list, page);
            serde_json::to_value(movies)?
        }
        "search" => {
            let query = args.get(1).ok_or_else(|| anyhow!("search needs a query"))?;
            let page = parse_page(args.get(2))?;
            serde_json::to_value(client.search_movies(query, page).await?)?
        }
        "movie" => {
            let id: i64 = args
                .get(1)
                .ok_or_else(|| anyhow!("movie needs a TMDB id"))?
                .parse()
                .context("TMDB id must be a number")?;
            serde_json::to_value(client.fetch_movie(id).await?)?
        }
        other => bail!("unknown kind '{}'", other),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
