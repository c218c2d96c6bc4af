//! Browse the proxy from a terminal.
//! Usage:
//!   movie_browser [--proxy URL] popular [page]
//!   movie_browser [--proxy URL] search <terms...>
//!   movie_browser [--proxy URL] movie <id>
//!   movie_browser [--proxy URL] clear
//! The proxy URL defaults to MOVIE_PROXY_URL, then http://localhost:5000.

use anyhow::{anyhow, bail, Context, Result};
use movie_proxy::browser::{
    format_runtime, poster_url, truncate_overview, MovieBrowser, ViewState,
};
use movie_proxy::models::{MovieDetail, MovieSummary};
use std::env;

const DEFAULT_PROXY_URL: &str = "http://localhost:5000";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut proxy = env::var("MOVIE_PROXY_URL").unwrap_or_else(|_| DEFAULT_PROXY_URL.to_string());
    if args.first().map(String::as_str) == Some("--proxy") {
        if args.len() < 2 {
            bail!("--proxy needs a URL");
        }
        proxy = args.remove(1);
        args.remove(0);
    }

    let browser = MovieBrowser::new(&proxy)?;
    let command = args.first().cloned().unwrap_or_else(|| "popular".to_string());

    match command.as_str() {
        "popular" => {
            let page = match args.get(1) {
                Some(p) => p.parse().context("page must be a positive number")?,
                None => 1,
            };
            render_status(&ViewState::<()>::Loading);
            render_list("Popular Movies", browser.popular(page).await);
        }
        // Clearing a search goes back to the first page of popular movies.
        "clear" => {
            render_status(&ViewState::<()>::Loading);
            render_list("Popular Movies", browser.popular(1).await);
        }
        "search" => {
            let term = args[1..].join(" ");
            render_status(&ViewState::<()>::Loading);
            match browser.search(&term, 1).await {
                Some(state) => render_list(&format!("Results for '{}'", term.trim()), state),
                None => println!("Enter a search term."),
            }
        }
        "movie" => {
            let id: i64 = args
                .get(1)
                .ok_or_else(|| anyhow!("movie needs an id"))?
                .parse()
                .context("movie id must be a number")?;
            render_status(&ViewState::<()>::Loading);
            render_detail(browser.movie(id).await);
        }
        other => bail!("unknown command '{}'", other),
    }
    Ok(())
}

fn render_status<T>(state: &ViewState<T>) {
    if matches!(state, ViewState::Loading) {
        eprintln!("Loading...");
    }
}

fn render_list(heading: &str, state: ViewState<Vec<MovieSummary>>) {
    println!("{heading}\n");
    match state {
        ViewState::Loading => println!("Loading..."),
        ViewState::Error(msg) => println!("Error: {msg}"),
        ViewState::Empty => println!("No movies found. Try a different search."),
        ViewState::Loaded(movies) => {
            for movie in movies {
                println!("[{}] {}", movie.id, movie.title);
                if !movie.overview.is_empty() {
                    println!("    {}", truncate_overview(&movie.overview));
                }
                if let Some(date) = movie.release_date {
                    println!("    Released: {}", date);
                }
                if let Some(vote) = movie.vote_average {
                    println!("    Rating: {vote}/10");
                }
                if let Some(path) = movie.poster_path.as_deref() {
                    println!("    Poster: {}", poster_url(path));
                }
                println!();
            }
        }
    }
}

fn render_detail(state: ViewState<MovieDetail>) {
    let movie = match state {
        ViewState::Loaded(movie) => movie,
        ViewState::Error(msg) => {
            println!("Error: {msg}");
            return;
        }
        ViewState::Loading | ViewState::Empty => {
            println!("No movie data available");
            return;
        }
    };

    let summary = &movie.summary;
    println!("{}\n", summary.title);
    if let Some(homepage) = movie.homepage.as_deref() {
        println!("Official website: {homepage}");
    }
    if !summary.overview.is_empty() {
        println!("{}\n", summary.overview);
    }
    if let Some(date) = summary.release_date {
        println!("Release Date: {}", date);
    }
    if let Some(vote) = summary.vote_average {
        println!("Rating: {vote}/10");
    }
    if let Some(runtime) = movie.runtime_minutes {
        println!("Runtime: {}", format_runtime(runtime));
    }
    if !movie.genres.is_empty() {
        let names: Vec<&str> = movie.genres.iter().map(|g| g.name.as_str()).collect();
        println!("Genres: {}", names.join(", "));
    }
    if let Some(path) = summary.poster_path.as_deref() {
        println!("Poster: {}", poster_url(path));
    }
}
