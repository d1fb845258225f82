use std::io::{self, BufRead, Write};
use std::str::FromStr;
use std::sync::Arc;

use needledrop::config::Config;
use needledrop::models::{FormatChoice, QuizAnswers};
use needledrop::services::recommend;
use needledrop::services::{
    AuthFlowController, CollectionFetcher, MemoryTokenStore, ReleaseDetailFetcher,
    ReqwestTransport,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How many top-ranked candidates get the extended-metadata fetch.
const DETAIL_CANDIDATES: usize = 5;

const USER_ID: &str = "local";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,needledrop=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let transport = Arc::new(ReqwestTransport::new(config.user_agent.clone()));
    let store = Arc::new(MemoryTokenStore::new());
    let auth = AuthFlowController::new(&config, transport.clone(), store.clone());
    let collection_fetcher = CollectionFetcher::new(&config, transport.clone(), store.clone());
    let detail_fetcher = ReleaseDetailFetcher::new(&config, transport);

    // Three-leg authorization: open the URL, paste the redirect back in.
    let pending = auth.begin().await?;
    println!("Authorize this app in your browser:\n\n  {}\n", pending.authorize_url);
    let callback = prompt("Paste the full redirect URL (or its query string)")?;
    let tokens = auth.complete(pending, &callback, USER_ID).await?;
    println!("Signed in as {}\n", tokens.username);

    let snapshot = collection_fetcher.fetch_all(USER_ID).await?;
    if snapshot.items.is_empty() {
        println!("Your collection is empty - nothing to recommend.");
        return Ok(());
    }
    if !snapshot.complete {
        println!(
            "Heads up: only part of your collection could be fetched ({} items).",
            snapshot.items.len()
        );
    }

    let answers = ask_quiz()?;
    let criteria = recommend::to_filter_criteria(&answers);

    let mut candidates = recommend::filter_collection(&snapshot.items, &criteria);
    if candidates.is_empty() {
        candidates = recommend::broaden_filters(&snapshot.items, &criteria);
    }
    if candidates.is_empty() {
        println!("Nothing in your collection fits, even after loosening the filters.");
        return Ok(());
    }

    // Extended metadata for the top few candidates only; the rate limit
    // makes fetching everything impractical.
    let ranked = recommend::rank(&candidates, &criteria);
    let top_ids: Vec<u64> = ranked
        .iter()
        .take(DETAIL_CANDIDATES)
        .map(|s| s.item.basic_information.id)
        .collect();
    let details = detail_fetcher
        .fetch_details(&top_ids, &tokens, |done, total| {
            print!("\rFetching release details {}/{}...", done, total);
            let _ = io::stdout().flush();
        })
        .await;
    println!();

    match recommend::recommend(&candidates, &answers, &details, &mut rand::thread_rng()) {
        Some(rec) => {
            let artists = rec
                .item
                .basic_information
                .artist_names()
                .join(", ");
            println!("\nTonight's record: {} - {}", artists, rec.release.title);
            if rec.release.year > 0 {
                println!("Released: {}", rec.release.year);
            }
            println!("Match score: {}", rec.score);
            for reason in &rec.reasons {
                println!("  - {}", reason);
            }
            if !rec.release.tracklist.is_empty() {
                println!("Tracklist:");
                for track in &rec.release.tracklist {
                    println!("  {} {}", track.position, track.title);
                }
            }
        }
        None => println!("No record in your collection scored above zero for these answers."),
    }

    Ok(())
}

fn ask_quiz() -> anyhow::Result<QuizAnswers> {
    println!("A few questions about tonight:");
    let mood = prompt("Mood (chill / energetic / aggressive / melancholic / upbeat)")?;
    let tempo = prompt("Tempo (slow / medium / fast)")?;
    let genres_raw = prompt("Genres, comma-separated (blank for any)")?;
    let decade = prompt("Decade, e.g. 1990s (blank for any)")?;
    let format_raw = prompt("Format (single / album / both)")?;
    let language = prompt("Language (blank for all)")?;

    let genres = genres_raw
        .split(',')
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .collect();

    Ok(QuizAnswers {
        mood,
        tempo,
        genres,
        decade: if decade.is_empty() { "any".to_string() } else { decade },
        format: FormatChoice::from_str(&format_raw).unwrap_or_default(),
        language: if language.is_empty() { "all".to_string() } else { language },
    })
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
