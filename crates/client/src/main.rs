mod api;
mod cache;
mod identity;
mod models;

use std::{
    env,
    future::Future,
    io::{self, Write},
    path::PathBuf,
    time::Duration,
};

use api::Api;
use cache::GalleryCache;
use colored::*;
use models::{Concert, GalleryEntry};

const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";
const DEFAULT_VOTER_FILE: &str = ".frontrow_voter";
const DEFAULT_TIMEOUT_MS: u64 = 5000;
const VOTING_ROUND_PHOTOS: usize = 4;

// ===== Main =====

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let backend_url = env::var("FRONTROW_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
    let voter_file =
        PathBuf::from(env::var("FRONTROW_VOTER_FILE").unwrap_or_else(|_| DEFAULT_VOTER_FILE.into()));
    let timeout_ms = match env::var("FRONTROW_TIMEOUT_MS") {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid FRONTROW_TIMEOUT_MS {raw:?}: {e}"))?,
        Err(_) => DEFAULT_TIMEOUT_MS,
    };

    println!("{}", "=".repeat(60).bright_cyan());
    println!("{}", "    📸 FRONTROW PHOTO ALBUM 📸".bright_yellow().bold());
    println!("{}", "=".repeat(60).bright_cyan());
    println!();

    let voter = identity::load_or_create(&voter_file)?;
    let api = Api::new(&backend_url, voter, Duration::from_millis(timeout_ms))?;
    println!("{} {}", "Voting as".bright_black(), api.voter().as_str().bright_black());

    let band_name = match env::args().nth(1) {
        Some(name) => name,
        None => match choose_concert(&api).await? {
            Some(name) => name,
            None => return Ok(()),
        },
    };

    let lookup = {
        let (api, band) = (&api, band_name.as_str());
        retrying("Could not look up the concert:", move || api.fetch_concert(band), ask_retry).await?
    };
    let Some(lookup) = lookup else {
        return Ok(());
    };
    let Some(concert) = lookup else {
        no_concert_found(&band_name);
        return Ok(());
    };

    print_welcome(&concert);
    let mut cache = GalleryCache::new(api, concert.band_name);
    gallery_loop(&mut cache).await
}

// ===== Event Selection =====

async fn choose_concert(api: &Api) -> anyhow::Result<Option<String>> {
    loop {
        let Some(concerts) =
            retrying("Could not load concerts:", move || api.list_concerts(), ask_retry).await?
        else {
            return Ok(None);
        };
        println!();
        println!("{}", "CONCERTS:".bright_yellow().bold());
        if concerts.is_empty() {
            println!("{}", "  (none yet)".bright_black());
        }
        for (i, concert) in concerts.iter().enumerate() {
            println!(
                "{}. {} {}",
                (i + 1).to_string().bright_cyan(),
                concert.band_name.bright_white().bold(),
                concert.concert_date.as_deref().unwrap_or("").bright_black()
            );
        }
        println!();
        println!("{}", "Pick: [number]  [C]reate  [Q]uit".bright_black());

        let choice = prompt("> ")?.to_lowercase();
        match choice.as_str() {
            "q" | "quit" => return Ok(None),
            "c" | "create" => {
                let name = prompt("Band name: ")?;
                if name.is_empty() {
                    println!("{}", "Band name must not be empty.".red());
                    continue;
                }
                let date = prompt("Concert date (YYYY-MM-DD, optional): ")?;
                let date = (!date.is_empty()).then_some(date);
                match api.create_concert(&name, date).await {
                    Ok(concert) => {
                        println!("{}", format!("✓ Created {}", concert.band_name).green());
                        return Ok(Some(concert.band_name));
                    }
                    Err(e) => println!("{} {}", "❌ Could not create concert:".red().bold(), e),
                }
            }
            other => match other.parse::<usize>().ok().and_then(|n| concerts.get(n.wrapping_sub(1))) {
                Some(concert) => return Ok(Some(concert.band_name.clone())),
                None => println!("{}", "Invalid choice. Please try again.".red()),
            },
        }
    }
}

fn no_concert_found(band_name: &str) {
    println!();
    println!("{}", "No Concert Found".bright_red().bold());
    println!("The concert \"{}\" doesn't exist.", band_name);
    println!("{}", "Run without arguments to pick or create one.".bright_black());
}

fn print_welcome(concert: &Concert) {
    println!();
    println!("{}", "Welcome to the FrontRow photo album for:".bright_black());
    println!(
        "{} {}",
        concert.band_name.bright_white().bold(),
        concert.concert_date.as_deref().unwrap_or("").bright_black()
    );
}

// ===== Gallery Loop =====

#[derive(Debug, PartialEq)]
enum Command {
    Vote { index: usize, up: bool },
    AddPhoto(String),
    Round,
    Refresh,
    Quit,
}

fn parse_command(input: &str) -> Option<Command> {
    let input = input.trim();
    let (head, rest) = match input.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (input, ""),
    };

    match (head.to_lowercase().as_str(), rest) {
        ("u" | "up" | "d" | "down", n) => {
            let index = n.parse::<usize>().ok().filter(|n| *n > 0)?;
            Some(Command::Vote {
                index,
                up: head.starts_with(['u', 'U']),
            })
        }
        ("a" | "add", url) if !url.is_empty() => Some(Command::AddPhoto(url.to_string())),
        ("v" | "vote", "") => Some(Command::Round),
        ("r" | "refresh" | "retry", "") => Some(Command::Refresh),
        ("q" | "quit", "") => Some(Command::Quit),
        _ => None,
    }
}

async fn gallery_loop(cache: &mut GalleryCache<Api>) -> anyhow::Result<()> {
    let voter = cache.source().voter().as_str().to_string();
    loop {
        match cache.get().await {
            Ok(entries) => print_gallery(entries, &voter),
            Err(e) => print_load_failed(&e),
        }

        println!(
            "{}",
            "[U N] upvote  [D N] downvote  [A URL] add photo  [V]ote round  [R]efresh  [Q]uit"
                .bright_black()
        );
        let input = prompt("> ")?;

        match parse_command(&input) {
            Some(Command::Vote { index, up }) => {
                let Some(photo_id) = cache.cached().and_then(|e| e.get(index - 1)).map(|e| e.id) else {
                    println!("{}", "No photo with that number.".red());
                    continue;
                };
                submit_vote(cache, photo_id, up).await;
            }
            Some(Command::AddPhoto(url)) => {
                match cache.source().add_photo(cache.band_name(), &url).await {
                    Ok(photo) => {
                        println!("{}", format!("✓ Added photo #{}", photo.id).green());
                        cache.invalidate();
                    }
                    Err(e) => println!("{} {}", "❌ Could not add photo:".red().bold(), e),
                }
            }
            Some(Command::Round) => voting_round(cache).await?,
            Some(Command::Refresh) => cache.invalidate(),
            Some(Command::Quit) => {
                println!();
                println!("{}", "Thanks for voting! 👋".bright_cyan().bold());
                return Ok(());
            }
            None => println!("{}", "Invalid choice. Please try again.".red()),
        }
    }
}

async fn submit_vote(cache: &mut GalleryCache<Api>, photo_id: i64, up: bool) {
    match cache.vote(photo_id, up).await {
        Ok(Some(true)) => println!("{}", "✓ Voted UP".green()),
        Ok(Some(false)) => println!("{}", "✓ Voted DOWN".red()),
        Ok(None) => println!("{}", "↺ Vote removed".yellow()),
        Err(e) => print_retry(&e),
    }
}

/// Steps through the newest photos, one vote each.
async fn voting_round(cache: &mut GalleryCache<Api>) -> anyhow::Result<()> {
    let photos = match cache
        .source()
        .latest_photos(cache.band_name(), VOTING_ROUND_PHOTOS)
        .await
    {
        Ok(photos) => photos,
        Err(e) => {
            print_load_failed(&e);
            return Ok(());
        }
    };
    if photos.is_empty() {
        println!("{}", "No photos to vote on yet.".yellow());
        return Ok(());
    }

    for (i, photo) in photos.iter().enumerate() {
        println!("{}", "━".repeat(60).bright_black());
        println!(
            "{} {}/{}",
            "Photo".bright_black(),
            (i + 1).to_string().bright_cyan(),
            photos.len().to_string().bright_cyan()
        );
        println!("{}", photo.photo_url.bright_white().bold());
        println!("{}", "Vote: [U]p  [D]own  [S]kip  [Q]uit".bright_black());

        let choice = prompt("> ")?.to_lowercase();
        match choice.as_str() {
            "u" | "up" => submit_vote(cache, photo.id, true).await,
            "d" | "down" => submit_vote(cache, photo.id, false).await,
            "q" | "quit" => break,
            _ => println!("{}", "→ Skipped".yellow()),
        }
    }
    Ok(())
}

// ===== Rendering =====

fn print_gallery(entries: &[GalleryEntry], voter: &str) {
    println!();
    println!("{}", "=".repeat(60).bright_cyan());
    println!("{}", "    🏆 TOP PHOTOS".bright_yellow().bold());
    println!("{}", "=".repeat(60).bright_cyan());
    println!();

    if entries.is_empty() {
        println!("{}", "No photos yet. Add one with [A URL].".bright_black());
    }

    for (i, entry) in entries.iter().enumerate() {
        let your_vote = match entry.your_vote {
            Some(true) => "▲ you".green(),
            Some(false) => "▼ you".red(),
            None => "".normal(),
        };
        let yours = if entry.uploader_id.as_deref() == Some(voter) {
            " [yours]".bright_blue()
        } else {
            "".normal()
        };
        println!(
            "{}. {}{}",
            (i + 1).to_string().bright_cyan(),
            entry.photo_url.bright_white().bold(),
            yours
        );
        println!(
            "   score {} ({} up, {} down) {}",
            entry.score.to_string().yellow(),
            entry.upvotes.to_string().green(),
            entry.downvotes.to_string().red(),
            your_vote
        );
    }
    println!();
}

/// For a mutation the server never confirmed.
fn print_retry(err: &anyhow::Error) {
    eprintln!("{} {}", "❌".red(), err.to_string().red());
    println!("{}", "Nothing changed. Press [R] to retry.".yellow());
}

/// For a read that failed. Votes already confirmed are kept server-side.
fn print_load_failed(err: &anyhow::Error) {
    eprintln!("{} {}", "❌".red(), err.to_string().red());
    println!("{}", "Could not load from the server. Press [R] to retry.".yellow());
}

// ===== Retry =====

/// Runs `call` until it succeeds or `ask_retry` says to give up, in which case
/// the result is `None`.
async fn retrying<T, Fut>(
    what: &str,
    mut call: impl FnMut() -> Fut,
    mut ask_retry: impl FnMut() -> anyhow::Result<bool>,
) -> anyhow::Result<Option<T>>
where
    Fut: Future<Output = anyhow::Result<T>>,
{
    loop {
        match call().await {
            Ok(value) => return Ok(Some(value)),
            Err(e) => {
                eprintln!("{} {}", what.red().bold(), e.to_string().red());
                if !ask_retry()? {
                    return Ok(None);
                }
            }
        }
    }
}

fn ask_retry() -> anyhow::Result<bool> {
    println!("{}", "[R]etry  [Q]uit".bright_black());
    let choice = prompt("> ")?.to_lowercase();
    Ok(!matches!(choice.as_str(), "q" | "quit"))
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{}", label.bright_green().bold());
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
