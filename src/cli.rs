use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::MusicApp;
use crate::config::AppConfig;
use crate::lyrics::Lyrics;
use crate::models::Track;

#[derive(Parser, Debug)]
#[command(name = "umusic")]
#[command(about = "Search music, fetch synced lyrics and browse the built-in catalog")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search for tracks (AI-backed when GEMINI_API_KEY is set)
    Search {
        /// Free text or a YouTube URL
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Fetch time-synced lyrics
    Lyrics {
        title: String,
        artist: String,
        /// Track length in seconds, used to pick the closest match
        #[arg(long, default_value_t = 0.0)]
        duration: f64,
    },
    /// List the built-in catalog and liked songs
    Catalog,
}

pub async fn execute(cli: Cli) -> Result<()> {
    let app = MusicApp::from_config(AppConfig::from_env())?;

    match cli.command {
        Command::Search { query } => {
            let query = query.join(" ");
            if let Some(results) = app.search(&query).await {
                println!("{} results ({:?})", results.tracks.len(), results.source);
                print_tracks(&results.tracks);
            }
        }
        Command::Lyrics {
            title,
            artist,
            duration,
        } => {
            let lyrics = app.lyrics(&title, &artist, duration).await;
            print_lyrics(&lyrics);
        }
        Command::Catalog => print_tracks(&app.all_songs()),
    }

    Ok(())
}

fn print_tracks(tracks: &[Track]) {
    for (i, track) in tracks.iter().enumerate() {
        println!("{:>2}. {} - {} [{}]", i + 1, track.artist, track.title, track.video_id);
    }
}

fn print_lyrics(lyrics: &Lyrics) {
    for line in &lyrics.lines {
        let minutes = (line.time / 60.0).floor() as u64;
        let seconds = line.time - (minutes as f64) * 60.0;
        println!("[{:02}:{:05.2}] {}", minutes, seconds, line.text);
    }
}
