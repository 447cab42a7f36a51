//! Command handlers
//!
//! Handlers call the gateway and the recommendation pipeline and turn the
//! result into a [`Reply`]. Failures are rendered with
//! [`BotError::user_message`]; nothing here retries or refreshes on its own.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, instrument};
use tunelink_spotify_client::{SpotifyAuth, TimeRange, Track};

use super::reply::Reply;
use super::{Command, ParseCommandError};
use crate::error::{BotError, BotResult};
use crate::services::recommendations::{build_prompt, hydrate};
use crate::services::{RequestGateway, TextGenerator};

/// Tracks shown by `/toptracks` and `/recent`
const LIST_LIMIT: u32 = 10;

/// Top tracks used to seed `/recommend`
const SEED_LIMIT: u32 = 5;

/// History fed to `/summary`
const SUMMARY_LIMIT: u32 = 20;

const SUMMARY_INSTRUCTIONS: &str = "Summarize this person's music taste in three or four \
     friendly sentences. Mention genres and moods, not just artist names.";

/// Executes parsed commands for one chat user at a time
#[derive(Clone)]
pub struct CommandHandler {
    gateway: Arc<RequestGateway>,
    auth: SpotifyAuth,
    generator: Option<Arc<dyn TextGenerator>>,
    recommendation_count: usize,
}

impl CommandHandler {
    pub fn new(
        gateway: Arc<RequestGateway>,
        auth: SpotifyAuth,
        generator: Option<Arc<dyn TextGenerator>>,
        recommendation_count: usize,
    ) -> Self {
        Self {
            gateway,
            auth,
            generator,
            recommendation_count,
        }
    }

    /// Parse and run raw chat text
    pub async fn handle_text(&self, user_id: &str, text: &str) -> Reply {
        match text.parse::<Command>() {
            Ok(command) => self.handle(user_id, command).await,
            Err(ParseCommandError::NotACommand) => {
                Reply::new("tunelink").line("Commands start with /. Try /help.")
            }
            Err(e) => Reply::new("Unknown Command").line(format!("{}. Try /help.", e)),
        }
    }

    /// Run one command
    #[instrument(skip(self))]
    pub async fn handle(&self, user_id: &str, command: Command) -> Reply {
        let (title, result) = match command {
            Command::Connect => ("Connect Spotify", self.connect(user_id)),
            Command::NowPlaying => ("Now Playing", self.now_playing(user_id).await),
            Command::TopTracks(range) => ("Top Tracks", self.top_tracks(user_id, range).await),
            Command::Recent => ("Recently Played", self.recent(user_id).await),
            Command::Recommend => ("Recommendations", self.recommend(user_id).await),
            Command::Summary => ("Listening Summary", self.summary(user_id).await),
            Command::Help => ("tunelink Commands", Ok(help_lines())),
        };

        match result {
            Ok(lines) => Reply::new(title).lines(lines),
            Err(e) => {
                e.log();
                Reply::from_error(title, &e)
            }
        }
    }

    fn connect(&self, user_id: &str) -> BotResult<Vec<String>> {
        let url = self.auth.authorize_url(user_id)?;
        Ok(vec![
            "Open this link to connect your Spotify account:".to_string(),
            url,
        ])
    }

    async fn now_playing(&self, user_id: &str) -> BotResult<Vec<String>> {
        let playing = self.gateway.now_playing(user_id).await?;

        let Some((track, is_playing)) =
            playing.and_then(|p| p.item.map(|track| (track, p.is_playing)))
        else {
            return Ok(vec!["Nothing is playing right now.".to_string()]);
        };

        let mut lines = vec![format!("{} by {}", track.name, track.artist_names())];
        if let Some(album) = &track.album {
            lines.push(format!("Album: {}", album.name));
        }
        if !is_playing {
            lines.push("(paused)".to_string());
        }
        if let Some(url) = track.url() {
            lines.push(url.to_string());
        }
        Ok(lines)
    }

    async fn top_tracks(&self, user_id: &str, range: TimeRange) -> BotResult<Vec<String>> {
        let tracks = self.gateway.top_tracks(user_id, LIST_LIMIT, range).await?;
        if tracks.is_empty() {
            return Ok(vec!["No top tracks yet. Listen to some music first!".to_string()]);
        }
        Ok(numbered(&tracks))
    }

    async fn recent(&self, user_id: &str) -> BotResult<Vec<String>> {
        let history = self.gateway.recently_played(user_id, LIST_LIMIT).await?;
        if history.is_empty() {
            return Ok(vec!["No recently played tracks.".to_string()]);
        }
        let tracks: Vec<Track> = history.into_iter().map(|play| play.track).collect();
        Ok(numbered(&tracks))
    }

    async fn recommend(&self, user_id: &str) -> BotResult<Vec<String>> {
        let generator = self.generator()?;

        let seeds = self
            .gateway
            .top_tracks(user_id, SEED_LIMIT, TimeRange::default())
            .await?;
        let prompt = build_prompt(&seeds, self.recommendation_count);
        let raw = generator.generate_structured(&prompt).await?;

        let gateway = &self.gateway;
        let search_failure: Mutex<Option<BotError>> = Mutex::new(None);
        let failure = &search_failure;
        let recommendations = hydrate(&raw, |candidate| async move {
            match gateway
                .search_track(user_id, &candidate.title, &candidate.artist)
                .await
            {
                Ok(track) => track,
                Err(e) => {
                    debug!(error = %e, "Catalog search failed; treating as no match");
                    *failure.lock().await = Some(e);
                    None
                }
            }
        })
        .await;

        // A failed search only surfaces when it left nothing to show
        if recommendations.is_empty() {
            return Err(search_failure
                .into_inner()
                .unwrap_or(BotError::NoRecommendations));
        }

        let mut lines = Vec::with_capacity(recommendations.len() * 2);
        for (i, rec) in recommendations.iter().enumerate() {
            let mut entry = format!("{}. {} by {}", i + 1, rec.title, rec.artist);
            if !rec.reason.is_empty() {
                entry.push_str(&format!(" - {}", rec.reason));
            }
            lines.push(entry);
            if let Some(url) = &rec.url {
                lines.push(format!("   {}", url));
            }
        }
        Ok(lines)
    }

    async fn summary(&self, user_id: &str) -> BotResult<Vec<String>> {
        let generator = self.generator()?;

        let top = self
            .gateway
            .top_tracks(user_id, SUMMARY_LIMIT, TimeRange::default())
            .await?;
        let recent = self.gateway.recently_played(user_id, SUMMARY_LIMIT).await?;

        if top.is_empty() && recent.is_empty() {
            return Ok(vec!["Not enough listening history to summarize yet.".to_string()]);
        }

        let mut prompt = String::from("Top tracks:\n");
        for track in &top {
            prompt.push_str(&format!("- {} by {}\n", track.name, track.artist_names()));
        }
        prompt.push_str("Recently played:\n");
        for play in &recent {
            prompt.push_str(&format!(
                "- {} by {}\n",
                play.track.name,
                play.track.artist_names()
            ));
        }

        let text = generator.generate_with_system(SUMMARY_INSTRUCTIONS, &prompt).await?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn generator(&self) -> BotResult<&Arc<dyn TextGenerator>> {
        self.generator.as_ref().ok_or(BotError::AiNotConfigured)
    }
}

fn numbered(tracks: &[Track]) -> Vec<String> {
    tracks
        .iter()
        .enumerate()
        .map(|(i, track)| format!("{}. {} by {}", i + 1, track.name, track.artist_names()))
        .collect()
}

fn help_lines() -> Vec<String> {
    [
        "/connect - link your Spotify account",
        "/nowplaying - what you're listening to",
        "/toptracks [short|medium|long] - your most played tracks",
        "/recent - your latest plays",
        "/recommend - AI picks based on your taste",
        "/summary - AI summary of your listening",
        "/help - this list",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}
