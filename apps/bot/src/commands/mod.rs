//! Chat command parsing, handling and dispatch
//!
//! Commands arrive as raw chat text (`/nowplaying`, `/toptracks long`, ...)
//! through the [`Dispatcher`]; each is handled on its own task and answered
//! with a [`Reply`].

mod console;
mod dispatcher;
mod handlers;
mod reply;

pub use console::run_console;
pub use dispatcher::{CommandInvocation, Dispatcher};
pub use handlers::CommandHandler;
pub use reply::Reply;

use std::str::FromStr;

use thiserror::Error;
use tunelink_spotify_client::TimeRange;

/// Prefix every command starts with
pub const COMMAND_PREFIX: char = '/';

/// A parsed chat command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    NowPlaying,
    TopTracks(TimeRange),
    Recent,
    Recommend,
    Summary,
    Help,
}

/// Chat text that is not a known command
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("not a command")]
    NotACommand,

    #[error("unknown command: /{0}")]
    Unknown(String),

    #[error("invalid argument for /{command}: {argument}")]
    InvalidArgument { command: String, argument: String },
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let body = text
            .trim()
            .strip_prefix(COMMAND_PREFIX)
            .ok_or(ParseCommandError::NotACommand)?;

        let mut parts = body.split_whitespace();
        let name = parts.next().unwrap_or_default().to_lowercase();
        let argument = parts.next();

        match name.as_str() {
            "connect" => Ok(Self::Connect),
            "nowplaying" | "np" => Ok(Self::NowPlaying),
            "toptracks" | "top" => match argument {
                None => Ok(Self::TopTracks(TimeRange::default())),
                Some(arg) => parse_time_range(arg).map(Self::TopTracks).ok_or_else(|| {
                    ParseCommandError::InvalidArgument {
                        command: name.clone(),
                        argument: arg.to_string(),
                    }
                }),
            },
            "recent" => Ok(Self::Recent),
            "recommend" => Ok(Self::Recommend),
            "summary" => Ok(Self::Summary),
            "help" => Ok(Self::Help),
            _ => Err(ParseCommandError::Unknown(name)),
        }
    }
}

fn parse_time_range(arg: &str) -> Option<TimeRange> {
    match arg.to_lowercase().as_str() {
        "short" | "month" => Some(TimeRange::ShortTerm),
        "medium" | "halfyear" => Some(TimeRange::MediumTerm),
        "long" | "alltime" => Some(TimeRange::LongTerm),
        _ => None,
    }
}
