//! Input feeds that supply the entity list and live health map.
//!
//! The topology engine never fetches anything itself. A feed is polled from
//! the app's update loop at a fixed interval, outside the frame tick, and
//! whatever it returns is handed to the engine.

mod demo;
mod file;

pub use demo::DemoFeed;
pub use file::FileFeed;

use crate::graph::types::{Entity, RawHealthMap};
use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

/// What changed since the previous poll
#[derive(Debug, Default)]
pub struct FeedUpdate {
    pub entities: Option<Vec<Entity>>,
    pub health: Option<RawHealthMap>,
}

impl FeedUpdate {
    pub fn is_empty(&self) -> bool {
        self.entities.is_none() && self.health.is_none()
    }
}

pub trait Feed {
    fn poll(&mut self) -> anyhow::Result<FeedUpdate>;

    /// Short description for the status bar
    fn describe(&self) -> String;
}

/// Polls a feed at a fixed interval and remembers the outcome
pub struct FeedPoller {
    feed: Box<dyn Feed>,
    interval: Duration,
    last_poll: Option<Instant>,
    last_success: Option<DateTime<Local>>,
    last_error: Option<String>,
}

impl FeedPoller {
    pub fn new(feed: Box<dyn Feed>, interval: Duration) -> Self {
        Self {
            feed,
            interval,
            last_poll: None,
            last_success: None,
            last_error: None,
        }
    }

    pub fn describe(&self) -> String {
        self.feed.describe()
    }

    pub fn last_success(&self) -> Option<DateTime<Local>> {
        self.last_success
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Time left until the next poll is due
    pub fn time_until_due(&self, now: Instant) -> Duration {
        match self.last_poll {
            Some(last) => self.interval.saturating_sub(now.duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Poll if the interval has elapsed. Errors are logged and kept for
    /// display; the caller keeps showing the last good data.
    pub fn poll_if_due(&mut self, now: Instant) -> Option<FeedUpdate> {
        if !self.time_until_due(now).is_zero() {
            return None;
        }
        self.last_poll = Some(now);
        match self.feed.poll() {
            Ok(update) => {
                if update.is_empty() {
                    tracing::trace!("Feed unchanged since last poll");
                }
                self.last_success = Some(Local::now());
                self.last_error = None;
                Some(update)
            }
            Err(e) => {
                let message = format!("{:#}", e);
                if self.last_error.as_deref() != Some(message.as_str()) {
                    tracing::warn!("Feed poll failed: {}", message);
                }
                self.last_error = Some(message);
                None
            }
        }
    }
}
