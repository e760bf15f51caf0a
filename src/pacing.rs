use crate::config::Config;
use governor::{clock::DefaultClock, state::direct::NotKeyed, state::InMemoryState, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

pub const DEFAULT_THROTTLE: Duration = Duration::from_secs(1);

/// Pacing policy for one run. `Fixed` pauses between consecutive songs;
/// `TokenBucket` gates every remote request.
pub enum Pacing {
    None,
    Fixed(Duration),
    TokenBucket(DirectRateLimiter),
}

impl Pacing {
    /// `true` -> fixed 1s between songs, `false` -> no pause.
    pub fn from_throttle(throttle: bool) -> Self {
        if throttle {
            Pacing::Fixed(DEFAULT_THROTTLE)
        } else {
            Pacing::None
        }
    }

    /// At most `per_second` remote requests per second, no bursts.
    pub fn token_bucket(per_second: NonZeroU32) -> Self {
        let quota = Quota::per_second(per_second).allow_burst(NonZeroU32::MIN);
        Pacing::TokenBucket(RateLimiter::direct(quota))
    }

    /// Build the policy from config; `throttle` overrides the configured mode.
    pub fn from_config(cfg: &Config, throttle: bool) -> Self {
        if !throttle {
            return Pacing::None;
        }
        match cfg.pacing.as_str() {
            "none" => Pacing::None,
            "token_bucket" => match NonZeroU32::new(cfg.requests_per_second) {
                Some(n) => Pacing::token_bucket(n),
                None => Pacing::from_throttle(true),
            },
            _ => Pacing::Fixed(Duration::from_millis(cfg.throttle_ms)),
        }
    }

    /// Awaited before every remote call.
    pub async fn before_request(&self) {
        if let Pacing::TokenBucket(limiter) = self {
            log::debug!("Waiting for rate limiter");
            limiter.until_ready().await;
        }
    }

    /// Awaited between songs, never after the last one.
    pub async fn between_songs(&self) {
        if let Pacing::Fixed(d) = self {
            log::debug!("Pausing {:?} before next song", d);
            tokio::time::sleep(*d).await;
        }
    }
}

impl std::fmt::Debug for Pacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pacing::None => write!(f, "Pacing::None"),
            Pacing::Fixed(d) => write!(f, "Pacing::Fixed({:?})", d),
            Pacing::TokenBucket(_) => write!(f, "Pacing::TokenBucket"),
        }
    }
}
