//! Footer decoration.
//!
//! Purely cosmetic: the token is generated locally, never verified, and
//! carries no integrity or authenticity guarantee.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use tracing::debug;

/// Age after which the hidden token is regenerated
pub const STALE_AFTER_HOURS: i64 = 2;

const TOKEN_PREFIX: &str = "NLCMD";
const RANDOM_LEN: usize = 13;

/// Hidden token plus the time it was generated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watermark {
    pub token: String,
    pub generated_at: DateTime<Utc>,
}

impl Watermark {
    #[must_use]
    pub fn generate(now: DateTime<Utc>) -> Self {
        let random: String = uuid::Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(RANDOM_LEN)
            .collect();
        Self {
            token: format!(
                "{TOKEN_PREFIX}-{}-{random}",
                now.to_rfc3339_opts(SecondsFormat::Millis, true)
            ),
            generated_at: now,
        }
    }

    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now - self.generated_at > Duration::hours(STALE_AFTER_HOURS)
    }
}

/// Hidden token and visible footer credit
#[derive(Debug, Clone)]
pub struct WatermarkDecoration {
    hidden: Option<Watermark>,
    footer: String,
}

impl WatermarkDecoration {
    #[must_use]
    pub fn new(footer: impl Into<String>) -> Self {
        Self {
            hidden: None,
            footer: footer.into(),
        }
    }

    /// Regenerate the token when absent or stale. Returns true if it changed.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> bool {
        let needs_new = self.hidden.as_ref().map_or(true, |w| w.is_stale(now));
        if needs_new {
            let watermark = Watermark::generate(now);
            debug!("Watermark regenerated: {}", watermark.token);
            self.hidden = Some(watermark);
        }
        needs_new
    }

    /// Drop the hidden token; the next refresh recreates it
    pub fn remove(&mut self) {
        self.hidden = None;
    }

    #[must_use]
    pub fn hidden(&self) -> Option<&Watermark> {
        self.hidden.as_ref()
    }

    #[must_use]
    pub fn footer(&self) -> &str {
        &self.footer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_token_format() {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let watermark = Watermark::generate(now);
        assert!(watermark.token.starts_with("NLCMD-2026-01-02T03:04:05.000Z-"));
        let random = watermark.token.rsplit('-').next().unwrap();
        assert_eq!(random.len(), RANDOM_LEN);
    }

    #[test]
    fn test_refresh_when_absent_or_stale() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut decoration = WatermarkDecoration::new("footer");

        assert!(decoration.refresh(now));
        let first = decoration.hidden().unwrap().token.clone();

        assert!(!decoration.refresh(now + Duration::hours(1)));
        assert_eq!(decoration.hidden().unwrap().token, first);

        assert!(decoration.refresh(now + Duration::hours(2) + Duration::seconds(1)));
        assert_ne!(decoration.hidden().unwrap().token, first);

        decoration.remove();
        assert!(decoration.hidden().is_none());
        assert!(decoration.refresh(now));
    }
}
