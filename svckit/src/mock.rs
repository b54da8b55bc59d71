// svckit/src/mock.rs
//
// Mock log generator for demo mode and fixtures
// Seeded, so the same seed always yields the same rows

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{LogLevel, NewLogEntry};

const SOURCES: [&str; 5] = [
    "api-service",
    "user-service",
    "payment-service",
    "notification-service",
    "auth-service",
];

const ACTIONS: [&str; 8] = [
    "connect to database",
    "authenticate user",
    "process payment",
    "send notification",
    "validate token",
    "update user profile",
    "retrieve data from cache",
    "communicate with external API",
];

const WINDOW_MILLIS: i64 = 3 * 86_400_000;

pub struct MockDataGenerator {
    rng: StdRng,
    now: DateTime<Utc>,
}

impl MockDataGenerator {
    pub fn new(seed: u64, now: DateTime<Utc>) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            now,
        }
    }

    pub fn sources() -> &'static [&'static str] {
        &SOURCES
    }

    /// One entry somewhere in the three days before `now`.
    pub fn next_entry(&mut self) -> NewLogEntry {
        let log_level = LogLevel::ALL[self.rng.gen_range(0..LogLevel::ALL.len())];
        let source = SOURCES[self.rng.gen_range(0..SOURCES.len())];
        let action = ACTIONS[self.rng.gen_range(0..ACTIONS.len())];
        let age = Duration::milliseconds(self.rng.gen_range(0..WINDOW_MILLIS));

        let user = if self.rng.gen_bool(0.3) {
            Some(format!("user-{}", self.rng.gen_range(0..1000)))
        } else {
            None
        };

        NewLogEntry {
            source: source.to_string(),
            content: format!(
                "{} {}. Transaction ID: TXN-{}",
                prefix(log_level),
                action,
                self.rng.gen_range(0..1_000_000)
            ),
            log_level,
            timestamp: Some(self.now - age),
            ip: Some(format!(
                "192.168.{}.{}",
                self.rng.gen_range(0..255),
                self.rng.gen_range(0..255)
            )),
            user,
        }
    }

    pub fn generate(&mut self, count: usize) -> Vec<NewLogEntry> {
        (0..count).map(|_| self.next_entry()).collect()
    }
}

fn prefix(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "Failed to",
        LogLevel::Warn => "Potential issue with",
        LogLevel::Info => "Successfully processed",
        LogLevel::Debug => "Checking status of",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_same_seed_same_rows() {
        let a = MockDataGenerator::new(7, now()).generate(20);
        let b = MockDataGenerator::new(7, now()).generate(20);
        assert_eq!(a, b);
    }

    #[test]
    fn test_rows_stay_in_window() {
        for entry in MockDataGenerator::new(1, now()).generate(200) {
            let ts = entry.timestamp.unwrap();
            assert!(ts <= now());
            assert!(ts > now() - Duration::days(3));
            assert!(SOURCES.contains(&entry.source.as_str()));
            assert!(entry.content.starts_with(prefix(entry.log_level)));
        }
    }
}
