use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Locale-style date and time, e.g. `Wed Jul 14 18:29:23 2021`.
const FMT_DATETIME: &str = "%c";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum UserTimezone {
    #[default]
    Utc,
    Local,
}

impl UserTimezone {
    /// Formats a bid timestamp (unix milliseconds) for the tooltip.
    ///
    /// Returns `None` when `timestamp_ms` is out of chrono's range.
    pub fn format_bid_time(&self, timestamp_ms: u64) -> Option<String> {
        self.format_with(timestamp_ms, FMT_DATETIME)
    }

    pub fn format_with(&self, timestamp_ms: u64, pattern: &str) -> Option<String> {
        let millis = i64::try_from(timestamp_ms).ok()?;
        DateTime::from_timestamp_millis(millis).map(|datetime| {
            self.with_user_timezone(datetime, |time_with_zone| {
                time_with_zone.format(pattern).to_string()
            })
        })
    }

    /// Converts a UTC `DateTime` into the user's configured timezone and normalizes it to
    /// `DateTime<FixedOffset>` so downstream formatting can use one concrete type.
    fn with_user_timezone<T>(
        &self,
        datetime: DateTime<chrono::Utc>,
        formatter: impl FnOnce(DateTime<chrono::FixedOffset>) -> T,
    ) -> T {
        let time_with_zone = match self {
            UserTimezone::Local => datetime.with_timezone(&chrono::Local).fixed_offset(),
            UserTimezone::Utc => datetime.fixed_offset(),
        };

        formatter(time_with_zone)
    }
}

impl<'de> Deserialize<'de> for UserTimezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let timezone_str = String::deserialize(deserializer)?;
        match timezone_str.to_lowercase().as_str() {
            "utc" => Ok(UserTimezone::Utc),
            "local" => Ok(UserTimezone::Local),
            _ => Err(serde::de::Error::custom("Invalid UserTimezone")),
        }
    }
}

impl Serialize for UserTimezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            UserTimezone::Utc => serializer.serialize_str("UTC"),
            UserTimezone::Local => serializer.serialize_str("Local"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_bid_time_in_utc() {
        // 2021-07-14T18:29:23Z
        let formatted = UserTimezone::Utc.format_bid_time(1_626_287_363_000);
        assert_eq!(formatted.as_deref(), Some("Wed Jul 14 18:29:23 2021"));
        assert_eq!(
            UserTimezone::Utc
                .format_with(1_626_287_363_000, "%H:%M:%S")
                .as_deref(),
            Some("18:29:23")
        );
    }

    #[test]
    fn out_of_range_timestamp_is_none() {
        assert_eq!(UserTimezone::Utc.format_bid_time(u64::MAX), None);
    }

    #[test]
    fn serde_accepts_any_case() {
        let tz: UserTimezone = serde_json::from_str("\"LOCAL\"").unwrap();
        assert_eq!(tz, UserTimezone::Local);
        assert_eq!(serde_json::to_string(&UserTimezone::Utc).unwrap(), "\"UTC\"");
        assert!(serde_json::from_str::<UserTimezone>("\"mars\"").is_err());
    }
}
