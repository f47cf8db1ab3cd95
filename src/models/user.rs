use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-account preferences. Unset flags fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserSettings {
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub is_dark_mode: Option<bool>,
    #[serde(default)]
    pub is_24_hour_format: Option<bool>,
}

impl UserSettings {
    pub fn is_available(&self) -> bool {
        self.is_available.unwrap_or(false)
    }

    pub fn merge(&mut self, update: UserSettings) {
        if update.is_available.is_some() {
            self.is_available = update.is_available;
        }
        if update.is_dark_mode.is_some() {
            self.is_dark_mode = update.is_dark_mode;
        }
        if update.is_24_hour_format.is_some() {
            self.is_24_hour_format = update.is_24_hour_format;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub settings: UserSettings,
    pub created_at: DateTime<Utc>,
}

/// `+` followed by 8 to 15 digits, first digit non-zero.
pub fn is_e164(phone: &str) -> bool {
    let Some(digits) = phone.strip_prefix('+') else {
        return false;
    };

    (8..=15).contains(&digits.len())
        && digits.chars().all(|c| c.is_ascii_digit())
        && !digits.starts_with('0')
}

#[cfg(test)]
mod tests {
    use super::{is_e164, UserSettings};

    #[test]
    fn phone_format() {
        assert!(is_e164("+966500000001"));
        assert!(!is_e164("966500000001"));
        assert!(!is_e164("+0123456789"));
        assert!(!is_e164("+9665abc"));
        assert!(!is_e164("+123"));
    }

    #[test]
    fn availability_defaults_to_false_and_merges() {
        let mut settings = UserSettings::default();
        assert!(!settings.is_available());

        settings.merge(UserSettings {
            is_available: Some(true),
            ..Default::default()
        });
        settings.merge(UserSettings {
            is_dark_mode: Some(true),
            ..Default::default()
        });

        assert!(settings.is_available());
        assert_eq!(settings.is_dark_mode, Some(true));
    }
}
