use serde::{Deserialize, Serialize};

/// Current-user profile, including notification preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub weekly_notification: bool,
    pub lock_notification: bool,
    pub activity_notification: bool,
    pub gift_card: String,
    pub gift_card_pin: String,
    pub reward_card: String,
    pub zip: String,
    pub phone: String,
    pub carrier: String,
}

/// The editable part of a profile, as a settings form would submit it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserSettings {
    pub weekly_notification: bool,
    pub lock_notification: bool,
    pub activity_notification: bool,
    pub gift_card: String,
    pub gift_card_pin: String,
    pub reward_card: String,
    pub zip: String,
    pub phone: String,
    pub carrier: String,
}

impl User {
    /// Identity fields are kept; everything editable comes from `settings`.
    pub fn with_settings(&self, settings: UserSettings) -> User {
        User {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            weekly_notification: settings.weekly_notification,
            lock_notification: settings.lock_notification,
            activity_notification: settings.activity_notification,
            gift_card: settings.gift_card,
            gift_card_pin: settings.gift_card_pin,
            reward_card: settings.reward_card,
            zip: settings.zip,
            phone: settings.phone,
            carrier: settings.carrier,
        }
    }

    pub fn settings(&self) -> UserSettings {
        UserSettings {
            weekly_notification: self.weekly_notification,
            lock_notification: self.lock_notification,
            activity_notification: self.activity_notification,
            gift_card: self.gift_card.clone(),
            gift_card_pin: self.gift_card_pin.clone(),
            reward_card: self.reward_card.clone(),
            zip: self.zip.clone(),
            phone: self.phone.clone(),
            carrier: self.carrier.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
}

/// Completes a registration or password reset with the one-time token from the email.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub ott: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_profile_decodes_camel_case() {
        let user: User = serde_json::from_str(
            r#"{"id":5,"name":"Sam","email":"sam@example.com",
                "weeklyNotification":true,"lockNotification":false,
                "giftCard":"GC-1","zip":"84043","carrier":"tmobile"}"#,
        )
        .unwrap();
        assert_eq!(user.id, 5);
        assert!(user.weekly_notification);
        assert!(!user.activity_notification);
        assert_eq!(user.gift_card, "GC-1");
        assert_eq!(user.phone, "");
        assert_eq!(user.carrier, "tmobile");
    }

    #[test]
    fn test_with_settings_keeps_identity() {
        let user = User {
            id: 9,
            name: "Ada".into(),
            email: "ada@example.com".into(),
            zip: "84043".into(),
            ..Default::default()
        };
        let mut settings = user.settings();
        settings.activity_notification = true;
        settings.zip = "84101".into();

        let updated = user.with_settings(settings);
        assert_eq!(updated.id, 9);
        assert_eq!(updated.email, "ada@example.com");
        assert!(updated.activity_notification);
        assert_eq!(updated.zip, "84101");

        let body = serde_json::to_value(&updated).unwrap();
        assert_eq!(body["activityNotification"], true);
        assert_eq!(body["giftCardPin"], "");
    }
}
