//! Identity-provider (Clerk) user lifecycle events.

use serde::{Deserialize, Serialize};

use super::UserProfile;

/// Webhook envelope: `{"type": "user.created", "data": {...}, ...}`
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: serde_json::Value,
}

/// Clerk user object (only the fields mirrored locally)
#[derive(Debug, Clone, Deserialize)]
pub struct ClerkUser {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<ClerkEmailAddress>,
    pub primary_email_address_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClerkEmailAddress {
    pub id: Option<String>,
    pub email_address: String,
}

/// Payload of `user.deleted`
#[derive(Debug, Clone, Deserialize)]
pub struct ClerkDeletedObject {
    pub id: String,
}

impl ClerkUser {
    /// Primary email if flagged, otherwise the first one listed
    pub fn email(&self) -> String {
        let primary = self.primary_email_address_id.as_deref().and_then(|primary| {
            self.email_addresses
                .iter()
                .find(|e| e.id.as_deref() == Some(primary))
        });

        primary
            .or_else(|| self.email_addresses.first())
            .map(|e| e.email_address.clone())
            .unwrap_or_default()
    }

    /// "first last", skipping missing parts
    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn into_profile(self) -> UserProfile {
        UserProfile {
            email: self.email(),
            name: self.full_name(),
            id: self.id,
            image: self.image_url.filter(|url| !url.is_empty()),
        }
    }
}

/// User lifecycle change to apply to the local user table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UserSyncEvent {
    Created(UserProfile),
    Updated(UserProfile),
    Deleted { user_id: String },
}

impl UserSyncEvent {
    /// Translate a webhook envelope.
    ///
    /// Returns `Ok(None)` for event types this service does not track.
    pub fn from_envelope(envelope: WebhookEnvelope) -> Result<Option<Self>, serde_json::Error> {
        let event = match envelope.event_type.as_str() {
            "user.created" => {
                let user: ClerkUser = serde_json::from_value(envelope.data)?;
                UserSyncEvent::Created(user.into_profile())
            }
            "user.updated" => {
                let user: ClerkUser = serde_json::from_value(envelope.data)?;
                UserSyncEvent::Updated(user.into_profile())
            }
            "user.deleted" => {
                let deleted: ClerkDeletedObject = serde_json::from_value(envelope.data)?;
                UserSyncEvent::Deleted { user_id: deleted.id }
            }
            _ => return Ok(None),
        };

        Ok(Some(event))
    }

    pub fn user_id(&self) -> &str {
        match self {
            UserSyncEvent::Created(profile) | UserSyncEvent::Updated(profile) => &profile.id,
            UserSyncEvent::Deleted { user_id } => user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: serde_json::Value) -> WebhookEnvelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn created_event_maps_to_profile() {
        let event = UserSyncEvent::from_envelope(envelope(json!({
            "type": "user.created",
            "object": "event",
            "data": {
                "id": "user_1",
                "email_addresses": [
                    {"id": "idn_a", "email_address": "old@x.io"},
                    {"id": "idn_b", "email_address": "main@x.io"}
                ],
                "primary_email_address_id": "idn_b",
                "first_name": "Ada",
                "last_name": null,
                "image_url": "https://img.example/ada.png"
            }
        })))
        .unwrap()
        .unwrap();

        assert_eq!(
            event,
            UserSyncEvent::Created(UserProfile {
                id: "user_1".to_string(),
                email: "main@x.io".to_string(),
                name: "Ada".to_string(),
                image: Some("https://img.example/ada.png".to_string()),
            })
        );
    }

    #[test]
    fn first_email_is_used_without_primary() {
        let user: ClerkUser = serde_json::from_value(json!({
            "id": "user_2",
            "email_addresses": [{"email_address": "only@x.io"}],
            "first_name": " Grace ",
            "last_name": "Hopper"
        }))
        .unwrap();

        assert_eq!(user.email(), "only@x.io");
        assert_eq!(user.full_name(), "Grace Hopper");
    }

    #[test]
    fn deleted_event_carries_user_id() {
        let event = UserSyncEvent::from_envelope(envelope(json!({
            "type": "user.deleted",
            "data": {"id": "user_3", "deleted": true, "object": "user"}
        })))
        .unwrap()
        .unwrap();

        assert_eq!(event.user_id(), "user_3");
        assert!(matches!(event, UserSyncEvent::Deleted { .. }));
    }

    #[test]
    fn unrelated_events_are_ignored() {
        let event = UserSyncEvent::from_envelope(envelope(json!({
            "type": "session.created",
            "data": {"id": "sess_1"}
        })))
        .unwrap();

        assert!(event.is_none());
    }
}
