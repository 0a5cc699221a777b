use crate::{Error, Result, UserId};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Deserialize an opaque field so that an explicit `null` stays
/// `Some(Value::Null)`; only a missing key (via `default`) yields `None`.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Registration body posted by the front end.
///
/// Every field is optional at the type level; the projection into a
/// [`PersistedRecord`] decides what is required. `age` and
/// `face_descriptors` are opaque and copied verbatim, `null` included.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPayload {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub age: Option<Value>,
    pub schedules: Option<Vec<ScheduleEntry>>,
    #[serde(default, deserialize_with = "present")]
    pub face_descriptors: Option<Value>,
}

/// One medication time. Fields beyond `time`, `pillA` and `pillB` are
/// discarded when the entry is deserialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub time: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub pill_a: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub pill_b: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub age: Option<Value>,
}

/// Record written to `data/<identifier>.json` and handed to the dispenser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecord {
    pub user: UserInfo,
    pub schedules: Vec<ScheduleEntry>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub face_descriptors: Option<Value>,
}

impl PersistedRecord {
    /// Project a registration payload into the stored shape.
    ///
    /// Fails with a validation error when `name` is missing or empty, or
    /// when `schedules` is missing. An empty schedule list is accepted.
    pub fn from_payload(payload: RegistrationPayload) -> Result<Self> {
        let name = payload
            .name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::Validation("name is required".to_string()))?;

        let schedules = payload
            .schedules
            .ok_or_else(|| Error::Validation("schedules is required".to_string()))?;

        Ok(Self {
            user: UserInfo {
                name,
                age: payload.age,
            },
            schedules,
            face_descriptors: payload.face_descriptors,
        })
    }

    /// Identifier under which this record is stored
    pub fn user_id(&self) -> Result<UserId> {
        UserId::derive(&self.user.name)
    }

    /// Human-readable JSON with two-space indentation
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
