use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
    PrimitiveDateTime,
};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::TestLaunch;
use crate::services::scheduling::LaunchActivity;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LaunchCreate {
    #[serde(alias = "testId")]
    #[validate(length(min = 1, message = "test_id must not be empty"))]
    pub(crate) test_id: String,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(alias = "classroomIds")]
    #[validate(length(min = 1, message = "classroom_ids must not be empty"))]
    pub(crate) classroom_ids: Vec<String>,
    #[serde(
        default,
        alias = "launchedAt",
        deserialize_with = "deserialize_option_offset_datetime_flexible"
    )]
    pub(crate) launched_at: Option<OffsetDateTime>,
    #[serde(
        default,
        alias = "expiresAt",
        deserialize_with = "deserialize_option_offset_datetime_flexible"
    )]
    pub(crate) expires_at: Option<OffsetDateTime>,
}

/// The timestamp fields are double-optional: an absent field keeps the
/// stored value, an explicit `null` clears it.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LaunchUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    #[serde(alias = "classroomIds")]
    pub(crate) classroom_ids: Option<Vec<String>>,
    #[serde(
        default,
        alias = "launchedAt",
        deserialize_with = "deserialize_nullable_offset_datetime_flexible"
    )]
    pub(crate) launched_at: Option<Option<OffsetDateTime>>,
    #[serde(
        default,
        alias = "expiresAt",
        deserialize_with = "deserialize_nullable_offset_datetime_flexible"
    )]
    pub(crate) expires_at: Option<Option<OffsetDateTime>>,
    #[serde(default)]
    #[serde(alias = "isActive")]
    pub(crate) is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LaunchListQuery {
    #[serde(default)]
    #[serde(alias = "classroomId")]
    pub(crate) classroom_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LaunchResponse {
    pub(crate) id: String,
    pub(crate) test_id: String,
    pub(crate) title: String,
    pub(crate) session_id: String,
    pub(crate) launched_at: Option<String>,
    pub(crate) expires_at: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) status: &'static str,
    pub(crate) classroom_ids: Vec<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl LaunchResponse {
    pub(crate) fn from_db(
        launch: TestLaunch,
        activity: LaunchActivity,
        classroom_ids: Vec<String>,
    ) -> Self {
        Self {
            id: launch.id,
            test_id: launch.test_id,
            title: launch.title,
            session_id: launch.session_id,
            launched_at: launch.launched_at.map(format_primitive),
            expires_at: launch.expires_at.map(format_primitive),
            is_active: launch.is_active,
            status: activity.as_str(),
            classroom_ids,
            created_at: format_primitive(launch.created_at),
            updated_at: format_primitive(launch.updated_at),
        }
    }
}

fn parse_offset_datetime_flexible(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(value);
    }

    // Frontend's datetime-local often sends without timezone.
    if raw.len() == 16 && raw.as_bytes().get(10) == Some(&b'T') {
        let candidate = format!("{raw}:00Z");
        if let Ok(value) = OffsetDateTime::parse(&candidate, &Rfc3339) {
            return Some(value);
        }
    }

    if raw.len() == 19 && raw.as_bytes().get(10) == Some(&b'T') {
        let candidate = format!("{raw}Z");
        if let Ok(value) = OffsetDateTime::parse(&candidate, &Rfc3339) {
            return Some(value);
        }
    }

    // Fallback for explicit format "YYYY-MM-DDTHH:MM[:SS]"
    if let Ok(value) =
        PrimitiveDateTime::parse(raw, &format_description!("[year]-[month]-[day]T[hour]:[minute]"))
    {
        return Some(value.assume_utc());
    }
    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(value.assume_utc());
    }

    None
}

fn deserialize_option_offset_datetime_flexible<'de, D>(
    deserializer: D,
) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        Some(value) => parse_offset_datetime_flexible(&value)
            .ok_or_else(|| D::Error::custom(format!("invalid datetime: {value}")))
            .map(Some),
        None => Ok(None),
    }
}

/// Only called when the field is present, so `null` maps to `Some(None)`
/// while a missing field falls back to serde's default of `None`.
fn deserialize_nullable_offset_datetime_flexible<'de, D>(
    deserializer: D,
) -> Result<Option<Option<OffsetDateTime>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        Some(value) => parse_offset_datetime_flexible(&value)
            .ok_or_else(|| D::Error::custom(format!("invalid datetime: {value}")))
            .map(|parsed| Some(Some(parsed))),
        None => Ok(Some(None)),
    }
}
