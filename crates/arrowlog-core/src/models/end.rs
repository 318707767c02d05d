//! End model

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::EndId;
use super::shot::Shot;
use crate::error::ValidationError;

/// Shooting distance in meters, always within [1, 300].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Distance(u16);

impl Distance {
    pub const MIN_METERS: i64 = 1;
    pub const MAX_METERS: i64 = 300;

    pub fn new(meters: i64) -> Result<Self, ValidationError> {
        if !(Self::MIN_METERS..=Self::MAX_METERS).contains(&meters) {
            return Err(ValidationError::DistanceOutOfRange(meters));
        }
        u16::try_from(meters)
            .map(Self)
            .map_err(|_| ValidationError::DistanceOutOfRange(meters))
    }

    pub const fn meters(self) -> u16 {
        self.0
    }
}

impl TryFrom<i64> for Distance {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Distance> for i64 {
    fn from(value: Distance) -> Self {
        Self::from(value.0)
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}

/// Reference to a photo held by the remote photo service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRef {
    pub file_id: String,
    pub name: String,
    #[serde(default)]
    pub web_view_link: Option<String>,
    pub uploaded_at: String,
}

/// One group of shots at a fixed distance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawEnd", into = "RawEnd")]
pub struct End {
    pub end_id: EndId,
    /// 1-based position within the session
    pub end_index: u32,
    /// `None` until the archer sets a distance
    pub distance_meters: Option<Distance>,
    pub photo: Option<PhotoRef>,
    pub shots: Vec<Shot>,
}

impl End {
    /// A new end filled with misses.
    #[must_use]
    pub fn new(end_index: u32, distance: Option<Distance>, shots_count: usize) -> Self {
        Self {
            end_id: EndId::new(),
            end_index,
            distance_meters: distance,
            photo: None,
            shots: (1..=shots_count)
                .map(|index| Shot::miss(u32::try_from(index).unwrap_or(u32::MAX)))
                .collect(),
        }
    }

    pub fn total(&self) -> u32 {
        self.shots.iter().map(|shot| u32::from(shot.score())).sum()
    }

    /// Resize to `count` shots, trimming from the back or padding with misses.
    pub(crate) fn resize_shots(&mut self, count: usize) {
        self.shots.truncate(count);
        while self.shots.len() < count {
            let next = u32::try_from(self.shots.len() + 1).unwrap_or(u32::MAX);
            self.shots.push(Shot::miss(next));
        }
        self.reindex_shots();
    }

    /// Sort shots by index and renumber them `1..=n`.
    pub(crate) fn reindex_shots(&mut self) {
        self.shots.sort_by_key(|shot| shot.shot_index);
        for (position, shot) in self.shots.iter_mut().enumerate() {
            shot.shot_index = u32::try_from(position + 1).unwrap_or(u32::MAX);
        }
    }
}

/// Wire shape of an end. The photo travels as flat `photo*` columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnd {
    end_id: EndId,
    end_index: u32,
    #[serde(default, deserialize_with = "deserialize_distance")]
    distance_meters: Option<Distance>,
    #[serde(default)]
    photo_file_id: Option<String>,
    #[serde(default)]
    photo_name: Option<String>,
    #[serde(default)]
    photo_uploaded_at: Option<String>,
    #[serde(default)]
    photo_web_view_link: Option<String>,
    /// Nested form written by earlier local stores
    #[serde(default, skip_serializing)]
    photo: Option<PhotoRef>,
    shots: Vec<Shot>,
}

impl From<RawEnd> for End {
    fn from(raw: RawEnd) -> Self {
        let flat_photo = raw
            .photo_file_id
            .filter(|file_id| !file_id.trim().is_empty())
            .map(|file_id| PhotoRef {
                file_id,
                name: raw.photo_name.unwrap_or_default(),
                web_view_link: raw.photo_web_view_link.filter(|link| !link.is_empty()),
                uploaded_at: raw.photo_uploaded_at.unwrap_or_default(),
            });

        Self {
            end_id: raw.end_id,
            end_index: raw.end_index,
            distance_meters: raw.distance_meters,
            photo: flat_photo.or(raw.photo),
            shots: raw.shots,
        }
    }
}

impl From<End> for RawEnd {
    fn from(end: End) -> Self {
        let (photo_file_id, photo_name, photo_uploaded_at, photo_web_view_link) = match end.photo
        {
            Some(photo) => (
                Some(photo.file_id),
                Some(photo.name),
                Some(photo.uploaded_at),
                photo.web_view_link,
            ),
            None => (None, None, None, None),
        };

        Self {
            end_id: end.end_id,
            end_index: end.end_index,
            distance_meters: end.distance_meters,
            photo_file_id,
            photo_name,
            photo_uploaded_at,
            photo_web_view_link,
            photo: None,
            shots: end.shots,
        }
    }
}

/// Older payloads stored an unset distance as `0` or a negative number.
fn deserialize_distance<'de, D>(deserializer: D) -> Result<Option<Distance>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(value) if !value.is_finite() || value <= 0.0 => Ok(None),
        #[allow(clippy::cast_possible_truncation)]
        Some(value) => Distance::new(value.round() as i64)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
