//! Session model and in-place edits

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::end::{Distance, End, PhotoRef};
use super::ids::SessionId;
use super::shot::ShotValue;
use crate::error::ValidationError;

/// Fewest shots an end may hold.
pub const MIN_SHOTS_PER_END: usize = 3;
/// Most shots an end may hold.
pub const MAX_SHOTS_PER_END: usize = 12;
/// Shots per end for a brand new session.
pub const DEFAULT_SHOTS_PER_END: usize = 5;

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self, ValidationError> {
        let point = Self { lat, lng };
        if point.is_valid() {
            Ok(point)
        } else {
            Err(ValidationError::InvalidCoordinates { lat, lng })
        }
    }

    fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// One practice outing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSession", into = "RawSession")]
pub struct Session {
    pub session_id: SessionId,
    /// Civil date the session logs against
    pub session_date: NaiveDate,
    /// RFC 3339 instant
    pub created_at: String,
    /// RFC 3339 instant; compared by the merge, so kept verbatim
    pub updated_at: String,
    pub location: String,
    pub coordinates: Option<GeoPoint>,
    pub notes: String,
    /// Draft never yet confirmed to the remote store
    pub is_local_only: bool,
    pub photos: Vec<PhotoRef>,
    pub ends: Vec<End>,
}

/// Wire shape of a session. Coordinates travel as `locationLat`/`locationLng`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSession {
    session_id: SessionId,
    session_date: NaiveDate,
    created_at: String,
    updated_at: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    location_lat: Option<f64>,
    #[serde(default)]
    location_lng: Option<f64>,
    /// Nested form written by earlier local stores
    #[serde(default, skip_serializing)]
    coordinates: Option<GeoPoint>,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    is_local_only: bool,
    #[serde(default)]
    photos: Vec<PhotoRef>,
    ends: Vec<End>,
}

impl From<RawSession> for Session {
    fn from(raw: RawSession) -> Self {
        // Half a pair is no position; range checks happen in `normalize`.
        let flat = match (raw.location_lat, raw.location_lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        };

        Self {
            session_id: raw.session_id,
            session_date: raw.session_date,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            location: raw.location,
            coordinates: flat.or(raw.coordinates),
            notes: raw.notes,
            is_local_only: raw.is_local_only,
            photos: raw.photos,
            ends: raw.ends,
        }
    }
}

impl From<Session> for RawSession {
    fn from(session: Session) -> Self {
        Self {
            session_id: session.session_id,
            session_date: session.session_date,
            created_at: session.created_at,
            updated_at: session.updated_at,
            location: session.location,
            location_lat: session.coordinates.map(|point| point.lat),
            location_lng: session.coordinates.map(|point| point.lng),
            coordinates: None,
            notes: session.notes,
            is_local_only: session.is_local_only,
            photos: session.photos,
            ends: session.ends,
        }
    }
}

/// Format an instant the way sessions store it.
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored instant, `None` when it is not a valid RFC 3339 timestamp.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|instant| instant.with_timezone(&Utc))
}

impl Session {
    /// A new local-only draft with one end of misses.
    #[must_use]
    pub fn new_draft(session_date: NaiveDate, now: DateTime<Utc>, shots_per_end: usize) -> Self {
        let stamp = format_instant(now);
        Self {
            session_id: SessionId::new(),
            session_date,
            created_at: stamp.clone(),
            updated_at: stamp,
            location: String::new(),
            coordinates: None,
            notes: String::new(),
            is_local_only: true,
            photos: Vec::new(),
            ends: vec![End::new(1, None, clamp_shots_per_end(shots_per_end))],
        }
    }

    pub fn updated_instant(&self) -> Option<DateTime<Utc>> {
        parse_instant(&self.updated_at)
    }

    /// Bump `updated_at`, never moving it before `created_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        let stamp = match parse_instant(&self.created_at) {
            Some(created) if created > now => created,
            _ => now,
        };
        self.updated_at = format_instant(stamp);
    }

    pub fn end(&self, end_index: u32) -> Option<&End> {
        self.ends.iter().find(|end| end.end_index == end_index)
    }

    fn end_mut(&mut self, end_index: u32) -> Result<&mut End, ValidationError> {
        self.ends
            .iter_mut()
            .find(|end| end.end_index == end_index)
            .ok_or(ValidationError::UnknownEnd(end_index))
    }

    /// Shots per end as set by the first end.
    pub fn shots_per_end(&self) -> Option<usize> {
        self.ends.first().map(|end| end.shots.len())
    }

    pub fn distance(&self) -> Option<Distance> {
        self.ends.first().and_then(|end| end.distance_meters)
    }

    pub fn shot_count(&self) -> usize {
        self.ends.iter().map(|end| end.shots.len()).sum()
    }

    /// Append an end that inherits the session's distance and shot count.
    pub fn add_end(&mut self) -> &End {
        let next_index = u32::try_from(self.ends.len() + 1).unwrap_or(u32::MAX);
        let shots = self.shots_per_end().unwrap_or(DEFAULT_SHOTS_PER_END);
        self.ends.push(End::new(next_index, self.distance(), shots));
        &self.ends[self.ends.len() - 1]
    }

    /// Remove an end and renumber the rest `1..=n`.
    pub fn remove_end(&mut self, end_index: u32) -> Result<End, ValidationError> {
        let position = self
            .ends
            .iter()
            .position(|end| end.end_index == end_index)
            .ok_or(ValidationError::UnknownEnd(end_index))?;
        if self.ends.len() <= 1 {
            return Err(ValidationError::LastEnd);
        }
        let removed = self.ends.remove(position);
        self.reindex_ends();
        Ok(removed)
    }

    /// Apply one distance to every end; `None` clears it.
    pub fn set_distance(&mut self, distance: Option<Distance>) {
        for end in &mut self.ends {
            end.distance_meters = distance;
        }
    }

    pub fn set_shots_per_end(&mut self, count: usize) -> Result<(), ValidationError> {
        if !(MIN_SHOTS_PER_END..=MAX_SHOTS_PER_END).contains(&count) {
            return Err(ValidationError::ShotsPerEndOutOfRange {
                got: count,
                min: MIN_SHOTS_PER_END,
                max: MAX_SHOTS_PER_END,
            });
        }
        for end in &mut self.ends {
            end.resize_shots(count);
        }
        Ok(())
    }

    pub fn set_shot(
        &mut self,
        end_index: u32,
        shot_index: u32,
        value: ShotValue,
    ) -> Result<(), ValidationError> {
        let end = self.end_mut(end_index)?;
        let shot = end
            .shots
            .iter_mut()
            .find(|shot| shot.shot_index == shot_index)
            .ok_or(ValidationError::UnknownShot {
                end: end_index,
                shot: shot_index,
            })?;
        shot.value = value;
        Ok(())
    }

    pub fn set_location(&mut self, location: impl Into<String>, coordinates: Option<GeoPoint>) {
        self.location = location.into().trim().to_string();
        self.coordinates = coordinates.filter(|point| point.is_valid());
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    pub fn set_date(&mut self, session_date: NaiveDate) {
        self.session_date = session_date;
    }

    pub fn add_photo(&mut self, photo: PhotoRef) {
        self.photos.retain(|existing| existing.file_id != photo.file_id);
        self.photos.push(photo);
    }

    pub fn set_end_photo(
        &mut self,
        end_index: u32,
        photo: Option<PhotoRef>,
    ) -> Result<(), ValidationError> {
        self.end_mut(end_index)?.photo = photo;
        Ok(())
    }

    /// Repair ordering invariants on data that came from storage or the remote.
    pub fn normalize(&mut self) {
        self.reindex_ends();
        for end in &mut self.ends {
            end.reindex_shots();
        }
        self.location = self.location.trim().to_string();
        self.coordinates = self.coordinates.filter(|point| point.is_valid());
    }

    fn reindex_ends(&mut self) {
        self.ends.sort_by_key(|end| end.end_index);
        for (position, end) in self.ends.iter_mut().enumerate() {
            end.end_index = u32::try_from(position + 1).unwrap_or(u32::MAX);
        }
    }
}

fn clamp_shots_per_end(count: usize) -> usize {
    count.clamp(MIN_SHOTS_PER_END, MAX_SHOTS_PER_END)
}

/// Normalize every session in a collection.
pub fn normalize_sessions(sessions: &mut [Session]) {
    for session in sessions {
        session.normalize();
    }
}
