//! Data models for arrowlog

mod end;
mod ids;
mod meta;
mod pending_write;
mod session;
mod shot;
mod sync_conflict;

pub use end::{Distance, End, PhotoRef};
pub use ids::{EndId, SessionId, ShotId, WriteId};
pub use meta::AppMeta;
pub use pending_write::PendingWrite;
pub use session::{
    format_instant, normalize_sessions, parse_instant, GeoPoint, Session, DEFAULT_SHOTS_PER_END,
    MAX_SHOTS_PER_END, MIN_SHOTS_PER_END,
};
pub use shot::{Shot, ShotValue};
pub use sync_conflict::{ConflictWinner, SyncConflict};
