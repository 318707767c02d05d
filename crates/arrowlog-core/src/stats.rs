//! Score aggregates.

use serde::{Deserialize, Serialize};

use crate::models::{End, Session};

/// Totals across a whole collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifetimeStats {
    pub session_count: usize,
    pub arrow_count: usize,
    pub total_points: u64,
    pub avg_per_arrow: f64,
    pub avg_per_end: f64,
}

pub fn end_total(end: &End) -> u32 {
    end.total()
}

pub fn session_total(session: &Session) -> u32 {
    session.ends.iter().map(end_total).sum()
}

pub fn session_arrows(session: &Session) -> usize {
    session.shot_count()
}

pub fn session_avg_per_arrow(session: &Session) -> f64 {
    ratio(u64::from(session_total(session)), session_arrows(session))
}

pub fn session_avg_per_end(session: &Session) -> f64 {
    ratio(u64::from(session_total(session)), session.ends.len())
}

pub fn lifetime_stats(sessions: &[Session]) -> LifetimeStats {
    let arrow_count = sessions.iter().map(session_arrows).sum();
    let total_points = sessions
        .iter()
        .map(|session| u64::from(session_total(session)))
        .sum();
    let total_ends: usize = sessions.iter().map(|session| session.ends.len()).sum();

    LifetimeStats {
        session_count: sessions.len(),
        arrow_count,
        total_points,
        avg_per_arrow: ratio(total_points, arrow_count),
        avg_per_end: ratio(total_points, total_ends),
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(points: u64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        points as f64 / count as f64
    }
}
