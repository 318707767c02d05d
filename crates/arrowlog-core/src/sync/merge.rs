//! Last-writer-wins reconciliation of local and remote session collections

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{format_instant, parse_instant, ConflictWinner, Session, SessionId, SyncConflict};

/// Strategy name recorded in the conflict log
pub const MERGE_STRATEGY: &str = "lww-local-bias";

/// Merged collection plus the conflicts resolved along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub sessions: Vec<Session>,
    pub conflicts: Vec<SyncConflict>,
}

/// Whether the local copy replaces the remote one.
///
/// Local wins on ties and whenever either timestamp fails to parse.
pub fn local_wins(local: &Session, remote: &Session) -> bool {
    match (local.updated_instant(), remote.updated_instant()) {
        (Some(local_at), Some(remote_at)) => local_at >= remote_at,
        _ => true,
    }
}

/// Merge `local` into `remote`, newest session date first.
pub fn merge_sessions_lww(local: &[Session], remote: &[Session]) -> Vec<Session> {
    merge(local, remote, None).sessions
}

/// Merge and report every id whose two copies differed.
pub fn merge_with_conflicts(
    local: &[Session],
    remote: &[Session],
    resolved_at: DateTime<Utc>,
) -> MergeOutcome {
    merge(local, remote, Some(format_instant(resolved_at)))
}

fn merge(local: &[Session], remote: &[Session], resolved_at: Option<String>) -> MergeOutcome {
    let mut merged: Vec<Session> = Vec::with_capacity(local.len() + remote.len());
    let mut positions: HashMap<SessionId, usize> = HashMap::new();
    let mut conflicts = Vec::new();

    for session in remote {
        match positions.get(&session.session_id) {
            // A remote listing repeating an id keeps its last row.
            Some(&position) => merged[position] = session.clone(),
            None => {
                positions.insert(session.session_id, merged.len());
                merged.push(session.clone());
            }
        }
    }

    for session in local {
        let Some(&position) = positions.get(&session.session_id) else {
            positions.insert(session.session_id, merged.len());
            merged.push(session.clone());
            continue;
        };

        let existing = &merged[position];
        if existing == session {
            continue;
        }
        let winner = if local_wins(session, existing) {
            ConflictWinner::Local
        } else {
            ConflictWinner::Remote
        };
        if let Some(resolved_at) = &resolved_at {
            conflicts.push(SyncConflict {
                session_id: session.session_id,
                local_updated_at: session.updated_at.clone(),
                remote_updated_at: existing.updated_at.clone(),
                winner,
                resolved_at: resolved_at.clone(),
                strategy: MERGE_STRATEGY.to_string(),
            });
        }
        if winner == ConflictWinner::Local {
            merged[position] = session.clone();
        }
    }

    // Stable sort: equal dates keep remote-then-local insertion order.
    merged.sort_by(|a, b| b.session_date.cmp(&a.session_date));

    MergeOutcome {
        sessions: merged,
        conflicts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn session(date: (i32, u32, u32), updated_at: &str) -> Session {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let mut session = Session::new_draft(
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            now,
            5,
        );
        session.is_local_only = false;
        session.updated_at = updated_at.to_string();
        session
    }

    fn with_notes(session: &Session, notes: &str, updated_at: &str) -> Session {
        let mut copy = session.clone();
        copy.notes = notes.to_string();
        copy.updated_at = updated_at.to_string();
        copy
    }

    fn ids(sessions: &[Session]) -> Vec<SessionId> {
        sessions.iter().map(|s| s.session_id).collect()
    }

    #[test]
    fn newer_local_copy_wins() {
        let remote = session((2024, 1, 1), "2024-01-01T09:00:00Z");
        let local = with_notes(&remote, "local edit", "2024-01-01T10:00:00Z");

        let merged = merge_sessions_lww(&[local.clone()], &[remote]);

        assert_eq!(merged, vec![local]);
    }

    #[test]
    fn newer_remote_copy_wins() {
        let remote = session((2024, 1, 1), "2024-01-01T10:00:00Z");
        let local = with_notes(&remote, "local edit", "2024-01-01T09:00:00Z");

        let merged = merge_sessions_lww(&[local], &[remote.clone()]);

        assert_eq!(merged, vec![remote]);
    }

    #[test]
    fn ties_and_unparsable_timestamps_favor_local() {
        let remote = session((2024, 1, 1), "2024-01-01T10:00:00Z");
        let tied = with_notes(&remote, "tie", "2024-01-01T10:00:00.000Z");
        assert_eq!(merge_sessions_lww(&[tied.clone()], &[remote.clone()]), vec![tied]);

        let broken_remote = with_notes(&remote, "remote", "not a date");
        let local = with_notes(&remote, "local", "2020-01-01T00:00:00Z");
        assert_eq!(
            merge_sessions_lww(&[local.clone()], &[broken_remote]),
            vec![local]
        );

        let broken_local = with_notes(&remote, "local", "");
        assert_eq!(
            merge_sessions_lww(&[broken_local.clone()], &[remote]),
            vec![broken_local]
        );
    }

    #[test]
    fn every_id_appears_exactly_once() {
        let shared = session((2024, 2, 1), "2024-02-01T10:00:00Z");
        let remote_only = session((2024, 2, 3), "2024-02-03T10:00:00Z");
        let local_only = session((2024, 2, 2), "2024-02-02T10:00:00Z");
        let local = vec![with_notes(&shared, "x", "2024-02-01T11:00:00Z"), local_only];
        let remote = vec![shared, remote_only];

        let merged = merge_sessions_lww(&local, &remote);

        let expected: HashSet<SessionId> = ids(&local).into_iter().chain(ids(&remote)).collect();
        assert_eq!(merged.len(), expected.len());
        assert_eq!(ids(&merged).into_iter().collect::<HashSet<_>>(), expected);
    }

    #[test]
    fn output_is_sorted_by_date_descending() {
        let sessions = vec![
            session((2024, 1, 5), "2024-01-05T10:00:00Z"),
            session((2024, 3, 1), "2024-03-01T10:00:00Z"),
            session((2023, 12, 31), "2023-12-31T10:00:00Z"),
        ];

        let merged = merge_sessions_lww(&sessions[..1], &sessions[1..]);

        let dates: Vec<String> = merged.iter().map(|s| s.session_date.to_string()).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-01-05", "2023-12-31"]);
    }

    #[test]
    fn empty_sides_are_identities() {
        let x = vec![
            session((2024, 1, 2), "2024-01-02T10:00:00Z"),
            session((2024, 1, 1), "2024-01-01T10:00:00Z"),
        ];
        assert_eq!(merge_sessions_lww(&x, &[]), x);
        assert_eq!(merge_sessions_lww(&[], &x), x);
        assert_eq!(merge_sessions_lww(&x, &x), x);
    }

    #[test]
    fn equal_dates_keep_a_stable_order() {
        let a = session((2024, 1, 1), "2024-01-01T10:00:00Z");
        let b = session((2024, 1, 1), "2024-01-01T11:00:00Z");
        let c = session((2024, 1, 1), "2024-01-01T12:00:00Z");

        let first = merge_sessions_lww(&[c.clone()], &[a.clone(), b.clone()]);
        let second = merge_sessions_lww(&[c], &[a, b]);

        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn conflicts_record_winner_and_both_timestamps() {
        let resolved = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let remote = session((2024, 1, 1), "2024-01-01T10:00:00Z");
        let local = with_notes(&remote, "older", "2024-01-01T09:00:00Z");
        let untouched = session((2024, 1, 3), "2024-01-03T10:00:00Z");

        let outcome = merge_with_conflicts(
            &[local.clone(), untouched.clone()],
            &[remote.clone(), untouched],
            resolved,
        );

        assert_eq!(outcome.conflicts.len(), 1);
        let conflict = &outcome.conflicts[0];
        assert_eq!(conflict.session_id, local.session_id);
        assert_eq!(conflict.winner, ConflictWinner::Remote);
        assert_eq!(conflict.local_updated_at, "2024-01-01T09:00:00Z");
        assert_eq!(conflict.remote_updated_at, "2024-01-01T10:00:00Z");
        assert_eq!(conflict.resolved_at, "2024-01-02T00:00:00.000Z");
        assert_eq!(
            outcome
                .sessions
                .iter()
                .find(|session| session.session_id == remote.session_id),
            Some(&remote)
        );
    }

    #[test]
    fn parse_instant_accepts_offsets() {
        assert_eq!(
            parse_instant("2024-01-01T02:00:00-08:00"),
            parse_instant("2024-01-01T10:00:00Z")
        );
    }
}
