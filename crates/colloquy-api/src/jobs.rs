//! Registry of conversations running in background tasks.
//!
//! The REST layer starts each conversation in a spawned task and answers
//! with an id right away. `ConversationJobs` tracks each one so clients can
//! poll progress or cancel it. Entries are cloned out on read; no `DashMap`
//! guard is ever held across an `.await`.
//!
//! Running jobs are kept until they finish. Finished jobs are kept for
//! polling, up to a fixed number; past that the oldest are dropped.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use colloquy_types::conversation::{ConversationStatus, ConversationTurn, Transcript};
use colloquy_types::error::ConversationError;

/// Point-in-time view of a conversation job.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSnapshot {
    pub id: Uuid,
    pub status: ConversationStatus,
    pub agents: Vec<String>,
    pub turns_requested: u32,
    pub transcript: Vec<ConversationTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

struct ConversationJob {
    snapshot: ConversationSnapshot,
    cancel: CancellationToken,
}

/// Finished jobs retained for polling by [`ConversationJobs::new`].
pub const DEFAULT_RETAINED_FINISHED: usize = 100;

/// Concurrent map of conversation id to job state.
#[derive(Clone)]
pub struct ConversationJobs {
    inner: Arc<DashMap<Uuid, ConversationJob>>,
    retain_finished: usize,
}

impl Default for ConversationJobs {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETAINED_FINISHED)
    }
}

impl ConversationJobs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `retain_finished` finished jobs.
    pub fn with_retention(retain_finished: usize) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            retain_finished,
        }
    }

    /// Register a running conversation and return its id and cancellation token.
    pub fn start(&self, agents: Vec<String>, turns_requested: u32) -> (Uuid, CancellationToken) {
        let id = Uuid::now_v7();
        let cancel = CancellationToken::new();
        self.inner.insert(
            id,
            ConversationJob {
                snapshot: ConversationSnapshot {
                    id,
                    status: ConversationStatus::Running,
                    agents,
                    turns_requested,
                    transcript: Vec::new(),
                    error: None,
                    started_at: Utc::now(),
                    finished_at: None,
                },
                cancel: cancel.clone(),
            },
        );
        (id, cancel)
    }

    /// Append a completed turn to a running job.
    pub fn record_turn(&self, id: &Uuid, turn: &ConversationTurn) {
        if let Some(mut job) = self.inner.get_mut(id) {
            job.snapshot.transcript.push(turn.clone());
        }
    }

    /// Mark a job finished with the engine's result, then drop the oldest
    /// finished jobs beyond the retention limit.
    pub fn finish(&self, id: &Uuid, result: Result<Transcript, ConversationError>) {
        if self.record_result(id, result) {
            self.evict_finished();
        }
    }

    fn record_result(&self, id: &Uuid, result: Result<Transcript, ConversationError>) -> bool {
        let Some(mut job) = self.inner.get_mut(id) else {
            return false;
        };
        let snapshot = &mut job.snapshot;
        match result {
            Ok(transcript) => {
                snapshot.status = if transcript.cancelled {
                    ConversationStatus::Cancelled
                } else {
                    ConversationStatus::Completed
                };
                snapshot.transcript = transcript.turns;
            }
            Err(e) => {
                snapshot.status = ConversationStatus::Failed;
                snapshot.error = Some(e.to_string());
            }
        }
        snapshot.finished_at = Some(Utc::now());
        true
    }

    fn evict_finished(&self) {
        // Collected first: removing while iterating would deadlock the shard.
        let mut finished: Vec<(DateTime<Utc>, Uuid)> = self
            .inner
            .iter()
            .filter_map(|job| job.snapshot.finished_at.map(|at| (at, *job.key())))
            .collect();
        if finished.len() <= self.retain_finished {
            return;
        }
        finished.sort_unstable();
        let excess = finished.len() - self.retain_finished;
        for (_, id) in finished.into_iter().take(excess) {
            self.inner.remove(&id);
        }
        tracing::debug!(evicted = excess, "dropped finished conversations");
    }

    /// Request cancellation. Returns the job's status at the time of the
    /// request, or `None` for an unknown id.
    ///
    /// A running conversation finishes its current turn before stopping.
    pub fn cancel(&self, id: &Uuid) -> Option<ConversationStatus> {
        let job = self.inner.get(id)?;
        job.cancel.cancel();
        Some(job.snapshot.status)
    }

    pub fn snapshot(&self, id: &Uuid) -> Option<ConversationSnapshot> {
        self.inner.get(id).map(|job| job.snapshot.clone())
    }

    /// All jobs, oldest first.
    pub fn list(&self) -> Vec<ConversationSnapshot> {
        let mut all: Vec<ConversationSnapshot> =
            self.inner.iter().map(|job| job.snapshot.clone()).collect();
        all.sort_by_key(|s| s.id);
        all
    }

    /// Cancel every running conversation. Used on server shutdown.
    pub fn cancel_all(&self) {
        for job in self.inner.iter() {
            job.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_types::agent::AgentId;
    use colloquy_types::error::ReferenceError;

    fn turn(index: u32, utterance: &str) -> ConversationTurn {
        ConversationTurn {
            index,
            speaker_id: AgentId::new(),
            speaker: "Alice".to_string(),
            utterance: utterance.to_string(),
            failed: false,
        }
    }

    #[test]
    fn test_start_is_running_and_empty() {
        let jobs = ConversationJobs::new();
        let (id, cancel) = jobs.start(vec!["Alice".into(), "Bob".into()], 4);
        let snap = jobs.snapshot(&id).unwrap();
        assert_eq!(snap.status, ConversationStatus::Running);
        assert!(snap.transcript.is_empty());
        assert_eq!(snap.turns_requested, 4);
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn test_record_turn_is_visible_while_running() {
        let jobs = ConversationJobs::new();
        let (id, _) = jobs.start(vec!["Alice".into()], 2);
        jobs.record_turn(&id, &turn(0, "Hello"));
        let snap = jobs.snapshot(&id).unwrap();
        assert_eq!(snap.transcript.len(), 1);
        assert_eq!(snap.status, ConversationStatus::Running);
    }

    #[test]
    fn test_finish_completed_and_cancelled() {
        let jobs = ConversationJobs::new();
        let (done, _) = jobs.start(vec!["Alice".into()], 1);
        jobs.finish(
            &done,
            Ok(Transcript {
                turns: vec![turn(0, "Hi")],
                cancelled: false,
            }),
        );
        let snap = jobs.snapshot(&done).unwrap();
        assert_eq!(snap.status, ConversationStatus::Completed);
        assert!(snap.finished_at.is_some());

        let (stopped, _) = jobs.start(vec!["Alice".into()], 5);
        jobs.finish(
            &stopped,
            Ok(Transcript {
                turns: vec![],
                cancelled: true,
            }),
        );
        assert_eq!(
            jobs.snapshot(&stopped).unwrap().status,
            ConversationStatus::Cancelled
        );
    }

    #[test]
    fn test_finish_with_error_is_failed() {
        let jobs = ConversationJobs::new();
        let (id, _) = jobs.start(vec!["Ghost".into()], 1);
        jobs.finish(
            &id,
            Err(ConversationError::Reference(ReferenceError::UnknownAgent(
                AgentId::new(),
            ))),
        );
        let snap = jobs.snapshot(&id).unwrap();
        assert_eq!(snap.status, ConversationStatus::Failed);
        assert!(snap.error.unwrap().contains("unknown agent"));
    }

    #[test]
    fn test_cancel_fires_token() {
        let jobs = ConversationJobs::new();
        let (id, token) = jobs.start(vec!["Alice".into()], 3);
        assert_eq!(jobs.cancel(&id), Some(ConversationStatus::Running));
        assert!(token.is_cancelled());
        assert_eq!(jobs.cancel(&Uuid::now_v7()), None);
    }

    #[test]
    fn test_list_oldest_first() {
        let jobs = ConversationJobs::new();
        let (first, _) = jobs.start(vec!["Alice".into()], 1);
        let (second, _) = jobs.start(vec!["Bob".into()], 1);
        let ids: Vec<Uuid> = jobs.list().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    fn complete(jobs: &ConversationJobs, id: &Uuid) {
        jobs.finish(
            id,
            Ok(Transcript {
                turns: vec![turn(0, "Hi")],
                cancelled: false,
            }),
        );
    }

    #[test]
    fn test_oldest_finished_jobs_are_evicted() {
        let jobs = ConversationJobs::with_retention(2);
        let running = jobs.start(vec!["Charlie".into()], 9).0;
        let ids: Vec<Uuid> = (0..4).map(|_| jobs.start(vec!["Alice".into()], 1).0).collect();
        for id in &ids {
            complete(&jobs, id);
        }

        assert!(jobs.snapshot(&ids[0]).is_none());
        assert!(jobs.snapshot(&ids[1]).is_none());
        assert!(jobs.snapshot(&ids[2]).is_some());
        assert!(jobs.snapshot(&ids[3]).is_some());
        assert_eq!(
            jobs.snapshot(&running).unwrap().status,
            ConversationStatus::Running
        );
        assert_eq!(jobs.list().len(), 3);
    }

    #[test]
    fn test_running_jobs_are_never_evicted() {
        let jobs = ConversationJobs::with_retention(0);
        let (running, _) = jobs.start(vec!["Bob".into()], 3);
        let (done, _) = jobs.start(vec!["Alice".into()], 1);
        complete(&jobs, &done);

        assert!(jobs.snapshot(&done).is_none());
        assert!(jobs.snapshot(&running).is_some());
    }

    #[test]
    fn test_cancel_all() {
        let jobs = ConversationJobs::new();
        let (_, a) = jobs.start(vec!["Alice".into()], 1);
        let (_, b) = jobs.start(vec!["Bob".into()], 1);
        jobs.cancel_all();
        assert!(a.is_cancelled() && b.is_cancelled());
    }
}
