//! The control-signal protocol: one distinguished worker decides, all
//! workers observe the same decision.
//!
//! On every output interval the distinguished worker probes the stop
//! sentinel and broadcasts the result together with the authoritative
//! checkpoint iteration. Followers block on the broadcast and must
//! branch only on the received value; a follower consulting its own
//! filesystem would let workers disagree about whether to terminate.

use std::path::{Path, PathBuf};

use crossbeam_channel::{bounded, Receiver, Sender};

use skein_core::id::{Iteration, WorkerId};

use crate::error::CheckpointError;

// ── Sentinels ──────────────────────────────────────────────────────

/// External state the distinguished worker consults for a cooperative
/// stop request.
pub trait SentinelProbe {
    /// Whether a stop has been requested.
    fn stop_requested(&self) -> bool;
}

/// Filesystem sentinel: presence of the marker file `stop_<simname>`
/// requests a stop.
#[derive(Clone, Debug)]
pub struct FsSentinel {
    path: PathBuf,
}

impl FsSentinel {
    /// The sentinel for a run, living in the run's working directory.
    pub fn for_run(dir: impl AsRef<Path>, simname: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("stop_{simname}")),
        }
    }

    /// The marker path being probed.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SentinelProbe for FsSentinel {
    fn stop_requested(&self) -> bool {
        self.path.exists()
    }
}

// ── Signals ────────────────────────────────────────────────────────

/// What a control round communicates to every worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlSignal {
    /// Terminate the loop after the current output interval.
    pub stop: bool,
    /// The iteration whose checkpoint every worker should advance to.
    pub iteration: Iteration,
}

/// A worker's place in the control protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerRole {
    /// Probes external state and broadcasts decisions.
    Distinguished,
    /// Receives broadcast decisions.
    Follower,
}

// ── Channel ────────────────────────────────────────────────────────

/// One worker's handle on the group's control channel.
///
/// Every worker calls [`exchange`](Self::exchange) once per output
/// interval with its own sentinel probe; only the distinguished
/// worker's probe is ever consulted. The exchange is an implicit
/// barrier: followers block until the broadcast arrives.
#[derive(Debug)]
pub struct ControlChannel {
    id: WorkerId,
    role: WorkerRole,
    peers: Vec<Sender<ControlSignal>>,
    inbox: Option<Receiver<ControlSignal>>,
}

impl ControlChannel {
    /// This worker's identifier within the group.
    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// This worker's role.
    pub fn role(&self) -> WorkerRole {
        self.role
    }

    /// Run one control round.
    ///
    /// The distinguished worker probes `sentinel`, forms the signal
    /// with its local `iteration`, sends it to every follower, and
    /// returns it. Followers ignore both arguments and return whatever
    /// was broadcast. Either side fails with
    /// [`CheckpointError::Disconnected`] when a peer has gone away.
    pub fn exchange(
        &self,
        sentinel: &dyn SentinelProbe,
        iteration: Iteration,
    ) -> Result<ControlSignal, CheckpointError> {
        match self.role {
            WorkerRole::Distinguished => {
                let signal = ControlSignal {
                    stop: sentinel.stop_requested(),
                    iteration,
                };
                for peer in &self.peers {
                    peer.send(signal).map_err(|_| CheckpointError::Disconnected)?;
                }
                Ok(signal)
            }
            WorkerRole::Follower => match &self.inbox {
                Some(inbox) => inbox.recv().map_err(|_| CheckpointError::Disconnected),
                None => Err(CheckpointError::Disconnected),
            },
        }
    }
}

/// Build the control channels for a group of `workers` processes.
///
/// Worker 0 is the distinguished worker; the rest are followers.
/// Channels are rendezvous-free but bounded to one in-flight round,
/// which is all the protocol ever has.
pub fn worker_group(workers: usize) -> Vec<ControlChannel> {
    let mut peers = Vec::new();
    let mut inboxes = Vec::new();
    for _ in 1..workers {
        let (tx, rx) = bounded(1);
        peers.push(tx);
        inboxes.push(rx);
    }
    let mut channels = Vec::with_capacity(workers);
    channels.push(ControlChannel {
        id: WorkerId(0),
        role: WorkerRole::Distinguished,
        peers,
        inbox: None,
    });
    for (follower, inbox) in inboxes.into_iter().enumerate() {
        channels.push(ControlChannel {
            id: WorkerId(follower as u32 + 1),
            role: WorkerRole::Follower,
            peers: Vec::new(),
            inbox: Some(inbox),
        });
    }
    channels
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    /// Probe with a fixed answer, standing in for per-worker local
    /// filesystem state.
    struct StaticSentinel(bool);

    impl SentinelProbe for StaticSentinel {
        fn stop_requested(&self) -> bool {
            self.0
        }
    }

    #[test]
    fn roles_are_assigned_by_position() {
        let group = worker_group(3);
        assert_eq!(group[0].role(), WorkerRole::Distinguished);
        assert_eq!(group[1].role(), WorkerRole::Follower);
        assert_eq!(group[2].role(), WorkerRole::Follower);
    }

    #[test]
    fn worker_ids_follow_group_position() {
        let group = worker_group(3);
        let ids: Vec<WorkerId> = group.iter().map(ControlChannel::id).collect();
        assert_eq!(ids, [WorkerId(0), WorkerId(1), WorkerId(2)]);
        assert_eq!(group[0].id(), WorkerId(0));
    }

    #[test]
    fn all_workers_observe_the_distinguished_decision() {
        // Only the distinguished worker's sentinel says stop; every
        // follower's local probe says continue and must be ignored.
        let group = worker_group(4);
        let observed: Vec<ControlSignal> = thread::scope(|scope| {
            let handles: Vec<_> = group
                .iter()
                .enumerate()
                .map(|(rank, channel)| {
                    scope.spawn(move || {
                        let local = StaticSentinel(rank == 0);
                        channel.exchange(&local, Iteration(8)).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for signal in &observed {
            assert!(signal.stop);
            assert_eq!(signal.iteration, Iteration(8));
        }
    }

    #[test]
    fn no_sentinel_means_everyone_continues() {
        let group = worker_group(3);
        let observed: Vec<ControlSignal> = thread::scope(|scope| {
            let handles: Vec<_> = group
                .iter()
                .map(|channel| {
                    scope.spawn(move || {
                        channel.exchange(&StaticSentinel(false), Iteration(4)).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(observed.iter().all(|s| !s.stop));
    }

    #[test]
    fn single_worker_group_needs_no_followers() {
        let group = worker_group(1);
        let signal = group[0]
            .exchange(&StaticSentinel(true), Iteration(0))
            .unwrap();
        assert!(signal.stop);
    }

    #[test]
    fn dropped_followers_disconnect_the_broadcast() {
        let mut group = worker_group(2);
        group.truncate(1);
        match group[0].exchange(&StaticSentinel(false), Iteration(0)) {
            Err(CheckpointError::Disconnected) => {}
            other => panic!("expected Disconnected, got {other:?}"),
        }
    }

    #[test]
    fn sentinel_path_derives_from_run_name() {
        let sentinel = FsSentinel::for_run("/tmp/work", "nsve_run");
        assert!(sentinel.path().ends_with("stop_nsve_run"));
    }
}
