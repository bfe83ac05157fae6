use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::{task::JoinHandle, time::Instant};
use types::ids::UserId;

use crate::{
    consts::{MAX_WATCHED_PEERS, TYPING_POLL_INTERVAL, TYPING_TTL},
    service::MessageService,
};

struct PeerWatch {
    last_typing: Option<Instant>,
    started_at: Instant,
    task: JoinHandle<()>,
}

/// Polls the typing flag of a bounded set of peers. A peer counts as typing
/// only while its last positive poll is younger than the TTL, so a missed
/// poll or a stopped sender decays to "not typing" without any stop signal.
pub struct TypingWatcher<S> {
    service: S,
    peers: Arc<RwLock<HashMap<UserId, PeerWatch>>>,
}

impl<S> TypingWatcher<S>
where
    S: MessageService + Clone + Send + Sync + 'static,
{
    pub fn new(service: S) -> Self {
        Self {
            service,
            peers: Arc::default(),
        }
    }

    /// Begins polling `peer`. Watching an already-watched peer is a no-op;
    /// at the bound, the longest-watched peer is evicted first.
    pub fn start_watching(&self, peer: UserId) {
        let mut peers = self.peers.write().unwrap();
        if peers.contains_key(&peer) {
            return;
        }
        if peers.len() >= MAX_WATCHED_PEERS {
            let oldest = peers
                .iter()
                .min_by_key(|(_, w)| w.started_at)
                .map(|(id, _)| *id);
            if let Some(id) = oldest {
                if let Some(watch) = peers.remove(&id) {
                    watch.task.abort();
                }
            }
        }

        let task = tokio::spawn(poll_loop(
            self.service.clone(),
            peer,
            Arc::clone(&self.peers),
        ));
        peers.insert(
            peer,
            PeerWatch {
                last_typing: None,
                started_at: Instant::now(),
                task,
            },
        );
    }

    pub fn stop_watching(&self, peer: UserId) {
        if let Some(watch) = self.peers.write().unwrap().remove(&peer) {
            watch.task.abort();
        }
    }

    pub fn stop_all(&self) {
        for (_, watch) in self.peers.write().unwrap().drain() {
            watch.task.abort();
        }
    }

    pub fn watched_count(&self) -> usize {
        self.peers.read().unwrap().len()
    }

    pub fn is_typing(&self, peer: UserId) -> bool {
        self.peers
            .read()
            .unwrap()
            .get(&peer)
            .and_then(|w| w.last_typing)
            .is_some_and(|at| at.elapsed() < TYPING_TTL)
    }
}

impl<S> Drop for TypingWatcher<S> {
    fn drop(&mut self) {
        for (_, watch) in self.peers.write().unwrap().drain() {
            watch.task.abort();
        }
    }
}

async fn poll_loop<S: MessageService>(
    service: S,
    peer: UserId,
    peers: Arc<RwLock<HashMap<UserId, PeerWatch>>>,
) {
    let mut interval = tokio::time::interval(TYPING_POLL_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        match service.get_typing(peer).await {
            Ok(true) => {
                if let Some(watch) = peers.write().unwrap().get_mut(&peer) {
                    watch.last_typing = Some(Instant::now());
                }
            }
            Ok(false) => {}
            Err(e) => log::debug!("typing poll for {peer} failed: {e}"),
        }
    }
}
