//! In-process dispatcher over tokio channels

use crate::domain::Message;
use crate::ports::Dispatcher;
use async_trait::async_trait;
use hd_02_consensus::{Action, Transition};
use shared_crypto::{Hash, Signatory};
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

/// Broadcasts actions to every shard member's worker channel.
///
/// The sender's own channel must be in `peers` so that its actions loop
/// back as transitions.
#[derive(Clone)]
pub struct ChannelDispatcher {
    peers: Vec<(Signatory, UnboundedSender<Message>)>,
}

impl ChannelDispatcher {
    pub fn new(peers: Vec<(Signatory, UnboundedSender<Message>)>) -> Self {
        Self { peers }
    }

    pub fn peers(&self) -> usize {
        self.peers.len()
    }
}

#[async_trait]
impl Dispatcher for ChannelDispatcher {
    async fn dispatch(&self, shard: Hash, action: Action) -> Result<(), String> {
        let transition = Transition::from(action);
        let mut delivered = 0;

        for (signatory, sender) in &self.peers {
            if sender.send(Message::Transition(transition.clone())).is_ok() {
                delivered += 1;
            } else {
                trace!(%signatory, %shard, "Peer channel closed");
            }
        }

        if delivered == 0 && !self.peers.is_empty() {
            return Err(format!("no live peers in shard {shard}"));
        }
        Ok(())
    }
}
