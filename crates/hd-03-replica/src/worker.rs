//! Async worker driving one replica
//!
//! Messages are drained in batches. Signatures in a batch are checked in
//! parallel on the blocking pool, then applied to the replica one by one in
//! arrival order. A `TimedOut` is injected whenever the replica's point has
//! not moved for a whole propose timeout.

use crate::domain::Message;
use crate::ports::{Dispatcher, TxPool};
use crate::service::Replica;
use hd_02_consensus::Transition;
use hd_telemetry::replica_span;
use rayon::prelude::*;
use shared_crypto::Signer;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn, Instrument};

/// Upper bound on messages drained per wake-up
pub const MAX_BATCH: usize = 256;

/// Keep the transitions whose signatures check out, in their original order.
pub fn verify_transitions(transitions: Vec<Transition>) -> Vec<Transition> {
    transitions
        .into_par_iter()
        .filter(|transition| match transition.verify() {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    kind = transition.kind(),
                    height = transition.height(),
                    round = transition.round(),
                    error = %e,
                    "Dropping unverifiable transition"
                );
                false
            }
        })
        .collect()
}

/// Run until `Shutdown` arrives or every sender is gone, then hand the
/// replica back.
pub async fn run_worker<D, P, S>(
    replica: Replica<D, P, S>,
    receiver: UnboundedReceiver<Message>,
    propose_timeout: Duration,
) -> Replica<D, P, S>
where
    D: Dispatcher,
    P: TxPool,
    S: Signer,
{
    let span = replica_span!(
        "replica",
        shard = %replica.shard().hash,
        signatory = %replica.signatory()
    );
    drive(replica, receiver, propose_timeout)
        .instrument(span)
        .await
}

async fn drive<D, P, S>(
    mut replica: Replica<D, P, S>,
    mut receiver: UnboundedReceiver<Message>,
    propose_timeout: Duration,
) -> Replica<D, P, S>
where
    D: Dispatcher,
    P: TxPool,
    S: Signer,
{
    if let Err(e) = replica.init().await {
        error!(error = %e, "Replica init failed");
    }

    let mut point = replica.state().point();
    let mut deadline = Instant::now() + propose_timeout;

    loop {
        tokio::select! {
            message = receiver.recv() => {
                let Some(message) = message else {
                    info!("All senders dropped, stopping replica");
                    break;
                };
                let mut batch = vec![message];
                while batch.len() < MAX_BATCH {
                    match receiver.try_recv() {
                        Ok(next) => batch.push(next),
                        Err(_) => break,
                    }
                }
                if !process_batch(&mut replica, batch).await {
                    info!(height = replica.blockchain().height(), "Shutdown requested");
                    break;
                }
            }
            _ = sleep_until(deadline) => {
                debug!(state = %replica.state(), "Propose timeout elapsed");
                if let Err(e) = replica.timeout().await {
                    warn!(error = %e, "Timeout transition failed");
                }
                deadline = Instant::now() + propose_timeout;
            }
        }

        let current = replica.state().point();
        if current != point {
            point = current;
            deadline = Instant::now() + propose_timeout;
        }
    }

    replica
}

/// Returns `false` once a `Shutdown` was seen.
async fn process_batch<D, P, S>(replica: &mut Replica<D, P, S>, batch: Vec<Message>) -> bool
where
    D: Dispatcher,
    P: TxPool,
    S: Signer,
{
    let mut transitions = Vec::with_capacity(batch.len());
    let mut running = true;

    for message in batch {
        match message {
            Message::Transition(transition) => transitions.push(transition),
            Message::Transact(tx) => {
                replica.transact(tx);
            }
            Message::Shutdown => {
                running = false;
                break;
            }
        }
    }

    if transitions.is_empty() {
        return running;
    }

    let verified = match tokio::task::spawn_blocking(move || verify_transitions(transitions)).await {
        Ok(verified) => verified,
        Err(e) => {
            error!(error = %e, "Verification task failed");
            Vec::new()
        }
    };

    for transition in verified {
        let kind = transition.kind();
        if let Err(e) = replica.transition(transition).await {
            warn!(kind, error = %e, "Transition rejected");
        }
    }

    running
}
