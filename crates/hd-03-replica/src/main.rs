//! # hd-localnet
//!
//! Runs a shard of replicas in one process until every replica has
//! finalized the target height, then checks that they all agree.
//!
//! ## Environment Variables
//!
//! - `HD_REPLICAS` (default: 4)
//! - `HD_TARGET_HEIGHT` (default: 10)
//! - `HD_TXS` (default: 100)
//! - `HD_DEADLINE_SECS` (default: 60)
//! - plus everything read by `ReplicaConfig::from_env` and `TelemetryConfig::from_env`

use anyhow::{bail, Context, Result};
use hd_01_block::{Height, Transaction};
use hd_03_replica::{LocalNet, ReplicaConfig, ReplicaEvent};
use hd_telemetry::{init_tracing, TelemetryConfig};
use shared_crypto::{Secp256k1KeyPair, Signatory};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let mut telemetry = TelemetryConfig::from_env();
    telemetry.service_name = "hd-localnet".to_string();
    init_tracing(&telemetry)?;

    let replicas: usize = env_or("HD_REPLICAS", 4);
    let target: Height = env_or("HD_TARGET_HEIGHT", 10);
    let tx_count: usize = env_or("HD_TXS", 100);
    let deadline = Duration::from_secs(env_or("HD_DEADLINE_SECS", 60));
    if replicas == 0 {
        bail!("HD_REPLICAS must be at least 1");
    }

    let config = ReplicaConfig::from_env();
    info!(replicas, target, tx_count, ?config, "Starting local network");

    let keys = (0..replicas).map(|_| Secp256k1KeyPair::generate()).collect();
    let (net, mut events) = LocalNet::spawn(keys, config)?;
    for i in 0..tx_count {
        net.transact(Transaction::new(format!("tx-{i}").into_bytes()));
    }

    let mut heights: HashMap<Signatory, Height> = HashMap::new();
    let reached = tokio::time::timeout(deadline, async {
        while let Some(event) = events.recv().await {
            let ReplicaEvent::Committed {
                signatory, height, ..
            } = event;
            debug!(%signatory, height, "Replica committed");
            heights.insert(signatory, height);
            if heights.len() == replicas && heights.values().all(|h| *h >= target) {
                return true;
            }
        }
        false
    })
    .await
    .context("replicas did not reach the target height in time")?;

    let finished = net.shutdown().await;
    if !reached {
        bail!("event stream closed before target height {target}");
    }

    // Every replica must have finalized the same blocks
    for height in 1..=target {
        let mut headers = finished
            .iter()
            .filter_map(|replica| replica.blockchain().block_at(height))
            .map(|block| block.header());
        let Some(first) = headers.next() else {
            bail!("no replica holds height {height}");
        };
        if headers.any(|header| header != first) {
            bail!("replicas disagree at height {height}");
        }
    }

    let committed: usize = finished
        .first()
        .map(|replica| {
            (1..=replica.blockchain().height())
                .filter_map(|h| replica.blockchain().block_at(h))
                .map(|block| block.txs().len())
                .sum()
        })
        .unwrap_or_default();
    info!(target, committed, "All replicas agree");
    Ok(())
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
