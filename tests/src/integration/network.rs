//! # Replica Network
//!
//! Four replicas from hd-03-replica running as tokio tasks, wired together
//! by channel dispatchers. Checks that transactions submitted to the
//! shard are finalized exactly once and that every replica ends up with the
//! same chain.

#[cfg(test)]
mod tests {
    use hd_01_block::{Height, Transaction};
    use hd_03_replica::{LocalNet, LocalReplica, ReplicaConfig, ReplicaEvent, Shard, TxPool};
    use shared_crypto::{Secp256k1KeyPair, Signatory, Signer};
    use std::collections::{HashMap, HashSet};
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::time::timeout;

    fn keys(n: u8) -> Vec<Secp256k1KeyPair> {
        (1..=n)
            .map(|i| Secp256k1KeyPair::from_bytes([i; 32]).unwrap())
            .collect()
    }

    fn config() -> ReplicaConfig {
        ReplicaConfig {
            propose_timeout_ms: 200,
            ..ReplicaConfig::default()
        }
    }

    /// Wait until every replica reached `height` and finalized `txs`
    /// transactions in total.
    async fn wait_for(
        events: &mut UnboundedReceiver<ReplicaEvent>,
        replicas: usize,
        height: Height,
        txs: usize,
    ) {
        let mut progress: HashMap<Signatory, (Height, usize)> = HashMap::new();
        while let Some(ReplicaEvent::Committed {
            signatory,
            height: committed,
            txs: count,
            ..
        }) = events.recv().await
        {
            let entry = progress.entry(signatory).or_default();
            entry.0 = committed;
            entry.1 += count;

            let done = progress.len() == replicas
                && progress.values().all(|(h, n)| *h >= height && *n >= txs);
            if done {
                return;
            }
        }
        panic!("event stream closed");
    }

    fn assert_same_chain(replicas: &[LocalReplica], up_to: Height) {
        for height in 1..=up_to {
            let headers: HashSet<_> = replicas
                .iter()
                .map(|replica| replica.blockchain().block_at(height).map(|b| b.header()))
                .collect();
            assert_eq!(headers.len(), 1, "replicas disagree at height {height}");
            assert!(!headers.contains(&None), "height {height} missing");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_local_network_finalizes_transactions_once() {
        let (net, mut events) = LocalNet::spawn(keys(4), config()).unwrap();
        let submitted: Vec<Transaction> = (0..10)
            .map(|i| Transaction::new(format!("transfer-{i}").into_bytes()))
            .collect();
        for tx in &submitted {
            net.transact(tx.clone());
        }

        timeout(Duration::from_secs(30), wait_for(&mut events, 4, 3, submitted.len()))
            .await
            .expect("shard made no progress");
        let replicas = net.shutdown().await;
        assert_eq!(replicas.len(), 4);

        let common = replicas
            .iter()
            .map(|replica| replica.blockchain().height())
            .min()
            .unwrap();
        assert!(common >= 3);
        assert_same_chain(&replicas, common);

        let chain = replicas[0].blockchain();
        let mut seen = HashSet::new();
        for height in 1..=chain.height() {
            for tx in chain.block_at(height).unwrap().txs() {
                assert!(seen.insert(tx.hash()), "transaction finalized twice");
            }
        }
        for tx in &submitted {
            assert!(seen.contains(&tx.hash()));
        }
        assert!(replicas.iter().all(|replica| replica.pool().is_empty()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_local_network_survives_silent_member() {
        // The fourth member never runs, so (3, 0) has to time out
        let mut running = keys(4);
        let absent = running.pop().unwrap();
        let shard = Shard::from_signatories(
            running
                .iter()
                .chain(std::iter::once(&absent))
                .map(Signer::signatory)
                .collect(),
        );

        let (net, mut events) = LocalNet::spawn_in(shard, running, config()).unwrap();
        timeout(Duration::from_secs(30), wait_for(&mut events, 3, 4, 0))
            .await
            .expect("shard made no progress");
        let replicas = net.shutdown().await;

        assert_same_chain(&replicas, 4);
        let height_three = replicas[0].blockchain().block_at(3).unwrap();
        assert!(height_three.round() >= 1);
        assert_ne!(height_three.signatory, absent.signatory());
    }
}
