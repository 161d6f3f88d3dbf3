//! # Consensus Scenarios
//!
//! Deterministic (FIFO delivery) runs of a four validator shard:
//!
//! 1. **Happy path**: every height commits in round 0
//! 2. **Silent proposer**: timeouts produce a nil commit and a round skip
//! 3. **Catch-up**: a validator cut off from the shard replays everything it
//!    missed, even in reverse order

#[cfg(test)]
mod tests {
    use crate::harness::Harness;
    use hd_02_consensus::State;

    #[test]
    fn test_four_validators_commit_in_round_zero() {
        let mut harness = Harness::new(4);
        harness.run_until(5);

        for i in 0..4 {
            assert_eq!(harness.height(i), 5);
            assert_eq!(harness.state(i), State::WaitForPropose { height: 6, round: 0 });
            for height in 1..=5 {
                let block = harness.blockchain(i).block_at(height).unwrap();
                assert_eq!(block.round(), 0);
                assert_eq!(block.signatory, harness.machines[harness.proposer(height, 0)].signatory());
            }
        }
        harness.assert_consistent();
        assert_eq!(harness.rejected, 0);
    }

    #[test]
    fn test_chain_links_to_parent() {
        let mut harness = Harness::new(4);
        harness.run_until(3);

        let chain = harness.blockchain(0);
        for height in 2..=3 {
            let block = chain.block_at(height).unwrap();
            let parent = chain.block_at(height - 1).unwrap();
            assert_eq!(block.parent_header(), parent.header());
        }
    }

    #[test]
    fn test_silent_proposer_skips_round() {
        let mut harness = Harness::new(4);
        // Proposer of (1, 0)
        harness.offline.insert(1);

        harness.run_until(1);

        for i in [0, 2, 3] {
            let block = harness.blockchain(i).block_at(1).unwrap();
            assert_eq!(block.round(), 1);
            assert_eq!(block.signatory, harness.machines[2].signatory());
        }
        harness.assert_consistent();
    }

    #[test]
    fn test_progress_with_one_faulty_of_four() {
        let mut harness = Harness::new(4);
        harness.offline.insert(3);

        // (3, 0) and (7, 0) belong to the silent validator
        harness.run_until(8);

        for i in [0, 1, 2] {
            assert_eq!(harness.height(i), 8);
            assert_eq!(harness.blockchain(i).block_at(3).unwrap().round(), 1);
            assert_eq!(harness.blockchain(i).block_at(7).unwrap().round(), 1);
        }
        assert_eq!(harness.height(3), 0);
        harness.assert_consistent();
    }

    #[test]
    fn test_no_progress_without_quorum() {
        let mut harness = Harness::new(4);
        harness.offline.insert(2);
        harness.offline.insert(3);

        // Two of four is below the threshold of three
        harness.run(1);
        harness.timeout_all();
        harness.run(1);

        for i in [0, 1] {
            assert_eq!(harness.height(i), 0);
            assert_eq!(harness.state(i), State::WaitForPolka { height: 1, round: 0 });
        }
    }

    #[test]
    fn test_cut_off_validator_catches_up_in_order() {
        let mut harness = Harness::new(4);
        harness.hold(0);
        harness.run_until(3);
        assert_eq!(harness.height(0), 0);

        harness.release(0, false);
        harness.run_until(3);

        assert_eq!(harness.height(0), 3);
        harness.assert_consistent();
    }

    #[test]
    fn test_cut_off_validator_catches_up_in_reverse() {
        let mut harness = Harness::new(4);
        harness.hold(3);
        harness.run_until(3);

        harness.release(3, true);
        harness.run_until(3);

        assert_eq!(harness.height(3), 3);
        assert_eq!(harness.machines[3].buffered(), 0);
        harness.assert_consistent();
    }
}
