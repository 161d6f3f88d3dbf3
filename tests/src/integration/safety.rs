//! # Safety Under Reordering
//!
//! Independent state machines receive every message in a random order.
//! Whatever the order, no two validators may finalize different blocks at
//! the same height, and honest majorities keep making progress.

#[cfg(test)]
mod tests {
    use crate::harness::Harness;

    const SEEDS: u64 = 16;

    #[test]
    fn test_random_delivery_agrees() {
        for seed in 0..SEEDS {
            let mut harness = Harness::with_seed(4, seed);
            harness.run_until(4);

            harness.assert_consistent();
            for i in 0..4 {
                assert!(harness.height(i) >= 4, "seed {seed}: validator {i} stuck");
            }
        }
    }

    #[test]
    fn test_random_delivery_with_faulty_validator() {
        for seed in 0..SEEDS {
            let mut harness = Harness::with_seed(4, seed);
            harness.offline.insert((seed % 4) as usize);
            harness.run_until(4);

            harness.assert_consistent();
        }
    }

    #[test]
    fn test_random_delivery_seven_validators() {
        for seed in 0..4 {
            let mut harness = Harness::with_seed(7, seed);
            // f = 2
            harness.offline.insert(1);
            harness.offline.insert(5);
            harness.run_until(6);

            harness.assert_consistent();
        }
    }

    #[test]
    fn test_same_seed_same_chain() {
        let mut a = Harness::with_seed(4, 42);
        let mut b = Harness::with_seed(4, 42);
        a.run_until(3);
        b.run_until(3);

        for height in 1..=3 {
            assert_eq!(a.header(0, height), b.header(0, height));
        }
        assert_eq!(a.delivered, b.delivered);
    }

    #[test]
    fn test_late_validator_agrees_with_majority() {
        for seed in 0..8 {
            let mut harness = Harness::with_seed(4, seed);
            harness.hold(2);
            harness.run_until(3);

            harness.release(2, seed % 2 == 0);
            harness.run_until(3);

            assert!(harness.height(2) >= 3, "seed {seed}: late validator stuck");
            harness.assert_consistent();
        }
    }
}
