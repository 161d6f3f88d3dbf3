//! # Multi-Validator Harness
//!
//! Drives several independent [`StateMachine`]s by hand. Every action is
//! broadcast to all validators, the sender included, through a single
//! queue. Delivery order is FIFO unless a seed is given, in which case
//! the next message is picked at random. Validators can be taken offline
//! (they neither send nor receive) or held (their inbox is stashed until
//! released).

use hd_01_block::{Blockchain, Height, Round};
use hd_02_consensus::{Action, ConsensusConfig, State, StateMachine, Transition};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared_crypto::{Hash, Secp256k1KeyPair};
use std::collections::{HashSet, VecDeque};

/// Upper bound on delivered messages per `run`
const MAX_STEPS: usize = 1_000_000;

pub struct Harness {
    pub machines: Vec<StateMachine<Secp256k1KeyPair>>,
    pub offline: HashSet<usize>,
    held: HashSet<usize>,
    stash: Vec<(usize, Transition)>,
    queue: VecDeque<(usize, Transition)>,
    proposed: HashSet<(usize, Height, Round)>,
    rng: Option<StdRng>,
    /// Transitions the state machines returned an error for
    pub rejected: usize,
    /// Number of delivered transitions
    pub delivered: usize,
}

impl Harness {
    /// `n` validators with keys `[1; 32]`, `[2; 32]`, ... and FIFO delivery.
    pub fn new(n: usize) -> Self {
        let config = ConsensusConfig::for_validators(n);
        let machines = (0..n)
            .map(|i| {
                let key = Secp256k1KeyPair::from_bytes([i as u8 + 1; 32])
                    .expect("valid test key");
                StateMachine::new(config.clone(), key, Blockchain::new())
                    .expect("valid config")
            })
            .collect();

        Self {
            machines,
            offline: HashSet::new(),
            held: HashSet::new(),
            stash: Vec::new(),
            queue: VecDeque::new(),
            proposed: HashSet::new(),
            rng: None,
            rejected: 0,
            delivered: 0,
        }
    }

    /// Like [`Harness::new`] but delivering in a seeded random order.
    pub fn with_seed(n: usize, seed: u64) -> Self {
        let mut harness = Self::new(n);
        harness.rng = Some(StdRng::seed_from_u64(seed));
        harness
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// Round-robin proposer index of a point.
    pub fn proposer(&self, height: Height, round: Round) -> usize {
        let n = self.len() as i64;
        (height.rem_euclid(n) + round.rem_euclid(n)).rem_euclid(n) as usize
    }

    pub fn online(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(|i| !self.offline.contains(i))
    }

    pub fn state(&self, i: usize) -> State {
        self.machines[i].state()
    }

    pub fn blockchain(&self, i: usize) -> &Blockchain {
        self.machines[i].blockchain()
    }

    pub fn height(&self, i: usize) -> Height {
        self.blockchain(i).height()
    }

    /// Stash everything addressed to `i` from now on.
    pub fn hold(&mut self, i: usize) {
        self.held.insert(i);
    }

    /// Deliver the stash of `i`, in arrival order or reversed, and resume
    /// normal delivery.
    pub fn release(&mut self, i: usize, reversed: bool) {
        self.held.remove(&i);
        let (mut mine, others): (Vec<_>, Vec<_>) = std::mem::take(&mut self.stash)
            .into_iter()
            .partition(|(to, _)| *to == i);
        self.stash = others;

        if reversed {
            mine.reverse();
        }
        for (to, transition) in mine {
            self.deliver(to, transition);
        }
    }

    /// Queue an action from `from` to every validator.
    pub fn broadcast(&mut self, from: usize, action: Action) {
        if self.offline.contains(&from) {
            return;
        }
        let transition = Transition::from(action);
        for to in 0..self.len() {
            self.queue.push_back((to, transition.clone()));
        }
    }

    /// Let every active proposer in `WaitForPropose` propose once per point,
    /// up to `max_height`. Returns whether anything was proposed.
    pub fn propose(&mut self, max_height: Height) -> bool {
        let mut any = false;
        for i in self.active().collect::<Vec<_>>() {
            let State::WaitForPropose { height, round } = self.state(i) else {
                continue;
            };
            if height > max_height
                || self.proposer(height, round) != i
                || !self.proposed.insert((i, height, round))
            {
                continue;
            }
            if let Ok(Some(action)) = self.machines[i].propose(0, Vec::new()) {
                self.broadcast(i, action);
                any = true;
            }
        }
        any
    }

    /// Time out every online, non-held validator at its current point.
    pub fn timeout_all(&mut self) {
        for i in self.active().collect::<Vec<_>>() {
            let (height, round) = self.state(i).point();
            self.deliver(i, Transition::TimedOut { height, round });
        }
    }

    /// Deliver one queued message. Returns `false` when the queue is empty.
    pub fn step(&mut self) -> bool {
        let next = match self.rng.as_mut() {
            Some(rng) if !self.queue.is_empty() => {
                let index = rng.gen_range(0..self.queue.len());
                self.queue.swap_remove_back(index)
            }
            _ => self.queue.pop_front(),
        };
        let Some((to, transition)) = next else {
            return false;
        };
        self.deliver(to, transition);
        true
    }

    fn deliver(&mut self, to: usize, transition: Transition) {
        if self.offline.contains(&to) {
            return;
        }
        if self.held.contains(&to) {
            self.stash.push((to, transition));
            return;
        }
        self.delivered += 1;
        match self.machines[to].transition(transition) {
            Ok(actions) => {
                for action in actions {
                    self.broadcast(to, action);
                }
            }
            Err(_) => self.rejected += 1,
        }
    }

    /// Deliver and propose until nothing moves.
    pub fn run(&mut self, max_height: Height) {
        for _ in 0..MAX_STEPS {
            if !self.step() && !self.propose(max_height) {
                return;
            }
        }
        panic!("harness did not quiesce");
    }

    /// Run, timing everybody out whenever progress stalls, until every
    /// online and non-held validator has finalized `height`.
    pub fn run_until(&mut self, height: Height) {
        for _ in 0..100 {
            self.run(height);
            if self.active().all(|i| self.height(i) >= height) {
                return;
            }
            self.timeout_all();
        }
        panic!(
            "height {height} not reached: {:?}",
            self.active().map(|i| self.state(i)).collect::<Vec<_>>()
        );
    }

    fn active(&self) -> impl Iterator<Item = usize> + '_ {
        self.online().filter(|i| !self.held.contains(i))
    }

    /// Header finalized by validator `i` at `height`
    pub fn header(&self, i: usize, height: Height) -> Option<Hash> {
        self.blockchain(i).block_at(height).map(|block| block.header())
    }

    /// Panic if two validators finalized different blocks at any height.
    pub fn assert_consistent(&self) {
        for a in 0..self.len() {
            for b in (a + 1)..self.len() {
                let common = self.height(a).min(self.height(b));
                for height in 1..=common {
                    assert_eq!(
                        self.header(a, height),
                        self.header(b, height),
                        "validators {a} and {b} diverge at height {height}"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_validator_progresses_alone() {
        let mut harness = Harness::new(1);
        harness.run_until(3);

        assert_eq!(harness.height(0), 3);
        assert_eq!(harness.rejected, 0);
    }

    #[test]
    fn test_proposer_rotation() {
        let harness = Harness::new(4);
        assert_eq!(harness.proposer(1, 0), 1);
        assert_eq!(harness.proposer(1, 3), 0);
        assert_eq!(harness.proposer(2, 1), 3);
    }

    #[test]
    fn test_signers_are_distinct() {
        let harness = Harness::new(4);
        let signatories: HashSet<_> = harness.machines.iter().map(|m| m.signatory()).collect();
        assert_eq!(signatories.len(), 4);
    }

    #[test]
    fn test_offline_validator_receives_nothing() {
        let mut harness = Harness::new(4);
        harness.offline.insert(0);
        harness.run_until(2);

        assert_eq!(harness.height(0), 0);
        assert_eq!(harness.state(0), State::WaitForPropose { height: 1, round: 0 });
    }
}
