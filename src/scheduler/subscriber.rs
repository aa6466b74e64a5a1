//! The reference C1 policy: "favor reliable" (§4.1).

use super::SubscriberScheduler;
use crate::connection::Connection;

use rand::seq::SliceRandom;

/// Partitions candidates into reliable and non-reliable, then picks uniformly
/// at random among the reliable ones if any exist, else among the rest.
///
/// This biases delivery toward acknowledgeable subscribers, so messages
/// accumulate ACK feedback rather than being fired and forgotten.
#[derive(Debug, Default, Clone, Copy)]
pub struct FavorReliableScheduler;

impl<C: Connection<F>, F> SubscriberScheduler<C, F> for FavorReliableScheduler {
	fn choose(&self, candidates: &[C], _frame: &F) -> C {
		debug_assert!(!candidates.is_empty(), "choose() requires a non-empty candidate set");

		let reliable: Vec<&C> = candidates.iter().filter(|c| c.reliable()).collect();
		let pool = if reliable.is_empty() { candidates.iter().collect() } else { reliable };

		(*pool.choose(&mut rand::thread_rng()).expect("pool is non-empty")).clone()
	}
}
