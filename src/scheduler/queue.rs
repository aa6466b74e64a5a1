//! The reference C2 policy: "random" (§4.2).

use super::QueueScheduler;
use crate::frame::Destination;

use rand::seq::SliceRandom;

/// Picks a destination uniformly at random out of the candidates.
///
/// Fairness at this level is explicitly only probabilistic (§4.2); a
/// production deployment that needs priority between destinations can supply
/// a different [`QueueScheduler`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomQueueScheduler;

impl<C> QueueScheduler<C> for RandomQueueScheduler {
	fn choose(&self, candidates: &[Destination], _connection: &C) -> Option<Destination> {
		candidates.choose(&mut rand::thread_rng()).cloned()
	}
}
