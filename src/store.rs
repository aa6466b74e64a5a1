//! The Queue Store contract (C3, §6) and an in-memory reference implementation.
//!
//! Durable stores — WAL layout, fsync policy, anything that survives a
//! restart — are explicitly out of scope (§1); this module only defines the
//! contract the core relies on and a `MemoryStore` good enough for tests and
//! docs.

use crate::error::StoreError;
use crate::frame::Destination;

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Persists frames that have no ready subscriber, per destination.
///
/// Implementations are assumed thread-safe and every method atomic from the
/// queue manager's point of view (§5); all methods take `&self` for that
/// reason. Errors are fatal to whichever `QueueManager` operation triggered
/// them, leaving the manager's own state (`R`, `P`, `T`) consistent (§6).
pub trait QueueStore<F> {
	/// Persist a frame at the tail of `destination`'s backlog.
	fn enqueue(&self, destination: &str, frame: F) -> Result<(), StoreError>;

	/// Remove and return the head of `destination`'s backlog, if any.
	fn dequeue(&self, destination: &str) -> Result<Option<F>, StoreError>;

	/// Whether `destination` currently has any backlog.
	fn has_frames(&self, destination: &str) -> Result<bool, StoreError>;

	/// A finite, lazily-draining sequence over `destination`'s backlog.
	///
	/// Each frame is removed from the store at the moment it is yielded, not
	/// upfront — a caller that stops iterating early leaves the rest in the
	/// store.
	fn frames(&self, destination: &str) -> Box<dyn Iterator<Item = F> + '_>;

	/// Return a frame to the head of `destination`'s backlog, so the next
	/// `dequeue` returns it again.
	fn requeue(&self, destination: &str, frame: F) -> Result<(), StoreError>;
}

/// An in-process [`QueueStore`] backed by a mutex-guarded map of `VecDeque`s.
///
/// This is the reference store used by this crate's own tests; it satisfies
/// the contract but has no persistence and no backpressure, neither of which
/// this crate's scope requires of it (§1, §10.6).
#[derive(Debug, Default)]
pub struct MemoryStore<F> {
	queues: Mutex<HashMap<Destination, VecDeque<F>>>,
}

impl<F> MemoryStore<F> {
	/// Construct an empty store.
	pub fn new() -> Self {
		Self {
			queues: Mutex::new(HashMap::new()),
		}
	}
}

impl<F: Clone> QueueStore<F> for MemoryStore<F> {
	fn enqueue(&self, destination: &str, frame: F) -> Result<(), StoreError> {
		self.queues
			.lock()
			.unwrap()
			.entry(destination.to_owned())
			.or_default()
			.push_back(frame);
		Ok(())
	}

	fn dequeue(&self, destination: &str) -> Result<Option<F>, StoreError> {
		let mut queues = self.queues.lock().unwrap();
		let frame = queues.get_mut(destination).and_then(VecDeque::pop_front);
		if matches!(queues.get(destination), Some(queue) if queue.is_empty()) {
			queues.remove(destination);
		}
		Ok(frame)
	}

	fn has_frames(&self, destination: &str) -> Result<bool, StoreError> {
		Ok(self
			.queues
			.lock()
			.unwrap()
			.get(destination)
			.map_or(false, |queue| !queue.is_empty()))
	}

	fn frames(&self, destination: &str) -> Box<dyn Iterator<Item = F> + '_> {
		Box::new(Drain {
			store: self,
			destination: destination.to_owned(),
		})
	}

	fn requeue(&self, destination: &str, frame: F) -> Result<(), StoreError> {
		self.queues
			.lock()
			.unwrap()
			.entry(destination.to_owned())
			.or_default()
			.push_front(frame);
		Ok(())
	}
}

/// Iterator returned by [`MemoryStore::frames`]; pops one frame per `next()`.
struct Drain<'a, F> {
	store: &'a MemoryStore<F>,
	destination: Destination,
}

impl<'a, F: Clone> Iterator for Drain<'a, F> {
	type Item = F;

	fn next(&mut self) -> Option<F> {
		// MemoryStore::dequeue is infallible; frames() takes the `Box<dyn
		// Iterator>` shape required by the trait, which has no room for a
		// `Result` item type.
		self.store.dequeue(&self.destination).unwrap()
	}
}
