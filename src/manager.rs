//! The Queue Manager (C5): subscription registry, pending-ACK table,
//! transaction buffer, and send-path orchestration.

use crate::connection::Connection;
use crate::error::QueueError;
use crate::frame::{Destination, Frame, TransactionId};
use crate::scheduler::{QueueScheduler, SubscriberScheduler};
use crate::store::QueueStore;

use parking_lot::ReentrantMutex;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// `R`, `P` and `T` from §3, guarded together by the manager's re-entrant lock.
struct State<C, F> {
	/// Subscription registry: destination → subscribed connections (I1).
	registry: HashMap<Destination, HashSet<C>>,
	/// Pending table: connection → its single in-flight frame (I2, I3).
	pending: HashMap<C, F>,
	/// Transaction buffer: connection → transaction id → ack'd frames, in ack order (I6).
	transactions: HashMap<C, HashMap<TransactionId, Vec<F>>>,
}

impl<C, F> Default for State<C, F> {
	fn default() -> Self {
		Self {
			registry: HashMap::new(),
			pending: HashMap::new(),
			transactions: HashMap::new(),
		}
	}
}

/// The dispatch core of a STOMP-family broker.
///
/// Every public method acquires the manager's internal re-entrant lock for
/// its entire duration (§4.3, §5): concurrent callers from different threads
/// serialize on it, while `resend_transaction_frames` re-entering `send` from
/// the same thread proceeds without deadlocking.
///
/// `C` is the connection handle type (see [`Connection`]), `F` is the frame
/// type (see [`Frame`]), `S` is the backing [`QueueStore`], and `C1`/`C2` are
/// the subscriber and queue schedulers (§4.1, §4.2).
pub struct QueueManager<C, F, S, C1, C2>
where
	C: Connection<F>,
	F: Frame,
{
	state: ReentrantMutex<RefCell<State<C, F>>>,
	store: S,
	subscriber_scheduler: C1,
	queue_scheduler: C2,
}

impl<C, F, S, C1, C2> QueueManager<C, F, S, C1, C2>
where
	C: Connection<F>,
	F: Frame,
	S: QueueStore<F>,
	C1: SubscriberScheduler<C, F>,
	C2: QueueScheduler<C>,
{
	/// Construct a queue manager over the given store and schedulers.
	pub fn new(store: S, subscriber_scheduler: C1, queue_scheduler: C2) -> Self {
		Self {
			state: ReentrantMutex::new(RefCell::new(State::default())),
			store,
			subscriber_scheduler,
			queue_scheduler,
		}
	}

	/// The backing store, for collaborators that need to inspect backlog
	/// state directly (monitoring, tests).
	pub fn store(&self) -> &S {
		&self.store
	}

	/// Subscribe `connection` to `destination` and drain any existing
	/// backlog to it (§4.4).
	///
	/// Re-subscribing an already-subscribed connection is a no-op for the
	/// registry, but still triggers a backlog drain attempt; I2 guarantees
	/// this cannot double-deliver to an already-pending reliable connection,
	/// since such a connection can never be "eligible" again until it ACKs.
	pub fn subscribe(&self, connection: C, destination: Destination) -> Result<(), QueueError> {
		let guard = self.state.lock();
		{
			let mut state = guard.borrow_mut();
			state.registry.entry(destination.clone()).or_default().insert(connection.clone());
		}

		if connection.reliable() {
			if let Some(frame) = self.store.dequeue(&destination)? {
				self.send_reliably_or_not(&guard, connection, frame)?;
			}
		} else {
			for frame in self.store.frames(&destination) {
				self.send_reliably_or_not(&guard, connection.clone(), frame)?;
			}
		}
		Ok(())
	}

	/// Unsubscribe `connection` from `destination` (§4.11).
	///
	/// Pending frames and transaction buffers are untouched: a connection
	/// that still has a pending frame for `destination` keeps it — its ACK
	/// (or a transaction abort naming it) can still be processed even though
	/// the subscription itself is gone. This crate deliberately keeps that
	/// behaviour rather than "fixing" it by requeuing on unsubscribe (see
	/// DESIGN.md).
	pub fn unsubscribe(&self, connection: &C, destination: &str) {
		let guard = self.state.lock();
		let mut state = guard.borrow_mut();
		if let Some(subs) = state.registry.get_mut(destination) {
			subs.remove(connection);
			if subs.is_empty() {
				state.registry.remove(destination);
			}
		}
	}

	/// Dispatch `message` (§4.5).
	///
	/// Mutates `message` exactly once on entry: stamps its command tag as
	/// `MESSAGE` and assigns a fresh `message-id` if it doesn't already have
	/// one. Fails with [`QueueError::BadFrame`] if `message` has no
	/// destination; no state is changed in that case.
	pub fn send(&self, mut message: F) -> Result<(), QueueError> {
		let guard = self.state.lock();
		self.send_locked(&guard, &mut message)
	}

	fn send_locked(&self, guard: &StateGuard<'_, C, F>, message: &mut F) -> Result<(), QueueError> {
		let destination = message.destination().ok_or(QueueError::BadFrame)?.to_owned();
		message.normalize_for_dispatch();

		let eligible: Vec<C> = {
			let state = guard.borrow();
			match state.registry.get(&destination) {
				Some(subs) => subs.iter().filter(|c| !state.pending.contains_key(*c)).cloned().collect(),
				None => Vec::new(),
			}
		};

		if eligible.is_empty() {
			self.store.enqueue(&destination, message.clone())?;
		} else {
			let selected = self.subscriber_scheduler.choose(&eligible, message);
			self.send_reliably_or_not(guard, selected, message.clone())?;
		}
		Ok(())
	}

	/// Acknowledge `frame` on behalf of `connection`, optionally under `transaction` (§4.6).
	///
	/// A spurious ACK — `connection` has nothing pending — is logged and
	/// tolerated, not an error.
	pub fn ack(&self, connection: &C, frame: &F, transaction: Option<TransactionId>) -> Result<(), QueueError> {
		let guard = self.state.lock();

		let pending = {
			let state = guard.borrow();
			match state.pending.get(connection) {
				Some(pending) => pending.clone(),
				None => {
					log::debug!("spurious ack: connection has no pending frame");
					return Ok(());
				},
			}
		};

		if pending.message_id() != frame.message_id() {
			log::warn!(
				"ack for unexpected message-id (expected {:?}, got {:?}); requeuing pending frame",
				pending.message_id(),
				frame.message_id(),
			);
			if let Some(destination) = pending.destination() {
				self.store.requeue(destination, pending.clone())?;
			}
		}

		if let Some(transaction) = transaction {
			let mut state = guard.borrow_mut();
			state
				.transactions
				.entry(connection.clone())
				.or_default()
				.entry(transaction)
				.or_default()
				.push(pending);
		}

		{
			let mut state = guard.borrow_mut();
			state.pending.remove(connection);
		}

		self.drain_subscriber_backlog(&guard, connection)?;
		Ok(())
	}

	/// Re-dispatch every frame ack'd by `connection` under `transaction`,
	/// from scratch (§4.7).
	///
	/// Each frame re-enters `send` and may land on a different subscriber.
	/// The transaction entry itself is left untouched — the caller is
	/// expected to call [`clear_transaction_frames`](Self::clear_transaction_frames)
	/// next. An unknown `(connection, transaction)` pair yields no frames and
	/// is not an error.
	pub fn resend_transaction_frames(&self, connection: &C, transaction: &str) -> Result<(), QueueError> {
		let guard = self.state.lock();

		let frames: Vec<F> = {
			let state = guard.borrow();
			state
				.transactions
				.get(connection)
				.and_then(|txs| txs.get(transaction))
				.cloned()
				.unwrap_or_default()
		};

		for mut frame in frames {
			self.send_locked(&guard, &mut frame)?;
		}
		Ok(())
	}

	/// Discard the buffered ack'd frames for `(connection, transaction)` (§4.7).
	///
	/// An unknown pair is a silent no-op.
	pub fn clear_transaction_frames(&self, connection: &C, transaction: &str) {
		let guard = self.state.lock();
		let mut state = guard.borrow_mut();
		if let Some(txs) = state.transactions.get_mut(connection) {
			txs.remove(transaction);
			if txs.is_empty() {
				state.transactions.remove(connection);
			}
		}
	}

	/// Remove `connection` entirely: requeue its pending frame if any,
	/// drop every subscription, and abandon its transaction buffers (§4.10).
	///
	/// Frames already ack'd-but-uncommitted under an open transaction are
	/// lost when the transaction buffer is dropped here — this crate keeps
	/// that behaviour rather than attempting to recover them (see
	/// DESIGN.md).
	pub fn disconnect(&self, connection: &C) -> Result<(), QueueError> {
		let guard = self.state.lock();

		let pending = {
			let mut state = guard.borrow_mut();
			state.pending.remove(connection)
		};
		if let Some(pending) = pending {
			if let Some(destination) = pending.destination() {
				self.store.requeue(destination, pending)?;
			}
		}

		let mut state = guard.borrow_mut();
		state.registry.retain(|_, subs| {
			subs.remove(connection);
			!subs.is_empty()
		});

		if state.transactions.remove(connection).is_some() {
			log::debug!("disconnect abandoned open transaction buffers for connection");
		}
		Ok(())
	}

	/// §4.8: deliver `frame` to `connection`, recording it in the pending
	/// table first if `connection` is reliable.
	fn send_reliably_or_not(&self, guard: &StateGuard<'_, C, F>, connection: C, frame: F) -> Result<(), QueueError> {
		if connection.reliable() {
			let mut state = guard.borrow_mut();
			if state.pending.contains_key(&connection) {
				return Err(QueueError::InternalInvariant(
					"reliable send path reached with a connection already in the pending table",
				));
			}
			state.pending.insert(connection.clone(), frame.clone());
		}

		if let Err(error) = connection.deliver(&frame) {
			log::warn!("transport error delivering frame, will recover via disconnect: {}", error);
		}
		Ok(())
	}

	/// §4.9: after freeing a reliable slot, hand the now-idle subscriber its
	/// next backlogged message, if any of its subscriptions have one.
	fn drain_subscriber_backlog(&self, guard: &StateGuard<'_, C, F>, connection: &C) -> Result<(), QueueError> {
		let candidates: Vec<Destination> = {
			let state = guard.borrow();
			state
				.registry
				.iter()
				.filter(|(_, subs)| subs.contains(connection))
				.map(|(dest, _)| dest.clone())
				.filter(|dest| self.store.has_frames(dest).unwrap_or(false))
				.collect()
		};

		if candidates.is_empty() {
			return Ok(());
		}

		if let Some(destination) = self.queue_scheduler.choose(&candidates, connection) {
			if let Some(frame) = self.store.dequeue(&destination)? {
				self.send_reliably_or_not(guard, connection.clone(), frame)?;
			}
		}
		Ok(())
	}
}

type StateGuard<'a, C, F> = parking_lot::ReentrantMutexGuard<'a, RefCell<State<C, F>>>;
