//! Connection handles: the core's view of a subscriber.

mod id;

pub use id::{ConnectionId, IdAllocator};

use crate::error::TransportError;

use std::hash::Hash;

/// The core's view of a client session.
///
/// Identity is by the handle itself — implementors must give `Eq`/`Hash` that
/// stay stable for the connection's lifetime (§3), since handles are used as
/// keys in the subscription registry, the pending table and the transaction
/// buffer. A handle that does not naturally support reference equality (no
/// `Rc`/`Arc` to compare by pointer) can embed a [`ConnectionId`] allocated
/// from an [`IdAllocator`] and derive `Eq`/`Hash` from that.
///
/// `F` is the frame type this connection transports; see [`Frame`](crate::frame::Frame).
pub trait Connection<F>: Clone + Eq + Hash {
	/// Whether this subscriber requires per-message acknowledgement.
	///
	/// At most one frame is ever in flight to a `reliable` connection at a
	/// time (I2/I3); a non-reliable connection is never tracked in the
	/// pending table and may receive any number of frames concurrently.
	fn reliable(&self) -> bool;

	/// Hand a frame to the transport.
	///
	/// Delivery is synchronous from the queue manager's perspective: by the
	/// time this is called the frame has already left the store (or been
	/// recorded as pending), so a returned [`TransportError`] is logged and
	/// swallowed rather than unwinding that bookkeeping (§6, §7). Transport
	/// level recovery is this connection's own responsibility; the protocol
	/// engine is expected to eventually call
	/// [`QueueManager::disconnect`](crate::manager::QueueManager::disconnect)
	/// once it observes the connection is dead.
	fn deliver(&self, frame: &F) -> Result<(), TransportError>;
}
