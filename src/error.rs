//! Error types surfaced by the queue manager and its collaborators.

use std::error::Error;
use std::fmt;

/// An error raised by a [`QueueStore`](crate::store::QueueStore) implementation.
///
/// The store is an external collaborator (§6); this crate never inspects the
/// reason for a store failure, only that one occurred.
#[derive(Debug)]
pub struct StoreError(pub Box<dyn Error + Send + Sync>);

impl StoreError {
	/// Wrap an arbitrary error as a [`StoreError`].
	pub fn new<E: Error + Send + Sync + 'static>(error: E) -> Self {
		Self(Box::new(error))
	}
}

impl fmt::Display for StoreError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "queue store error: {}", self.0)
	}
}

impl Error for StoreError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		Some(self.0.as_ref())
	}
}

/// An error raised attempting to hand a frame to a [`Connection`](crate::connection::Connection).
///
/// Never propagated out of [`QueueManager`](crate::manager::QueueManager) — per
/// the connection contract (§6) it is logged and swallowed, recovery happens
/// later through `disconnect`.
#[derive(Debug)]
pub struct TransportError(pub Box<dyn Error + Send + Sync>);

impl TransportError {
	/// Wrap an arbitrary error as a [`TransportError`].
	pub fn new<E: Error + Send + Sync + 'static>(error: E) -> Self {
		Self(Box::new(error))
	}
}

impl fmt::Display for TransportError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "transport error delivering frame: {}", self.0)
	}
}

impl Error for TransportError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		Some(self.0.as_ref())
	}
}

/// An error raised by a public [`QueueManager`](crate::manager::QueueManager) operation.
#[derive(Debug)]
pub enum QueueError {
	/// `send` was called with a frame that has no destination.
	BadFrame,
	/// The reliable send path found a connection already present in the
	/// pending table, violating I2. Indicates a bug upstream of this crate:
	/// the only way to reach the reliable send path is through code that is
	/// supposed to have already checked for this.
	InternalInvariant(&'static str),
	/// The backing [`QueueStore`](crate::store::QueueStore) failed.
	Store(StoreError),
}

impl fmt::Display for QueueError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			QueueError::BadFrame => write!(f, "frame has no destination"),
			QueueError::InternalInvariant(what) => write!(f, "internal invariant violated: {}", what),
			QueueError::Store(error) => error.fmt(f),
		}
	}
}

impl Error for QueueError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			QueueError::Store(error) => Some(error),
			_ => None,
		}
	}
}

impl From<StoreError> for QueueError {
	fn from(error: StoreError) -> Self {
		QueueError::Store(error)
	}
}
