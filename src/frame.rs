//! The opaque message object the queue manager dispatches.

use uuid::Uuid;

/// Header name the core looks for and assigns (§3, §4.5).
pub const MESSAGE_ID_HEADER: &str = "message-id";

/// Command tag every frame is normalized to before it leaves the core (I5).
pub const MESSAGE_COMMAND: &str = "MESSAGE";

/// A named channel a frame is addressed to, or a connection is subscribed to.
///
/// An opaque string as far as this crate is concerned — `/queue/foo` vs.
/// `/topic/foo` structure, if any, is the protocol engine's business (§3).
pub type Destination = String;

/// A client-scoped grouping of ACKs that can be committed or aborted (§4.7).
pub type TransactionId = String;

/// The opaque message object passed through [`QueueManager`](crate::manager::QueueManager).
///
/// Implementors own their payload; the core only ever touches the
/// destination, the command tag and the `message-id` header.
pub trait Frame: Clone {
	/// The destination this frame is addressed to, if any.
	///
	/// Required for `send` (§4.5); frames already resident in the pending
	/// table or a transaction buffer always have one, since they can only
	/// get there after a prior successful `send`.
	fn destination(&self) -> Option<&str>;

	/// Read a header value by name.
	fn header(&self, name: &str) -> Option<&str>;

	/// Set a header value by name, overwriting any previous value.
	fn set_header(&mut self, name: &str, value: String);

	/// Set the command tag.
	fn set_command(&mut self, command: &str);

	/// The `message-id` header, once assigned.
	#[inline]
	fn message_id(&self) -> Option<&str> {
		self.header(MESSAGE_ID_HEADER)
	}

	/// Normalize the frame on entry to `send` (§4.5): stamp the command tag
	/// as `MESSAGE` and assign a fresh `message-id` if one isn't already
	/// present. Idempotent — resending an already-normalized frame is a
	/// no-op here.
	fn normalize_for_dispatch(&mut self) {
		self.set_command(MESSAGE_COMMAND);
		if self.message_id().is_none() {
			self.set_header(MESSAGE_ID_HEADER, Uuid::new_v4().to_string());
		}
	}
}
