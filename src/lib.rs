//! Dispatch core for a STOMP-family publish/subscribe broker.
//!
//! This crate is the **Queue Manager**: it decides which subscriber receives
//! which message, persists messages when no one is ready, tracks in-flight
//! deliveries to reliable subscribers, and cooperates with transactional
//! acknowledgement so aborted transactions redeliver. Everything around it —
//! wire-protocol parsing, TCP accept loops, authentication, durable-store
//! internals, topic (broadcast) semantics, cluster replication — is out of
//! scope and lives in the embedding protocol engine; this crate only defines
//! the contracts those collaborators must satisfy ([`Connection`],
//! [`Frame`], [`QueueStore`]).
//!
//! # Example
//!
//! ```
//! use queue_manager::{QueueManager, Connection, Frame};
//! use queue_manager::scheduler::{FavorReliableScheduler, RandomQueueScheduler};
//! use queue_manager::store::MemoryStore;
//! use std::collections::HashMap;
//!
//! #[derive(Clone, Debug, Default, PartialEq, Eq)]
//! struct SimpleFrame {
//!     destination: Option<String>,
//!     headers: HashMap<String, String>,
//! }
//!
//! impl Frame for SimpleFrame {
//!     fn destination(&self) -> Option<&str> { self.destination.as_deref() }
//!     fn header(&self, name: &str) -> Option<&str> { self.headers.get(name).map(String::as_str) }
//!     fn set_header(&mut self, name: &str, value: String) { self.headers.insert(name.to_owned(), value); }
//!     fn set_command(&mut self, _command: &str) {}
//! }
//!
//! #[derive(Clone, PartialEq, Eq, Hash)]
//! struct LoggingConnection(u64);
//!
//! impl Connection<SimpleFrame> for LoggingConnection {
//!     fn reliable(&self) -> bool { false }
//!     fn deliver(&self, _frame: &SimpleFrame) -> Result<(), queue_manager::TransportError> {
//!         Ok(())
//!     }
//! }
//!
//! let qm = QueueManager::new(MemoryStore::new(), FavorReliableScheduler, RandomQueueScheduler);
//! qm.subscribe(LoggingConnection(1), "/queue/greetings".to_owned()).unwrap();
//! qm.send(SimpleFrame { destination: Some("/queue/greetings".to_owned()), ..Default::default() }).unwrap();
//! ```

#![warn(clippy::all)]

pub mod connection;
pub mod error;
pub mod frame;
pub mod manager;
pub mod scheduler;
pub mod store;

pub use connection::Connection;
pub use error::{QueueError, StoreError, TransportError};
pub use frame::Frame;
pub use manager::QueueManager;
pub use store::QueueStore;
