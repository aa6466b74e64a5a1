//! End-to-end exercises of the queue manager's seed scenarios, against
//! `MemoryStore` and the reference schedulers.

use queue_manager::scheduler::{FavorReliableScheduler, RandomQueueScheduler};
use queue_manager::store::MemoryStore;
use queue_manager::{Connection, Frame, QueueManager, TransportError};

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct StompFrame {
	command: String,
	destination: Option<String>,
	headers: HashMap<String, String>,
}

impl StompFrame {
	fn new(destination: &str, message_id: Option<&str>) -> Self {
		let mut frame = Self {
			command: "SEND".to_owned(),
			destination: Some(destination.to_owned()),
			headers: HashMap::new(),
		};
		if let Some(id) = message_id {
			frame.set_header("message-id", id.to_owned());
		}
		frame
	}

	fn no_destination() -> Self {
		Self { command: "SEND".to_owned(), destination: None, headers: HashMap::new() }
	}
}

impl Frame for StompFrame {
	fn destination(&self) -> Option<&str> {
		self.destination.as_deref()
	}

	fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).map(String::as_str)
	}

	fn set_header(&mut self, name: &str, value: String) {
		self.headers.insert(name.to_owned(), value);
	}

	fn set_command(&mut self, command: &str) {
		self.command = command.to_owned();
	}
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone)]
struct Subscriber {
	id: u64,
	reliable: bool,
	inbox: Rc<RefCell<Vec<StompFrame>>>,
}

impl Subscriber {
	fn new(reliable: bool) -> Self {
		Self {
			id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
			reliable,
			inbox: Rc::new(RefCell::new(Vec::new())),
		}
	}

	fn inbox(&self) -> Vec<StompFrame> {
		self.inbox.borrow().clone()
	}
}

impl PartialEq for Subscriber {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}
impl Eq for Subscriber {}
impl std::hash::Hash for Subscriber {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl Connection<StompFrame> for Subscriber {
	fn reliable(&self) -> bool {
		self.reliable
	}

	fn deliver(&self, frame: &StompFrame) -> Result<(), TransportError> {
		self.inbox.borrow_mut().push(frame.clone());
		Ok(())
	}
}

type Manager = QueueManager<Subscriber, StompFrame, MemoryStore<StompFrame>, FavorReliableScheduler, RandomQueueScheduler>;

fn new_manager() -> Manager {
	QueueManager::new(MemoryStore::new(), FavorReliableScheduler, RandomQueueScheduler)
}

#[test]
fn scenario_1_enqueue_when_no_subscribers() {
	let qm = new_manager();

	assert!(qm.send(StompFrame::no_destination()).is_err());

	qm.send(StompFrame::new("/q/a", None)).unwrap();
	assert!(qm.store().has_frames("/q/a").unwrap());
}

#[test]
fn scenario_2_immediate_delivery_non_reliable() {
	let qm = new_manager();
	let c1 = Subscriber::new(false);

	qm.subscribe(c1.clone(), "/q/a".to_owned()).unwrap();
	qm.send(StompFrame::new("/q/a", None)).unwrap();

	assert_eq!(c1.inbox().len(), 1);
	assert!(!qm.store().has_frames("/q/a").unwrap());
}

#[test]
fn scenario_3_reliable_in_flight_then_ack_releases_next() {
	let qm = new_manager();
	let c1 = Subscriber::new(true);

	qm.subscribe(c1.clone(), "/q/a".to_owned()).unwrap();
	qm.send(StompFrame::new("/q/a", Some("m1"))).unwrap();
	qm.send(StompFrame::new("/q/a", Some("m2"))).unwrap();

	assert_eq!(c1.inbox().len(), 1);
	assert_eq!(c1.inbox()[0].message_id(), Some("m1"));
	assert!(qm.store().has_frames("/q/a").unwrap());

	qm.ack(&c1, &StompFrame::new("/q/a", Some("m1")), None).unwrap();

	assert_eq!(c1.inbox().len(), 2);
	assert_eq!(c1.inbox()[1].message_id(), Some("m2"));
}

#[test]
fn scenario_4_mismatched_ack_requeues_and_redelivers() {
	let qm = new_manager();
	let c1 = Subscriber::new(true);

	qm.subscribe(c1.clone(), "/q/a".to_owned()).unwrap();
	qm.send(StompFrame::new("/q/a", Some("m1"))).unwrap();
	qm.send(StompFrame::new("/q/a", Some("m2"))).unwrap();

	qm.ack(&c1, &StompFrame::new("/q/a", Some("mX")), None).unwrap();

	// m1 goes back to the head of the store, then the now-idle c1 is handed
	// it straight back by the backlog drain; only m2 is left behind.
	assert_eq!(c1.inbox().len(), 2);
	assert_eq!(c1.inbox()[1].message_id(), Some("m1"));
	assert_eq!(qm.store().dequeue("/q/a").unwrap().unwrap().message_id(), Some("m2"));
}

#[test]
fn scenario_5_transactional_abort_redelivers() {
	let qm = new_manager();
	let c1 = Subscriber::new(true);

	qm.subscribe(c1.clone(), "/q/a".to_owned()).unwrap();
	qm.send(StompFrame::new("/q/a", Some("m1"))).unwrap();

	qm.ack(&c1, &StompFrame::new("/q/a", Some("m1")), Some("t1".to_owned())).unwrap();
	qm.resend_transaction_frames(&c1, "t1").unwrap();

	assert_eq!(c1.inbox().len(), 2);
	assert_eq!(c1.inbox()[1].message_id(), Some("m1"));

	// Still present until explicitly cleared.
	qm.clear_transaction_frames(&c1, "t1");
}

#[test]
fn scenario_6_disconnect_with_pending_requeues_and_forgets() {
	let qm = new_manager();
	let c1 = Subscriber::new(true);

	qm.subscribe(c1.clone(), "/q/a".to_owned()).unwrap();
	qm.send(StompFrame::new("/q/a", Some("m1"))).unwrap();

	qm.disconnect(&c1).unwrap();

	assert!(qm.store().has_frames("/q/a").unwrap());

	// Nothing left referencing c1: a late ack or a second disconnect is a no-op.
	qm.ack(&c1, &StompFrame::new("/q/a", Some("m1")), None).unwrap();
	qm.disconnect(&c1).unwrap();
}

#[test]
fn unrelated_destinations_do_not_block_each_other() {
	let qm = new_manager();
	let c1 = Subscriber::new(true);

	qm.subscribe(c1.clone(), "/q/a".to_owned()).unwrap();
	qm.subscribe(c1.clone(), "/q/b".to_owned()).unwrap();

	qm.send(StompFrame::new("/q/a", Some("a1"))).unwrap();
	assert_eq!(c1.inbox().len(), 1);

	// c1 is pending for /q/a; a message on /q/b still can't reach it (I2 is
	// per-connection, not per-destination), so it queues up.
	qm.send(StompFrame::new("/q/b", Some("b1"))).unwrap();
	assert_eq!(c1.inbox().len(), 1);
	assert!(qm.store().has_frames("/q/b").unwrap());

	// Acking /q/a's frame frees the connection; the drain picks whichever
	// backlogged destination the queue scheduler lands on next.
	qm.ack(&c1, &StompFrame::new("/q/a", Some("a1")), None).unwrap();
	assert_eq!(c1.inbox().len(), 2);
}
