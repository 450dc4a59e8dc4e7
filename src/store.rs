use std::{
	cell::RefCell,
	collections::HashMap,
	rc::Rc,
	time::{Duration, Instant},
};

use log::*;
use tokio::{select, sync::oneshot, time::sleep};

// One entry per fully qualified query name that ever carried two
// addresses. The timestamp is the first observation and is never
// touched again, repeat lookups only read.
pub struct SeenStore {
	entries: HashMap<String, Instant>,
}

#[derive(Clone, Copy)]
#[cfg_attr(test, derive(Debug, PartialEq, Eq))]
pub enum Observation {
	First,
	Repeat,
}

impl SeenStore {
	pub fn new() -> SeenStore {
		SeenStore {
			entries: HashMap::new(),
		}
	}

	// check and insert in one exclusive section, the first caller for a
	// name wins and every later caller sees Repeat until a sweep
	pub fn observe_or_recall(&mut self, name: &str) -> Observation {
		match self.entries.get(name) {
			Some(_) => Observation::Repeat,
			_ => {
				self.entries.insert(name.to_string(), Instant::now());
				Observation::First
			}
		}
	}

	pub fn sweep(&mut self, max_age: Duration) {
		let now = Instant::now();
		let before = self.entries.len();
		self.entries.retain(|_, first_seen| now - *first_seen < max_age);
		info!("sweep: {} entries before, {} after", before, self.entries.len());
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}
}

impl Default for SeenStore {
	fn default() -> Self {
		Self::new()
	}
}

pub async fn sweep_task(
	mut quit_signal: oneshot::Receiver<()>,
	store: Rc<RefCell<SeenStore>>,
	max_age: Duration,
	interval: Duration,
) {
	loop {
		select! {
			_ = sleep(interval) => {
				store.borrow_mut().sweep(max_age);
			}
			_ = &mut quit_signal => {
				info!("sweep exiting");
				break;
			}
		}
	}
}
