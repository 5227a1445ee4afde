use std::cell::RefCell;
use std::rc::Rc;

use crate::mapper::{Path, Value};

/// Observer invoked with `(destination, source, path)` at every assignment step.
pub type TraceHook = Box<dyn Fn(&Value, &Value, &Path)>;

/// One recorded assignment step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
	/// Assignment path.
	pub path: String,
	/// Destination type at this step.
	pub dst: String,
	/// Source type at this step.
	pub src: String,
}

/// Shared buffer of trace events, fed by the hook from [`TraceLog::hook`].
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
	events: Rc<RefCell<Vec<TraceEvent>>>,
}

impl TraceLog {
	/// Empty log.
	pub fn new() -> Self {
		Self::default()
	}

	/// Hook appending one event per step to this log.
	pub fn hook(&self) -> TraceHook {
		let events = Rc::clone(&self.events);
		Box::new(move |dst, src, path| {
			events.borrow_mut().push(TraceEvent {
				path: path.to_string(),
				dst: dst.ty().to_string(),
				src: src.ty().to_string(),
			});
		})
	}

	/// Snapshot of recorded events.
	pub fn events(&self) -> Vec<TraceEvent> {
		self.events.borrow().clone()
	}
}
