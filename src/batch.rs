use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Something whose notification is deferred until the batch flushes.
pub(crate) trait Reactive {
	fn update(self: Rc<Self>);
}

thread_local! {
	static STARTED: Cell<bool> = const { Cell::new(false) };
	static CHANGED: RefCell<Vec<Weak<dyn Reactive>>> = const { RefCell::new(Vec::new()) };
}

pub fn in_batch() -> bool {
	STARTED.with(|started| started.get())
}

/// Runs `func` inside a batch.
///
/// Aggregate store and refs events raised inside the batch are queued,
/// deduplicated and delivered once the outermost batch ends. Every
/// `State::set` opens a batch implicitly; nested batches join the outer one.
pub fn batch<R>(func: impl FnOnce() -> R) -> R {
	let guard = BatchGuard::start();
	let result = func();
	if guard.is_root {
		batch_run();
	}

	result
}

pub(crate) fn defer(reactive: Weak<dyn Reactive>) {
	CHANGED.with(|changed| changed.borrow_mut().push(reactive));
}

struct BatchGuard {
	is_root: bool,
}

impl BatchGuard {
	fn start() -> Self {
		let is_root = STARTED.with(|started| !started.replace(true));
		BatchGuard { is_root }
	}
}

impl Drop for BatchGuard {
	fn drop(&mut self) {
		if self.is_root {
			STARTED.with(|started| started.set(false));
		}
	}
}

fn batch_run() {
	loop {
		let changed = CHANGED.with(|changed| std::mem::take(&mut *changed.borrow_mut()));

		if changed.is_empty() {
			break;
		}

		tracing::trace!(count = changed.len(), "flushing batch");

		let mut pending = Pending(changed.into_iter());
		while let Some(reactive) = pending.0.next() {
			if let Some(reactive) = reactive.upgrade() {
				reactive.update();
			}
		}
	}
}

/// Items of a flush that have not been delivered yet.
///
/// A panicking observer unwinds through the flush; the undelivered items go
/// back to the front of the queue so the next batch delivers them.
struct Pending(std::vec::IntoIter<Weak<dyn Reactive>>);

impl Drop for Pending {
	fn drop(&mut self) {
		let rest: Vec<Weak<dyn Reactive>> = self.0.by_ref().collect();
		if rest.is_empty() {
			return;
		}

		CHANGED.with(|changed| {
			let mut changed = changed.borrow_mut();
			let queued = std::mem::replace(&mut *changed, rest);
			changed.extend(queued);
		});
	}
}
