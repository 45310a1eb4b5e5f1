use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use fxhash::FxHashMap;

use crate::batch::{self, in_batch, Reactive};
use crate::observer::{Observer, Observers, Subscription};
use crate::{Error, Observable, Result, Store};

/// A read-only projection over some keys of a store.
///
/// It reads through to the store rather than copying values, and has its
/// own aggregate event firing when any projected entry changes.
pub struct Refs<V> {
	body: Rc<RefsBody<V>>,
}

struct RefsBody<V> {
	store: Store<V>,
	keys: Vec<String>,
	observers: RefCell<Observers<Refs<V>>>,
	queued: Cell<bool>,
	#[allow(unused)]
	subscriptions: Vec<Subscription>,
}

impl<V> Clone for Refs<V> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<V> Refs<V>
where
	V: Clone + PartialEq + 'static,
{
	pub(crate) fn new(store: Store<V>, keys: Vec<String>) -> Result<Self> {
		let entries = keys
			.iter()
			.map(|key| store.entry(key))
			.collect::<Result<Vec<_>>>()?;

		let body = Rc::new_cyclic(|this: &Weak<RefsBody<V>>| {
			let this = this.clone();
			let hook: Rc<dyn Fn()> = Rc::new(move || {
				if let Some(body) = this.upgrade() {
					RefsBody::changed(&body);
				}
			});

			RefsBody {
				subscriptions: entries
					.iter()
					.map(|entry| entry.subscribe(hook.clone()))
					.collect(),
				store,
				keys,
				observers: RefCell::new(Observers::default()),
				queued: Cell::new(false),
			}
		});

		Ok(Refs { body })
	}

	pub fn keys(&self) -> &[String] {
		&self.body.keys
	}

	pub fn store(&self) -> &Store<V> {
		&self.body.store
	}

	pub fn get(&self, key: &str) -> Result<V> {
		self.check(key)?;
		self.body.store.get(key)
	}

	pub fn gets_dict(&self) -> Result<FxHashMap<String, V>> {
		self.body.store.gets_dict(&self.body.keys)
	}

	/// Binds observers to some of the projected entries.
	pub fn bind_states<K>(
		&self,
		keys: impl IntoIterator<Item = K>,
		observers: impl IntoIterator<Item = Observer<V>>,
	) -> Result<()>
	where
		K: AsRef<str>,
	{
		let keys: Vec<K> = keys.into_iter().collect();
		for key in &keys {
			self.check(key.as_ref())?;
		}

		self.body.store.bind_states(keys, observers)
	}

	pub fn bind(&self, observers: impl IntoIterator<Item = Observer<Refs<V>>>) -> Result<()> {
		self.body.observers.borrow_mut().bind(observers)
	}

	pub fn unbind_self(&self, observers: impl IntoIterator<Item = Observer<Refs<V>>>) -> Result<()> {
		self.body.observers.borrow_mut().unbind(observers)
	}

	fn check(&self, key: &str) -> Result<()> {
		if self.body.keys.iter().any(|k| k == key) {
			Ok(())
		} else {
			Err(Error::MissingKey(key.to_owned()))
		}
	}

	fn notify(&self) {
		Observers::notify(&self.body.observers, self);
	}
}

impl<V> RefsBody<V>
where
	V: Clone + PartialEq + 'static,
{
	fn changed(body: &Rc<Self>) {
		// Entries only notify from inside the batch opened by `State::set`.
		debug_assert!(in_batch());
		if !body.queued.replace(true) {
			batch::defer(Rc::downgrade(body) as Weak<dyn Reactive>);
		}
	}
}

impl<V> Reactive for RefsBody<V>
where
	V: Clone + PartialEq + 'static,
{
	fn update(self: Rc<Self>) {
		self.queued.set(false);
		Refs { body: self }.notify();
	}
}

impl<V> Debug for Refs<V> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Refs")
			.field("store", &self.body.store.name())
			.field("keys", &self.body.keys)
			.finish()
	}
}
