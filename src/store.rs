use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use fxhash::FxHashMap;

use crate::batch::{self, batch, in_batch, Reactive};
use crate::error::Target;
use crate::observer::{self, Callbacks, Observer, Observers, Subscription, Teardown};
use crate::{Derivation, Entry, Error, Init, Observable, ReactiveState, Refs, Result, State};

/// A named namespace of states, reactive states and child stores.
///
/// Stores form a strict tree: a child is only ever created by its parent
/// through [`Store::store`]. The store's own aggregate event fires when any
/// direct entry or direct child store changes, once aggregate binding has
/// been enabled by the first call to [`Store::bind`].
pub struct Store<V> {
	body: Rc<StoreBody<V>>,
}

struct StoreBody<V> {
	name: String,
	inner: RefCell<StoreInner<V>>,
	observers: RefCell<Observers<Store<V>>>,
	on_drops: RefCell<Callbacks<Teardown>>,
	queued: Cell<bool>,
}

struct StoreInner<V> {
	states: FxHashMap<String, Entry<V>>,
	stores: FxHashMap<String, Store<V>>,
	/// Set once aggregate binding is enabled; every entry and child relays
	/// its changes into this store through it.
	relay: Option<Rc<dyn Fn()>>,
	relays: FxHashMap<String, Subscription>,
	store_relays: FxHashMap<String, Subscription>,
}

impl<V> Clone for Store<V> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<V> Drop for StoreBody<V> {
	fn drop(&mut self) {
		let on_drops = std::mem::take(self.on_drops.get_mut());
		if !on_drops.is_empty() {
			tracing::debug!(store = %self.name, count = on_drops.len(), "running teardown");
		}
		for on_drop in on_drops {
			on_drop.call();
		}
	}
}

impl<V> Store<V> {
	pub fn name(&self) -> &str {
		&self.body.name
	}
}

impl<V> Store<V>
where
	V: Clone + PartialEq + 'static,
{
	pub fn new(name: impl Into<String>) -> Self {
		let name = name.into();
		tracing::debug!(store = %name, "created store");

		Store {
			body: Rc::new(StoreBody {
				name,
				inner: RefCell::new(StoreInner {
					states: FxHashMap::default(),
					stores: FxHashMap::default(),
					relay: None,
					relays: FxHashMap::default(),
					store_relays: FxHashMap::default(),
				}),
				observers: RefCell::new(Observers::default()),
				on_drops: RefCell::new(Callbacks::new()),
				queued: Cell::new(false),
			}),
		}
	}

	pub fn with_init(name: impl Into<String>, init: Init<V>) -> Result<Self> {
		let store = Store::new(name);
		store.state(init.states)?;
		store.state(init.state_keys)?;
		store.reactive(init.reactives)?;
		Ok(store)
	}

	/// Registers one state per `(key, value)` pair.
	///
	/// Pairs before a colliding key stay registered; the colliding pair and
	/// the ones after it are not registered.
	pub fn state<K>(&self, pairs: impl IntoIterator<Item = (K, V)>) -> Result<()>
	where
		K: Into<String>,
	{
		for (key, value) in pairs {
			self.insert(key.into(), Entry::State(State::new(value)))?;
		}

		Ok(())
	}

	/// Registers default-valued states.
	pub fn state_keys<K>(&self, keys: impl IntoIterator<Item = K>) -> Result<()>
	where
		K: Into<String>,
		V: Default,
	{
		self.state(keys.into_iter().map(|key| (key, V::default())))
	}

	/// Registers one reactive state per derivation, resolving its dependency
	/// keys against this store. Same partial registration as [`Store::state`].
	pub fn reactive(&self, derivations: impl IntoIterator<Item = Derivation<V>>) -> Result<()> {
		for derivation in derivations {
			let Derivation {
				key,
				formula,
				dependencies,
				external,
			} = derivation;

			if self.contains_key(&key) {
				return Err(redundant_key(key));
			}

			let mut entries = Vec::with_capacity(dependencies.len() + external.len());
			for dependency in &dependencies {
				entries.push(self.entry(dependency)?);
			}
			entries.extend(external);

			let reactive = ReactiveState::new(formula, entries)?;
			self.insert(key, Entry::Reactive(reactive))?;
		}

		Ok(())
	}

	/// Creates a child store and registers it under `name`.
	pub fn store(&self, name: impl Into<String>, init: Init<V>) -> Result<Store<V>> {
		let name = name.into();
		if self.contains_store(&name) {
			return Err(Error::redundancy(
				vec![Target::Store(name.clone())],
				format!("store \"{}\" has already existed", name),
			));
		}

		let child = Store::with_init(name.clone(), init)?;

		let relay = self.body.inner.borrow().relay.clone();
		let subscription = relay.map(|relay| child.subscribe(relay));

		let mut inner = self.body.inner.borrow_mut();
		if let Some(subscription) = subscription {
			inner.store_relays.insert(name.clone(), subscription);
		}
		inner.stores.insert(name.clone(), child.clone());

		tracing::debug!(store = %self.body.name, child = %name, "registered child store");
		Ok(child)
	}

	fn insert(&self, key: String, entry: Entry<V>) -> Result<()> {
		if self.contains_key(&key) {
			return Err(redundant_key(key));
		}

		let relay = self.body.inner.borrow().relay.clone();
		let subscription = relay.map(|relay| entry.subscribe(relay));

		tracing::debug!(store = %self.body.name, key = %key, kind = ?entry.kind(), "registered");

		let mut inner = self.body.inner.borrow_mut();
		if let Some(subscription) = subscription {
			inner.relays.insert(key.clone(), subscription);
		}
		inner.states.insert(key, entry);

		Ok(())
	}

	/// Deletes entries without notifying anyone.
	pub fn remove<K>(&self, keys: impl IntoIterator<Item = K>) -> Result<()>
	where
		K: AsRef<str>,
	{
		for key in keys {
			let key = key.as_ref();
			let (entry, relay) = {
				let mut inner = self.body.inner.borrow_mut();
				let entry = inner
					.states
					.remove(key)
					.ok_or_else(|| Error::MissingKey(key.to_owned()))?;
				(entry, inner.relays.remove(key))
			};

			std::mem::drop(relay);
			std::mem::drop(entry);
			tracing::debug!(store = %self.body.name, key = %key, "removed");
		}

		Ok(())
	}

	/// Detaches child stores and runs their teardown callbacks.
	pub fn drop_store<K>(&self, names: impl IntoIterator<Item = K>) -> Result<()>
	where
		K: AsRef<str>,
	{
		for name in names {
			let name = name.as_ref();
			let (child, relay) = {
				let mut inner = self.body.inner.borrow_mut();
				let child = inner
					.stores
					.remove(name)
					.ok_or_else(|| Error::MissingStore(name.to_owned()))?;
				(child, inner.store_relays.remove(name))
			};

			std::mem::drop(relay);
			tracing::debug!(store = %self.body.name, child = %name, "dropping child store");
			child.teardown();
		}

		Ok(())
	}

	/// Runs this store's teardown callbacks, then its descendants'.
	/// Each callback runs at most once over the lifetime of the store.
	fn teardown(&self) {
		let on_drops = std::mem::take(&mut *self.body.on_drops.borrow_mut());
		tracing::debug!(store = %self.body.name, count = on_drops.len(), "running teardown");
		for on_drop in on_drops {
			on_drop.call();
		}

		let children: Vec<Store<V>> = self.body.inner.borrow().stores.values().cloned().collect();
		for child in children {
			child.teardown();
		}
	}

	pub fn on_drop<K>(
		&self,
		names: impl IntoIterator<Item = K>,
		on_drops: impl IntoIterator<Item = Teardown>,
	) -> Result<()>
	where
		K: AsRef<str>,
	{
		let on_drops: Vec<Teardown> = on_drops.into_iter().collect();
		for name in names {
			self.get_store(name.as_ref())?
				.on_drop_self(on_drops.iter().cloned())?;
		}

		Ok(())
	}

	pub fn on_drop_self(&self, on_drops: impl IntoIterator<Item = Teardown>) -> Result<()> {
		observer::register(&mut self.body.on_drops.borrow_mut(), on_drops)
	}

	pub fn bind_states<K>(
		&self,
		keys: impl IntoIterator<Item = K>,
		observers: impl IntoIterator<Item = Observer<V>>,
	) -> Result<()>
	where
		K: AsRef<str>,
	{
		let observers: Vec<Observer<V>> = observers.into_iter().collect();
		for key in keys {
			self.entry(key.as_ref())?.bind(observers.iter().cloned())?;
		}

		Ok(())
	}

	pub fn bind_store<K>(
		&self,
		names: impl IntoIterator<Item = K>,
		observers: impl IntoIterator<Item = Observer<Store<V>>>,
	) -> Result<()>
	where
		K: AsRef<str>,
	{
		let observers: Vec<Observer<Store<V>>> = observers.into_iter().collect();
		for name in names {
			self.get_store(name.as_ref())?
				.bind(observers.iter().cloned())?;
		}

		Ok(())
	}

	/// Binds to the aggregate "something in this store changed" event.
	pub fn bind(&self, observers: impl IntoIterator<Item = Observer<Store<V>>>) -> Result<()> {
		self.enable_bind_self();
		self.body.observers.borrow_mut().bind(observers)
	}

	pub fn unbind<K>(
		&self,
		keys: impl IntoIterator<Item = K>,
		observers: impl IntoIterator<Item = Observer<V>>,
	) -> Result<()>
	where
		K: AsRef<str>,
	{
		let observers: Vec<Observer<V>> = observers.into_iter().collect();
		for key in keys {
			self.entry(key.as_ref())?.unbind(observers.iter().cloned())?;
		}

		Ok(())
	}

	pub fn unbind_store<K>(
		&self,
		names: impl IntoIterator<Item = K>,
		observers: impl IntoIterator<Item = Observer<Store<V>>>,
	) -> Result<()>
	where
		K: AsRef<str>,
	{
		let observers: Vec<Observer<Store<V>>> = observers.into_iter().collect();
		for name in names {
			self.get_store(name.as_ref())?
				.unbind_self(observers.iter().cloned())?;
		}

		Ok(())
	}

	pub fn unbind_self(&self, observers: impl IntoIterator<Item = Observer<Store<V>>>) -> Result<()> {
		self.body.observers.borrow_mut().unbind(observers)
	}

	/// Wires every current entry and child into the aggregate event. Entries
	/// and children added later are wired when they are registered.
	fn enable_bind_self(&self) {
		let (relay, entries, children) = {
			let mut inner = self.body.inner.borrow_mut();
			if inner.relay.is_some() {
				return;
			}

			let this = Rc::downgrade(&self.body);
			let relay: Rc<dyn Fn()> = Rc::new(move || {
				if let Some(body) = this.upgrade() {
					StoreBody::changed(&body);
				}
			});
			inner.relay = Some(relay.clone());

			let entries: Vec<(String, Entry<V>)> = inner
				.states
				.iter()
				.map(|(key, entry)| (key.clone(), entry.clone()))
				.collect();
			let children: Vec<(String, Store<V>)> = inner
				.stores
				.iter()
				.map(|(name, store)| (name.clone(), store.clone()))
				.collect();

			(relay, entries, children)
		};

		tracing::debug!(
			store = %self.body.name,
			entries = entries.len(),
			children = children.len(),
			"enabled aggregate binding"
		);

		let relays: Vec<(String, Subscription)> = entries
			.into_iter()
			.map(|(key, entry)| (key, entry.subscribe(relay.clone())))
			.collect();
		let store_relays: Vec<(String, Subscription)> = children
			.into_iter()
			.map(|(name, store)| (name, store.subscribe(relay.clone())))
			.collect();

		let mut inner = self.body.inner.borrow_mut();
		inner.relays.extend(relays);
		inner.store_relays.extend(store_relays);
	}

	/// Attaches an internal hook to the aggregate event, enabling it.
	pub(crate) fn subscribe(&self, hook: Rc<dyn Fn()>) -> Subscription {
		self.enable_bind_self();
		self.body.observers.borrow_mut().hook(hook.clone());
		let source = Rc::downgrade(&self.body);
		Subscription::new(move || {
			if let Some(body) = source.upgrade() {
				body.observers.borrow_mut().unhook(&hook);
			}
		})
	}

	/// Assigns `value` to every named state, as one batch.
	///
	/// Fails with [`Error::ReadOnly`] on a reactive state; keys before it
	/// have already been assigned.
	pub fn set<K>(&self, keys: impl IntoIterator<Item = K>, value: V) -> Result<()>
	where
		K: AsRef<str>,
	{
		batch(|| {
			for key in keys {
				let key = key.as_ref();
				match self.entry(key)? {
					Entry::State(state) => state.set(value.clone()),
					Entry::Reactive(_) => return Err(Error::ReadOnly(key.to_owned())),
				}
			}

			Ok(())
		})
	}

	pub fn get(&self, key: &str) -> Result<V> {
		Ok(self.entry(key)?.get())
	}

	pub fn gets<K>(&self, keys: impl IntoIterator<Item = K>) -> Result<Vec<V>>
	where
		K: AsRef<str>,
	{
		keys.into_iter().map(|key| self.get(key.as_ref())).collect()
	}

	pub fn gets_dict<K>(&self, keys: impl IntoIterator<Item = K>) -> Result<FxHashMap<String, V>>
	where
		K: AsRef<str>,
	{
		keys.into_iter()
			.map(|key| {
				let key = key.as_ref();
				Ok((key.to_owned(), self.get(key)?))
			})
			.collect()
	}

	pub fn entry(&self, key: &str) -> Result<Entry<V>> {
		self.body
			.inner
			.borrow()
			.states
			.get(key)
			.cloned()
			.ok_or_else(|| Error::MissingKey(key.to_owned()))
	}

	pub fn get_store(&self, name: &str) -> Result<Store<V>> {
		self.body
			.inner
			.borrow()
			.stores
			.get(name)
			.cloned()
			.ok_or_else(|| Error::MissingStore(name.to_owned()))
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.body.inner.borrow().states.contains_key(key)
	}

	pub fn contains_store(&self, name: &str) -> bool {
		self.body.inner.borrow().stores.contains_key(name)
	}

	pub fn keys(&self) -> Vec<String> {
		let mut keys: Vec<String> = self.body.inner.borrow().states.keys().cloned().collect();
		keys.sort();
		keys
	}

	pub fn store_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.body.inner.borrow().stores.keys().cloned().collect();
		names.sort();
		names
	}

	/// A bindable read-only view over `keys`.
	pub fn refs<K>(&self, keys: impl IntoIterator<Item = K>) -> Result<Refs<V>>
	where
		K: Into<String>,
	{
		Refs::new(self.clone(), keys.into_iter().map(Into::into).collect())
	}

	fn notify(&self) {
		Observers::notify(&self.body.observers, self);
	}
}

impl<V> StoreBody<V>
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

impl<V> Reactive for StoreBody<V>
where
	V: Clone + PartialEq + 'static,
{
	fn update(self: Rc<Self>) {
		self.queued.set(false);
		tracing::trace!(store = %self.name, "store changed");
		Store { body: self }.notify();
	}
}

fn redundant_key(key: String) -> Error {
	let message = format!("key \"{}\" has already existed", key);
	Error::redundancy(vec![Target::Key(key)], message)
}

impl<V> Debug for Store<V> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let inner = self.body.inner.borrow();
		let mut keys: Vec<&String> = inner.states.keys().collect();
		keys.sort();
		let mut stores: Vec<&String> = inner.stores.keys().collect();
		stores.sort();

		f.debug_struct("Store")
			.field("name", &self.body.name)
			.field("keys", &keys)
			.field("stores", &stores)
			.finish()
	}
}
