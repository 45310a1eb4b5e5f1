use std::cell::RefCell;
use std::fmt::{self, Debug, Display};
use std::rc::Rc;

use smallvec::SmallVec;

use crate::error::{Error, Result, Target};

/// Identity of a callback handle: the address of its allocation.
///
/// Two handles compare equal only when one is a clone of the other,
/// never because the wrapped closures look alike.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallbackId(usize);

impl CallbackId {
	fn of<T: ?Sized>(ptr: &Rc<T>) -> Self {
		CallbackId(Rc::as_ptr(ptr) as *const () as usize)
	}
}

impl Debug for CallbackId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "CallbackId({:#x})", self.0)
	}
}

impl Display for CallbackId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:#x}", self.0)
	}
}

pub(crate) trait Callback: Clone {
	fn id(&self) -> CallbackId;
}

/// A change observer receiving the new value.
pub struct Observer<T> {
	func: Rc<dyn Fn(&T)>,
}

impl<T> Observer<T> {
	pub fn new(func: impl Fn(&T) + 'static) -> Self {
		Observer {
			func: Rc::new(func),
		}
	}

	pub fn id(&self) -> CallbackId {
		CallbackId::of(&self.func)
	}

	#[inline]
	pub fn call(&self, value: &T) {
		(self.func)(value)
	}
}

impl<T> Clone for Observer<T> {
	fn clone(&self) -> Self {
		Observer {
			func: self.func.clone(),
		}
	}
}

impl<T> PartialEq for Observer<T> {
	fn eq(&self, other: &Self) -> bool {
		self.id() == other.id()
	}
}

impl<T> Eq for Observer<T> {}

impl<T> Debug for Observer<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Observer").field(&self.id()).finish()
	}
}

impl<T> Callback for Observer<T> {
	fn id(&self) -> CallbackId {
		Observer::id(self)
	}
}

/// A store teardown callback.
#[derive(Clone)]
pub struct Teardown {
	func: Rc<dyn Fn()>,
}

impl Teardown {
	pub fn new(func: impl Fn() + 'static) -> Self {
		Teardown {
			func: Rc::new(func),
		}
	}

	pub fn id(&self) -> CallbackId {
		CallbackId::of(&self.func)
	}

	#[inline]
	pub fn call(&self) {
		(self.func)()
	}
}

impl PartialEq for Teardown {
	fn eq(&self, other: &Self) -> bool {
		self.id() == other.id()
	}
}

impl Eq for Teardown {}

impl Debug for Teardown {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Teardown").field(&self.id()).finish()
	}
}

impl Callback for Teardown {
	fn id(&self) -> CallbackId {
		Teardown::id(self)
	}
}

pub(crate) type Callbacks<C> = SmallVec<[C; 4]>;

/// Adds every callback that is not registered yet, then reports the ones
/// that were, in the order they were supplied.
pub(crate) fn register<C: Callback>(
	list: &mut Callbacks<C>,
	callbacks: impl IntoIterator<Item = C>,
) -> Result<()> {
	let mut redundant = Vec::new();
	for callback in callbacks {
		let id = callback.id();
		if list.iter().any(|c| c.id() == id) {
			redundant.push(Target::Callback(id));
		} else {
			list.push(callback);
		}
	}

	if redundant.is_empty() {
		Ok(())
	} else {
		Err(Error::redundancy(redundant, "redundant callback was given"))
	}
}

/// Removes callbacks one by one; an empty input clears the list.
pub(crate) fn deregister<C: Callback>(
	list: &mut Callbacks<C>,
	callbacks: impl IntoIterator<Item = C>,
) -> Result<()> {
	let mut callbacks = callbacks.into_iter().peekable();
	if callbacks.peek().is_none() {
		list.clear();
		return Ok(());
	}

	for callback in callbacks {
		let id = callback.id();
		match list.iter().position(|c| c.id() == id) {
			Some(index) => {
				list.remove(index);
			}
			None => return Err(Error::NotBound(id)),
		}
	}

	Ok(())
}

/// Internal edge from a source to something that depends on it.
pub(crate) type Hook = Rc<dyn Fn()>;

/// Observer bookkeeping shared by states, reactive states, stores and refs.
///
/// Hooks are internal wiring (recompute routines, store relays) and are
/// kept apart from user observers so that clearing the observers never
/// disconnects the dependency graph.
pub(crate) struct Observers<T> {
	bound: Callbacks<Observer<T>>,
	hooks: SmallVec<[Hook; 2]>,
}

impl<T> Default for Observers<T> {
	fn default() -> Self {
		Observers {
			bound: SmallVec::new(),
			hooks: SmallVec::new(),
		}
	}
}

impl<T> Observers<T> {
	pub fn bind(&mut self, observers: impl IntoIterator<Item = Observer<T>>) -> Result<()> {
		register(&mut self.bound, observers)
	}

	pub fn unbind(&mut self, observers: impl IntoIterator<Item = Observer<T>>) -> Result<()> {
		deregister(&mut self.bound, observers)
	}

	pub fn clear(&mut self) {
		self.bound.clear();
	}

	pub fn hook(&mut self, hook: Hook) {
		self.hooks.push(hook);
	}

	pub fn unhook(&mut self, hook: &Hook) {
		if let Some(index) = self.hooks.iter().position(|h| Rc::ptr_eq(h, hook)) {
			self.hooks.remove(index);
		}
	}

	pub fn len(&self) -> usize {
		self.bound.len()
	}

	/// Runs hooks first, then user observers, on a snapshot taken before
	/// any of them is called. No borrow is held while they run.
	pub fn notify(cell: &RefCell<Self>, value: &T) {
		let (hooks, bound) = {
			let observers = cell.borrow();
			(observers.hooks.clone(), observers.bound.clone())
		};

		tracing::trace!(hooks = hooks.len(), observers = bound.len(), "notify");

		for hook in hooks {
			hook();
		}
		for observer in bound {
			observer.call(value);
		}
	}
}

/// Detaches an internal hook from its source when dropped.
///
/// Holds the source weakly, so it never keeps a dependency alive.
#[must_use]
pub struct Subscription {
	detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
	pub(crate) fn new(detach: impl FnOnce() + 'static) -> Self {
		Subscription {
			detach: Some(Box::new(detach)),
		}
	}

	pub fn detach(mut self) {
		if let Some(detach) = self.detach.take() {
			detach()
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(detach) = self.detach.take() {
			detach()
		}
	}
}

impl Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("attached", &self.detach.is_some())
			.finish()
	}
}
