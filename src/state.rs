use std::cell::{Ref, RefCell};
use std::fmt::Debug;
use std::rc::Rc;

use crate::batch::batch;
use crate::observer::{Observer, Observers, Subscription};
use crate::{Observable, Result};

/// A mutable observable value.
///
/// Cloning the handle shares the state.
pub struct State<T> {
	body: Rc<StateBody<T>>,
}

struct StateBody<T> {
	value: RefCell<T>,
	observers: RefCell<Observers<T>>,
}

impl<T> Clone for State<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T> Default for State<T>
where
	T: Default + 'static,
{
	fn default() -> Self {
		State::new(Default::default())
	}
}

impl<T> State<T>
where
	T: 'static,
{
	pub fn new(value: T) -> Self {
		State {
			body: Rc::new(StateBody {
				value: RefCell::new(value),
				observers: RefCell::new(Observers::default()),
			}),
		}
	}

	#[inline]
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		self.body.value.borrow().clone()
	}

	#[inline]
	pub fn get_ref(&self) -> Ref<'_, T> {
		self.body.value.borrow()
	}

	#[inline]
	pub fn with<R>(&self, func: impl FnOnce(&T) -> R) -> R {
		func(&self.body.value.borrow())
	}

	/// Stores `value` and notifies observers, unless it equals the current one.
	pub fn set(&self, value: T)
	where
		T: Clone + PartialEq,
	{
		let _ = self.replace(value);
	}

	pub fn replace(&self, value: T) -> T
	where
		T: Clone + PartialEq,
	{
		let mut current = self.body.value.borrow_mut();
		if *current == value {
			return value;
		}

		let old = std::mem::replace(&mut *current, value.clone());
		std::mem::drop(current);
		self.body.changed(&value);

		old
	}

	pub fn update(&self, func: impl FnOnce(&mut T))
	where
		T: Clone + PartialEq,
	{
		let mut next = self.get();
		func(&mut next);
		self.set(next);
	}

	pub fn bind(&self, observers: impl IntoIterator<Item = Observer<T>>) -> Result<()> {
		self.body.observers.borrow_mut().bind(observers)
	}

	pub fn unbind(&self, observers: impl IntoIterator<Item = Observer<T>>) -> Result<()> {
		self.body.observers.borrow_mut().unbind(observers)
	}

	pub fn unbind_all(&self) {
		self.body.observers.borrow_mut().clear()
	}

	pub(crate) fn subscribe(&self, hook: Rc<dyn Fn()>) -> Subscription {
		self.body.observers.borrow_mut().hook(hook.clone());
		let source = Rc::downgrade(&self.body);
		Subscription::new(move || {
			if let Some(body) = source.upgrade() {
				body.observers.borrow_mut().unhook(&hook);
			}
		})
	}
}

impl<T> StateBody<T> {
	fn changed(&self, value: &T) {
		tracing::trace!(observers = self.observers.borrow().len(), "state changed");
		batch(|| Observers::notify(&self.observers, value));
	}
}

impl<T> Observable for State<T>
where
	T: Clone + PartialEq + 'static,
{
	type Value = T;

	fn get(&self) -> T {
		State::get(self)
	}

	fn bind(&self, observers: impl IntoIterator<Item = Observer<T>>) -> Result<()> {
		State::bind(self, observers)
	}

	fn unbind(&self, observers: impl IntoIterator<Item = Observer<T>>) -> Result<()> {
		State::unbind(self, observers)
	}

	fn unbind_all(&self) {
		State::unbind_all(self)
	}

	fn subscribe(&self, hook: Rc<dyn Fn()>) -> Subscription {
		State::subscribe(self, hook)
	}
}

impl<T> Debug for State<T>
where
	T: Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("State").field(&*self.body.value.borrow()).finish()
	}
}
