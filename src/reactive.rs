use std::cell::{Ref, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use crate::dependencies::{Dependencies, NonEmpty, Subscriptions};
use crate::observer::{Observer, Observers, Subscription};
use crate::{Error, Observable, Result, State};

/// A value derived from its dependencies by a pure formula.
///
/// The value is recomputed eagerly whenever a dependency notifies and cached;
/// reading never recomputes. Observers are notified only when the formula's
/// output actually changes.
pub struct ReactiveState<T> {
	body: Rc<ReactiveBody<T>>,
}

struct ReactiveBody<T> {
	value: RefCell<T>,
	observers: RefCell<Observers<T>>,
	formula: Box<dyn Fn() -> T>,
	// Detaches the recompute hook from every dependency on drop.
	#[allow(unused)]
	subscriptions: Subscriptions,
}

impl<T> Clone for ReactiveState<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T> ReactiveState<T>
where
	T: Clone + PartialEq + 'static,
{
	/// Evaluates `formula` over the current dependency values and subscribes
	/// to every dependency.
	///
	/// Fails with [`Error::Essential`] when `dependencies` is empty.
	pub fn new<D, F>(formula: F, dependencies: D) -> Result<Self>
	where
		D: Dependencies,
		F: Fn(D::Values) -> T + 'static,
	{
		if dependencies.is_empty() {
			return Err(Error::essential(
				"reactive state needs at least one dependency",
			));
		}

		Ok(Self::build(formula, dependencies))
	}

	/// Like [`ReactiveState::new`] for dependency lists that are never empty.
	pub fn derive<D, F>(formula: F, dependencies: D) -> Self
	where
		D: NonEmpty,
		F: Fn(D::Values) -> T + 'static,
	{
		Self::build(formula, dependencies)
	}

	fn build<D, F>(formula: F, dependencies: D) -> Self
	where
		D: Dependencies,
		F: Fn(D::Values) -> T + 'static,
	{
		let value = formula(dependencies.values());

		let body = Rc::new_cyclic(|this: &Weak<ReactiveBody<T>>| {
			let this = this.clone();
			let hook: Rc<dyn Fn()> = Rc::new(move || {
				if let Some(body) = this.upgrade() {
					body.recompute();
				}
			});

			let subscriptions = dependencies.subscribe(&hook);

			ReactiveBody {
				value: RefCell::new(value),
				observers: RefCell::new(Observers::default()),
				formula: Box::new(move || formula(dependencies.values())),
				subscriptions,
			}
		});

		ReactiveState { body }
	}

	pub fn map<F, R>(&self, func: F) -> ReactiveState<R>
	where
		F: Fn(&T) -> R + 'static,
		R: Clone + PartialEq + 'static,
	{
		ReactiveState::derive(move |(value,): (T,)| func(&value), (self.clone(),))
	}

	#[inline]
	pub fn get(&self) -> T {
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

impl<T> ReactiveBody<T>
where
	T: Clone + PartialEq + 'static,
{
	/// Re-reads every dependency; the value that triggered the call is
	/// irrelevant.
	fn recompute(&self) {
		let next = (self.formula)();

		let mut value = self.value.borrow_mut();
		if *value == next {
			tracing::trace!("reactive state recomputed, unchanged");
			return;
		}

		*value = next.clone();
		std::mem::drop(value);

		tracing::trace!(
			observers = self.observers.borrow().len(),
			"reactive state changed"
		);
		Observers::notify(&self.observers, &next);
	}
}

impl<T> State<T>
where
	T: Clone + PartialEq + 'static,
{
	pub fn map<F, R>(&self, func: F) -> ReactiveState<R>
	where
		F: Fn(&T) -> R + 'static,
		R: Clone + PartialEq + 'static,
	{
		ReactiveState::derive(move |(value,): (T,)| func(&value), (self.clone(),))
	}
}

impl<T> Observable for ReactiveState<T>
where
	T: Clone + PartialEq + 'static,
{
	type Value = T;

	fn get(&self) -> T {
		ReactiveState::get(self)
	}

	fn bind(&self, observers: impl IntoIterator<Item = Observer<T>>) -> Result<()> {
		ReactiveState::bind(self, observers)
	}

	fn unbind(&self, observers: impl IntoIterator<Item = Observer<T>>) -> Result<()> {
		ReactiveState::unbind(self, observers)
	}

	fn unbind_all(&self) {
		ReactiveState::unbind_all(self)
	}

	fn subscribe(&self, hook: Rc<dyn Fn()>) -> Subscription {
		ReactiveState::subscribe(self, hook)
	}
}

impl<T> Debug for ReactiveState<T>
where
	T: Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("ReactiveState")
			.field(&*self.body.value.borrow())
			.finish()
	}
}
