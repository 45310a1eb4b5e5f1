use std::fmt::Debug;
use std::rc::Rc;

use crate::observer::{Observer, Subscription};
use crate::{Observable, ReactiveState, Result, State};

/// A value held under a store key: either a plain state or a reactive one.
pub enum Entry<V> {
	State(State<V>),
	Reactive(ReactiveState<V>),
}

impl<V> Clone for Entry<V> {
	fn clone(&self) -> Self {
		match self {
			Entry::State(state) => Entry::State(state.clone()),
			Entry::Reactive(reactive) => Entry::Reactive(reactive.clone()),
		}
	}
}

impl<V> Entry<V> {
	pub fn kind(&self) -> Kind {
		match self {
			Entry::State(_) => Kind::State,
			Entry::Reactive(_) => Kind::Reactive,
		}
	}

	pub fn as_state(&self) -> Option<&State<V>> {
		match self {
			Entry::State(state) => Some(state),
			Entry::Reactive(_) => None,
		}
	}

	pub fn as_reactive(&self) -> Option<&ReactiveState<V>> {
		match self {
			Entry::State(_) => None,
			Entry::Reactive(reactive) => Some(reactive),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
	State,
	Reactive,
}

impl<V> From<State<V>> for Entry<V> {
	fn from(state: State<V>) -> Self {
		Entry::State(state)
	}
}

impl<V> From<ReactiveState<V>> for Entry<V> {
	fn from(reactive: ReactiveState<V>) -> Self {
		Entry::Reactive(reactive)
	}
}

impl<V> Observable for Entry<V>
where
	V: Clone + PartialEq + 'static,
{
	type Value = V;

	fn get(&self) -> V {
		match self {
			Entry::State(state) => state.get(),
			Entry::Reactive(reactive) => reactive.get(),
		}
	}

	fn bind(&self, observers: impl IntoIterator<Item = Observer<V>>) -> Result<()> {
		match self {
			Entry::State(state) => state.bind(observers),
			Entry::Reactive(reactive) => reactive.bind(observers),
		}
	}

	fn unbind(&self, observers: impl IntoIterator<Item = Observer<V>>) -> Result<()> {
		match self {
			Entry::State(state) => state.unbind(observers),
			Entry::Reactive(reactive) => reactive.unbind(observers),
		}
	}

	fn unbind_all(&self) {
		match self {
			Entry::State(state) => state.unbind_all(),
			Entry::Reactive(reactive) => reactive.unbind_all(),
		}
	}

	fn subscribe(&self, hook: Rc<dyn Fn()>) -> Subscription {
		match self {
			Entry::State(state) => state.subscribe(hook),
			Entry::Reactive(reactive) => reactive.subscribe(hook),
		}
	}
}

impl<V> Debug for Entry<V>
where
	V: Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Entry::State(state) => state.fmt(f),
			Entry::Reactive(reactive) => reactive.fmt(f),
		}
	}
}
