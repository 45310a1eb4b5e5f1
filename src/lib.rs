//! Observable states, derived reactive states and hierarchical stores.
//!
//! A [`State`] holds a value and notifies its observers synchronously when
//! `set` changes it. A [`ReactiveState`] caches the output of a pure formula
//! over its dependencies and is recomputed eagerly whenever one of them
//! notifies. A [`Store`] is a named tree of both, with an aggregate change
//! event bubbling one level at a time and teardown hooks.
//!
//! Change detection is value equality: setting an equal value, or a
//! recomputation producing an equal value, notifies nobody.
//!
//! Everything is single-threaded and runs to completion inside the call
//! that caused it.

pub mod macros;

mod batch;
mod dependencies;
mod entry;
mod error;
mod init;
mod observer;
mod reactive;
mod refs;
mod state;
mod store;

use std::rc::Rc;

pub use batch::{batch, in_batch};
pub use dependencies::{Dependencies, NonEmpty, Subscriptions};
pub use entry::{Entry, Kind};
pub use error::{Error, Result, Target, Targets};
pub use init::{Derivation, Init};
pub use observer::{CallbackId, Observer, Subscription, Teardown};
pub use reactive::ReactiveState;
pub use refs::Refs;
pub use state::State;
pub use store::Store;

/// Common surface of [`State`], [`ReactiveState`] and [`Entry`].
pub trait Observable: 'static {
	type Value: Clone + PartialEq + 'static;

	fn get(&self) -> Self::Value;

	/// Registers observers. Observers that were already bound are reported
	/// through [`Error::Redundancy`], after the new ones have been added.
	fn bind(&self, observers: impl IntoIterator<Item = Observer<Self::Value>>) -> Result<()>;

	/// Removes observers, or all of them when `observers` is empty.
	fn unbind(&self, observers: impl IntoIterator<Item = Observer<Self::Value>>) -> Result<()>;

	fn unbind_all(&self);

	/// Attaches an internal hook that runs before observers on every change.
	/// Dropping the returned subscription detaches it.
	fn subscribe(&self, hook: Rc<dyn Fn()>) -> Subscription;
}
