use std::fmt::Debug;

use crate::Entry;

/// Definition of a reactive store entry.
///
/// `dependencies` are keys of the same store; entries from elsewhere can be
/// appended with [`Derivation::external`]. The formula receives the keyed
/// dependencies' values first, then the external ones, in declared order.
pub struct Derivation<V> {
	pub(crate) key: String,
	pub(crate) formula: Box<dyn Fn(Vec<V>) -> V>,
	pub(crate) dependencies: Vec<String>,
	pub(crate) external: Vec<Entry<V>>,
}

impl<V> Derivation<V> {
	pub fn new<K, F, I, S>(key: K, formula: F, dependencies: I) -> Self
	where
		K: Into<String>,
		F: Fn(Vec<V>) -> V + 'static,
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Derivation {
			key: key.into(),
			formula: Box::new(formula),
			dependencies: dependencies.into_iter().map(Into::into).collect(),
			external: Vec::new(),
		}
	}

	pub fn external(mut self, entry: impl Into<Entry<V>>) -> Self {
		self.external.push(entry.into());
		self
	}

	pub fn key(&self) -> &str {
		&self.key
	}
}

impl<V> Debug for Derivation<V> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Derivation")
			.field("key", &self.key)
			.field("dependencies", &self.dependencies)
			.field("external", &self.external.len())
			.finish()
	}
}

/// Initial contents of a store: plain values, default-valued slots and
/// derivations, registered in that order.
pub struct Init<V> {
	pub(crate) states: Vec<(String, V)>,
	pub(crate) state_keys: Vec<(String, V)>,
	pub(crate) reactives: Vec<Derivation<V>>,
}

impl<V> Default for Init<V> {
	fn default() -> Self {
		Init {
			states: Vec::new(),
			state_keys: Vec::new(),
			reactives: Vec::new(),
		}
	}
}

impl<V> Init<V> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn state(mut self, key: impl Into<String>, value: V) -> Self {
		self.states.push((key.into(), value));
		self
	}

	pub fn state_key(mut self, key: impl Into<String>) -> Self
	where
		V: Default,
	{
		self.state_keys.push((key.into(), V::default()));
		self
	}

	pub fn reactive(mut self, derivation: Derivation<V>) -> Self {
		self.reactives.push(derivation);
		self
	}
}
