use std::fmt::{self, Display};

use thiserror::Error;

use crate::CallbackId;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	/// Something was registered twice under the same identity or name.
	#[error("{targets} is redundant: {message}")]
	Redundancy { targets: Targets, message: String },

	/// A required argument was missing or empty.
	#[error("essentials were not given: {message}")]
	Essential { message: String },

	#[error("state or reactive state \"{0}\" is not found")]
	MissingKey(String),

	#[error("store \"{0}\" is not found")]
	MissingStore(String),

	#[error("callback {0} is not bound")]
	NotBound(CallbackId),

	/// `Store::set` targeted a reactive state.
	#[error("\"{0}\" is a reactive state and cannot be set")]
	ReadOnly(String),
}

impl Error {
	pub(crate) fn redundancy(targets: Vec<Target>, message: impl Into<String>) -> Self {
		Error::Redundancy {
			targets: Targets(targets),
			message: message.into(),
		}
	}

	pub(crate) fn essential(message: impl Into<String>) -> Self {
		Error::Essential {
			message: message.into(),
		}
	}

	/// Offending items of a `Redundancy` error, in the order they were supplied.
	pub fn targets(&self) -> &[Target] {
		match self {
			Error::Redundancy { targets, .. } => &targets.0,
			_ => &[],
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
	Callback(CallbackId),
	Key(String),
	Store(String),
}

impl Display for Target {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Target::Callback(id) => write!(f, "callback {}", id),
			Target::Key(key) => write!(f, "key \"{}\"", key),
			Target::Store(name) => write!(f, "store \"{}\"", name),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Targets(pub Vec<Target>);

impl Display for Targets {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("(")?;
		for (i, target) in self.0.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			target.fmt(f)?;
		}
		f.write_str(")")
	}
}
