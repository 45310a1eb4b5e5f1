use std::rc::Rc;

use smallvec::SmallVec;

use crate::observer::Subscription;
use crate::Observable;

pub type Subscriptions = SmallVec<[Subscription; 2]>;

/// The ordered dependency list of a reactive state.
///
/// Implemented for tuples of observables, whose formula receives a tuple of
/// values, and for `Vec`s of same-typed observables, whose formula receives
/// a `Vec` of values.
pub trait Dependencies: 'static {
	type Values;

	/// Current values of every dependency, in declared order.
	fn values(&self) -> Self::Values;

	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Attaches `hook` to every dependency.
	fn subscribe(&self, hook: &Rc<dyn Fn()>) -> Subscriptions;
}

impl<O> Dependencies for Vec<O>
where
	O: Observable,
{
	type Values = Vec<O::Value>;

	fn values(&self) -> Self::Values {
		self.iter().map(Observable::get).collect()
	}

	fn len(&self) -> usize {
		Vec::len(self)
	}

	fn subscribe(&self, hook: &Rc<dyn Fn()>) -> Subscriptions {
		self.iter().map(|dep| dep.subscribe(hook.clone())).collect()
	}
}

/// Dependency lists that cannot be empty by construction.
pub trait NonEmpty: Dependencies {}

macro_rules! tuple_dependencies {
	($len:literal; $($name:ident $idx:tt),+) => {
		impl<$($name),+> Dependencies for ($($name,)+)
		where
			$($name: Observable),+
		{
			type Values = ($(<$name as Observable>::Value,)+);

			fn values(&self) -> Self::Values {
				($(self.$idx.get(),)+)
			}

			fn len(&self) -> usize {
				$len
			}

			fn subscribe(&self, hook: &Rc<dyn Fn()>) -> Subscriptions {
				let mut subscriptions = Subscriptions::new();
				$(subscriptions.push(self.$idx.subscribe(hook.clone()));)+
				subscriptions
			}
		}

		impl<$($name),+> NonEmpty for ($($name,)+) where $($name: Observable),+ {}
	};
}

tuple_dependencies!(1; A 0);
tuple_dependencies!(2; A 0, B 1);
tuple_dependencies!(3; A 0, B 1, C 2);
tuple_dependencies!(4; A 0, B 1, C 2, D 3);
tuple_dependencies!(5; A 0, B 1, C 2, D 3, E 4);
tuple_dependencies!(6; A 0, B 1, C 2, D 3, E 4, F 5);
