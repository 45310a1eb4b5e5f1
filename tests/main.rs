use std::cell::{Cell, RefCell};
use std::rc::Rc;

use mockall::predicate::eq;
use reactive_store::{
	observer, reactive, Error, Observable, Observer, ReactiveState, State, Target,
};

mod mock;

#[test]
fn set_notifies_every_bound_observer() {
	let state = State::new(0);
	assert_eq!(state.get(), 0);

	let mock = mock::SharedMock::new();
	state.bind([mock.observer(), mock.observer()]).unwrap();

	mock.get().expect_trigger().with(eq(5)).times(2).return_const(());

	state.set(5);
	assert_eq!(state.get(), 5);

	mock.get().checkpoint();
}

#[test]
fn set_with_equal_value_does_not_notify() {
	let mock = mock::SharedMock::new();

	let number = State::new(7);
	number.bind([mock.observer()]).unwrap();
	number.set(7);
	number.update(|n| *n += 0);

	let calls = Rc::new(Cell::new(0));

	let text = State::new(String::from("init"));
	text.bind([observer!((calls) _value: &String => calls.set(calls.get() + 1))])
		.unwrap();
	text.set(String::from("init"));

	let list = State::new(vec![0, 1, 2]);
	list.bind([observer!((calls) _value: &Vec<i32> => calls.set(calls.get() + 1))])
		.unwrap();
	list.set(vec![0, 1, 2]);

	assert_eq!(calls.get(), 0);

	list.set(vec![0, 1]);
	assert_eq!(calls.get(), 1);

	mock.get().checkpoint();
}

#[test]
fn default_state_starts_absent() {
	let state = State::<Option<String>>::default();
	assert_eq!(state.get(), None);

	let seen = Rc::new(RefCell::new(None));
	state
		.bind([observer!((seen) value: &Option<String> => *seen.borrow_mut() = value.clone())])
		.unwrap();

	state.set(Some(String::from("2nd")));
	assert_eq!(state.get().as_deref(), Some("2nd"));
	assert_eq!(seen.borrow().as_deref(), Some("2nd"));

	state.set(None);
	assert_eq!(*seen.borrow(), None);
}

#[test]
fn replace_returns_previous_value() {
	let state = State::new(1);
	assert_eq!(state.replace(2), 1);
	assert_eq!(state.replace(2), 2);
	assert_eq!(state.get(), 2);
}

#[test]
fn redundant_bind_reports_already_bound_observers_in_order() {
	let state = State::new(0_i64);
	let calls = Rc::new(Cell::new(0));

	let first = observer!((calls) _v: &i64 => calls.set(calls.get() + 1));
	let second = observer!((calls) _v: &i64 => calls.set(calls.get() + 10));
	let third = observer!((calls) _v: &i64 => calls.set(calls.get() + 100));

	state.bind([first.clone(), second.clone()]).unwrap();

	let err = state.bind([first.clone()]).unwrap_err();
	assert!(matches!(err, Error::Redundancy { .. }));
	assert_eq!(err.targets(), &[Target::Callback(first.id())]);

	// The new observer of a failing call is still bound.
	let err = state
		.bind([second.clone(), third.clone(), first.clone()])
		.unwrap_err();
	assert_eq!(
		err.targets(),
		&[Target::Callback(second.id()), Target::Callback(first.id())]
	);

	state.set(1);
	assert_eq!(calls.get(), 111);
}

#[test]
fn observer_repeated_in_one_call_is_redundant() {
	let state = State::new(0_i64);
	let calls = Rc::new(Cell::new(0));
	let only = observer!((calls) _v: &i64 => calls.set(calls.get() + 1));

	let err = state.bind([only.clone(), only.clone()]).unwrap_err();
	assert_eq!(err.targets(), &[Target::Callback(only.id())]);

	state.set(3);
	assert_eq!(calls.get(), 1);
}

#[test]
fn unbind_removes_observers() {
	let state = State::new(0_i64);
	let mock = mock::SharedMock::new();
	let kept = mock.observer();
	let removed = mock.observer();
	let stranger = mock.observer();

	state.bind([kept.clone(), removed.clone()]).unwrap();
	state.unbind([removed.clone()]).unwrap();

	assert_eq!(
		state.unbind([kept.clone(), stranger.clone()]),
		Err(Error::NotBound(stranger.id()))
	);

	// `kept` was removed before the failure.
	state.set(1);

	state.bind([kept.clone()]).unwrap();
	mock.get().expect_trigger().with(eq(2)).times(1).return_const(());
	state.set(2);
	mock.get().checkpoint();

	state.unbind(Vec::<Observer<i64>>::new()).unwrap();
	state.set(3);
	mock.get().checkpoint();
}

#[test]
fn reentrant_set_recurses_without_panicking() {
	let state = State::new(0);
	let clamp = observer!((state) value: &i32 => {
		if *value > 10 {
			state.set(10);
		}
	});
	state.bind([clamp.clone()]).unwrap();

	state.set(15);
	assert_eq!(state.get(), 10);

	state.unbind_all();
}

#[test]
fn reactive_state_recomputes_on_dependency_change() {
	let a = State::new(0_i64);
	let b = State::new(100_i64);
	let sum = ReactiveState::new(|(a, b): (i64, i64)| a + b, (a.clone(), b.clone())).unwrap();

	assert_eq!(sum.get(), 100);

	let mock = mock::SharedMock::new();
	sum.bind([mock.observer()]).unwrap();

	let check = observer!((a, b) value: &i64 => assert_eq!(*value, a.get() + b.get()));
	sum.bind([check]).unwrap();

	mock.get().expect_trigger().with(eq(101)).times(1).return_const(());
	a.set(1);
	assert_eq!(sum.get(), 101);
	mock.get().checkpoint();

	mock.get().expect_trigger().with(eq(1)).times(1).return_const(());
	b.set(0);
	assert_eq!(sum.get(), 1);
	mock.get().checkpoint();
}

#[test]
fn unchanged_formula_output_does_not_notify() {
	let a = State::new(0_i64);
	let b = State::new(100_i64);
	let max = ReactiveState::new(|(a, b): (i64, i64)| a.max(b), (a.clone(), b.clone())).unwrap();

	let mock = mock::SharedMock::new();
	max.bind([mock.observer()]).unwrap();

	a.set(1);
	a.set(50);
	assert_eq!(max.get(), 100);
	mock.get().checkpoint();

	mock.get().expect_trigger().with(eq(150)).times(1).return_const(());
	a.set(150);
	mock.get().checkpoint();
}

#[test]
fn empty_dependencies_are_rejected() {
	let result = ReactiveState::new(|values: Vec<i64>| values.len() as i64, Vec::<State<i64>>::new());
	assert!(matches!(result, Err(Error::Essential { .. })));
}

#[test]
fn vec_dependencies_are_read_in_order() {
	let parts = vec![State::new(1), State::new(2), State::new(3)];
	let digits = ReactiveState::new(
		|values: Vec<i32>| values.iter().fold(0, |acc, d| acc * 10 + d),
		parts.clone(),
	)
	.unwrap();

	assert_eq!(digits.get(), 123);
	parts[1].set(5);
	assert_eq!(digits.get(), 153);
}

#[test]
fn reactive_states_chain() {
	let a = State::new(2_i64);
	let b = State::new(3_i64);
	let product = reactive!((a, b) => a * b);
	let label = product.map(|p| format!("product: {}", p));

	assert_eq!(label.get(), "product: 6");

	let seen = Rc::new(RefCell::new(Vec::new()));
	label
		.bind([observer!((seen) value: &String => seen.borrow_mut().push(value.clone()))])
		.unwrap();

	a.set(4);
	b.set(4);
	assert_eq!(*seen.borrow(), vec!["product: 12", "product: 16"]);
}

#[test]
fn observers_of_a_dependency_see_updated_derived_values() {
	let a = State::new(1_i64);
	let doubled = a.map(|a| a * 2);

	let seen = Rc::new(Cell::new(0));
	a.bind([observer!((seen, doubled) _v: &i64 => seen.set(doubled.get()))])
		.unwrap();

	a.set(21);
	assert_eq!(seen.get(), 42);
}

#[test]
fn dropped_reactive_state_detaches_from_dependencies() {
	let a = State::new(1_i64);
	let evaluations = Rc::new(Cell::new(0));

	let reactive = {
		let evaluations = evaluations.clone();
		ReactiveState::derive(
			move |(a,): (i64,)| {
				evaluations.set(evaluations.get() + 1);
				a + 1
			},
			(a.clone(),),
		)
	};
	assert_eq!(evaluations.get(), 1);

	a.set(2);
	assert_eq!(reactive.get(), 3);
	assert_eq!(evaluations.get(), 2);

	std::mem::drop(reactive);

	a.set(3);
	assert_eq!(evaluations.get(), 2);
}

#[test]
fn clearing_observers_keeps_derived_values_wired() {
	let a = State::new(1_i64);
	let plus_one = a.map(|a| a + 1);

	a.unbind_all();
	a.set(5);

	assert_eq!(plus_one.get(), 6);
}

#[test]
fn detached_subscription_stops_hook() {
	let a = State::new(0_i64);
	let hits = Rc::new(Cell::new(0));

	let subscription = Observable::subscribe(&a, {
		let hits = hits.clone();
		Rc::new(move || hits.set(hits.get() + 1))
	});

	a.set(1);
	assert_eq!(hits.get(), 1);

	subscription.detach();
	a.set(2);
	assert_eq!(hits.get(), 1);
}
