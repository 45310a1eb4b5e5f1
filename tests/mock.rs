#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use mockall::*;
use reactive_store::{Observer, Store, Teardown};

/// Routes library logs to the test output; `RUST_LOG=trace` shows them.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

#[automock]
pub trait Spy {
	fn trigger(&self, value: i64);
	fn changed(&self, store: String);
	fn dropped(&self, store: String);
}

#[derive(Clone)]
pub struct SharedMock(Arc<Mutex<MockSpy>>);

impl SharedMock {
	pub fn new() -> SharedMock {
		SharedMock(Arc::new(Mutex::new(MockSpy::new())))
	}

	pub fn get<'a>(&'a self) -> MutexGuard<'a, MockSpy> {
		return self.0.lock().unwrap();
	}

	/// An observer reporting every value to `trigger`.
	pub fn observer(&self) -> Observer<i64> {
		let mock = self.clone();
		Observer::new(move |value: &i64| mock.get().trigger(*value))
	}

	/// A store observer reporting the store's name to `changed`.
	pub fn store_observer(&self) -> Observer<Store<i64>> {
		let mock = self.clone();
		Observer::new(move |store: &Store<i64>| mock.get().changed(store.name().to_owned()))
	}

	pub fn teardown(&self, name: &str) -> Teardown {
		let mock = self.clone();
		let name = name.to_owned();
		Teardown::new(move || mock.get().dropped(name.clone()))
	}
}
