pub use enclose::*;

/// Builds an [`Observer`](crate::Observer), optionally cloning captures first.
///
/// ```ignore
/// let seen = Rc::new(Cell::new(0));
/// state.bind([observer!((seen) value: &i32 => seen.set(*value))])?;
/// ```
#[macro_export]
macro_rules! observer {
    (( $($d_tt:tt)* ) $value:ident $(: $ty:ty)? => $($b:tt)*) => {
        $crate::Observer::new($crate::macros::enclose!(($( $d_tt )*) move |$value $(: $ty)?| { $($b)* }))
    };
    ($value:ident $(: $ty:ty)? => $($b:tt)*) => {
        $crate::Observer::new(move |$value $(: $ty)?| { $($b)* })
    };
}

/// Builds a store [`Teardown`](crate::Teardown) callback.
#[macro_export]
macro_rules! teardown {
    (( $($d_tt:tt)* ) => $($b:tt)*) => {
        $crate::Teardown::new($crate::macros::enclose!(($( $d_tt )*) move || { $($b)* }))
    };
    (=> $($b:tt)*) => {
        $crate::Teardown::new(move || { $($b)* })
    };
}

/// Derives a [`ReactiveState`](crate::ReactiveState) from the named
/// observables; inside the body each name is bound to its current value.
///
/// ```ignore
/// let sum = reactive!((a, b) => a + b);
/// ```
#[macro_export]
macro_rules! reactive {
    (( $($dep:ident),+ $(,)? ) => $($b:tt)*) => {
        $crate::ReactiveState::derive(move |($($dep,)+)| { $($b)* }, ($($dep.clone(),)+))
    };
}
