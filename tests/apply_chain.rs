//! Chaining: continuations, short-circuits, flattening and composition.

use eventual::test_utils::{block_on, init_test_logging};
use eventual::{AnyOutput, Error, Output, Status, Value};
use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

fn resolved_later<T: eventual::Element>(value: T) -> Output<T> {
    let (out, resolver) = Output::new();
    thread::spawn(move || resolver.resolve(value));
    out
}

#[test]
fn resolved_source_runs_the_continuation() {
    init_test_logging();
    eventual::test_phase!("resolved_source_runs_the_continuation");

    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    let app = resolved_later(42_isize).apply(move |v| {
        flag.store(true, Ordering::SeqCst);
        Ok(v + 1)
    });
    let (value, known, cause) = block_on(app.settled()).into_parts();
    assert!(ran.load(Ordering::SeqCst));
    assert!(cause.is_none());
    assert!(known);
    assert_eq!(value, Some(43));

    eventual::test_complete!("resolved_source_runs_the_continuation");
}

#[test]
fn unknown_source_skips_the_continuation() {
    let (out, resolver) = Output::<isize>::new();
    thread::spawn(move || resolver.resolve_with_known(42, false));
    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    let app = out.map(move |v| {
        flag.store(true, Ordering::SeqCst);
        v + 1
    });
    let (_, known, cause) = block_on(app.settled()).into_parts();
    assert!(!ran.load(Ordering::SeqCst));
    assert!(cause.is_none());
    assert!(!known);
}

#[test]
fn rejected_source_flows_the_error() {
    let (out, resolver) = Output::<isize>::new();
    thread::spawn(move || resolver.reject("boom"));
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let app = out.map(move |v| {
        counted.fetch_add(1, Ordering::SeqCst);
        v + 1
    });
    let (value, _, cause) = block_on(app.settled()).into_parts();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(value.is_none());
    assert_eq!(cause.map(|c| c.to_string()).as_deref(), Some("boom"));
}

#[test]
fn continuation_returning_an_output_yields_its_value() {
    let out = resolved_later(42_isize);
    for offset in [1, 2] {
        let app = out.and_then(move |v| Ok(resolved_later(v + offset)));
        assert_eq!(block_on(app.value()).expect("known"), Some(42 + offset));
    }
}

#[test]
fn continuation_returning_a_rejected_output_yields_its_error() {
    let out = resolved_later(42_isize);
    let app = out.and_then(|_| {
        let (other, reject_other) = Output::<isize>::new();
        thread::spawn(move || reject_other.reject("boom"));
        Ok(other)
    });
    let (value, _, cause) = block_on(app.settled()).into_parts();
    assert!(value.is_none());
    assert_eq!(cause.map(|c| c.to_string()).as_deref(), Some("boom"));
}

#[test]
fn erased_continuations_flatten_two_levels() {
    let app: AnyOutput = resolved_later(1_u8).map(|v| {
        let inner = resolved_later(Value::new(u32::from(v) + 100));
        let outer = resolved_later(Value::new(inner));
        Value::new(outer)
    });
    let value = block_on(app.value()).expect("known").expect("value");
    assert_eq!(value.downcast_ref::<u32>(), Some(&101));
}

#[test]
fn typed_flattening_across_chained_and_then() {
    let app = resolved_later(String::from("bucket")).and_then(|name| {
        Ok(resolved_later(name.len()).and_then(move |len| {
            Ok(resolved_later(format!("{name}-{len}")))
        }))
    });
    assert_eq!(
        block_on(app.value()).expect("known").as_deref(),
        Some("bucket-6")
    );
}

#[test]
fn nested_unknown_propagates_through_flattening() {
    let app = Output::known(1_i32).and_then(|_| Ok(Output::<i32>::unknown()));
    assert!(block_on(app.settled()).is_unknown());
}

#[test]
fn continuation_error_and_panic_fail_the_result() {
    let errored: Output<i32> = Output::known(1_i32).apply(|_| Err(Error::msg("bad input")));
    let err = block_on(errored.value()).expect_err("error propagates");
    assert_eq!(err.to_string(), "bad input");

    let panicked: Output<i32> = Output::known(1_i32).map(|_| panic!("continuation blew up"));
    let err = block_on(panicked.value()).expect_err("panic propagates");
    assert!(err.is_panic());
}

#[test]
fn continuation_never_runs_on_the_settling_thread() {
    let (out, resolver) = Output::<u8>::new();
    let app = out.map(|_| thread::current().id());
    let settler = thread::current().id();
    resolver.resolve(0);
    let ran_on = block_on(app.value()).expect("known").expect("value");
    assert_ne!(ran_on, settler);
}

#[test]
fn long_chains_do_not_recurse() {
    let (root, resolver) = Output::<u64>::new();
    let mut tail = root;
    for _ in 0..200 {
        tail = tail.map(|v| v + 1);
    }
    resolver.resolve(0);
    assert_eq!(block_on(tail.value()).expect("known"), Some(200));
    assert_eq!(tail.status(), Status::Known);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn apply_composes(start in -1000_i64..1000, add in -50_i64..50, mul in -5_i64..5) {
        let f = move |v: i64| v + add;
        let g = move |v: i64| v * mul;

        let source = Output::known(start);
        let chained = source.map(f).map(g);
        let composed = source.map(move |v| g(f(v)));

        let chained = block_on(chained.value()).expect("known");
        let composed = block_on(composed.value()).expect("known");
        prop_assert_eq!(chained, composed);
        prop_assert_eq!(chained, Some((start + add) * mul));
    }
}
