//! Settlement behavior of outputs: resolve, reject, unknown, broadcast to
//! early and late observers, delegation, and double settlement.

use eventual::test_utils::{block_on, init_test_logging};
use eventual::{AnyOutput, Error, Output, Settlement, Status, Value};
use proptest::prelude::*;
use std::thread;
use std::time::Duration;

#[test]
fn resolve_and_reject_from_producer_threads() {
    init_test_logging();
    eventual::test_phase!("resolve_and_reject_from_producer_threads");

    let (out, resolver) = Output::<i32>::new();
    let producer = thread::spawn(move || resolver.resolve(42));
    let (value, known, cause) = block_on(out.settled()).into_parts();
    assert!(cause.is_none());
    assert!(known);
    assert_eq!(value, Some(42));
    producer.join().expect("producer panicked");

    let (out, resolver) = Output::<i32>::new();
    let producer = thread::spawn(move || resolver.reject("boom"));
    let (value, _, cause) = block_on(out.settled()).into_parts();
    assert!(value.is_none());
    assert_eq!(cause.map(|c| c.to_string()).as_deref(), Some("boom"));
    producer.join().expect("producer panicked");

    eventual::test_complete!("resolve_and_reject_from_producer_threads");
}

#[test]
fn unknown_settlement_has_no_value_and_no_error() {
    let (out, resolver) = Output::<String>::new();
    resolver.resolve_unknown();
    let (value, known, cause) = block_on(out.settled()).into_parts();
    assert!(value.is_none());
    assert!(!known);
    assert!(cause.is_none());
    assert!(matches!(block_on(out.value()), Ok(None)));
}

#[test]
fn early_and_late_observers_see_one_snapshot() {
    let (out, resolver) = Output::<Vec<u8>>::new();

    let early: Vec<_> = (0..4)
        .map(|_| {
            let out = out.clone();
            thread::spawn(move || block_on(out.value()))
        })
        .collect();

    thread::sleep(Duration::from_millis(10));
    resolver.resolve(vec![1, 2, 3]);

    for handle in early {
        let value = handle.join().expect("observer panicked").expect("known");
        assert_eq!(value, Some(vec![1, 2, 3]));
    }
    for _ in 0..4 {
        assert_eq!(block_on(out.value()).expect("known"), Some(vec![1, 2, 3]));
    }
}

#[test]
#[should_panic(expected = "already settled")]
fn second_settlement_panics() {
    let (_out, resolver) = Output::<u8>::new();
    resolver.resolve(1);
    resolver.resolve_unknown();
}

#[test]
fn failed_second_settlement_keeps_the_first() {
    let (out, resolver) = Output::<u8>::new();
    resolver.resolve(1);
    let late = resolver.clone();
    let attempt = thread::spawn(move || late.reject("late"));
    assert!(attempt.join().is_err(), "second settlement must panic");
    assert_eq!(out.status(), Status::Known);
    assert_eq!(block_on(out.value()).expect("known"), Some(1));
}

#[test]
fn resolving_to_an_output_yields_its_value() {
    let (out, resolver) = Output::<Value>::new();
    let producer = thread::spawn(move || {
        let (other, resolve_other) = Output::<Value>::new();
        resolver.resolve(Value::new(other));
        thread::spawn(move || resolve_other.resolve(Value::new(99_i32)))
            .join()
            .expect("inner producer panicked");
    });

    let checked = out.map(|v: Value| v.downcast_ref::<i32>().copied());
    assert_eq!(block_on(checked.value()).expect("known"), Some(Some(99)));
    producer.join().expect("producer panicked");
}

#[test]
fn resolving_to_a_rejected_output_yields_its_error() {
    let (out, resolver) = Output::<Value>::new();
    let (other, reject_other) = Output::<Value>::new();
    resolver.resolve(Value::new(other));
    assert!(!out.is_settled());
    reject_other.reject("boom");

    let (value, _, cause) = block_on(out.settled()).into_parts();
    assert!(value.is_none());
    assert_eq!(cause.map(|c| c.to_string()).as_deref(), Some("boom"));
}

#[test]
fn delegation_commits_the_resolver() {
    let (out, resolver) = Output::<u32>::new();
    let (other, resolve_other) = Output::<u32>::new();
    resolver.resolve_output(&other);
    assert!(!resolver.is_settled());

    let late = resolver.clone();
    let attempt = thread::spawn(move || late.resolve(5));
    assert!(attempt.join().is_err(), "direct settlement after delegation panics");

    resolve_other.resolve(7);
    assert_eq!(block_on(out.value()).expect("known"), Some(7));
}

#[test]
fn delegation_is_transitive() {
    let (a, resolve_a) = Output::<Value>::new();
    let (b, resolve_b) = Output::<Value>::new();
    let (c, resolve_c) = Output::<Value>::new();
    resolve_a.resolve(Value::new(b));
    resolve_b.resolve(Value::new(c));
    resolve_c.resolve_unknown();
    assert!(block_on(a.settled()).is_unknown());
}

#[test]
fn erased_resolution_unwraps_typed_outputs() {
    let (out, resolver) = Output::<Value>::new();
    let (typed, resolve_typed) = Output::<u16>::new();
    resolver.resolve(Value::new(typed));
    resolve_typed.resolve(12);

    let value = block_on(out.value()).expect("known").expect("value");
    assert_eq!(value.downcast_ref::<u16>(), Some(&12));
}

#[test]
fn delegation_cycles_panic_instead_of_hanging() {
    init_test_logging();
    eventual::test_phase!("delegation_cycles_panic_instead_of_hanging");
    let (a, resolve_a) = Output::<Value>::new();
    let (b, resolve_b) = Output::<Value>::new();
    let (c, resolve_c) = Output::<Value>::new();
    resolve_a.resolve(Value::new(b.clone()));
    resolve_b.resolve(Value::new(c.clone()));

    let closing = thread::spawn(move || resolve_c.resolve(Value::new(a)));
    assert!(closing.join().is_err(), "closing the cycle panics");
    assert!(!b.is_settled());
    assert!(!c.is_settled());
    eventual::test_complete!("delegation_cycles_panic_instead_of_hanging");
}

#[test]
fn type_mismatch_surfaces_at_await() {
    let any: AnyOutput = Output::known(String::from("text")).into_any();
    let as_number = any.downcast::<u64>();
    match block_on(as_number.settled()) {
        Settlement::Failed(Error::TypeMismatch { expected, found }) => {
            assert_eq!(expected, "u64");
            assert_eq!(found, std::any::type_name::<String>());
        }
        other => panic!("expected a type mismatch, got {other:?}"),
    }
}

#[test]
fn pre_settled_constructors() {
    assert_eq!(Output::known(1.5_f32).status(), Status::Known);
    assert_eq!(Output::<f32>::unknown().status(), Status::Unknown);
    let failed = Output::<f32>::failed(Error::msg("nope"));
    assert_eq!(failed.status(), Status::Failed);
    assert!(block_on(failed.value()).is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_observer_receives_the_settlement(
        observers in 1_usize..8,
        value in any::<i64>(),
        outcome in 0_u8..3,
    ) {
        let (out, resolver) = Output::<i64>::new();
        let waiting: Vec<_> = (0..observers)
            .map(|_| {
                let out = out.clone();
                thread::spawn(move || block_on(out.settled()).status())
            })
            .collect();

        match outcome {
            0 => resolver.resolve(value),
            1 => resolver.resolve_unknown(),
            _ => resolver.reject(format!("failed {value}")),
        }
        let expected = out.status();
        prop_assert!(expected.is_terminal());

        for handle in waiting {
            prop_assert_eq!(handle.join().expect("observer panicked"), expected);
        }
        prop_assert_eq!(block_on(out.settled()).status(), expected);
    }
}
