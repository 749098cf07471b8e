use super::*;
use crate::util::test::trace_init;
use proptest::{collection::vec, num::usize::ANY};
use std::{collections::VecDeque, ops::Range, vec::Vec};

fn collect_vals(registry: &Registry<i32>) -> Vec<i32> {
    registry.iter().map(|(_, &val)| val).collect()
}

fn collect_backwards(registry: &Registry<i32>) -> Vec<i32> {
    let mut vals = Vec::new();
    let mut curr = registry.last();
    while let Some(handle) = curr {
        vals.push(*registry.get(handle).unwrap());
        curr = registry.prev(handle);
    }
    vals
}

fn attach_all<const N: usize>(registry: &mut Registry<i32>, vals: [i32; N]) -> [Handle; N] {
    vals.map(|val| registry.attach(val))
}

#[test]
fn const_new() {
    const _: Registry<i32> = Registry::new();
}

#[test]
fn attach_and_iterate() {
    let _trace = trace_init();
    let mut registry = Registry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.cursor(), None);

    let a = registry.attach(5);
    registry.assert_valid();
    assert_eq!(registry.cursor(), Some(a), "first attach sets the cursor");
    assert_eq!(registry.first(), Some(a));
    assert_eq!(registry.last(), Some(a));

    let b = registry.attach(7);
    let c = registry.attach(31);
    registry.assert_valid();

    assert_eq!(registry.len(), 3);
    assert_eq!(collect_vals(&registry), [5, 7, 31]);
    assert_eq!(collect_backwards(&registry), [31, 7, 5]);
    assert_eq!(registry.iter().len(), 3);
    assert_eq!(registry.cursor(), Some(a), "later attaches leave the cursor alone");
    assert_eq!(registry.next(a), Some(b));
    assert_eq!(registry.next(b), Some(c));
    assert_eq!(registry.next(c), None, "the registry does not wrap around");
    assert_eq!(registry.prev(a), None);
}

#[test]
fn detach_sole() {
    let _trace = trace_init();
    let mut registry = Registry::new();
    let a = registry.attach(5);

    assert_eq!(registry.detach(a), Ok(5));
    registry.assert_valid();
    assert!(registry.is_empty());
    assert_eq!(registry.first(), None);
    assert_eq!(registry.last(), None);
    assert_eq!(registry.cursor(), None);
}

#[test]
fn detach_head() {
    let _trace = trace_init();
    let mut registry = Registry::new();
    let [a, b, c] = attach_all(&mut registry, [5, 7, 31]);
    assert_eq!(registry.cursor(), Some(a));

    assert_eq!(registry.detach(a), Ok(5));
    registry.assert_valid();
    assert_eq!(registry.first(), Some(b));
    assert_eq!(registry.prev(b), None);
    assert_eq!(collect_vals(&registry), [7, 31]);
    assert_eq!(collect_backwards(&registry), [31, 7]);
    // the cursor moves to the head's ring predecessor, so the new head is
    // the next value visited.
    assert_eq!(registry.cursor(), Some(c));
}

#[test]
fn detach_tail() {
    let _trace = trace_init();
    let mut registry = Registry::new();
    let [a, b, c] = attach_all(&mut registry, [5, 7, 31]);
    registry.set_cursor(c).unwrap();

    assert_eq!(registry.detach(c), Ok(31));
    registry.assert_valid();
    assert_eq!(registry.last(), Some(b));
    assert_eq!(registry.next(b), None);
    assert_eq!(collect_vals(&registry), [5, 7]);
    assert_eq!(collect_backwards(&registry), [7, 5]);
    assert_eq!(registry.cursor(), Some(b));
    assert_eq!(registry.first(), Some(a));
}

#[test]
fn detach_interior() {
    let _trace = trace_init();
    let mut registry = Registry::new();
    let [a, b, c] = attach_all(&mut registry, [5, 7, 31]);
    registry.set_cursor(b).unwrap();

    assert_eq!(registry.detach(b), Ok(7));
    registry.assert_valid();
    assert_eq!(registry.next(a), Some(c));
    assert_eq!(registry.prev(c), Some(a));
    assert_eq!(collect_vals(&registry), [5, 31]);
    assert_eq!(collect_backwards(&registry), [31, 5]);
    assert_eq!(registry.cursor(), Some(a));
}

#[test]
fn detach_elsewhere_keeps_cursor() {
    let _trace = trace_init();
    let mut registry = Registry::new();
    let [a, b, c] = attach_all(&mut registry, [5, 7, 31]);
    registry.set_cursor(c).unwrap();

    registry.detach(a).unwrap();
    registry.detach(b).unwrap();
    registry.assert_valid();
    assert_eq!(registry.cursor(), Some(c));
}

#[test]
fn detach_empty_fails() {
    let mut registry = Registry::new();
    let a = registry.attach(1);
    registry.detach(a).unwrap();

    assert_eq!(registry.detach(a), Err(RegistryError::Empty));
    registry.assert_valid();
}

#[test]
fn detach_twice_fails() {
    let _trace = trace_init();
    let mut registry = Registry::new();
    let [a, b] = attach_all(&mut registry, [1, 2]);

    assert_eq!(registry.detach(a), Ok(1));
    assert_eq!(registry.detach(a), Err(RegistryError::NotAttached(a)));
    registry.assert_valid();
    assert_eq!(registry.len(), 1);
    assert!(registry.contains(b));
}

#[test]
fn stale_handle_after_slot_reuse() {
    let _trace = trace_init();
    let mut registry = Registry::new();
    let a = registry.attach(1);
    let _b = registry.attach(2);
    registry.detach(a).unwrap();

    let c = registry.attach(3);
    assert_eq!(c.index(), a.index(), "the vacant slot is reused");
    assert_ne!(c, a, "but with a new generation");

    assert!(!registry.contains(a));
    assert_eq!(registry.get(a), None);
    assert_eq!(registry.get_mut(a), None);
    assert_eq!(registry.next(a), None);
    assert_eq!(registry.detach(a), Err(RegistryError::NotAttached(a)));
    assert_eq!(registry.set_cursor(a), Err(RegistryError::NotAttached(a)));

    assert_eq!(registry.get(c), Some(&3));
    assert_eq!(collect_vals(&registry), [2, 3], "reused slots still attach at the tail");
    registry.assert_valid();
}

#[test]
fn churn_reuses_one_slot() {
    let mut registry = Registry::new();
    for generation in 0..1_000 {
        let handle = registry.attach(generation as i32);
        assert_eq!(handle.index(), 0, "detached slots are reused before new ones");
        assert_eq!(handle.generation(), generation);
        assert_eq!(registry.detach(handle), Ok(generation as i32));
    }
    assert!(registry.is_empty());
    registry.assert_valid();
}

#[test]
fn handle_from_another_registry() {
    let mut registry = Registry::new();
    let mut other = Registry::new();
    registry.attach(1);
    let foreign = other.attach(2);
    other.attach(3);
    let foreign_tail = other.attach(4);

    // index 0 generation 0 exists in both, so it is indistinguishable; but
    // an index past the end is always rejected.
    assert_eq!(
        registry.detach(foreign_tail),
        Err(RegistryError::NotAttached(foreign_tail))
    );
    assert!(registry.contains(foreign));
    registry.assert_valid();
}

#[test]
fn get_mut_updates_value() {
    let mut registry = Registry::new();
    let a = registry.attach(1);
    *registry.get_mut(a).unwrap() += 41;
    assert_eq!(registry.get(a), Some(&42));
}

#[test]
fn from_iter() {
    let registry = [1, 2, 3].into_iter().collect::<Registry<_>>();
    registry.assert_valid();
    assert_eq!(collect_vals(&registry), [1, 2, 3]);
    let debug = format!("{registry:?}");
    assert!(debug.contains("len: 3"), "{debug}");
}

#[derive(Debug)]
enum Op {
    Attach,
    Detach(usize),
    DetachStale(usize),
    Cursor(usize),
}

/// Miri uses a significant amount of time and memory, so keep the op
/// sequences short under it.
#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

/// The default range for proptest's vec strategy is 0..100.
#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..100;

proptest::proptest! {
    #[test]
    fn fuzz_registry(ops in vec(ANY, FUZZ_RANGE)) {
        let ops = ops
            .iter()
            .map(|i| match i % 4 {
                0 | 1 => Op::Attach,
                2 => Op::Detach(i / 4),
                3 if i % 8 == 3 => Op::DetachStale(i / 8),
                _ => Op::Cursor(i / 8),
            })
            .collect::<Vec<_>>();

        let _trace = trace_init();
        let _span = tracing::info_span!("fuzz").entered();
        tracing::info!(?ops);
        run_fuzz(ops);
    }
}

fn run_fuzz(ops: Vec<Op>) {
    let mut registry = Registry::<i32>::new();
    let mut reference = VecDeque::<(Handle, i32)>::new();
    let mut stale = Vec::<Handle>::new();

    for (i, op) in ops.iter().enumerate() {
        let _span = tracing::info_span!("op", ?i, ?op).entered();
        match op {
            Op::Attach => {
                let handle = registry.attach(i as i32);
                reference.push_back((handle, i as i32));
            }
            Op::Detach(n) => {
                if reference.is_empty() {
                    if let Some(&handle) = stale.first() {
                        assert_eq!(registry.detach(handle), Err(RegistryError::Empty));
                    }
                    tracing::debug!("skipping detach; registry is empty");
                    continue;
                }

                let idx = n % reference.len();
                let (handle, expect) = reference.remove(idx).unwrap();
                assert_eq!(registry.detach(handle), Ok(expect));
                stale.push(handle);
            }
            Op::DetachStale(n) => {
                if stale.is_empty() {
                    continue;
                }
                let handle = stale[n % stale.len()];
                assert!(registry.detach(handle).is_err());
            }
            Op::Cursor(n) => {
                if reference.is_empty() {
                    assert_eq!(registry.cursor(), None);
                    continue;
                }
                let (handle, _) = reference[n % reference.len()];
                registry.set_cursor(handle).unwrap();
                assert_eq!(registry.cursor(), Some(handle));
            }
        }

        registry.assert_valid();
        assert_eq!(registry.len(), reference.len());
        let expected = reference.iter().map(|&(_, val)| val).collect::<Vec<_>>();
        assert_eq!(collect_vals(&registry), expected);
        for &handle in &stale {
            assert!(!registry.contains(handle), "{handle:?} should be stale");
        }
    }
}
