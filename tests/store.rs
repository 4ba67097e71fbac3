use std::rc::Rc;

use genr::{
    error::RuntimeError,
    interpreter::{
        dataset::Dataset,
        evaluator::auxiliary::{AuxMode, AuxPool},
        store::VarStore,
        value::{bundle::Bundle, core::Value, matrix::Matrix},
    },
};
use pretty_assertions::assert_eq;

fn names_at(store: &VarStore, level: usize) -> Vec<String> {
    store.iter()
         .filter(|v| v.level == level)
         .map(|v| v.name.clone())
         .collect()
}

#[test]
fn lookup_is_scoped_to_one_level() {
    let mut store = VarStore::new();
    store.add("x", Value::Scalar(1.0), 0, 1).unwrap();
    store.add("x", Value::Scalar(2.0), 1, 1).unwrap();

    assert_eq!(store.lookup("x", 0), Some(&Value::Scalar(1.0)));
    assert_eq!(store.lookup("x", 1), Some(&Value::Scalar(2.0)));
    assert_eq!(store.lookup("x", 2), None);
    assert_eq!(store.len(), 2);
}

#[test]
fn adding_the_same_kind_replaces() {
    let mut store = VarStore::new();
    store.add("x", Value::Scalar(1.0), 0, 1).unwrap();
    store.add("x", Value::Scalar(5.0), 0, 2).unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(store.lookup("x", 0), Some(&Value::Scalar(5.0)));
}

#[test]
fn adding_another_kind_is_rejected() {
    let mut store = VarStore::new();
    store.add("x", Value::Scalar(1.0), 0, 1).unwrap();

    let err = store.add("x", Value::from(Matrix::identity(2)), 0, 7)
                   .unwrap_err();
    assert!(matches!(err, RuntimeError::DuplicateName { line: 7, .. }));
    assert_eq!(store.lookup("x", 0), Some(&Value::Scalar(1.0)));
}

#[test]
fn a_null_placeholder_takes_any_kind() {
    let mut store = VarStore::new();
    store.add("b", Value::Null, 0, 1).unwrap();
    store.add("b", Value::from(Bundle::new()), 0, 2).unwrap();

    assert!(matches!(store.lookup("b", 0), Some(Value::Bundle(_))));
}

#[test]
fn replace_keeps_the_level() {
    let mut store = VarStore::new();
    store.add("s", Value::from("old"), 2, 1).unwrap();

    let old = store.replace("s", 2, Value::from("new"));
    assert_eq!(old, Some(Value::from("old")));
    assert_eq!(store.lookup("s", 2), Some(&Value::from("new")));
    assert_eq!(store.replace("missing", 0, Value::Scalar(1.0)), None);
}

#[test]
fn identity_lookup_finds_shared_matrices_only() {
    let mut store = VarStore::new();
    let m = Rc::new(Matrix::identity(3));
    store.add("A", Value::Matrix(Rc::clone(&m)), 0, 1).unwrap();

    assert_eq!(store.lookup_by_identity(&m).map(|v| v.name.as_str()), Some("A"));

    let copy = Rc::new(Matrix::identity(3));
    assert!(store.lookup_by_identity(&copy).is_none());
}

#[test]
fn a_matrix_shared_with_a_bundle_survives_deletion() {
    let mut store = VarStore::new();
    let m = Rc::new(Matrix::identity(2));
    let mut b = Bundle::new();
    b.insert("m", Value::Matrix(Rc::clone(&m)));
    store.add("A", Value::Matrix(m), 0, 1).unwrap();
    store.add("b", Value::from(b), 0, 1).unwrap();

    store.delete("A", 0);

    let Some(Value::Bundle(b)) = store.lookup("b", 0) else {
        panic!("b is not a bundle");
    };
    assert_eq!(b.get("m"), Some(&Value::from(Matrix::identity(2))));
}

#[test]
fn destroying_a_scope_keeps_the_others_in_order() {
    let mut store = VarStore::new();
    for (name, level) in [("a", 0), ("t1", 1), ("b", 0), ("t2", 1), ("c", 0)] {
        store.add(name, Value::Scalar(0.0), level, 1).unwrap();
    }

    assert_eq!(store.destroy_all_at_scope(1), 2);
    assert_eq!(names_at(&store, 0), vec!["a", "b", "c"]);
    assert_eq!(store.destroy_all_at_scope(1), 0);
}

#[test]
fn localize_round_trip_restores_name_level_and_value() {
    let mut store = VarStore::new();
    let m = Rc::new(Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap());
    store.add("A", Value::Matrix(Rc::clone(&m)), 0, 1).unwrap();
    store.add("other", Value::Scalar(9.0), 0, 1).unwrap();

    assert!(store.localize("A", 0, "p1"));
    assert_eq!(store.lookup("A", 0), None);
    assert!(matches!(store.lookup("p1", 1), Some(Value::Matrix(held)) if Rc::ptr_eq(held, &m)));

    assert!(store.unlocalize("p1", 1, "A"));
    assert_eq!(store.lookup("p1", 1), None);
    assert!(matches!(store.lookup("A", 0), Some(Value::Matrix(held)) if Rc::ptr_eq(held, &m)));
    assert_eq!(store.lookup("other", 0), Some(&Value::Scalar(9.0)));
}

#[test]
fn localize_of_an_unknown_name_does_nothing() {
    let mut store = VarStore::new();
    assert!(!store.localize("nope", 0, "p"));
    assert!(!store.unlocalize("p", 1, "nope"));
    assert!(store.is_empty());
}

#[test]
fn pruning_a_series_shifts_list_members() {
    let mut store = VarStore::new();
    store.add("L", Value::List(Rc::new(vec![1, 2, 3])), 0, 1).unwrap();
    store.add("M", Value::List(Rc::new(vec![1])), 0, 1).unwrap();

    store.prune_list_member(2);

    assert_eq!(store.lookup("L", 0), Some(&Value::List(Rc::new(vec![1, 2]))));
    assert_eq!(store.lookup("M", 0), Some(&Value::List(Rc::new(vec![1]))));
}

#[test]
fn dropping_lists_leaves_other_kinds() {
    let mut store = VarStore::new();
    store.add("L", Value::List(Rc::new(vec![1])), 0, 1).unwrap();
    store.add("x", Value::Scalar(1.0), 0, 1).unwrap();
    store.add("K", Value::List(Rc::new(vec![])), 1, 1).unwrap();

    assert_eq!(store.drop_lists(), 2);
    assert_eq!(names_at(&store, 0), vec!["x"]);
}

#[test]
fn dataset_columns_are_scoped_and_relabelled() {
    let mut ds = Dataset::new(3);
    let id = ds.add_series("y", vec![1.0, 2.0, 3.0], 0);

    assert_eq!(ds.relabel(id, "p", 1), Some(("y".to_string(), 0)));
    assert_eq!(ds.series_id("y", 0), None);
    assert_eq!(ds.series_id("p", 1), Some(id));

    let local = ds.add_series("tmp", vec![0.0; 3], 1);
    assert_eq!(ds.delete_series_at_level(1), vec![local, id]);
    assert_eq!(ds.num_series(), 1);
}

#[test]
fn dataset_sample_bounds_are_checked() {
    let mut ds = Dataset::new(5);
    ds.set_sample(1, 3, 1).unwrap();
    assert_eq!((ds.t1(), ds.t2(), ds.sample_len()), (1, 3, 3));

    assert!(ds.set_sample(3, 1, 1).is_err());
    assert!(ds.set_sample(0, 5, 1).is_err());

    ds.full_sample();
    assert_eq!(ds.sample_len(), 5);
    assert!(Dataset::new(0).require_data(4).is_err());
}

#[test]
fn the_pool_reuses_slots_in_traversal_order() {
    let mut pool = AuxPool::new();
    assert_eq!(pool.mode(), AuxMode::Starting);

    for pass in 0..4 {
        pool.begin_pass();
        let a = pool.fill_series(3, |buf, fresh| {
                        assert_eq!(fresh, pass == 0);
                        buf.fill(1.0);
                    });
        let m = pool.fill_matrix(2, 2, |m| m.set(0, 0, f64::from(pass)));
        assert_eq!(a[2], 1.0);
        assert_eq!(m.get(0, 0), f64::from(pass));
    }

    assert_eq!(pool.mode(), AuxMode::Continuing);
    assert_eq!(pool.len(), 2);
    let stats = pool.destroy();
    assert_eq!((stats.allocated, stats.reused), (2, 6));
}

#[test]
fn a_held_slot_is_never_overwritten() {
    let mut pool = AuxPool::new();
    pool.begin_pass();
    let kept = pool.fill_series(2, |buf, _| buf.fill(7.0));

    pool.begin_pass();
    let next = pool.fill_series(2, |buf, _| buf.fill(8.0));

    assert_eq!(*kept, vec![7.0, 7.0]);
    assert_eq!(*next, vec![8.0, 8.0]);
    assert_eq!(pool.stats().allocated, 2);
}

#[test]
fn a_shape_change_allocates_instead_of_reusing() {
    let mut pool = AuxPool::new();
    pool.begin_pass();
    pool.fill_matrix(2, 2, |_| {});

    pool.begin_pass();
    let m = pool.fill_matrix(3, 1, |m| m.set(2, 0, 5.0));

    assert_eq!((m.rows(), m.cols()), (3, 1));
    assert_eq!(pool.stats().reused, 0);
    assert_eq!(pool.len(), 1);
}
