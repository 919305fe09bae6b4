use crate::engine::core::array::Array;
use crate::engine::core::column::Column;
use crate::engine::errors::TableError;
use crate::engine::schema::Field;
use crate::engine::types::{DType, Value};
use crate::test_helpers::factory::Factory;

#[test]
fn length_is_sum_of_chunk_lengths() {
    let column = Factory::column()
        .with_chunk_lengths(&[3, 0, 5, 2])
        .create();
    assert_eq!(column.num_chunks(), 4);
    assert_eq!(column.len(), 10);
}

#[test]
fn value_at_walks_chunks_including_empty_ones() {
    let column = Factory::column()
        .with_chunk_lengths(&[3, 0, 5, 2])
        .create();

    for i in 0..10 {
        assert_eq!(column.i64_at(i).unwrap(), Some(i), "row {i}");
        assert_eq!(column.value_at(i).unwrap(), Value::Int64(i));
    }

    assert!(matches!(column.i64_at(10), Err(TableError::OutOfRange(_))));
    assert!(matches!(column.i64_at(-1), Err(TableError::OutOfRange(_))));
    assert!(matches!(column.value_at(i64::MAX), Err(TableError::OutOfRange(_))));
}

#[test]
fn typed_access_checks_range_before_dtype() {
    let column = Factory::column().with_chunk_lengths(&[2]).create();

    let err = column.str_at(0).expect_err("int64 column read as string");
    assert!(matches!(
        err,
        TableError::TypeMismatch {
            expected: DType::Int64,
            ..
        }
    ));
    let err = column.str_at(5).expect_err("out of range wins");
    assert!(matches!(err, TableError::OutOfRange(_)));
}

#[test]
fn construction_rejects_chunk_of_other_dtype() {
    let ints = Array::try_from_values(DType::Int64, vec![1i64, 2]).unwrap();
    let floats = Array::try_from_values(DType::Float64, vec![1.0f64]).unwrap();
    let err = Column::from_chunks(Field::new("x", DType::Int64), vec![ints, floats])
        .expect_err("mixed chunks");
    assert!(matches!(err, TableError::TypeMismatch { .. }));

    let err = Column::new(
        Field::new("x", DType::Utf8),
        Array::try_from_values(DType::Bool, vec![true]).unwrap(),
    )
    .expect_err("field/array dtype mismatch");
    assert!(matches!(err, TableError::TypeMismatch { .. }));
}

#[test]
fn slice_spanning_chunk_boundaries_keeps_values() {
    let column = Factory::column()
        .with_chunk_lengths(&[3, 0, 5, 2])
        .create();

    let slice = column.slice(2, 6).expect("rows 2..8");
    assert_eq!(slice.len(), 6);
    // Tail of chunk 0, all of chunk 2; the empty chunk and the last chunk fall away.
    assert_eq!(slice.num_chunks(), 2);
    let values = (0..6)
        .map(|i| slice.i64_at(i).unwrap().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(values, vec![2, 3, 4, 5, 6, 7]);
}

#[test]
fn slice_bounds_are_validated() {
    let column = Factory::column().with_chunk_lengths(&[4, 6]).create();

    assert!(matches!(column.slice(8, 5), Err(TableError::OutOfRange(_))));
    assert!(matches!(column.slice(-1, 2), Err(TableError::OutOfRange(_))));
    assert!(matches!(column.slice(0, -2), Err(TableError::OutOfRange(_))));
    assert!(matches!(column.slice(i64::MAX, 1), Err(TableError::OutOfRange(_))));

    let full = column.slice(0, 10).unwrap();
    assert_eq!(full.len(), 10);
    let empty = column.slice(10, 0).unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.num_chunks(), 1);
}

#[test]
fn renamed_shares_chunks() {
    let column = Factory::column().with_name("a").create();
    let renamed = column.renamed("b");
    assert_eq!(renamed.name(), "b");
    assert_eq!(renamed.dtype(), column.dtype());
    assert_eq!(renamed.values().unwrap(), column.values().unwrap());
}

#[test]
fn nulls_surface_as_none() {
    let array = Array::try_from_values(
        DType::Utf8,
        vec![Value::from("x"), Value::Null, Value::from("z")],
    )
    .unwrap();
    let column = Column::new(Field::new("s", DType::Utf8), array).unwrap();
    assert_eq!(column.str_at(0).unwrap(), Some("x"));
    assert_eq!(column.str_at(1).unwrap(), None);
    assert_eq!(column.value_at(1).unwrap(), Value::Null);
    assert_eq!(column.null_count(), 1);
}
