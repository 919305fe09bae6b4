use crate::engine::types::{DType, Value};
use crate::test_helpers::factory::Factory;

#[test]
fn creates_columns_in_declaration_order() {
    let table = Factory::table()
        .with_int_column("i", 3)
        .with_string_column("s", 3)
        .with_metadata("k", "v")
        .create();

    let names: Vec<_> = table.schema().fields().iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["i", "s"]);
    assert_eq!(
        table.row(2).unwrap(),
        vec![Value::Int64(2), Value::Utf8("row-2".into())]
    );
    assert_eq!(table.schema().metadata().get("k").map(String::as_str), Some("v"));
}

#[test]
fn column_values_pick_dtype_from_first_non_null() {
    let table = Factory::table()
        .with_column_values("f", vec![Value::Null, Value::Float64(1.5)])
        .create();
    assert_eq!(table.column_by_index(0).unwrap().dtype(), DType::Float64);
}

#[test]
fn column_factory_numbers_rows_across_chunks() {
    let column = Factory::column().with_chunk_lengths(&[2, 3]).create();
    assert_eq!(column.num_chunks(), 2);
    assert_eq!(column.i64_at(4).unwrap(), Some(4));
}
