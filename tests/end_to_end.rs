use std::thread;
use std::time::Duration;

use shm_tables::engine::TableError;
use shm_tables::engine::core::{ArrayBuilder, Column, Table};
use shm_tables::engine::schema::Field;
use shm_tables::engine::store::{Client, ObjectId};
use shm_tables::engine::types::{DType, Value};
use tempfile::tempdir;

fn sample_table(rows: usize) -> Table {
    let mut ids = ArrayBuilder::new(DType::Int64);
    let mut names = ArrayBuilder::new(DType::Utf8);
    for i in 0..rows {
        ids.append_i64(i as i64).unwrap();
        if i % 3 == 0 {
            names.append_null().unwrap();
        } else {
            names.append_str(&format!("name-{i}")).unwrap();
        }
    }
    Table::from_columns(vec![
        Column::new(Field::new("id", DType::Int64), ids.finish().unwrap()).unwrap(),
        Column::new(Field::new("name", DType::Utf8), names.finish().unwrap()).unwrap(),
    ])
    .unwrap()
}

#[test]
fn table_crosses_between_independent_clients() {
    let dir = tempdir().unwrap();
    let id = ObjectId::from_key("obj1").unwrap();

    let mut writer = Client::connect(dir.path()).unwrap();
    let written = writer.write_table(&sample_table(10), &id).unwrap();
    assert_eq!(std::fs::metadata(dir.path().join(id.to_hex())).unwrap().len(), written as u64);

    let mut reader = Client::connect(dir.path()).unwrap();
    let table = reader.read_table(&id, 0).unwrap();
    assert_eq!(table.num_rows(), 10);
    assert_eq!(table.column_by_index(0).unwrap().value_at(7).unwrap(), Value::Int64(7));
    assert_eq!(table.column_by_name("name").unwrap().str_at(3).unwrap(), None);
    assert_eq!(table.column_by_name("name").unwrap().str_at(4).unwrap(), Some("name-4"));

    let slice = table.slice(2, 4).unwrap();
    assert_eq!(slice.row(0).unwrap(), table.row(2).unwrap());

    reader.release(&id).unwrap();
    reader.disconnect().unwrap();
    writer.delete(&id).unwrap();
    writer.disconnect().unwrap();
}

#[test]
fn reader_waits_for_writer_in_another_thread() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_path_buf();
    let id = ObjectId::random();

    let handle = thread::spawn(move || {
        let mut writer = Client::connect(&root).unwrap();
        thread::sleep(Duration::from_millis(50));
        writer.write_table(&sample_table(100), &id).unwrap();
    });

    let mut reader = Client::connect(dir.path()).unwrap();
    let table = reader.read_table(&id, -1).unwrap();
    assert_eq!(table.num_rows(), 100);
    handle.join().unwrap();
}

#[test]
fn absent_object_is_not_found() {
    let dir = tempdir().unwrap();
    let mut reader = Client::connect(dir.path()).unwrap();
    let err = reader
        .read_table(&ObjectId::from_key("nope").unwrap(), 25)
        .expect_err("never written");
    assert!(matches!(err, TableError::NotFound(_)));
}
