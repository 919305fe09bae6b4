use std::path::PathBuf;

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value as JsonValue, json};
use shm_tables::engine::core::{ArrayBuilder, Column, Table};
use shm_tables::engine::schema::Field;
use shm_tables::engine::store::{Client, ObjectId};
use shm_tables::engine::types::DType;
use shm_tables::logging;
use shm_tables::shared::config::{CONFIG, StoreConfig};
use tracing::info;

#[derive(Parser)]
#[command(name = "shm_tables")]
#[command(about = "Exchange columnar tables through a shared object store", long_about = None)]
struct Args {
    /// Store directory (defaults to `store.path` from config)
    #[arg(long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a generated table under an id
    WriteDemo {
        #[arg(long)]
        id: String,
        #[arg(long, default_value = "10")]
        rows: usize,
    },
    /// Read a table and print it as JSON
    Read {
        #[arg(long)]
        id: String,
        /// 0 returns at once, negative waits forever
        #[arg(long, allow_hyphen_values = true)]
        timeout_ms: Option<i64>,
        /// Maximum number of rows to print (0 = unlimited)
        #[arg(short, long, default_value = "0")]
        limit: usize,
    },
    /// Delete a sealed table
    Delete {
        #[arg(long)]
        id: String,
    },
}

fn demo_table(rows: usize) -> anyhow::Result<Table> {
    let mut ids = ArrayBuilder::with_capacity(DType::Int64, rows);
    let mut scores = ArrayBuilder::with_capacity(DType::Float64, rows);
    let mut labels = ArrayBuilder::with_capacity(DType::Utf8, rows);
    let mut flags = ArrayBuilder::with_capacity(DType::Bool, rows);
    let mut times = ArrayBuilder::with_capacity(DType::Timestamp, rows);

    let start = Utc::now();
    for i in 0..rows {
        ids.append_i64(i as i64)?;
        scores.append_f64(i as f64 / 4.0)?;
        labels.append_str(&format!("item-{i}"))?;
        if i % 5 == 4 {
            flags.append_null()?;
        } else {
            flags.append_bool(i % 2 == 0)?;
        }
        times.append_timestamp(start + Duration::seconds(i as i64))?;
    }

    let columns = vec![
        Column::new(Field::new("id", DType::Int64), ids.finish()?)?,
        Column::new(Field::new("score", DType::Float64), scores.finish()?)?,
        Column::new(Field::new("label", DType::Utf8), labels.finish()?)?,
        Column::new(Field::new("flag", DType::Bool), flags.finish()?)?,
        Column::new(Field::new("ts", DType::Timestamp), times.finish()?)?,
    ];
    Ok(Table::from_columns(columns)?)
}

fn table_json(table: &Table, limit: usize) -> anyhow::Result<JsonValue> {
    let fields: Vec<JsonValue> = table
        .schema()
        .fields()
        .iter()
        .map(|f| json!({ "name": f.name(), "dtype": f.dtype().as_str() }))
        .collect();

    let shown = match limit {
        0 => table.num_rows(),
        n => n.min(table.num_rows()),
    };
    let mut rows = Vec::with_capacity(shown);
    for row in 0..shown {
        let mut object = Map::new();
        for (field, value) in table.schema().fields().iter().zip(table.row(row as i64)?) {
            object.insert(field.name().to_string(), value.to_json());
        }
        rows.push(JsonValue::Object(object));
    }

    Ok(json!({
        "num_rows": table.num_rows(),
        "fields": fields,
        "rows": rows,
    }))
}

fn main() -> anyhow::Result<()> {
    logging::init()?;
    let args = Args::parse();

    let config = StoreConfig {
        path: match &args.store {
            Some(path) => path.to_string_lossy().into_owned(),
            None => CONFIG.store.path.clone(),
        },
        ..CONFIG.store.clone()
    };
    let mut client = Client::from_config(&config)?;

    match args.command {
        Command::WriteDemo { id, rows } => {
            let object_id = ObjectId::from_key(&id)?;
            let table = demo_table(rows)?;
            let size = client.write_table(&table, &object_id)?;
            info!(id = %object_id, rows, size, "Wrote demo table");
            println!("{}", json!({ "id": object_id.to_hex(), "rows": rows, "bytes": size }));
        }
        Command::Read {
            id,
            timeout_ms,
            limit,
        } => {
            let object_id = ObjectId::from_key(&id)?;
            let timeout = timeout_ms.unwrap_or(config.default_timeout_ms);
            let table = client.read_table(&object_id, timeout)?;
            let output = table_json(&table, limit)?;
            client.release(&object_id)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Delete { id } => {
            let object_id = ObjectId::from_key(&id)?;
            client.delete(&object_id)?;
            println!("{}", json!({ "deleted": object_id.to_hex() }));
        }
    }

    client.disconnect()?;
    Ok(())
}
