use clap::Parser;
use prettytable::{Cell, Row};
use rmdb::ser::{serialize_record, serialize_schema, serialize_table_info};
use rmdb::{
    Attribute, DataType, EngineConfig, Record, RecordId, Schema, Table, Value, parse_predicate,
};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

#[derive(Parser, Debug)]
#[command(name = "rmdb")]
#[command(about = "Inspect and edit paged table files", long_about = None)]
struct Args {
    /// Table file to operate on
    table: String,

    /// Create the table file before opening it (requires --schema)
    #[arg(long)]
    create: bool,

    /// Schema for --create, e.g. "id:int,name:string(10),score:float,ok:bool"
    #[arg(long, value_name = "SCHEMA")]
    schema: Option<String>,

    /// Comma-separated key attribute names for --create
    #[arg(long, value_name = "KEYS")]
    keys: Option<String>,

    /// Import records from a headerless CSV file and exit
    #[arg(short, long, value_name = "PATH")]
    import: Option<String>,

    /// Engine configuration JSON (pool capacity, eviction policy)
    #[arg(long, value_name = "PATH")]
    config: Option<String>,
}

fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    if args.create {
        let Some(schema_str) = &args.schema else {
            eprintln!("--create requires --schema");
            std::process::exit(1);
        };
        let schema = match parse_schema(schema_str, args.keys.as_deref()) {
            Ok(schema) => schema,
            Err(e) => {
                eprintln!("Bad schema: {}", e);
                std::process::exit(1);
            }
        };
        if let Err(e) = Table::create(&args.table, &schema, &config) {
            eprintln!("Failed to create table: {}", e);
            std::process::exit(1);
        }
        println!("Created table {}", args.table);
    }

    let mut table = match Table::open(&args.table, &config) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Failed to open table {}: {}", args.table, e);
            std::process::exit(1);
        }
    };

    if let Some(csv_path) = &args.import {
        match import_csv(&mut table, csv_path) {
            Ok(count) => println!("Imported {} records", count),
            Err(e) => {
                eprintln!("Import failed: {}", e);
                std::process::exit(1);
            }
        }
        if let Err(e) = table.close() {
            eprintln!("Failed to close table: {}", e);
            std::process::exit(1);
        }
        return;
    }

    run_repl(&mut table);

    if let Err(e) = table.close() {
        eprintln!("Failed to close table: {}", e);
        std::process::exit(1);
    }
}

/// Parse "name:type,..." into a schema; `keys` names the key attributes
fn parse_schema(input: &str, keys: Option<&str>) -> Result<Schema, String> {
    let mut attrs = Vec::new();

    for part in input.split(',') {
        let part = part.trim();
        let (name, type_str) = part
            .split_once(':')
            .ok_or_else(|| format!("expected name:type, got '{}'", part))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing attribute name in '{}'", part));
        }

        let type_str = type_str.trim().to_ascii_lowercase();
        let data_type = if type_str == "int" {
            DataType::Int
        } else if type_str == "float" {
            DataType::Float
        } else if type_str == "bool" {
            DataType::Bool
        } else if let Some(len) = type_str
            .strip_prefix("string(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let len = len
                .trim()
                .parse::<usize>()
                .map_err(|e| format!("bad string length in '{}': {}", part, e))?;
            DataType::String(len)
        } else {
            return Err(format!("unknown type '{}'", type_str));
        };

        attrs.push(Attribute::new(name, data_type));
    }

    let key_attrs = match keys {
        None => Vec::new(),
        Some(keys) => keys
            .split(',')
            .map(|key| {
                let key = key.trim();
                attrs
                    .iter()
                    .position(|a| a.name == key)
                    .ok_or_else(|| format!("key '{}' is not an attribute", key))
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    Schema::new(attrs, key_attrs).map_err(|e| e.to_string())
}

/// Parse one textual field according to its column type
fn parse_field(field: &str, data_type: &DataType) -> Result<Value, String> {
    let trimmed = field.trim();
    match data_type {
        DataType::Int => trimmed
            .parse::<i32>()
            .map(Value::Int)
            .map_err(|e| format!("bad INT '{}': {}", trimmed, e)),
        DataType::Float => trimmed
            .parse::<f32>()
            .map(Value::Float)
            .map_err(|e| format!("bad FLOAT '{}': {}", trimmed, e)),
        DataType::Bool => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Ok(Value::Bool(true)),
            "false" | "f" | "0" => Ok(Value::Bool(false)),
            other => Err(format!("bad BOOL '{}'", other)),
        },
        DataType::String(_) => Ok(Value::String(field.to_string())),
    }
}

/// Bulk-insert rows from a headerless CSV file, fields parsed by column type
fn import_csv(table: &mut Table, path: &str) -> Result<usize, String> {
    let schema = table.schema().clone();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| e.to_string())?;

    let mut count = 0;
    for result in reader.records() {
        let row = result.map_err(|e| e.to_string())?;
        if row.len() != schema.num_attrs() {
            return Err(format!(
                "row {}: expected {} fields, got {}",
                count + 1,
                schema.num_attrs(),
                row.len()
            ));
        }

        let mut values = Vec::with_capacity(schema.num_attrs());
        for (idx, field) in row.iter().enumerate() {
            let data_type = &schema.attrs()[idx].data_type;
            values.push(parse_field(field, data_type).map_err(|e| format!("row {}: {}", count + 1, e))?);
        }

        let mut record = Record::from_values(&schema, &values).map_err(|e| e.to_string())?;
        table.insert_record(&mut record).map_err(|e| e.to_string())?;
        count += 1;
    }

    Ok(count)
}

fn run_repl(table: &mut Table) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Failed to start editor: {}", e);
            return;
        }
    };

    println!("{}", serialize_table_info(table));
    println!("Type 'help' for commands.");

    loop {
        let line = match editor.readline("rmdb> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Read error: {}", e);
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line);

        if line == "exit" || line == "quit" {
            break;
        }

        if let Err(e) = execute_command(table, line) {
            eprintln!("Error: {}", e);
        }
    }
}

fn execute_command(table: &mut Table, line: &str) -> Result<(), String> {
    let (command, rest) = match line.split_once(' ') {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "help" => {
            println!("  info                      table name, schema, tuple count");
            println!("  schema                    schema only");
            println!("  count                     live record count");
            println!("  scan [predicate]          list records, e.g. scan v < 25 && k != 3");
            println!("  get <page> <slot>         fetch one record");
            println!("  insert <v1>,<v2>,...      insert a record (fields in schema order)");
            println!("  update <page> <slot> <v1>,<v2>,...  overwrite a record");
            println!("  delete <page> <slot>      delete a record");
            println!("  exit");
            Ok(())
        }
        "info" => {
            print!("{}", serialize_table_info(table));
            Ok(())
        }
        "schema" => {
            println!("{}", serialize_schema(table.schema()));
            Ok(())
        }
        "count" => {
            println!("{}", table.num_tuples());
            Ok(())
        }
        "scan" => run_scan(table, rest),
        "get" => {
            let rid = parse_rid(rest)?;
            let record = table.get_record(rid).map_err(|e| e.to_string())?;
            let schema = table.schema().clone();
            println!("{}", serialize_record(&record, &schema).map_err(|e| e.to_string())?);
            Ok(())
        }
        "insert" => {
            let schema = table.schema().clone();
            let mut record = parse_record(&schema, rest)?;
            let rid = table.insert_record(&mut record).map_err(|e| e.to_string())?;
            println!("Inserted at RID({},{})", rid.page, rid.slot);
            Ok(())
        }
        "update" => {
            let (rid_part, values_part) = split_rid_prefix(rest)?;
            let rid = parse_rid(&rid_part)?;
            let schema = table.schema().clone();
            let mut record = parse_record(&schema, values_part)?;
            record.id = Some(rid);
            table.update_record(&record).map_err(|e| e.to_string())?;
            println!("Updated RID({},{})", rid.page, rid.slot);
            Ok(())
        }
        "delete" => {
            let rid = parse_rid(rest)?;
            table.delete_record(rid).map_err(|e| e.to_string())?;
            println!("Deleted RID({},{})", rid.page, rid.slot);
            Ok(())
        }
        other => Err(format!("unknown command '{}'; try 'help'", other)),
    }
}

fn run_scan(table: &mut Table, predicate: &str) -> Result<(), String> {
    let schema = table.schema().clone();
    let condition = if predicate.is_empty() {
        None
    } else {
        Some(parse_predicate(predicate, &schema)?)
    };

    let mut display = prettytable::Table::new();
    let mut header = vec![Cell::new("rid")];
    header.extend(schema.attrs().iter().map(|a| Cell::new(&a.name)));
    display.add_row(Row::new(header));

    let mut count = 0;
    let mut scan = table.scan(condition).map_err(|e| e.to_string())?;
    while let Some(record) = scan.next_record().map_err(|e| e.to_string())? {
        let rid = record.id.map(|r| r.to_string()).unwrap_or_default();
        let mut cells = vec![Cell::new(&rid)];
        for value in record.values(&schema).map_err(|e| e.to_string())? {
            cells.push(Cell::new(&rmdb::ser::serialize_value(&value)));
        }
        display.add_row(Row::new(cells));
        count += 1;
    }

    display.printstd();
    println!("{} records", count);
    Ok(())
}

fn parse_rid(input: &str) -> Result<RecordId, String> {
    let mut parts = input.split_whitespace();
    let page = parts
        .next()
        .ok_or("expected <page> <slot>")?
        .parse::<u32>()
        .map_err(|e| format!("bad page: {}", e))?;
    let slot = parts
        .next()
        .ok_or("expected <page> <slot>")?
        .parse::<u32>()
        .map_err(|e| format!("bad slot: {}", e))?;
    if parts.next().is_some() {
        return Err("expected exactly <page> <slot>".to_string());
    }
    Ok(RecordId::new(page, slot))
}

/// Split "page slot rest..." into the rid part and the remainder
fn split_rid_prefix(input: &str) -> Result<(String, &str), String> {
    let mut parts = input.splitn(3, ' ');
    let page = parts.next().ok_or("expected <page> <slot> <values>")?;
    let slot = parts.next().ok_or("expected <page> <slot> <values>")?;
    let rest = parts.next().ok_or("expected <page> <slot> <values>")?;
    Ok((format!("{} {}", page, slot), rest.trim()))
}

/// Parse a comma-separated value list against the schema
fn parse_record(schema: &Schema, input: &str) -> Result<Record, String> {
    let fields: Vec<&str> = input.split(',').collect();
    if fields.len() != schema.num_attrs() {
        return Err(format!(
            "expected {} fields, got {}",
            schema.num_attrs(),
            fields.len()
        ));
    }

    let mut values = Vec::with_capacity(fields.len());
    for (idx, field) in fields.iter().enumerate() {
        values.push(parse_field(field, &schema.attrs()[idx].data_type)?);
    }

    Record::from_values(schema, &values).map_err(|e| e.to_string())
}
