//! Human-readable rendering of tables, schemas, records, and values,
//! plus the inverse `string_to_value` literal parser.

use crate::record::{Record, RecordError, RecordResult, Schema, Table, Value};

/// Render a table header: name, schema, and live tuple count
pub fn serialize_table_info(table: &Table) -> String {
    format!(
        "TABLE {}\nSchema: {}\nTotal Tuples: {}\n",
        table.name(),
        serialize_schema(table.schema()),
        table.num_tuples()
    )
}

/// Render a schema as `Attributes[N]: a: INT, b: STRING(5) | Keys: a`
pub fn serialize_schema(schema: &Schema) -> String {
    let attrs = schema
        .attrs()
        .iter()
        .map(|a| format!("{}: {}", a.name, a.data_type.name()))
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = format!("Attributes[{}]: {}", schema.num_attrs(), attrs);

    if !schema.key_attrs().is_empty() {
        let keys = schema
            .key_attrs()
            .iter()
            .map(|&idx| schema.attrs()[idx].name.clone())
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(" | Keys: {}", keys));
    }

    out
}

/// Render a record as `RID(p,s) [a: 1, b: 'abc']`.
/// Floats print with two decimals; strings are single-quoted.
pub fn serialize_record(record: &Record, schema: &Schema) -> RecordResult<String> {
    let rid = match record.id {
        Some(rid) => format!("RID({},{})", rid.page, rid.slot),
        None => "RID(-,-)".to_string(),
    };

    let fields = (0..schema.num_attrs())
        .map(|idx| serialize_attr(record, schema, idx))
        .collect::<RecordResult<Vec<_>>>()?
        .join(", ");

    Ok(format!("{} [{}]", rid, fields))
}

/// Render one attribute as `name: value` in record formatting
pub fn serialize_attr(record: &Record, schema: &Schema, idx: usize) -> RecordResult<String> {
    let attr = schema
        .attr(idx)
        .ok_or(RecordError::InvalidAttribute(idx))?;
    let value = record.get_attr(schema, idx)?;

    let rendered = match value {
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format!("{:.2}", f),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => format!("'{}'", s),
    };

    Ok(format!("{}: {}", attr.name, rendered))
}

/// Render a bare value: no attribute name, floats with six decimals,
/// strings unquoted
pub fn serialize_value(value: &Value) -> String {
    match value {
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format!("{:.6}", f),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => s.clone(),
    }
}

/// Parse a one-char-tagged literal: `i<int>`, `f<float>`, `s<string>`,
/// `b<t|1|anything-else>`. Unknown tags and malformed numbers yield `None`.
pub fn string_to_value(input: &str) -> Option<Value> {
    let rest = input.get(1..)?;
    match input.chars().next()? {
        'i' => rest.parse::<i32>().ok().map(Value::Int),
        'f' => rest.parse::<f32>().ok().map(Value::Float),
        's' => Some(Value::String(rest.to_string())),
        'b' => Some(Value::Bool(rest == "t" || rest == "1")),
        _ => None,
    }
}
