//! Table schema to action descriptor translation.

use tablebridge_common::action::{ActionDescriptor, Field, OutputSchema};

use crate::schema::{TableDefinition, TableRegistry};
use crate::types::ColumnType;

/// Maps a column kind to its protocol-neutral type name.
///
/// Total: unrecognized kinds map to `"unknown"` so descriptor generation
/// never fails on schema drift.
pub fn map_column_type(kind: ColumnType) -> &'static str {
    match kind {
        ColumnType::String => "string",
        ColumnType::Bool => "bool",
        ColumnType::Int => "int",
        ColumnType::Double => "double",
        ColumnType::Json => "json",
        ColumnType::Datetime => "datetime",
        ColumnType::IpAddr => "ipaddress",
        ColumnType::Cidr => "cidr",
        ColumnType::Timestamp => "timestamp",
        ColumnType::Unknown(_) => "unknown",
    }
}

pub fn describe_table(table: &TableDefinition) -> ActionDescriptor {
    let fields = table
        .columns()
        .iter()
        .map(|column| Field {
            name: column.name.clone(),
            field_type: map_column_type(column.column_type).to_string(),
        })
        .collect();

    ActionDescriptor {
        name: table.name().to_string(),
        description: table.description().to_string(),
        enabled: true,
        output: OutputSchema {
            name: table.name().to_string(),
            fields,
        },
    }
}

/// One descriptor per registered table, in table-name order.
pub fn build_descriptors(registry: &TableRegistry) -> Vec<ActionDescriptor> {
    registry.tables().map(describe_table).collect()
}
