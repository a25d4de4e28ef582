use model::{
    core::value::Value,
    entity::{BulkEntity, ProcessingDefinition},
    records::buffer::RowBuffer,
};
use planner::merge_script::{MergeScriptBundle, ROW_NUMBER_COLUMN};
use tracing::debug;

/// Lays the entities out in the staging table's column order and numbers
/// them `0..N` in input order.
pub fn build_staging_buffer<T: BulkEntity>(
    entities: &[T],
    processing: &ProcessingDefinition,
    bundle: &MergeScriptBundle,
) -> RowBuffer {
    let properties: Vec<Option<&str>> = bundle
        .staging_columns
        .iter()
        .filter(|c| c.as_str() != ROW_NUMBER_COLUMN)
        .map(|column| {
            let property = processing.property_for_column(column).or_else(|| {
                bundle
                    .identity_column
                    .as_deref()
                    .filter(|identity| identity.eq_ignore_ascii_case(column))
                    .and_then(|_| processing.identity_property())
            });
            if property.is_none() {
                debug!("No property maps to staging column '{}', loading NULL", column);
            }
            property.map(|p| p.property_name.as_str())
        })
        .collect();

    let mut buffer = RowBuffer::with_capacity(bundle.staging_columns.clone(), entities.len());
    for (row_number, entity) in entities.iter().enumerate() {
        let fields = entity.field_values();
        let mut row: Vec<Value> = properties
            .iter()
            .map(|property| {
                property
                    .and_then(|name| fields.iter().find(|f| f.name.eq_ignore_ascii_case(name)))
                    .map(|f| f.value.clone())
                    .unwrap_or(Value::Null)
            })
            .collect();
        row.push(Value::Int(row_number as i64));
        buffer.push_row(row);
    }

    buffer
}
