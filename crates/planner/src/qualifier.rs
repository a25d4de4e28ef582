use crate::error::PlannerError;
use model::{
    entity::ProcessingDefinition,
    merge::qualifier::{MatchQualifierExpression, MatchQualifierField},
    schema::table::TableDefinition,
};
use tracing::debug;

/// Picks the columns a merge matches source rows on.
///
/// A caller-supplied expression wins over the one declared on the entity
/// model; when neither is present the primary key is used. Fields that do
/// not name a real column are dropped, and the remaining names take the
/// casing the table reports.
pub struct MatchQualifierResolver;

impl MatchQualifierResolver {
    pub fn resolve(
        table: &TableDefinition,
        processing: &ProcessingDefinition,
        caller: Option<&MatchQualifierExpression>,
    ) -> Result<MatchQualifierExpression, PlannerError> {
        let resolved = match caller.or(processing.match_qualifier.as_ref()) {
            Some(expr) => Self::sanitize(table, processing, expr),
            None => Self::primary_key_fallback(table),
        };

        match resolved {
            Some(expr) if !expr.is_empty() => {
                debug!(
                    "Resolved match qualifier for {}: {:?} (throw_if_non_unique: {})",
                    table.fully_qualified_name(),
                    expr.field_names(),
                    expr.throw_if_non_unique
                );
                Ok(expr)
            }
            _ => Err(PlannerError::NoValidMatchQualifier {
                table: table.fully_qualified_name().to_string(),
            }),
        }
    }

    fn sanitize(
        table: &TableDefinition,
        processing: &ProcessingDefinition,
        expr: &MatchQualifierExpression,
    ) -> Option<MatchQualifierExpression> {
        let mut columns: Vec<String> = Vec::new();
        for field in expr.fields() {
            let column = table.find_column(field.sanitized_name()).or_else(|| {
                if !processing.mapping_lookup_enabled {
                    return None;
                }
                processing
                    .find_property(field.sanitized_name())
                    .and_then(|prop| table.find_column(&prop.mapped_column_name))
            });

            match column {
                Some(col) if !columns.iter().any(|c| c.eq_ignore_ascii_case(&col.name)) => {
                    columns.push(col.name.clone())
                }
                Some(_) => {}
                None => debug!(
                    "Dropping match qualifier field '{}': no such column on {}",
                    field.sanitized_name(),
                    table.fully_qualified_name()
                ),
            }
        }

        Some(
            MatchQualifierExpression::from_fields(
                columns.iter().map(|c| MatchQualifierField::new(c)).collect(),
            )
            .with_unique_match_check(expr.throw_if_non_unique),
        )
    }

    fn primary_key_fallback(table: &TableDefinition) -> Option<MatchQualifierExpression> {
        table.primary_key().map(|pk| {
            MatchQualifierExpression::new(pk.ordered_column_names()).with_unique_match_check(true)
        })
    }
}
