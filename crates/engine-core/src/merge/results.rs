use crate::error::{BulkMergeError, MergeStep};
use connectors::sql::base::error::DbError;
use model::{
    entity::BulkEntity,
    merge::result::{MergeOutcome, MergeResult},
    records::row::RowData,
};
use planner::merge_script::{
    ACTION_OUTPUT_COLUMN, COMPLETION_COLUMN, COMPLETION_MARKER, IDENTITY_OUTPUT_COLUMN,
    ROW_NUMBER_COLUMN,
};

/// Splits the merge batch's result sets into the OUTPUT rows, after checking
/// that the batch ran through to its completion marker.
pub fn take_output_rows(mut result_sets: Vec<Vec<RowData>>) -> Result<Vec<RowData>, BulkMergeError> {
    let completed = result_sets.pop().is_some_and(|marker| {
        marker.len() == 1
            && marker[0].try_get_string(COMPLETION_COLUMN).as_deref() == Some(COMPLETION_MARKER)
    });
    if !completed || result_sets.len() != 1 {
        return Err(BulkMergeError::ScriptExecution {
            step: MergeStep::Merge,
            source: DbError::Unknown(
                "merge batch ended without its completion marker".to_string(),
            ),
        });
    }
    Ok(result_sets.pop().unwrap_or_default())
}

/// Decodes the rows returned by the merge script.
pub fn decode_results(
    rows: &[RowData],
    has_identity: bool,
) -> Result<Vec<MergeResult>, BulkMergeError> {
    rows.iter()
        .map(|row| {
            let row_number = row
                .try_get_i64(ROW_NUMBER_COLUMN)
                .filter(|n| *n >= 0)
                .ok_or_else(|| {
                    BulkMergeError::InvalidMergeOutput(format!(
                        "missing or negative '{ROW_NUMBER_COLUMN}'"
                    ))
                })?;

            let identity_value = if has_identity {
                row.try_get_i64(IDENTITY_OUTPUT_COLUMN)
            } else {
                None
            };

            let tag = row.try_get_string(ACTION_OUTPUT_COLUMN).unwrap_or_default();
            let action = tag
                .parse::<MergeOutcome>()
                .map_err(BulkMergeError::InvalidMergeOutput)?;

            Ok(MergeResult {
                row_number: row_number as usize,
                identity_value,
                action,
            })
        })
        .collect()
}

/// Writes server-assigned identities back onto the entities the results
/// point at.
pub fn apply_results<T: BulkEntity>(
    entities: &mut [T],
    results: &[MergeResult],
    throw_if_non_unique: bool,
    table: &str,
) -> Result<(), BulkMergeError> {
    let mut seen = vec![false; entities.len()];
    for result in results {
        let Some(entity) = entities.get_mut(result.row_number) else {
            return Err(BulkMergeError::InvalidMergeOutput(format!(
                "row number {} is outside the {} input rows",
                result.row_number,
                seen.len()
            )));
        };

        if std::mem::replace(&mut seen[result.row_number], true) && throw_if_non_unique {
            return Err(BulkMergeError::NonUniqueMatch {
                row_number: result.row_number,
                table: table.to_string(),
            });
        }

        if let Some(identity) = result.identity_value {
            entity.set_identity(identity);
        }
    }
    Ok(())
}
