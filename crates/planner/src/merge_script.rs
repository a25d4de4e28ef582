//! Builds the statement batches that drive one bulk merge: temp table
//! creation, the MERGE with its OUTPUT capture, and cleanup.

use crate::{
    error::PlannerError,
    qualifier::MatchQualifierResolver,
    query::{
        ast::{
            common::{OrderDir, TableRef},
            expr::Expr,
            merge::{Merge, MergeAssignment},
            select::{Select, Top},
        },
        builder::{drop_table::DropTableBuilder, merge::MergeBuilder, select::SelectBuilder},
        dialect::{Dialect, SqlServer},
        ident, literal, qualified,
        script::{Script, Statement},
    },
};
use model::{
    entity::ProcessingDefinition,
    merge::{action::MergeAction, qualifier::MatchQualifierExpression},
    schema::table::TableDefinition,
};
use tracing::debug;
use uuid::Uuid;

/// Reserved column carrying each row's input position through the load and
/// the MERGE OUTPUT. Target tables must not define a column with this name.
pub const ROW_NUMBER_COLUMN: &str = "_BULK_MERGE_ROW_NUMBER_";
pub const IDENTITY_OUTPUT_COLUMN: &str = "IDENTITY_ID";
pub const ACTION_OUTPUT_COLUMN: &str = "MERGE_ACTION";
/// The merge batch ends with a one-row result set carrying this column and
/// value. A batch that stops early never produces it.
pub const COMPLETION_COLUMN: &str = "BULK_MERGE_STATUS";
pub const COMPLETION_MARKER: &str = "COMPLETED";

const STAGING_TABLE_PREFIX: &str = "#BulkMerge_STAGING_";
const OUTPUT_TABLE_PREFIX: &str = "#BulkMerge_OUTPUT_";
const TARGET_ALIAS: &str = "target";
const SOURCE_ALIAS: &str = "source";

#[derive(Debug, Clone)]
pub struct MergeScriptBundle {
    pub staging_table_name: String,
    pub output_table_name: String,
    /// Staging columns in load order: identity (if any), the writable
    /// columns, then the row number column.
    pub staging_columns: Vec<String>,
    pub identity_column: Option<String>,
    /// Creates the staging and output temp tables.
    pub init_script: Script,
    /// Runs the MERGE, returns the captured output ordered by row number,
    /// drops the temp tables and finally selects the completion marker.
    pub merge_script: Script,
    /// Drops both temp tables if they still exist. Used after a failed step.
    pub cleanup_script: Script,
    pub qualifier: MatchQualifierExpression,
}

impl MergeScriptBundle {
    pub fn has_identity(&self) -> bool {
        self.identity_column.is_some()
    }
}

pub struct MergeScriptBuilder {
    dialect: Box<dyn Dialect>,
}

impl Default for MergeScriptBuilder {
    fn default() -> Self {
        Self::new(Box::new(SqlServer))
    }
}

impl MergeScriptBuilder {
    pub fn new(dialect: Box<dyn Dialect>) -> Self {
        Self { dialect }
    }

    pub fn build(
        &self,
        table: &TableDefinition,
        processing: &ProcessingDefinition,
        action: MergeAction,
        qualifier_override: Option<&MatchQualifierExpression>,
    ) -> Result<MergeScriptBundle, PlannerError> {
        if processing.properties.is_empty() {
            return Err(PlannerError::InvalidArgument(format!(
                "entity mapping for {} defines no properties",
                table.fully_qualified_name()
            )));
        }

        let qualifier = MatchQualifierResolver::resolve(table, processing, qualifier_override)?;

        let writable: Vec<String> = table
            .column_names(false)
            .into_iter()
            .map(String::from)
            .collect();
        if writable.is_empty() {
            return Err(PlannerError::InvalidArgument(format!(
                "table {} has no writable columns",
                table.fully_qualified_name()
            )));
        }

        let identity_column = table.identity_column().map(|c| c.name.clone());
        let staging = TableRef::temp(&format!("{STAGING_TABLE_PREFIX}{}", Uuid::new_v4().simple()));
        let output = TableRef::temp(&format!("{OUTPUT_TABLE_PREFIX}{}", Uuid::new_v4().simple()));
        let target = TableRef::new(
            Some(table.table().schema_name()),
            table.table().table_name(),
        );

        let mut staging_columns = Vec::with_capacity(writable.len() + 2);
        staging_columns.extend(identity_column.clone());
        staging_columns.extend(writable.iter().cloned());
        staging_columns.push(ROW_NUMBER_COLUMN.to_string());

        let init_script = Script::new(
            vec![
                Statement::Select(Self::staging_table(
                    &target,
                    &staging,
                    identity_column.as_deref(),
                    &writable,
                )),
                Statement::Select(Self::output_table(&output, identity_column.is_some())),
            ],
            self.dialect.as_ref(),
        );

        let mut statements = vec![
            Statement::Merge(Self::merge(
                &target,
                &staging,
                &output,
                identity_column.as_deref(),
                &writable,
                &qualifier,
                action,
            )),
            Statement::Select(Self::output_projection(&output, identity_column.is_some())),
            Statement::DropTable(DropTableBuilder::new(staging.clone()).build()),
        ];
        // Without an identity column and without a uniqueness check the
        // output table is left for the session to discard.
        if identity_column.is_some() || qualifier.throw_if_non_unique {
            statements.push(Statement::DropTable(
                DropTableBuilder::new(output.clone()).build(),
            ));
        }
        statements.push(Statement::Select(Self::completion_marker()));
        let merge_script = Script::new(statements, self.dialect.as_ref());

        let cleanup_script = Script::new(
            vec![
                Statement::DropTable(DropTableBuilder::new(staging.clone()).if_exists().build()),
                Statement::DropTable(DropTableBuilder::new(output.clone()).if_exists().build()),
            ],
            self.dialect.as_ref(),
        );

        debug!(
            "Built {} merge script for {} (staging: {}, output: {})",
            action,
            table.fully_qualified_name(),
            staging.name,
            output.name
        );

        Ok(MergeScriptBundle {
            staging_table_name: staging.name,
            output_table_name: output.name,
            staging_columns,
            identity_column,
            init_script,
            merge_script,
            cleanup_script,
            qualifier,
        })
    }

    fn staging_table(
        target: &TableRef,
        staging: &TableRef,
        identity: Option<&str>,
        writable: &[String],
    ) -> Select {
        let mut columns = Vec::with_capacity(writable.len() + 2);
        if let Some(identity) = identity {
            columns.push(literal("-1").alias(identity));
        }
        columns.extend(writable.iter().map(|c| ident(c)));
        columns.push(literal("-1").alias(ROW_NUMBER_COLUMN));

        SelectBuilder::new()
            .top(Top::Rows(0))
            .select(columns)
            .into_table(staging.clone())
            .from(target.clone(), None)
            .build()
    }

    fn output_table(output: &TableRef, has_identity: bool) -> Select {
        let mut columns = vec![literal("-1").cast("int").alias(ROW_NUMBER_COLUMN)];
        if has_identity {
            columns.push(literal("-1").cast("bigint").alias(IDENTITY_OUTPUT_COLUMN));
        }
        columns.push(literal("N''").cast("nvarchar(10)").alias(ACTION_OUTPUT_COLUMN));

        SelectBuilder::new()
            .top(Top::Rows(0))
            .select(columns)
            .into_table(output.clone())
            .build()
    }

    fn merge(
        target: &TableRef,
        staging: &TableRef,
        output: &TableRef,
        identity: Option<&str>,
        writable: &[String],
        qualifier: &MatchQualifierExpression,
        action: MergeAction,
    ) -> Merge {
        let source = SelectBuilder::new()
            .top(Top::Percent(100))
            .select(vec![Expr::Wildcard])
            .from(staging.clone(), None)
            .order_by(ident(ROW_NUMBER_COLUMN), Some(OrderDir::Asc))
            .build();

        let mut on: Option<Expr> = None;
        for field in qualifier.fields() {
            let name = field.sanitized_name();
            let cond = qualified(TARGET_ALIAS, name).eq(qualified(SOURCE_ALIAS, name));
            on = Some(match on {
                Some(prev) => prev.and(cond),
                None => cond,
            });
        }

        let mut builder = MergeBuilder::using_query(target.clone(), source)
            .target_alias(TARGET_ALIAS)
            .source_alias(SOURCE_ALIAS);
        if let Some(on) = on {
            builder = builder.on(on);
        }

        if action.updates() {
            builder = builder.when_matched_update(
                writable
                    .iter()
                    .map(|c| MergeAssignment {
                        column: c.clone(),
                        value: qualified(SOURCE_ALIAS, c),
                    })
                    .collect(),
            );
        }

        if action.inserts() {
            builder = builder.when_not_matched_insert(
                writable.to_vec(),
                writable.iter().map(|c| qualified(SOURCE_ALIAS, c)).collect(),
            );
        }

        let mut output_columns = vec![qualified(SOURCE_ALIAS, ROW_NUMBER_COLUMN)];
        let mut into_columns = vec![ROW_NUMBER_COLUMN.to_string()];
        if let Some(identity) = identity {
            output_columns.push(qualified("INSERTED", identity));
            into_columns.push(IDENTITY_OUTPUT_COLUMN.to_string());
        }
        output_columns.push(literal("$action"));
        into_columns.push(ACTION_OUTPUT_COLUMN.to_string());

        builder
            .output_into(output_columns, output.clone(), into_columns)
            .build()
    }

    fn completion_marker() -> Select {
        SelectBuilder::new()
            .select(vec![
                literal(&format!("N'{COMPLETION_MARKER}'")).alias(COMPLETION_COLUMN),
            ])
            .build()
    }

    fn output_projection(output: &TableRef, has_identity: bool) -> Select {
        let mut columns = vec![ident(ROW_NUMBER_COLUMN)];
        if has_identity {
            columns.push(ident(IDENTITY_OUTPUT_COLUMN));
        }
        columns.push(ident(ACTION_OUTPUT_COLUMN));

        let mut builder = SelectBuilder::new()
            .select(columns)
            .from(output.clone(), None)
            .order_by(ident(ROW_NUMBER_COLUMN), Some(OrderDir::Asc));
        if has_identity {
            builder = builder.order_by(ident(IDENTITY_OUTPUT_COLUMN), Some(OrderDir::Asc));
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        core::identifiers::TableIdentifier,
        entity::PropertyDefinition,
        schema::column::{ColumnDefinition, KeyColumn, PrimaryKeyConstraint},
    };

    fn widgets(with_identity: bool) -> TableDefinition {
        let mut columns = vec![
            ColumnDefinition::new("Key", 2, "nvarchar"),
            ColumnDefinition::new("Value", 3, "nvarchar"),
        ];
        let pk = if with_identity {
            columns.push(ColumnDefinition::new("Id", 1, "int").identity());
            Some(PrimaryKeyConstraint {
                constraint_name: "PK_Widgets".into(),
                key_columns: vec![KeyColumn {
                    column_name: "Id".into(),
                    ordinal_position: 1,
                }],
            })
        } else {
            None
        };
        TableDefinition::new(TableIdentifier::parse("dbo.Widgets").unwrap(), columns, pk).unwrap()
    }

    fn processing() -> ProcessingDefinition {
        ProcessingDefinition::new(vec![
            PropertyDefinition::new("Id").identity(),
            PropertyDefinition::new("Key"),
            PropertyDefinition::new("Value"),
        ])
    }

    #[test]
    fn test_identity_table_script_layout() {
        let bundle = MergeScriptBuilder::default()
            .build(&widgets(true), &processing(), MergeAction::InsertOrUpdate, None)
            .unwrap();

        let staging = &bundle.staging_table_name;
        let output = &bundle.output_table_name;
        assert!(staging.starts_with("#BulkMerge_STAGING_"));
        assert!(output.starts_with("#BulkMerge_OUTPUT_"));
        assert_eq!(
            bundle.staging_columns,
            vec!["Id", "Key", "Value", ROW_NUMBER_COLUMN]
        );
        assert_eq!(bundle.qualifier.field_names(), vec!["Id"]);

        let init = bundle.init_script.sql();
        assert!(init.contains(&format!(
            "SELECT TOP(0) -1 AS [Id], [Key], [Value], -1 AS [{ROW_NUMBER_COLUMN}] INTO [{staging}] FROM [dbo].[Widgets];"
        )));
        assert!(init.contains(&format!(
            "SELECT TOP(0) CAST(-1 AS int) AS [{ROW_NUMBER_COLUMN}], CAST(-1 AS bigint) AS [IDENTITY_ID], CAST(N'' AS nvarchar(10)) AS [MERGE_ACTION] INTO [{output}];"
        )));

        let merge = bundle.merge_script.sql();
        assert!(merge.contains("ON ([target].[Id] = [source].[Id])"));
        assert!(merge.contains("WHEN MATCHED THEN UPDATE SET [Key] = [source].[Key], [Value] = [source].[Value]"));
        assert!(merge.contains("WHEN NOT MATCHED BY TARGET THEN INSERT ([Key], [Value])"));
        assert!(merge.contains(&format!(
            "OUTPUT [source].[{ROW_NUMBER_COLUMN}], INSERTED.[Id], $action INTO [{output}]"
        )));
        assert!(merge.contains(&format!(
            "ORDER BY [{ROW_NUMBER_COLUMN}] ASC, [IDENTITY_ID] ASC;"
        )));
        assert!(merge.contains(&format!("DROP TABLE [{staging}];")));
        assert!(merge.contains(&format!("DROP TABLE [{output}];")));
        assert!(merge.ends_with("SELECT N'COMPLETED' AS [BULK_MERGE_STATUS];"));
        assert_eq!(bundle.merge_script.statements().len(), 5);
    }

    #[test]
    fn test_actions_select_merge_clauses() {
        let builder = MergeScriptBuilder::default();
        let insert = builder
            .build(&widgets(true), &processing(), MergeAction::Insert, None)
            .unwrap();
        assert!(!insert.merge_script.sql().contains("WHEN MATCHED"));
        assert!(insert.merge_script.sql().contains("WHEN NOT MATCHED BY TARGET"));

        let update = builder
            .build(&widgets(true), &processing(), MergeAction::Update, None)
            .unwrap();
        assert!(update.merge_script.sql().contains("WHEN MATCHED THEN UPDATE"));
        assert!(!update.merge_script.sql().contains("WHEN NOT MATCHED"));
    }

    #[test]
    fn test_output_table_kept_without_identity_or_uniqueness() {
        let qualifier = MatchQualifierExpression::new(["Key"]);
        let bundle = MergeScriptBuilder::default()
            .build(
                &widgets(false),
                &processing(),
                MergeAction::InsertOrUpdate,
                Some(&qualifier),
            )
            .unwrap();

        let merge = bundle.merge_script.sql();
        assert!(!bundle.has_identity());
        assert_eq!(bundle.staging_columns, vec!["Key", "Value", ROW_NUMBER_COLUMN]);
        assert!(merge.contains(&format!("DROP TABLE [{}];", bundle.staging_table_name)));
        assert!(!merge.contains(&format!("DROP TABLE [{}];", bundle.output_table_name)));
        assert!(!merge.contains("IDENTITY_ID"));

        let cleanup = bundle.cleanup_script.sql();
        assert!(cleanup.contains(&format!("DROP TABLE IF EXISTS [{}]", bundle.output_table_name)));
    }

    #[test]
    fn test_unique_qualifier_drops_output_table() {
        let qualifier = MatchQualifierExpression::new(["Key", "Value"]).with_unique_match_check(true);
        let bundle = MergeScriptBuilder::default()
            .build(&widgets(false), &processing(), MergeAction::Update, Some(&qualifier))
            .unwrap();

        let merge = bundle.merge_script.sql();
        assert!(merge.contains("ON (([target].[Key] = [source].[Key]) AND ([target].[Value] = [source].[Value]))"));
        assert!(merge.contains(&format!("DROP TABLE [{}];", bundle.output_table_name)));
    }

    #[test]
    fn test_temp_table_names_are_unique_per_build() {
        let builder = MergeScriptBuilder::default();
        let a = builder
            .build(&widgets(true), &processing(), MergeAction::Insert, None)
            .unwrap();
        let b = builder
            .build(&widgets(true), &processing(), MergeAction::Insert, None)
            .unwrap();
        assert_ne!(a.staging_table_name, b.staging_table_name);
        assert_ne!(a.output_table_name, b.output_table_name);
        assert_ne!(a.staging_table_name, a.output_table_name);
    }

    #[test]
    fn test_build_fails_without_qualifier_or_mapping() {
        let builder = MergeScriptBuilder::default();
        let err = builder
            .build(&widgets(false), &processing(), MergeAction::Insert, None)
            .unwrap_err();
        assert!(matches!(err, PlannerError::NoValidMatchQualifier { .. }));

        let err = builder
            .build(
                &widgets(true),
                &ProcessingDefinition::new(Vec::new()),
                MergeAction::Insert,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, PlannerError::InvalidArgument(_)));
    }
}
