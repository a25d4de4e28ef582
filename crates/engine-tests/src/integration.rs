#[cfg(test)]
mod tests {
    use crate::{
        memory::MemorySession,
        utils::{Tag, Widget, merger, seeded_database, session, widgets},
    };
    use connectors::{error::SchemaError, metadata::source::CatalogSession};
    use engine_core::{
        blocking::BlockingBulkMerger,
        config::BulkMergeConfig,
        error::{BulkMergeError, MergeStep},
        merge::merger::BulkMerger,
    };
    use model::{
        core::identifiers::TableIdentifier,
        merge::{action::MergeAction, qualifier::MatchQualifierExpression, result::MergeOutcome},
        schema::table::TableSchemaDetailLevel,
    };
    use std::{collections::HashSet, sync::Arc, time::Duration};
    use tracing_test::traced_test;

    // Scenario: three new widgets are upserted into an empty table.
    // Expected Outcome: every widget gets a distinct identity, in input order, and all rows report INSERT.
    #[traced_test]
    #[tokio::test]
    async fn test_upsert_into_empty_table_assigns_identities() {
        let db = seeded_database();
        let session = session(&db);
        let merger = merger(BulkMergeConfig::default());

        let response = merger
            .bulk_merge(
                MergeAction::InsertOrUpdate,
                &session,
                widgets(&["a", "b", "c"]),
                None,
                None,
            )
            .await
            .unwrap();

        let ids: Vec<i64> = response.entities.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(
            response.entities.iter().map(|w| w.key.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        assert!(response.results.iter().all(|r| r.action == MergeOutcome::Inserted));
        assert_eq!(db.rows("dbo.Widgets").len(), 3);
        assert!(db.temp_tables().is_empty());
    }

    // Scenario: a batch is inserted and the same batch is immediately upserted again.
    // Expected Outcome: every row reports UPDATE, identities and row count are unchanged.
    #[traced_test]
    #[tokio::test]
    async fn test_round_trip_upsert_reports_updates() {
        let db = seeded_database();
        let session = session(&db);
        let merger = merger(BulkMergeConfig::default());

        let inserted = merger
            .bulk_insert(&session, widgets(&["a", "b", "c"]), None, None)
            .await
            .unwrap();
        let ids: Vec<i64> = inserted.iter().map(|w| w.id).collect();

        let response = merger
            .bulk_merge(
                MergeAction::InsertOrUpdate,
                &session,
                inserted.clone(),
                None,
                None,
            )
            .await
            .unwrap();

        assert_eq!(response.entities, inserted);
        assert_eq!(response.entities.iter().map(|w| w.id).collect::<Vec<_>>(), ids);
        assert!(response.results.iter().all(|r| r.action == MergeOutcome::Updated));
        assert_eq!(db.rows("dbo.Widgets").len(), 3);
        assert_eq!(session.schema_loads(), 1);
    }

    // Scenario: rows are updated by a caller-supplied qualifier on a non-key column.
    // Expected Outcome: existing rows are updated and their identities flow back onto the entities.
    #[traced_test]
    #[tokio::test]
    async fn test_update_by_caller_qualifier() {
        let db = seeded_database();
        let session = session(&db);
        let merger = merger(BulkMergeConfig::default());

        merger
            .bulk_insert(&session, widgets(&["a", "b"]), None, None)
            .await
            .unwrap();

        let changes = vec![Widget::new("b", "changed b"), Widget::new("a", "changed a")];
        let qualifier = MatchQualifierExpression::new(["[key]"]);
        let updated = merger
            .bulk_update(&session, changes, None, Some(&qualifier))
            .await
            .unwrap();

        assert_eq!(updated.iter().map(|w| w.id).collect::<Vec<_>>(), vec![2, 1]);
        let values: Vec<String> = db
            .rows("dbo.Widgets")
            .iter()
            .filter_map(|r| r.try_get_string("Value"))
            .collect();
        assert_eq!(values, vec!["changed a", "changed b"]);

        let scripts = session.executed_scripts();
        assert!(scripts.iter().any(|sql| sql.contains("ON ([target].[Key] = [source].[Key])")));
        assert!(db.temp_tables().is_empty());
    }

    // Scenario: an insert-only call receives rows that already exist.
    // Expected Outcome: no WHEN MATCHED clause is emitted, so matched rows produce no output and keep their data.
    #[traced_test]
    #[tokio::test]
    async fn test_insert_only_skips_matched_rows() {
        let db = seeded_database();
        let session = session(&db);
        let merger = merger(BulkMergeConfig::default());

        let mut inserted = merger
            .bulk_insert(&session, widgets(&["a"]), None, None)
            .await
            .unwrap();
        inserted[0].value = "ignored".to_string();
        inserted.push(Widget::new("b", "new"));

        let response = merger
            .bulk_merge(MergeAction::Insert, &session, inserted, None, None)
            .await
            .unwrap();

        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].row_number, 1);
        assert_eq!(response.entities[1].id, 2);
        let rows = db.rows("dbo.Widgets");
        assert_eq!(rows[0].try_get_string("Value").as_deref(), Some("value of a"));
    }

    // Scenario: an empty batch.
    // Expected Outcome: the table and qualifier are still validated, but no statement reaches the session.
    #[traced_test]
    #[tokio::test]
    async fn test_empty_input_issues_no_statements() {
        let db = seeded_database();
        let session = session(&db);
        let merger = merger(BulkMergeConfig::default());

        let result = merger
            .bulk_insert(&session, Vec::<Widget>::new(), None, None)
            .await
            .unwrap();
        assert!(result.is_empty());
        assert!(session.executed_scripts().is_empty());
        assert_eq!(session.schema_loads(), 1);

        let err = merger
            .bulk_insert(&session, Vec::<Tag>::new(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BulkMergeError::NoValidMatchQualifier { .. }));
    }

    // Scenario: a table with neither a primary key nor a usable qualifier.
    // Expected Outcome: the call fails before any temp table is created.
    #[traced_test]
    #[tokio::test]
    async fn test_no_qualifier_and_no_primary_key_fails() {
        let db = seeded_database();
        let session = session(&db);
        let merger = merger(BulkMergeConfig::default());

        let err = merger
            .bulk_insert(&session, vec![Tag::new("x", "one")], None, None)
            .await
            .unwrap_err();
        match err {
            BulkMergeError::NoValidMatchQualifier { table } => assert_eq!(table, "[dbo].[Tags]"),
            other => panic!("unexpected error: {other}"),
        }

        let unknown = MatchQualifierExpression::new(["NotAColumn"]);
        let err = merger
            .bulk_insert(&session, vec![Tag::new("x", "one")], None, Some(&unknown))
            .await
            .unwrap_err();
        assert!(matches!(err, BulkMergeError::NoValidMatchQualifier { .. }));
        assert!(session.executed_scripts().is_empty());
    }

    // Scenario: a qualifier that matches two existing rows for one input row.
    // Expected Outcome: with the uniqueness check the call fails; without it both rows are updated
    // and, lacking an identity column, the output table is left behind.
    #[traced_test]
    #[tokio::test]
    async fn test_non_unique_match() {
        let db = seeded_database();
        let session = session(&db);
        let merger = merger(BulkMergeConfig::default());
        let by_code = MatchQualifierExpression::new(["Code"]);

        merger
            .bulk_insert(
                &session,
                vec![Tag::new("x", "one"), Tag::new("x", "two")],
                None,
                Some(&by_code),
            )
            .await
            .unwrap();
        assert_eq!(db.rows("dbo.Tags").len(), 2);
        assert_eq!(db.temp_tables().len(), 1);
        assert!(db.temp_tables()[0].starts_with("#BulkMerge_OUTPUT_"));

        let strict = by_code.clone().with_unique_match_check(true);
        let err = merger
            .bulk_update(&session, vec![Tag::new("x", "three")], None, Some(&strict))
            .await
            .unwrap_err();
        assert!(matches!(err, BulkMergeError::NonUniqueMatch { row_number: 0, .. }));
        assert_eq!(db.temp_tables().len(), 1);

        merger
            .bulk_update(&session, vec![Tag::new("x", "three")], None, Some(&by_code))
            .await
            .unwrap();
        assert!(
            db.rows("dbo.Tags")
                .iter()
                .all(|r| r.try_get_string("Label").as_deref() == Some("three"))
        );
        assert_eq!(db.temp_tables().len(), 2);
    }

    // Scenario: two merges run concurrently on the same session and table.
    // Expected Outcome: both succeed with disjoint identities and no temp table survives.
    #[traced_test]
    #[tokio::test]
    async fn test_concurrent_merges_on_one_session() {
        let db = seeded_database();
        let session = session(&db);
        let merger = merger(BulkMergeConfig::default());

        let (first, second) = tokio::join!(
            merger.bulk_insert(&session, widgets(&["a", "b", "c"]), None, None),
            merger.bulk_insert(&session, widgets(&["d", "e"]), None, None),
        );
        let first = first.unwrap();
        let second = second.unwrap();

        let ids: HashSet<i64> = first.iter().chain(&second).map(|w| w.id).collect();
        assert_eq!(ids.len(), 5);
        assert!(first.windows(2).all(|w| w[0].id < w[1].id));
        assert!(second.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(db.rows("dbo.Widgets").len(), 5);
        assert!(db.temp_tables().is_empty());
    }

    // Scenario: the catalog query fails on one session.
    // Expected Outcome: repeated calls through that session fail identically without re-querying;
    // a healthy session sharing the same loader still succeeds.
    #[traced_test]
    #[tokio::test]
    async fn test_schema_load_failure_is_remembered() {
        let db = seeded_database();
        let broken = MemorySession::new(db.clone(), "broken")
            .with_schema_failure(4902, "The transaction is in an incompatible state");
        let merger = merger(BulkMergeConfig::default());

        let first = merger
            .bulk_insert(&broken, widgets(&["a"]), None, None)
            .await
            .unwrap_err();
        let second = merger
            .bulk_insert(&broken, widgets(&["a"]), None, None)
            .await
            .unwrap_err();

        assert!(matches!(
            first,
            BulkMergeError::SchemaLoad(SchemaError::LoadFailure(_))
        ));
        assert_eq!(first.to_string(), second.to_string());
        assert!(first.to_string().contains("incompatible state"));
        assert_eq!(broken.schema_loads(), 1);

        let healthy = session(&db);
        let inserted = merger
            .bulk_insert(&healthy, widgets(&["a"]), None, None)
            .await
            .unwrap();
        assert_eq!(inserted[0].id, 1);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_schema_loaders_are_shared_per_identity() {
        let a = BulkMerger::get_schema_loader("Server=memory;Database=Widgets");
        let b = BulkMerger::get_schema_loader("database=Widgets; server=memory");
        let c = BulkMerger::get_schema_loader("Server=memory;Database=Other");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));

        let merger = BulkMerger::for_connection(
            "Server=memory;Database=Widgets",
            BulkMergeConfig::default(),
        );
        assert!(Arc::ptr_eq(merger.loader(), &a));
    }

    // Scenario: the bulk load takes longer than the configured command timeout.
    // Expected Outcome: the call fails with a timeout on the bulk load step and the temp tables are dropped.
    #[traced_test]
    #[tokio::test]
    async fn test_bulk_load_timeout() {
        let db = seeded_database();
        let session = session(&db).with_bulk_load_delay(Duration::from_millis(500));
        let merger = merger(
            BulkMergeConfig::default().with_command_timeout(Duration::from_millis(50)),
        );

        let err = merger
            .bulk_insert(&session, widgets(&["a"]), None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BulkMergeError::Timeout {
                step: MergeStep::BulkLoad
            }
        ));
        assert!(db.temp_tables().is_empty());
        assert!(db.rows("dbo.Widgets").is_empty());
    }

    // Scenario: the native bulk load rejects the rows.
    // Expected Outcome: the error surfaces as a bulk load failure; cleanup follows the config flag.
    #[traced_test]
    #[tokio::test]
    async fn test_bulk_load_failure_cleanup() {
        let db = seeded_database();
        let failing = session(&db).with_bulk_load_failure("String or binary data would be truncated");

        let err = merger(BulkMergeConfig::default())
            .bulk_insert(&failing, widgets(&["a"]), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BulkMergeError::BulkLoad { .. }));
        assert!(err.to_string().contains("would be truncated"));
        assert!(db.temp_tables().is_empty());

        let err = merger(BulkMergeConfig::default().with_cleanup_on_failure(false))
            .bulk_insert(&failing, widgets(&["a"]), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BulkMergeError::BulkLoad { .. }));
        assert_eq!(db.temp_tables().len(), 2);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_table_reference_validation() {
        let db = seeded_database();
        let session = session(&db);
        let merger = merger(BulkMergeConfig::default());

        let inserted = merger
            .bulk_insert(&session, widgets(&["a"]), Some(" [DBO].[widgets] "), None)
            .await
            .unwrap();
        assert_eq!(inserted[0].id, 1);

        let err = merger
            .bulk_insert(&session, widgets(&["a"]), Some("db.dbo.Widgets"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, BulkMergeError::InvalidArgument(_)));

        let err = merger
            .bulk_insert(&session, widgets(&["a"]), Some("dbo.Missing"), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BulkMergeError::SchemaLoad(SchemaError::TableNotFound(_))
        ));
    }

    // Scenario: the table definition is read through catalog queries issued on the session.
    // Expected Outcome: the merge uses the catalog casing and identity column, and a missing
    // table surfaces as not found.
    #[traced_test]
    #[tokio::test]
    async fn test_merge_through_catalog_queries() {
        let db = seeded_database();
        let session = session(&db);
        let catalog = CatalogSession::new(&session, "catalog");
        let merger = merger(
            BulkMergeConfig::default().with_schema_detail(TableSchemaDetailLevel::Extended),
        );

        let inserted = merger
            .bulk_insert(&catalog, widgets(&["a", "b"]), Some("DBO.WIDGETS"), None)
            .await
            .unwrap();
        assert_eq!(inserted.iter().map(|w| w.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(db.rows("dbo.Widgets").len(), 2);
        assert_eq!(session.schema_loads(), 0);

        let scripts = session.executed_scripts();
        assert!(scripts[0].contains("INFORMATION_SCHEMA.COLUMNS"));
        assert!(scripts[0].contains("c.TABLE_NAME = N'WIDGETS'"));
        assert!(scripts[1].contains("sys.foreign_keys"));
        assert!(scripts[3].contains("MERGE [dbo].[Widgets] AS [target]"));

        let definition = merger
            .loader()
            .get_table_schema(
                &catalog,
                &TableIdentifier::parse("dbo.widgets").unwrap(),
                TableSchemaDetailLevel::Basic,
            )
            .await
            .unwrap();
        assert_eq!(definition.fully_qualified_name(), "[dbo].[Widgets]");
        assert_eq!(definition.identity_column().unwrap().name, "Id");
        assert_eq!(session.executed_scripts().len(), scripts.len());

        let err = merger
            .bulk_insert(&catalog, widgets(&["a"]), Some("dbo.Missing"), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BulkMergeError::SchemaLoad(SchemaError::TableNotFound(_))
        ));
    }

    // Scenario: the merge batch returns without its final completion row.
    // Expected Outcome: the call fails on the merge step and the temp tables are dropped.
    #[traced_test]
    #[tokio::test]
    async fn test_merge_without_completion_marker_fails() {
        let db = seeded_database();
        let session = session(&db).with_missing_final_result_set();
        let merger = merger(BulkMergeConfig::default());

        let err = merger
            .bulk_insert(&session, widgets(&["a"]), None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BulkMergeError::ScriptExecution {
                step: MergeStep::Merge,
                ..
            }
        ));
        assert!(err.to_string().contains("completion marker"));
        assert!(db.temp_tables().is_empty());
    }

    #[traced_test]
    #[test]
    fn test_blocking_merger() {
        let db = seeded_database();
        let session = session(&db);
        let merger = BlockingBulkMerger::new(merger(BulkMergeConfig::default())).unwrap();

        let inserted = merger
            .bulk_insert(&session, widgets(&["a", "b"]), None, None)
            .unwrap();
        assert_eq!(inserted.iter().map(|w| w.id).collect::<Vec<_>>(), vec![1, 2]);

        let updated = merger
            .bulk_insert_or_update(&session, inserted.clone(), None, None)
            .unwrap();
        assert_eq!(updated, inserted);
        assert_eq!(db.rows("dbo.Widgets").len(), 2);
    }
}
