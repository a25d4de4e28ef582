//! An in-process stand-in for a SQL Server session.
//!
//! Scripts are executed from their statement trees rather than their SQL
//! text; raw catalog queries are answered from the stored definitions. Bulk loads append rows in reverse order, the way a real bulk copy
//! is free to reorder them.

use async_trait::async_trait;
use connectors::{
    error::{SchemaError, SchemaLoadFailure},
    metadata::query::{
        COL_CHAR_MAX_LENGTH, COL_COLUMN_NAME, COL_CONSTRAINT_NAME, COL_DATA_TYPE,
        COL_IS_IDENTITY, COL_IS_NULLABLE, COL_ORDINAL_POSITION, COL_PK_CONSTRAINT_NAME,
        COL_PK_ORDINAL_POSITION, COL_REFERENCED_COLUMN, COL_REFERENCED_TABLE, COL_TABLE_NAME,
        COL_TABLE_SCHEMA,
    },
    sql::base::{
        error::DbError,
        session::{SchemaSource, SqlSession},
    },
};
use model::{
    core::{
        identifiers::TableIdentifier,
        value::{FieldValue, Value},
    },
    records::{buffer::RowBuffer, row::RowData},
    schema::table::{TableDefinition, TableSchemaDetailLevel},
};
use planner::query::{
    ast::{
        common::{OrderDir, TableRef},
        drop_table::DropTable,
        expr::{BinaryOperator, Expr},
        merge::{Merge, MergeSource},
        select::{Select, Top},
    },
    script::{Script, Statement},
};
use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering as AtomicOrdering},
    },
    time::Duration,
};
use tracing::debug;

struct Table {
    definition: TableDefinition,
    rows: Vec<Vec<Value>>,
    next_identity: i64,
}

#[derive(Default)]
struct TempTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

#[derive(Default)]
struct State {
    tables: HashMap<String, Table>,
    temps: HashMap<String, TempTable>,
}

type ResultSet = (Vec<String>, Vec<Vec<Value>>);

#[derive(Default)]
pub struct MemoryDatabase {
    state: Mutex<State>,
}

fn table_key(schema: &str, name: &str) -> String {
    format!("[{schema}].[{name}]").to_lowercase()
}

fn ref_key(table: &TableRef) -> Option<String> {
    table.schema.as_deref().map(|schema| table_key(schema, &table.name))
}

fn position(columns: &[String], name: &str) -> Option<usize> {
    columns.iter().position(|c| c.eq_ignore_ascii_case(name))
}

fn invalid_object(name: &str) -> DbError {
    DbError::Server {
        code: 208,
        message: format!("Invalid object name '{name}'."),
    }
}

fn invalid_column(name: &str) -> DbError {
    DbError::Server {
        code: 207,
        message: format!("Invalid column name '{name}'."),
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => Ordering::Equal,
        },
    }
}

/// The value of the `N'..'` literal that follows `prefix` in `sql`.
fn bound_literal(sql: &str, prefix: &str) -> Result<String, DbError> {
    let start = sql
        .find(prefix)
        .ok_or_else(|| DbError::Unknown(format!("catalog query has no '{prefix}'")))?;
    let rest = sql[start + prefix.len()..]
        .strip_prefix("N'")
        .ok_or_else(|| DbError::Unknown(format!("'{prefix}' is not bound to a literal")))?;

    let mut value = String::new();
    let mut chars = rest.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\'' {
            value.push(ch);
        } else if chars.peek() == Some(&'\'') {
            chars.next();
            value.push('\'');
        } else {
            return Ok(value);
        }
    }
    Err(DbError::Unknown("unterminated literal".into()))
}

fn literal_value(sql: &str) -> Result<Value, DbError> {
    if let Some(text) = sql.strip_prefix("N'").and_then(|s| s.strip_suffix('\'')) {
        return Ok(Value::String(text.replace("''", "'")));
    }
    sql.parse::<i64>()
        .map(Value::Int)
        .map_err(|_| DbError::Unknown(format!("unsupported literal {sql}")))
}

fn column_rows(definition: &TableDefinition) -> ResultSet {
    let columns = [
        COL_TABLE_SCHEMA,
        COL_TABLE_NAME,
        COL_COLUMN_NAME,
        COL_ORDINAL_POSITION,
        COL_DATA_TYPE,
        COL_IS_NULLABLE,
        COL_CHAR_MAX_LENGTH,
        COL_IS_IDENTITY,
        COL_PK_CONSTRAINT_NAME,
        COL_PK_ORDINAL_POSITION,
    ]
    .map(String::from)
    .to_vec();

    let table = definition.table();
    let primary_key = definition.primary_key();
    let rows = definition
        .columns()
        .iter()
        .map(|column| {
            let key = primary_key.and_then(|pk| {
                pk.key_columns
                    .iter()
                    .find(|k| k.column_name.eq_ignore_ascii_case(&column.name))
                    .map(|k| (pk.constraint_name.clone(), k.ordinal_position as i64))
            });
            vec![
                Value::from(table.schema_name()),
                Value::from(table.table_name()),
                Value::from(column.name.as_str()),
                Value::Int(column.ordinal_position as i64),
                Value::from(column.sql_type.as_str()),
                Value::from(if column.is_nullable { "YES" } else { "NO" }),
                Value::from(column.char_max_length),
                Value::Int(column.is_identity as i64),
                Value::from(key.as_ref().map(|(name, _)| name.clone())),
                Value::from(key.map(|(_, position)| position)),
            ]
        })
        .collect();
    (columns, rows)
}

fn foreign_key_rows(definition: &TableDefinition) -> ResultSet {
    let columns = [
        COL_CONSTRAINT_NAME,
        COL_COLUMN_NAME,
        COL_REFERENCED_TABLE,
        COL_REFERENCED_COLUMN,
    ]
    .map(String::from)
    .to_vec();
    let rows = definition
        .foreign_keys()
        .iter()
        .map(|fk| {
            vec![
                Value::from(fk.constraint_name.as_str()),
                Value::from(fk.column_name.as_str()),
                Value::from(fk.referenced_table.as_str()),
                Value::from(fk.referenced_column.as_str()),
            ]
        })
        .collect();
    (columns, rows)
}

/// Column pairs `(target, source)` of an AND-chain of equalities.
fn match_pairs(
    on: &Expr,
    target_alias: &str,
    pairs: &mut Vec<(String, String)>,
) -> Result<(), DbError> {
    match on {
        Expr::BinaryOp(op) if op.op == BinaryOperator::And => {
            match_pairs(&op.left, target_alias, pairs)?;
            match_pairs(&op.right, target_alias, pairs)
        }
        Expr::BinaryOp(op) => match (&op.left, &op.right) {
            (Expr::Identifier(left), Expr::Identifier(right)) => {
                if left.qualifier.as_deref() == Some(target_alias) {
                    pairs.push((left.name.clone(), right.name.clone()));
                } else {
                    pairs.push((right.name.clone(), left.name.clone()));
                }
                Ok(())
            }
            _ => Err(DbError::Unknown("unsupported merge predicate".into())),
        },
        _ => Err(DbError::Unknown("unsupported merge predicate".into())),
    }
}

impl MemoryDatabase {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create_table(&self, definition: TableDefinition) {
        let key = definition.fully_qualified_name().to_lowercase();
        self.state().tables.insert(
            key,
            Table {
                definition,
                rows: Vec::new(),
                next_identity: 1,
            },
        );
    }

    fn definition(&self, table: &TableIdentifier) -> Option<TableDefinition> {
        self.state()
            .tables
            .get(&table.fully_qualified().to_lowercase())
            .map(|t| t.definition.clone())
    }

    /// Current rows of a real table, keyed by column name.
    pub fn rows(&self, table: &str) -> Vec<RowData> {
        let Ok(identifier) = TableIdentifier::parse(table) else {
            return Vec::new();
        };
        let state = self.state();
        let Some(table) = state
            .tables
            .get(&identifier.fully_qualified().to_lowercase())
        else {
            return Vec::new();
        };
        table
            .rows
            .iter()
            .map(|row| {
                RowData::new(
                    table
                        .definition
                        .columns()
                        .iter()
                        .zip(row)
                        .map(|(c, v)| FieldValue::new(c.name.clone(), v.clone()))
                        .collect(),
                )
            })
            .collect()
    }

    /// Names of the temp tables that currently exist.
    pub fn temp_tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state().temps.keys().cloned().collect();
        names.sort();
        names
    }

    /// Runs a statement script and returns the result set of every plain
    /// SELECT in it. Raw SQL is only understood when it is a catalog query.
    fn run(&self, script: &Script) -> Result<Vec<ResultSet>, DbError> {
        if script.statements().is_empty() {
            return self.catalog(script.sql()).map(|set| vec![set]);
        }

        let mut state = self.state();
        let mut result_sets = Vec::new();
        for statement in script.statements() {
            match statement {
                Statement::Select(select) if select.into.is_some() => {
                    Self::select_into(&mut state, select)?
                }
                Statement::Select(select) => result_sets.push(Self::select(&state, select)?),
                Statement::Merge(merge) => Self::merge(&mut state, merge)?,
                Statement::DropTable(drop) => Self::drop_table(&mut state, drop)?,
            }
        }
        Ok(result_sets)
    }

    /// Answers the column and foreign key catalog queries from the stored
    /// definitions.
    fn catalog(&self, sql: &str) -> Result<ResultSet, DbError> {
        let (schema_prefix, table_prefix) = if sql.contains("INFORMATION_SCHEMA.COLUMNS") {
            ("c.TABLE_SCHEMA = ", "c.TABLE_NAME = ")
        } else if sql.contains("sys.foreign_keys") {
            ("ps.name = ", "pt.name = ")
        } else {
            return Err(DbError::Unknown(format!(
                "cannot execute raw SQL in memory: {sql}"
            )));
        };

        let schema = bound_literal(sql, schema_prefix)?;
        let table = bound_literal(sql, table_prefix)?;
        let definition = TableIdentifier::new(&schema, &table)
            .ok()
            .and_then(|identifier| self.definition(&identifier));
        let Some(definition) = definition else {
            return Ok((Vec::new(), Vec::new()));
        };

        if schema_prefix.starts_with("ps.") {
            return Ok(foreign_key_rows(&definition));
        }
        Ok(column_rows(&definition))
    }

    fn source_rows(state: &State, table: &TableRef) -> Result<ResultSet, DbError> {
        if let Some(temp) = state.temps.get(&table.name) {
            return Ok((temp.columns.clone(), temp.rows.clone()));
        }
        let real = ref_key(table)
            .and_then(|key| state.tables.get(&key))
            .ok_or_else(|| invalid_object(&table.name))?;
        Ok((
            real.definition
                .columns()
                .iter()
                .map(|c| c.name.clone())
                .collect(),
            real.rows.clone(),
        ))
    }

    fn select(state: &State, select: &Select) -> Result<ResultSet, DbError> {
        let Some(from) = select.from.as_ref() else {
            return Self::select_constants(select);
        };
        let (columns, mut rows) = Self::source_rows(state, &from.table)?;

        for order in select.order_by.iter().rev() {
            let Expr::Identifier(ident) = &order.expr else {
                return Err(DbError::Unknown("unsupported ORDER BY".into()));
            };
            let idx = position(&columns, &ident.name).ok_or_else(|| invalid_column(&ident.name))?;
            rows.sort_by(|a, b| {
                let ord = compare(&a[idx], &b[idx]);
                if order.direction == Some(OrderDir::Desc) {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        if let Some(Top::Rows(n)) = select.top {
            rows.truncate(n as usize);
        }

        let mut projection: Vec<(String, usize)> = Vec::new();
        for expr in &select.columns {
            match expr {
                Expr::Wildcard => {
                    projection.extend(columns.iter().cloned().enumerate().map(|(i, c)| (c, i)))
                }
                Expr::Identifier(ident) => {
                    let idx =
                        position(&columns, &ident.name).ok_or_else(|| invalid_column(&ident.name))?;
                    projection.push((columns[idx].clone(), idx));
                }
                _ => return Err(DbError::Unknown("unsupported select column".into())),
            }
        }

        Ok((
            projection.iter().map(|(name, _)| name.clone()).collect(),
            rows.iter()
                .map(|row| projection.iter().map(|(_, i)| row[*i].clone()).collect())
                .collect(),
        ))
    }

    fn select_constants(select: &Select) -> Result<ResultSet, DbError> {
        let mut columns = Vec::with_capacity(select.columns.len());
        let mut row = Vec::with_capacity(select.columns.len());
        for expr in &select.columns {
            match expr {
                Expr::Alias { expr, alias } => match expr.as_ref() {
                    Expr::Literal(sql) => {
                        columns.push(alias.clone());
                        row.push(literal_value(sql)?);
                    }
                    _ => return Err(DbError::Unknown("unsupported constant select".into())),
                },
                _ => return Err(DbError::Unknown("unnamed constant column".into())),
            }
        }
        Ok((columns, vec![row]))
    }

    fn select_into(state: &mut State, select: &Select) -> Result<(), DbError> {
        let Some(into) = &select.into else {
            return Ok(());
        };
        if select.top != Some(Top::Rows(0)) {
            return Err(DbError::Unknown("only SELECT TOP(0) ... INTO is supported".into()));
        }

        let source_columns = match &select.from {
            Some(from) => Some(Self::source_rows(state, &from.table)?.0),
            None => None,
        };

        let mut columns = Vec::with_capacity(select.columns.len());
        for expr in &select.columns {
            match expr {
                Expr::Alias { alias, .. } => columns.push(alias.clone()),
                Expr::Identifier(ident) => {
                    let known = source_columns
                        .as_ref()
                        .and_then(|cols| position(cols, &ident.name))
                        .is_some();
                    if !known {
                        return Err(invalid_column(&ident.name));
                    }
                    columns.push(ident.name.clone());
                }
                _ => return Err(DbError::Unknown("unnamed column in SELECT INTO".into())),
            }
        }

        if state.temps.contains_key(&into.name) {
            return Err(DbError::Server {
                code: 2714,
                message: format!("There is already an object named '{}' in the database.", into.name),
            });
        }
        debug!("Created temp table {} {:?}", into.name, columns);
        state.temps.insert(
            into.name.clone(),
            TempTable {
                columns,
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    fn drop_table(state: &mut State, drop: &DropTable) -> Result<(), DbError> {
        if state.temps.remove(&drop.table.name).is_none() && !drop.if_exists {
            return Err(DbError::Server {
                code: 3701,
                message: format!(
                    "Cannot drop the table '{}', because it does not exist or you do not have permission.",
                    drop.table.name
                ),
            });
        }
        Ok(())
    }

    fn merge(state: &mut State, merge: &Merge) -> Result<(), DbError> {
        let (source_columns, source_rows) = match &merge.source {
            MergeSource::Query(select) => Self::select(state, select)?,
            MergeSource::Table(table) => Self::source_rows(state, table)?,
        };
        let target_alias = merge.target_alias.as_deref().unwrap_or(&merge.target.name);
        let source_alias = merge.source_alias.as_deref().unwrap_or_default();

        let mut pairs = Vec::new();
        match_pairs(&merge.on, target_alias, &mut pairs)?;

        let State { tables, temps } = state;
        let target = ref_key(&merge.target)
            .and_then(|key| tables.get_mut(&key))
            .ok_or_else(|| invalid_object(&merge.target.name))?;
        let target_columns: Vec<String> = target
            .definition
            .columns()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        let identity = target
            .definition
            .identity_column()
            .and_then(|c| position(&target_columns, &c.name));

        let resolve = |columns: &[String], name: &str| {
            position(columns, name).ok_or_else(|| invalid_column(name))
        };
        let key_indexes = pairs
            .iter()
            .map(|(t, s)| Ok((resolve(&target_columns, t)?, resolve(&source_columns, s)?)))
            .collect::<Result<Vec<_>, DbError>>()?;

        let source_value = |row: &[Value], expr: &Expr| -> Result<Value, DbError> {
            match expr {
                Expr::Identifier(ident) if ident.qualifier.as_deref() == Some(source_alias) => {
                    Ok(row[resolve(&source_columns, &ident.name)?].clone())
                }
                _ => Err(DbError::Unknown("unsupported merge value".into())),
            }
        };

        let existing = target.rows.len();
        let mut output: Vec<Vec<Value>> = Vec::new();

        for source in &source_rows {
            let matched: Vec<usize> = (0..existing)
                .filter(|&i| {
                    key_indexes.iter().all(|(t, s)| {
                        !source[*s].is_null() && target.rows[i][*t] == source[*s]
                    })
                })
                .collect();

            let mut touched: Vec<(usize, &str)> = Vec::new();
            if !matched.is_empty() {
                if let Some(update) = &merge.when_matched {
                    for &i in &matched {
                        for assignment in &update.assignments {
                            let idx = resolve(&target_columns, &assignment.column)?;
                            target.rows[i][idx] = source_value(source, &assignment.value)?;
                        }
                        touched.push((i, "UPDATE"));
                    }
                }
            } else if let Some(insert) = &merge.when_not_matched {
                let mut row = vec![Value::Null; target_columns.len()];
                for (column, value) in insert.columns.iter().zip(&insert.values) {
                    row[resolve(&target_columns, column)?] = source_value(source, value)?;
                }
                if let Some(idx) = identity {
                    row[idx] = Value::Int(target.next_identity);
                    target.next_identity += 1;
                }
                target.rows.push(row);
                touched.push((target.rows.len() - 1, "INSERT"));
            }

            if let Some(out) = &merge.output {
                for (i, action) in touched {
                    let mut values = Vec::with_capacity(out.columns.len());
                    for expr in &out.columns {
                        values.push(match expr {
                            Expr::Literal(sql) if sql == "$action" => Value::String(action.into()),
                            Expr::Identifier(ident)
                                if ident
                                    .qualifier
                                    .as_deref()
                                    .is_some_and(|q| q.eq_ignore_ascii_case("INSERTED")) =>
                            {
                                target.rows[i][resolve(&target_columns, &ident.name)?].clone()
                            }
                            other => source_value(source, other)?,
                        });
                    }
                    output.push(values);
                }
            }
        }

        if let Some(out) = &merge.output {
            let temp = temps
                .get_mut(&out.into.name)
                .ok_or_else(|| invalid_object(&out.into.name))?;
            let indexes = out
                .into_columns
                .iter()
                .map(|c| resolve(&temp.columns, c))
                .collect::<Result<Vec<_>, DbError>>()?;
            for values in output {
                let mut row = vec![Value::Null; temp.columns.len()];
                for (idx, value) in indexes.iter().zip(values) {
                    row[*idx] = value;
                }
                temp.rows.push(row);
            }
        }

        Ok(())
    }

    fn bulk_load(&self, table: &str, rows: &RowBuffer) -> Result<u64, DbError> {
        let mut state = self.state();
        let temp = state
            .temps
            .get_mut(table)
            .ok_or_else(|| DbError::BulkLoad(format!("Cannot access destination table '{table}'")))?;

        let indexes = rows
            .columns()
            .iter()
            .map(|c| {
                position(&temp.columns, c).ok_or_else(|| {
                    DbError::BulkLoad(format!("The given column '{c}' does not match the destination"))
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        for source in rows.rows().iter().rev() {
            let mut row = vec![Value::Null; temp.columns.len()];
            for (idx, value) in indexes.iter().zip(source) {
                row[*idx] = value.clone();
            }
            temp.rows.push(row);
        }
        Ok(rows.len() as u64)
    }
}

/// One session on a [`MemoryDatabase`].
pub struct MemorySession {
    db: Arc<MemoryDatabase>,
    id: String,
    schema_failure: Option<(i32, String)>,
    bulk_load_failure: Option<String>,
    bulk_load_delay: Option<Duration>,
    drop_final_result_set: bool,
    schema_loads: AtomicUsize,
    scripts: Mutex<Vec<String>>,
}

impl MemorySession {
    pub fn new(db: Arc<MemoryDatabase>, id: &str) -> Self {
        Self {
            db,
            id: id.to_string(),
            schema_failure: None,
            bulk_load_failure: None,
            bulk_load_delay: None,
            drop_final_result_set: false,
            schema_loads: AtomicUsize::new(0),
            scripts: Mutex::new(Vec::new()),
        }
    }

    /// Every catalog query on this session fails with the given server error.
    pub fn with_schema_failure(mut self, code: i32, message: &str) -> Self {
        self.schema_failure = Some((code, message.to_string()));
        self
    }

    pub fn with_bulk_load_failure(mut self, message: &str) -> Self {
        self.bulk_load_failure = Some(message.to_string());
        self
    }

    pub fn with_bulk_load_delay(mut self, delay: Duration) -> Self {
        self.bulk_load_delay = Some(delay);
        self
    }

    /// Statement batches lose their last result set, as when a batch stops
    /// before reaching its final statement without raising an error.
    pub fn with_missing_final_result_set(mut self) -> Self {
        self.drop_final_result_set = true;
        self
    }

    pub fn database(&self) -> &Arc<MemoryDatabase> {
        &self.db
    }

    pub fn schema_loads(&self) -> usize {
        self.schema_loads.load(AtomicOrdering::SeqCst)
    }

    /// SQL text of every script run on this session, in order.
    pub fn executed_scripts(&self) -> Vec<String> {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, script: &Script) {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(script.sql().to_string());
    }
}

#[async_trait]
impl SqlSession for MemorySession {
    async fn execute(&self, script: &Script) -> Result<(), DbError> {
        tokio::task::yield_now().await;
        self.record(script);
        self.db.run(script).map(|_| ())
    }

    async fn query_result_sets(&self, script: &Script) -> Result<Vec<Vec<RowData>>, DbError> {
        tokio::task::yield_now().await;
        self.record(script);
        let mut result_sets = self.db.run(script)?;
        if self.drop_final_result_set && script.statements().len() > 1 {
            result_sets.pop();
        }
        Ok(result_sets
            .into_iter()
            .map(|(columns, rows)| {
                rows.into_iter()
                    .map(|row| {
                        RowData::new(
                            columns
                                .iter()
                                .zip(row)
                                .map(|(name, value)| FieldValue::new(name.clone(), value))
                                .collect(),
                        )
                    })
                    .collect()
            })
            .collect())
    }

    async fn bulk_load(&self, table: &str, rows: &RowBuffer) -> Result<u64, DbError> {
        if let Some(delay) = self.bulk_load_delay {
            tokio::time::sleep(delay).await;
        }
        tokio::task::yield_now().await;
        if let Some(message) = &self.bulk_load_failure {
            return Err(DbError::BulkLoad(message.clone()));
        }
        self.db.bulk_load(table, rows)
    }
}

#[async_trait]
impl SchemaSource for MemorySession {
    fn source_id(&self) -> String {
        self.id.clone()
    }

    async fn load_table_schema(
        &self,
        table: &TableIdentifier,
        detail: TableSchemaDetailLevel,
    ) -> Result<TableDefinition, SchemaError> {
        self.schema_loads.fetch_add(1, AtomicOrdering::SeqCst);
        tokio::task::yield_now().await;

        if let Some((code, message)) = &self.schema_failure {
            return Err(SchemaError::LoadFailure(SchemaLoadFailure::from(
                DbError::Server {
                    code: *code,
                    message: message.clone(),
                },
            )));
        }

        let definition = self
            .db
            .definition(table)
            .ok_or_else(|| SchemaError::TableNotFound(table.fully_qualified().to_string()))?;

        Ok(match detail {
            TableSchemaDetailLevel::Basic => definition,
            TableSchemaDetailLevel::Extended => {
                let foreign_keys = definition.foreign_keys().to_vec();
                definition.with_foreign_keys(foreign_keys)
            }
        })
    }
}
