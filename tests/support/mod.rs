//! In-memory query engine for integration tests.
//!
//! Implements the `Engine`/`QueryBuilder` collaborator contract against a
//! table → rows map, evaluating filters with `Filter::matches`, and records
//! every executed query so tests can assert query counts and shapes.

// Each integration test crate compiles its own copy; not every test uses
// every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gantry::query::{
    Engine, Filter, InsertResponse, QueryBuilder, QueryResult, Row, SelectColumn,
    TransactionConfig, TransactionToken, Value,
};

/// One executed query, as recorded by the engine.
#[derive(Debug, Clone)]
pub struct QueryRecord {
    pub table: String,
    pub kind: &'static str,
    pub constraints: Vec<Filter>,
    pub joins: Vec<(String, String, String, String)>,
    pub transacting: Option<TransactionToken>,
}

#[derive(Default)]
struct Inner {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    log: Mutex<Vec<QueryRecord>>,
    next_id: AtomicI64,
    fail_on: Mutex<Option<String>>,
}

/// In-memory engine over a table → rows map.
#[derive(Clone, Default)]
pub struct MemoryEngine {
    inner: Arc<Inner>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        let engine = Self::default();
        engine.inner.next_id.store(1000, Ordering::SeqCst);
        engine
    }

    /// Seed a table with rows.
    pub fn seed(&self, table: &str, rows: Vec<Row>) {
        self.inner
            .tables
            .lock()
            .unwrap()
            .insert(table.to_string(), rows);
    }

    /// Snapshot of a table's current rows.
    pub fn table(&self, table: &str) -> Vec<Row> {
        self.inner
            .tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Every query executed so far.
    pub fn log(&self) -> Vec<QueryRecord> {
        self.inner.log.lock().unwrap().clone()
    }

    /// Number of queries of one kind executed against one table.
    pub fn count(&self, kind: &str, table: &str) -> usize {
        self.log()
            .iter()
            .filter(|r| r.kind == kind && r.table == table)
            .count()
    }

    /// Drop the query log.
    pub fn clear_log(&self) {
        self.inner.log.lock().unwrap().clear();
    }

    /// Make every select against one table fail.
    pub fn fail_on(&self, table: &str) {
        *self.inner.fail_on.lock().unwrap() = Some(table.to_string());
    }
}

#[async_trait]
impl Engine for MemoryEngine {
    fn builder(&self, table: &str) -> Box<dyn QueryBuilder> {
        Box::new(MemoryBuilder {
            inner: Arc::clone(&self.inner),
            table: table.to_string(),
            constraints: Vec::new(),
            joins: Vec::new(),
            limit: None,
            transacting: None,
        })
    }

    async fn begin(&self, _config: &TransactionConfig) -> QueryResult<TransactionToken> {
        Ok(TransactionToken::new())
    }
}

struct MemoryBuilder {
    inner: Arc<Inner>,
    table: String,
    constraints: Vec<Filter>,
    joins: Vec<(String, String, String, String)>,
    limit: Option<u64>,
    transacting: Option<TransactionToken>,
}

/// One candidate result: the target-table row plus, when joined, the
/// matching join-table row.
struct Candidate {
    target: Row,
    join: Option<Row>,
}

impl Candidate {
    fn combined(&self) -> Row {
        let mut row = self.join.clone().unwrap_or_default();
        row.extend(self.target.clone());
        row
    }
}

impl MemoryBuilder {
    fn record(&self, kind: &'static str) {
        self.inner.log.lock().unwrap().push(QueryRecord {
            table: self.table.clone(),
            kind,
            constraints: self.constraints.clone(),
            joins: self.joins.clone(),
            transacting: self.transacting,
        });
    }

    fn candidates(&self) -> Vec<Candidate> {
        let tables = self.inner.tables.lock().unwrap();
        let base = tables.get(&self.table).cloned().unwrap_or_default();
        match self.joins.first() {
            None => base
                .into_iter()
                .map(|target| Candidate { target, join: None })
                .collect(),
            Some((join_table, left, _op, right)) => {
                let join_rows = tables.get(join_table).cloned().unwrap_or_default();
                let left_col = bare_column(left);
                let right_col = bare_column(right);
                let mut out = Vec::new();
                for target in &base {
                    for join in &join_rows {
                        if target.get(left_col) == join.get(right_col)
                            && target.get(left_col).is_some()
                        {
                            out.push(Candidate {
                                target: target.clone(),
                                join: Some(join.clone()),
                            });
                        }
                    }
                }
                out
            }
        }
    }

    fn project(&self, candidate: &Candidate, columns: &[SelectColumn]) -> Row {
        let combined = candidate.combined();
        let mut out = Row::new();
        for column in columns {
            match column {
                SelectColumn::TableStar(_) => out.extend(candidate.target.clone()),
                SelectColumn::Named(name) => {
                    if let Some(value) = combined.get(bare_column(name)) {
                        out.insert(bare_column(name).to_string(), value.clone());
                    }
                }
                SelectColumn::Aliased { source, alias } => {
                    let source_col = bare_column(source);
                    let value = candidate
                        .join
                        .as_ref()
                        .and_then(|j| j.get(source_col))
                        .or_else(|| candidate.target.get(source_col))
                        .cloned()
                        .unwrap_or(Value::Null);
                    out.insert(alias.clone(), value);
                }
            }
        }
        out
    }
}

fn bare_column(column: &str) -> &str {
    column.rsplit('.').next().unwrap_or(column)
}

#[async_trait]
impl QueryBuilder for MemoryBuilder {
    fn where_(&mut self, filter: Filter) {
        self.constraints.push(filter);
    }

    fn where_in(&mut self, column: &str, values: Vec<Value>) {
        self.constraints.push(Filter::In(column.to_string(), values));
    }

    fn join(&mut self, table: &str, left: &str, op: &str, right: &str) {
        self.joins
            .push((table.to_string(), left.to_string(), op.to_string(), right.to_string()));
    }

    fn transacting(&mut self, token: TransactionToken) {
        self.transacting = Some(token);
    }

    fn limit(&mut self, n: u64) {
        self.limit = Some(n);
    }

    fn constraints(&self) -> &[Filter] {
        &self.constraints
    }

    async fn select(&mut self, columns: &[SelectColumn]) -> QueryResult<Vec<Row>> {
        self.record("select");
        if self.inner.fail_on.lock().unwrap().as_deref() == Some(self.table.as_str()) {
            return Err(gantry::query::QueryError::execution(format!(
                "injected failure for table {}",
                self.table
            )));
        }
        let mut rows: Vec<Row> = self
            .candidates()
            .into_iter()
            .filter(|c| {
                let combined = c.combined();
                self.constraints.iter().all(|f| f.matches(&combined))
            })
            .map(|c| self.project(&c, columns))
            .collect();
        if let Some(limit) = self.limit {
            rows.truncate(limit as usize);
        }
        Ok(rows)
    }

    async fn insert(&mut self, mut attrs: Row) -> QueryResult<InsertResponse> {
        self.record("insert");
        let generated = match attrs.get("id") {
            Some(v) if !v.is_null() => None,
            _ => {
                let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
                attrs.insert("id".to_string(), Value::Int(id));
                Some(Value::Int(id))
            }
        };
        self.inner
            .tables
            .lock()
            .unwrap()
            .entry(self.table.clone())
            .or_default()
            .push(attrs);
        Ok(InsertResponse {
            generated_id: generated,
        })
    }

    async fn update(&mut self, attrs: Row) -> QueryResult<u64> {
        self.record("update");
        let mut tables = self.inner.tables.lock().unwrap();
        let rows = tables.entry(self.table.clone()).or_default();
        let mut affected = 0;
        for row in rows.iter_mut() {
            if self.constraints.iter().all(|f| f.matches(row)) {
                row.extend(attrs.clone());
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn delete(&mut self) -> QueryResult<u64> {
        self.record("delete");
        let mut tables = self.inner.tables.lock().unwrap();
        let rows = tables.entry(self.table.clone()).or_default();
        let before = rows.len();
        rows.retain(|row| !self.constraints.iter().all(|f| f.matches(row)));
        Ok((before - rows.len()) as u64)
    }
}
