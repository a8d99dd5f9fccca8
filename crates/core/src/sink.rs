//! Row sink handed to the query engine.

use std::collections::HashMap;
use tablebridge_common::action::ResultRow;
use tracing::debug;

use crate::normalize::normalize;
use crate::types::ColumnValue;

/// One row as streamed by the engine.
pub type EngineRow = HashMap<String, ColumnValue>;

/// Receiver for rows produced by an engine execution.
///
/// Calls are sequential; the engine never sends concurrently into one sink.
pub trait RowSink: Send {
    fn send(&mut self, row: EngineRow);
}

/// Buffers normalized rows for a single execution.
///
/// `max_rows` is a hint for observability only: the engine is responsible for
/// stopping at the limit, this sink never drops rows.
#[derive(Debug)]
pub struct ResultStream {
    rows: Vec<ResultRow>,
    max_rows: usize,
}

impl ResultStream {
    pub fn new(max_rows: usize) -> Self {
        Self {
            rows: Vec::new(),
            max_rows,
        }
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<ResultRow> {
        self.rows
    }
}

impl RowSink for ResultStream {
    fn send(&mut self, row: EngineRow) {
        let normalized: ResultRow = row
            .iter()
            .map(|(name, value)| (name.clone(), normalize(value)))
            .collect();
        self.rows.push(normalized);

        if self.rows.len() - 1 == self.max_rows {
            debug!(
                target: "bridge",
                max_rows = self.max_rows,
                "Engine sent more rows than requested"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64) -> EngineRow {
        HashMap::from([
            ("id".to_string(), ColumnValue::Int(id)),
            ("note".to_string(), ColumnValue::Null),
            ("score".to_string(), ColumnValue::Double(3.0)),
        ])
    }

    #[test]
    fn test_rows_in_receive_order() {
        let mut sink = ResultStream::new(10);
        for id in [3, 1, 2] {
            sink.send(row(id));
        }

        let ids: Vec<&str> = sink.rows().iter().map(|r| r["id"].as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_columns_normalized() {
        let mut sink = ResultStream::new(1);
        sink.send(row(7));

        let rows = sink.into_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["note"], "");
        assert_eq!(rows[0]["score"], "3.000000");
    }

    #[test]
    fn test_absent_columns_stay_absent() {
        let mut sink = ResultStream::new(1);
        sink.send(HashMap::from([(
            "only".to_string(),
            ColumnValue::String("x".into()),
        )]));
        assert_eq!(sink.rows()[0].len(), 1);
        assert!(!sink.rows()[0].contains_key("id"));
    }

    #[test]
    fn test_no_truncation_past_max_rows() {
        let mut sink = ResultStream::new(2);
        for id in 0..5 {
            sink.send(row(id));
        }
        assert_eq!(sink.len(), 5);
        assert_eq!(sink.max_rows(), 2);
    }
}
