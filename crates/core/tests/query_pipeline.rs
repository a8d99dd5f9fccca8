//! Qualifier translation, engine execution and normalization end to end.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tablebridge_common::action::ActionContext;
use tablebridge_common::config::CacheSettings;
use tablebridge_core::descriptor::build_descriptors;
use tablebridge_core::qualifier::build_query_context;
use tablebridge_core::{
    ConnectionCache, EngineError, ExecuteRequest, ExecutionContext, MemoryEngine, QueryEngine,
    ResultStream,
};

const FIXTURE: &str = r#"{
  "tables": [
    {
      "name": "instances",
      "description": "Compute instances",
      "columns": [
        {"name": "id", "type": "string"},
        {"name": "cpus", "type": 1},
        {"name": "launched", "type": "timestamp"},
        {"name": "tags", "type": "json"},
        {"name": "private_ip", "type": "ipaddr"}
      ],
      "rows": [
        {"id": "i-1", "cpus": 2, "launched": "2024-03-01T10:00:00Z", "tags": {"env": "prod"}, "private_ip": "10.0.0.1"},
        {"id": "i-2", "cpus": 8, "launched": "2024-03-02T10:00:00.5Z", "tags": {}, "private_ip": "10.0.0.2"},
        {"id": "i-3", "cpus": 4, "launched": null}
      ]
    }
  ]
}"#;

fn ctx() -> ExecutionContext {
    ExecutionContext::new(
        Arc::new(ActionContext::default()),
        Duration::from_secs(5),
        Arc::new(ConnectionCache::new(&CacheSettings::default())),
    )
}

#[test]
fn descriptors_follow_fixture_schema() {
    let engine = MemoryEngine::from_yaml(FIXTURE).unwrap();
    let descriptors = build_descriptors(engine.schema());

    assert_eq!(descriptors.len(), 1);
    let fields: Vec<(&str, &str)> = descriptors[0]
        .output
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.field_type.as_str()))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("id", "string"),
            ("cpus", "int"),
            ("launched", "timestamp"),
            ("tags", "json"),
            ("private_ip", "ipaddress"),
        ]
    );
}

#[tokio::test]
async fn constraints_filter_and_values_normalize() {
    let engine = MemoryEngine::from_yaml(FIXTURE).unwrap();
    let parameters: HashMap<String, String> = [(
        "query.ctx".to_string(),
        r#"{"constraints":{"cpus":{"constraints":[{"operator":4,"expression":"2"}]}}}"#.to_string(),
    )]
    .into_iter()
    .collect();

    let (mut query_context, _) = build_query_context(&parameters, "query.ctx").unwrap();
    query_context.columns = engine
        .schema()
        .get("instances")
        .unwrap()
        .column_names()
        .map(String::from)
        .collect();

    let mut sink = ResultStream::new(10);
    engine
        .execute(
            &ctx(),
            ExecuteRequest {
                table: "instances".to_string(),
                query_context,
                max_rows: 10,
                key_lookup: false,
            },
            &mut sink,
        )
        .await
        .unwrap();

    let rows = sink.into_rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], "i-2");
    assert_eq!(rows[0]["launched"], "2024-03-02T10:00:00.500Z");
    assert_eq!(rows[0]["tags"], "{}");
    assert_eq!(rows[0]["private_ip"], "10.0.0.2");
    assert_eq!(rows[1]["id"], "i-3");
    assert_eq!(rows[1]["launched"], "");
}

#[tokio::test]
async fn truncation_keeps_rows_sent_before_the_limit() {
    let engine = MemoryEngine::from_yaml(FIXTURE).unwrap();
    let mut sink = ResultStream::new(1);

    let err = engine
        .execute(
            &ctx(),
            ExecuteRequest {
                table: "instances".to_string(),
                query_context: Default::default(),
                max_rows: 1,
                key_lookup: false,
            },
            &mut sink,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::RowLimitReached { limit: 1 }));
    assert_eq!(sink.len(), 1);
}
