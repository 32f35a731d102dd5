use edfi_harness_proton::{ExternalStream, ProtonSource, QueryEngine};
use edfi_harness_types::{
    export::{
        futures::{stream, stream::BoxStream, StreamExt},
        serde_json::{json, Value as Json},
    },
    HarnessErr, HarnessResult, RecordSource, Row, SourceKey,
};
use edfi_harness_validator::{
    CancelToken, CategorySuffixRule, Collector, StreamValidator, ValidationStats,
    ValidatorOptions,
};
use std::{io, sync::Mutex};

const SCHOOL: &str = r#"{"schoolId": 1, "educationOrganizationCategories": [{"educationOrganizationCategoryDescriptor": "uri://ed-fi.org/EducationOrganizationCategoryDescriptor#School"}]}"#;
const DISTRICT: &str = r#"{"schoolId": 2, "educationOrganizationCategories": [{"educationOrganizationCategoryDescriptor": "uri://ed-fi.org/EducationOrganizationCategoryDescriptor#District"}]}"#;

type RowItem = HarnessResult<Row, io::Error>;

/// Answers every query with the same rows, and remembers what it was asked.
#[derive(Debug, Default)]
struct FakeEngine {
    rows: Mutex<Vec<Vec<Json>>>,
    statements: Mutex<Vec<String>>,
    lost: bool,
}

impl FakeEngine {
    fn with_rows(rows: Vec<Vec<Json>>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

impl QueryEngine for FakeEngine {
    type Error = io::Error;
    type Rows = BoxStream<'static, RowItem>;

    async fn execute(&self, sql: &str) -> HarnessResult<(), io::Error> {
        self.statements.lock().unwrap().push(sql.to_owned());
        Ok(())
    }

    async fn execute_iter(&self, sql: &str) -> HarnessResult<Self::Rows, io::Error> {
        self.statements.lock().unwrap().push(sql.to_owned());
        let rows: Vec<RowItem> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .cloned()
            .map(|columns| Ok(Row::new(columns)))
            .collect();
        let tail: Vec<RowItem> = if self.lost {
            vec![Err(HarnessErr::StreamUnavailable("connection reset".to_owned()))]
        } else {
            Vec::new()
        };
        Ok(stream::iter(rows).chain(stream::iter(tail)).boxed())
    }
}

fn stream_name() -> SourceKey {
    SourceKey::new("document").unwrap()
}

#[tokio::test]
async fn proton_rows_are_validated() -> anyhow::Result<()> {
    let _ = env_logger::try_init();

    let engine = FakeEngine::with_rows(vec![
        vec![json!(SCHOOL)],
        vec![],
        vec![json!("not a document")],
        vec![json!(DISTRICT), json!("ignored")],
    ]);
    let mut source = ProtonSource::resource(engine, &stream_name(), "School");
    let mut sink = Collector::new();
    let validator =
        StreamValidator::new(CategorySuffixRule::default(), ValidatorOptions::default());
    let stats = validator
        .run(&mut source, &mut sink, &CancelToken::new())
        .await?;

    assert_eq!(
        stats,
        ValidationStats {
            records: 4,
            decoded: 2,
            skipped: 2,
            invalid: 1,
        }
    );
    assert_eq!(
        sink.diagnostics()[0].to_string(),
        "School 2 has invalid category uri://ed-fi.org/EducationOrganizationCategoryDescriptor#District"
    );
    assert_eq!(
        source.engine().statements(),
        ["SELECT * FROM document WHERE raw:resourcename='School'"]
    );
    Ok(())
}

#[tokio::test]
async fn records_are_numbered_in_row_order() -> anyhow::Result<()> {
    let engine = FakeEngine::with_rows(vec![
        vec![json!(SCHOOL)],
        vec![json!({"schoolId": 3})],
    ]);
    let mut source = ProtonSource::all(engine, &stream_name());
    assert_eq!(source.query(), "SELECT * FROM document");

    let records: Vec<_> = source.subscribe().await?.collect().await;
    assert_eq!(records.len(), 2);
    let first = records[0].as_ref().unwrap();
    let second = records[1].as_ref().unwrap();
    assert_eq!(first.sequence(), 0);
    assert_eq!(second.sequence(), 1);
    assert_eq!(second.deserialize_json::<Json>()?, json!({"schoolId": 3}));
    Ok(())
}

#[tokio::test]
async fn lost_engine_stops_validation() {
    let engine = FakeEngine {
        rows: Mutex::new(vec![vec![json!(DISTRICT)]]),
        lost: true,
        ..Default::default()
    };
    let mut source = ProtonSource::resource(engine, &stream_name(), "School");
    let mut sink = Collector::new();
    let validator =
        StreamValidator::new(CategorySuffixRule::default(), ValidatorOptions::default());
    let result = validator
        .run(&mut source, &mut sink, &CancelToken::new())
        .await;

    assert!(matches!(result, Err(HarnessErr::StreamUnavailable(_))));
    assert_eq!(sink.len(), 1);
}

#[tokio::test]
async fn stream_management_statements() -> anyhow::Result<()> {
    let engine = FakeEngine::with_rows(vec![
        vec![json!("document"), json!("external")],
        vec![json!(42)],
        vec![],
    ]);
    engine
        .create_external_stream(&ExternalStream::default())
        .await?;
    let streams = engine.show_streams().await?;

    assert_eq!(streams, ["document", "42"]);
    assert_eq!(
        engine.statements(),
        [
            ExternalStream::default().to_sql(),
            "SHOW STREAMS".to_owned(),
        ]
    );
    Ok(())
}
