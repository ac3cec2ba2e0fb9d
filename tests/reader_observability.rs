use std::sync::{Arc, Mutex};

use validated_csv::reader::{
    CompositeObserver, FileObserver, ReadContext, ReadMode, ReadStats, ReaderObserver, ReaderOptions,
    ReaderSeverity, ValidatingReader,
};
use validated_csv::schema::{FieldSpec, Schema};
use validated_csv::{ReaderError, RowError};

#[derive(Default)]
struct RecordingObserver {
    headers: Mutex<Vec<u64>>,
    rejected: Mutex<Vec<(ReaderSeverity, usize)>>,
    failures: Mutex<Vec<ReaderSeverity>>,
    alerts: Mutex<Vec<ReaderSeverity>>,
    finished: Mutex<Vec<(ReadMode, ReadStats)>>,
}

impl ReaderObserver for RecordingObserver {
    fn on_header_skipped(&self, _ctx: &ReadContext, line: u64) {
        self.headers.lock().unwrap().push(line);
    }

    fn on_row_rejected(&self, _ctx: &ReadContext, severity: ReaderSeverity, error: &RowError) {
        self.rejected.lock().unwrap().push((severity, error.row));
    }

    fn on_failure(&self, _ctx: &ReadContext, severity: ReaderSeverity, _error: &ReaderError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &ReadContext, severity: ReaderSeverity, _error: &ReaderError) {
        self.alerts.lock().unwrap().push(severity);
    }

    fn on_finished(&self, ctx: &ReadContext, stats: ReadStats) {
        self.finished.lock().unwrap().push((ctx.mode, stats));
    }
}

fn people_schema() -> Schema {
    Schema::builder()
        .field(FieldSpec::integer("id").required())
        .field(FieldSpec::string("name"))
        .field(FieldSpec::string("code").required().pattern("[A-Z0-9_]{3,9}"))
        .field(FieldSpec::date("joined").required().formats(["%m/%d/%Y"]))
        .build()
        .unwrap()
}

#[test]
fn lenient_read_reports_rejections_and_finish() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = ReaderOptions {
        capture_errors: true,
        observer: Some(obs.clone()),
        ..Default::default()
    };
    let schema = people_schema();
    let reader = ValidatingReader::from_path("tests/fixtures/people.csv", &schema, opts).unwrap();
    let report = reader.collect_report().unwrap();
    assert_eq!(report.records.len(), 5);

    assert_eq!(obs.headers.lock().unwrap().clone(), vec![1]);
    assert_eq!(
        obs.rejected.lock().unwrap().clone(),
        vec![
            (ReaderSeverity::Warning, 1),
            (ReaderSeverity::Warning, 2),
            (ReaderSeverity::Warning, 3),
        ]
    );
    assert!(obs.failures.lock().unwrap().is_empty());

    let finished = obs.finished.lock().unwrap().clone();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].0, ReadMode::Lenient);
    assert_eq!(finished[0].1.rows, 5);
    assert_eq!(finished[0].1.rejected, 3);
}

#[test]
fn strict_failure_is_reported_without_alert_below_threshold() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = ReaderOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: ReaderSeverity::Critical,
        ..Default::default()
    };
    let schema = people_schema();
    let reader = ValidatingReader::from_path("tests/fixtures/people.csv", &schema, opts).unwrap();
    let _ = reader.collect_report().unwrap_err();

    assert_eq!(
        obs.rejected.lock().unwrap().clone(),
        vec![(ReaderSeverity::Error, 1)]
    );
    assert_eq!(obs.failures.lock().unwrap().clone(), vec![ReaderSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
    // A failed read is not reported as finished.
    assert!(obs.finished.lock().unwrap().is_empty());
}

#[test]
fn schema_resolution_failure_alerts_at_error_threshold() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = ReaderOptions {
        header: validated_csv::reader::HeaderMode::Present,
        observer: Some(obs.clone()),
        alert_at_or_above: ReaderSeverity::Error,
        ..Default::default()
    };
    let schema = people_schema();
    let mut reader = ValidatingReader::from_reader("id,name\n1,Ada\n".as_bytes(), &schema, opts);
    assert!(reader.next().unwrap().is_err());
    assert!(reader.next().is_none());

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![ReaderSeverity::Error]);
    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![ReaderSeverity::Error]);
    assert!(obs.finished.lock().unwrap().is_empty());
}

#[test]
fn file_observer_appends_events() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("read.log");
    let composite = CompositeObserver::new(vec![
        Arc::new(FileObserver::new(&log)),
        Arc::new(RecordingObserver::default()),
    ]);
    let opts = ReaderOptions {
        capture_errors: true,
        observer: Some(Arc::new(composite)),
        ..Default::default()
    };
    let schema = people_schema();
    ValidatingReader::from_path("tests/fixtures/people.csv", &schema, opts)
        .unwrap()
        .for_each(drop);

    let text = std::fs::read_to_string(&log).unwrap();
    assert!(text.contains(" header "));
    assert_eq!(text.matches(" reject ").count(), 3);
    assert!(text.contains(" ok mode=Lenient"));
    assert!(text.contains("people.csv"));
}
