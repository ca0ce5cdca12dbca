//! End-to-end tests against real database files: record lifecycle across
//! close/re-open, batch insertion, the key-value mirror, the global
//! default gateway, and statement cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tempfile::NamedTempFile;

use activerow::{
    global, Database, KvTable, OrmError, Query, Record, Result, Row, Value, ValueMap, UNSAVED_ID,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Record over the columns {a: bool, b: int, c: string}.
struct Sample {
    id: i64,
    a: bool,
    b: i64,
    c: String,
}

impl Default for Sample {
    fn default() -> Self {
        Sample {
            id: UNSAVED_ID,
            a: false,
            b: 0,
            c: String::new(),
        }
    }
}

impl Record for Sample {
    fn table_name() -> &'static str {
        "sample"
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn read_row(&mut self, row: &Row) -> Result<()> {
        self.a = row.get_bool("a")?;
        self.b = row.get_long("b")?;
        self.c = row.get_text("c")?;
        Ok(())
    }

    fn write_values(&self, values: &mut ValueMap) {
        values.insert("a".to_string(), Value::Bool(self.a));
        values.insert("b".to_string(), Value::Long(self.b));
        values.insert("c".to_string(), Value::from(self.c.as_str()));
    }

    fn fast_values(&self) -> Vec<Value> {
        vec![
            Value::Bool(self.a),
            Value::Long(self.b),
            Value::from(self.c.as_str()),
        ]
    }
}

const CREATE_SAMPLE: &str = "CREATE TABLE IF NOT EXISTS sample (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    a BOOLEAN,
    b INTEGER,
    c TEXT
)";

fn sample(a: bool, b: i64, c: &str) -> Sample {
    Sample {
        a,
        b,
        c: c.to_string(),
        ..Sample::default()
    }
}

#[test]
fn test_records_survive_reopen() {
    init_tracing();
    let file = NamedTempFile::new().unwrap();
    let path = file.path().to_path_buf();

    let db = Database::open(&path).unwrap();
    db.run(CREATE_SAMPLE).unwrap();
    let mut rec = sample(true, 42, "persisted");
    rec.save(&db).unwrap();
    let id = rec.id();
    db.close().unwrap();

    let db = Database::open(&path).unwrap();
    let fetched: Sample = Query::on(&db).find(id).unwrap().unwrap();
    assert!(fetched.a);
    assert_eq!(fetched.b, 42);
    assert_eq!(fetched.c, "persisted");
}

#[test]
fn test_batch_insert_parameterized() {
    let db = Database::open_in_memory().unwrap();
    db.run(CREATE_SAMPLE).unwrap();

    let items = vec![
        sample(true, 1, "first"),
        sample(false, 2, "second"),
        sample(true, 3, "third"),
    ];
    db.batch_insert(&items, items.len()).unwrap();

    let fetched: Vec<Sample> = Query::on(&db).of::<Sample>().order_by("b").all().unwrap();
    assert_eq!(fetched.len(), 3);
    assert_eq!(fetched[0].c, "first");
    assert!(!fetched[1].a);
    assert_eq!(fetched[2].b, 3);
    // Batch insertion does not capture identities on the inserted records.
    assert!(items.iter().all(|r| r.id() == UNSAVED_ID));
}

#[test]
fn test_batch_insert_inlined_fast_path() {
    let db = Database::open_in_memory().unwrap();
    db.run(CREATE_SAMPLE).unwrap();

    let items = vec![
        sample(true, 10, "it's quoted"),
        sample(false, 20, "plain"),
        sample(true, 30, "th;ird"),
    ];
    db.batch_insert_inlined(&items, items.len()).unwrap();

    let fetched: Vec<Sample> = Query::on(&db).of::<Sample>().order_by("b").all().unwrap();
    assert_eq!(fetched.len(), 3);
    // Strings travel through placeholders, so metacharacters survive.
    assert_eq!(fetched[0].c, "it's quoted");
    assert_eq!(fetched[2].c, "th;ird");
    assert!(fetched[0].a);
    assert!(!fetched[1].a);
}

#[test]
fn test_batch_insert_limit_zero_is_noop() {
    let db = Database::open_in_memory().unwrap();
    db.run(CREATE_SAMPLE).unwrap();
    db.batch_insert(&[sample(true, 1, "x")], 0).unwrap();
    assert_eq!(Query::on(&db).of::<Sample>().count().unwrap(), 0);
}

#[test]
fn test_batch_insert_limit_caps_and_clamps() {
    let db = Database::open_in_memory().unwrap();
    db.run(CREATE_SAMPLE).unwrap();
    let items = vec![sample(true, 1, "a"), sample(true, 2, "b"), sample(true, 3, "c")];
    db.batch_insert(&items, 2).unwrap();
    assert_eq!(Query::on(&db).of::<Sample>().count().unwrap(), 2);

    db.batch_insert(&items, 100).unwrap();
    assert_eq!(Query::on(&db).of::<Sample>().count().unwrap(), 5);
}

/// Record whose fast serialization disagrees with its column set.
#[derive(Default)]
struct Lopsided {
    id: i64,
}

impl Record for Lopsided {
    fn table_name() -> &'static str {
        "sample"
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn read_row(&mut self, _row: &Row) -> Result<()> {
        Ok(())
    }

    fn write_values(&self, values: &mut ValueMap) {
        values.insert("a".to_string(), Value::Bool(false));
        values.insert("b".to_string(), Value::Long(0));
    }

    fn fast_values(&self) -> Vec<Value> {
        vec![Value::Bool(false)]
    }
}

#[test]
fn test_batch_insert_shape_mismatch_is_checked() {
    let db = Database::open_in_memory().unwrap();
    db.run(CREATE_SAMPLE).unwrap();
    let items = vec![Lopsided::default()];
    let result = db.batch_insert(&items, 1);
    assert!(matches!(result, Err(OrmError::ShapeMismatch(_))));
    assert_eq!(Query::on(&db).from("sample").count().unwrap(), 0);
}

#[test]
fn test_kv_mirror_survives_reopen() {
    let file = NamedTempFile::new().unwrap();
    let path = file.path().to_path_buf();

    let db = Database::open(&path).unwrap();
    let mut kv = KvTable::new("meta");
    kv.create_table(&db).unwrap();
    kv.put("db_version", "7");
    kv.save(&db).unwrap();
    db.close().unwrap();

    let db = Database::open(&path).unwrap();
    let mut kv = KvTable::new("meta");
    kv.load(&db).unwrap();
    assert_eq!(kv.get("db_version"), Some("7"));
}

// The only test in this binary touching the process-wide default.
#[test]
fn test_global_default_gateway() {
    let db = Database::open_in_memory().unwrap();
    db.run(CREATE_SAMPLE).unwrap();
    assert!(db.globalize().is_none());

    let mut rec = sample(true, 5, "ambient");
    rec.save_global().unwrap();
    assert!(rec.is_saved());

    let count = Query::new().of::<Sample>().count().unwrap();
    assert_eq!(count, 1);

    let fetched: Sample = Query::new().find(rec.id()).unwrap().unwrap();
    assert_eq!(fetched.c, "ambient");

    assert_eq!(rec.drop_global().unwrap(), 1);
    global::take().unwrap();
    assert!(matches!(
        Query::new().of::<Sample>().count(),
        Err(OrmError::NoDatabase(_))
    ));
}

#[test]
fn test_cancel_interrupts_running_statement() {
    init_tracing();
    let db = Database::open_in_memory().unwrap();
    let canceller = db.canceller();
    let stop = Arc::new(AtomicBool::new(false));

    let stop_signal = Arc::clone(&stop);
    let interrupter = thread::spawn(move || {
        while !stop_signal.load(Ordering::SeqCst) {
            canceller.cancel();
            thread::sleep(Duration::from_millis(20));
        }
    });

    // Finite but far too large to finish before an interrupt lands.
    let result = db.raw_query(
        "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 100000000)
         SELECT count(*) FROM c",
        &[],
    );
    stop.store(true, Ordering::SeqCst);
    interrupter.join().unwrap();

    assert!(matches!(result, Err(OrmError::Cancelled)));
}
