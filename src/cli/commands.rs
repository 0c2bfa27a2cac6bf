//! CLI command implementations
//!
//! `exec` requests, one JSON object per line:
//!
//! ```json
//! {"op":"create","kind":"school","fields":{"name":"Starfleet Academy"}}
//! {"op":"update","kind":"school","id":1,"fields":{"name":"Starfleet"}}
//! {"op":"delete","kind":"school","id":1}
//! {"op":"fetch","kind":"course","id":1,"relation":"assignments"}
//! {"op":"find","kind":"user","field":"email","value":"picard@starfleet.org"}
//! ```

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::engine::{CampusError, Database, Relation};
use crate::model::{
    Assignment, AssignmentGrade, Course, CourseInstructor, CourseStudent, EntityKind, EntityRef,
    Lesson, Model, Reading, RecordId, School, Term, User,
};
use crate::observability::{log_event, Event};
use crate::snapshot;
use crate::storage::{with_model, Tables};

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{error_response, ok_response, read_lines, write_line};

/// Code for requests that cannot be decoded
pub const BAD_REQUEST: &str = "CAMPUS_BAD_REQUEST";

/// Main CLI entry point
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Exec { config } => exec(&config),
        Command::Check { config } => check(&config),
    }
}

/// Create the data directory and an empty snapshot
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    log_event(Event::ConfigLoaded);
    let data_dir = config.data_path();

    if snapshot::exists(data_dir) {
        return Err(CliError::already_initialized());
    }

    fs::create_dir_all(data_dir).map_err(|e| {
        CliError::config_error(format!("Failed to create directory {:?}: {}", data_dir, e))
    })?;
    snapshot::save(data_dir, &Tables::new())?;

    write_line(&mut io::stdout().lock(), &ok_response(json!({"initialized": true})))
}

/// Apply requests from stdin, then save the snapshot
pub fn exec(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    log_event(Event::ConfigLoaded);
    let data_dir = config.data_path();

    if !snapshot::exists(data_dir) {
        return Err(CliError::not_initialized());
    }

    let db = Database::from_tables(snapshot::load(data_dir)?);
    let stdin = io::stdin();
    let stdout = io::stdout();
    exec_stream(&db, stdin.lock(), &mut stdout.lock())?;

    let metrics = db.metrics().snapshot();
    snapshot::save(data_dir, &db.into_tables())?;
    info!(
        event = %Event::ShutdownComplete,
        created = metrics.records_created,
        updated = metrics.records_updated,
        deleted = metrics.records_deleted,
        rejected = metrics.writes_rejected,
        restricted = metrics.deletes_restricted
    );
    Ok(())
}

/// Verify the snapshot and report counts per kind
pub fn check(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let data_dir = config.data_path();

    if !snapshot::exists(data_dir) {
        return Err(CliError::not_initialized());
    }

    let tables = snapshot::load(data_dir)?;
    let counts: Map<String, Value> = tables
        .counts()
        .into_iter()
        .map(|(kind, n)| (kind.name().to_string(), json!(n)))
        .collect();

    write_line(
        &mut io::stdout().lock(),
        &ok_response(json!({"verified": true, "counts": counts})),
    )
}

/// Answers every request line in `input`, one response line each.
///
/// Request failures become error responses; only I/O failures stop the loop.
pub fn exec_stream<R: BufRead, W: Write>(
    db: &Database,
    input: R,
    output: &mut W,
) -> CliResult<()> {
    for line in read_lines(input) {
        let response = handle_line(db, &line?);
        write_line(output, &response)?;
    }
    Ok(())
}

/// One request line to one response
pub fn handle_line(db: &Database, line: &str) -> Value {
    let result = serde_json::from_str::<Request>(line)
        .map_err(|e| Failure::bad_request(format!("invalid request: {}", e)))
        .and_then(|request| dispatch(db, request));

    match result {
        Ok(data) => ok_response(data),
        Err(failure) => error_response(failure.code, &failure.messages),
    }
}

/// A decoded request line
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Create {
        kind: EntityKind,
        #[serde(default)]
        fields: Map<String, Value>,
    },
    Update {
        kind: EntityKind,
        id: RecordId,
        #[serde(default)]
        fields: Map<String, Value>,
    },
    Delete {
        kind: EntityKind,
        id: RecordId,
    },
    Fetch {
        kind: EntityKind,
        id: RecordId,
        #[serde(default)]
        relation: Option<String>,
    },
    Find {
        kind: EntityKind,
        field: String,
        value: Value,
    },
}

struct Failure {
    code: &'static str,
    messages: Vec<String>,
}

impl Failure {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: BAD_REQUEST,
            messages: vec![message.into()],
        }
    }
}

impl From<CampusError> for Failure {
    fn from(err: CampusError) -> Self {
        Self {
            code: err.code(),
            messages: err.messages(),
        }
    }
}

fn dispatch(db: &Database, request: Request) -> Result<Value, Failure> {
    match request {
        Request::Create { kind, fields } => with_model!(kind, M => {
            let data: M = decode(Value::Object(fields))?;
            encode(&M::into_entity(db.create(data)?))
        }),
        Request::Update { kind, id, fields } => with_model!(kind, M => {
            let current = db.find::<M>(id)?;
            let data: M = decode(merge(encode(&current.data)?, fields))?;
            encode(&M::into_entity(db.update(id, data)?))
        }),
        Request::Delete { kind, id } => encode(&db.delete(EntityRef::new(kind, id))?),
        Request::Fetch { kind, id, relation } => {
            let target = EntityRef::new(kind, id);
            match relation {
                None => encode(&db.fetch(target)?),
                Some(name) => {
                    let relation = name.parse::<Relation>().map_err(|relation| {
                        Failure::from(CampusError::InvalidRelation { kind, relation })
                    })?;
                    encode(&db.fetch_related(target, relation)?)
                }
            }
        }
        Request::Find { kind, field, value } => encode(&db.find_by_field(kind, &field, &value)),
    }
}

/// Overlays `fields` on the encoded current record
fn merge(current: Value, fields: Map<String, Value>) -> Value {
    match current {
        Value::Object(mut object) => {
            object.extend(fields);
            Value::Object(object)
        }
        _ => Value::Object(fields),
    }
}

fn decode<M: Model>(value: Value) -> Result<M, Failure> {
    serde_json::from_value(value)
        .map_err(|e| Failure::bad_request(format!("invalid fields: {}", e)))
}

fn encode<T: Serialize>(value: &T) -> Result<Value, Failure> {
    serde_json::to_value(value).map_err(|e| Failure::bad_request(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run_lines(db: &Database, lines: &[&str]) -> Vec<Value> {
        let mut out = Vec::new();
        exec_stream(db, Cursor::new(lines.join("\n")), &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_create_and_fetch() {
        let db = Database::new();
        let responses = run_lines(
            &db,
            &[
                r#"{"op":"create","kind":"school","fields":{"name":"Starfleet Academy"}}"#,
                r#"{"op":"fetch","kind":"school","id":1}"#,
            ],
        );

        assert_eq!(responses[0]["status"], "ok");
        assert_eq!(responses[0]["data"]["kind"], "school");
        assert_eq!(responses[1]["data"]["data"]["name"], "Starfleet Academy");
    }

    #[test]
    fn test_validation_failure_response() {
        let db = Database::new();
        let response = handle_line(&db, r#"{"op":"create","kind":"school","fields":{}}"#);

        assert_eq!(response["status"], "error");
        assert_eq!(response["code"], "CAMPUS_VALIDATION_FAILED");
        assert_eq!(response["messages"], json!(["Name can't be blank"]));
    }

    #[test]
    fn test_update_merges_fields() {
        let db = Database::new();
        run_lines(
            &db,
            &[
                r#"{"op":"create","kind":"user","fields":{"first_name":"Jean-Luc","last_name":"Picard","email":"picard@starfleet.org","photo_url":"http://borg.com"}}"#,
            ],
        );
        let response = handle_line(
            &db,
            r#"{"op":"update","kind":"user","id":1,"fields":{"middle_name":"Locutus"}}"#,
        );

        assert_eq!(response["status"], "ok");
        assert_eq!(response["data"]["data"]["middle_name"], "Locutus");
        assert_eq!(response["data"]["data"]["email"], "picard@starfleet.org");
    }

    #[test]
    fn test_unknown_field_is_bad_request() {
        let db = Database::new();
        let response =
            handle_line(&db, r#"{"op":"create","kind":"school","fields":{"motto":"Ex astris"}}"#);
        assert_eq!(response["code"], BAD_REQUEST);
    }

    #[test]
    fn test_malformed_line_is_bad_request() {
        let db = Database::new();
        let response = handle_line(&db, "not json");
        assert_eq!(response["code"], BAD_REQUEST);

        let response = handle_line(&db, r#"{"op":"launch","kind":"school"}"#);
        assert_eq!(response["code"], BAD_REQUEST);
    }

    #[test]
    fn test_unknown_relation_name() {
        let db = Database::new();
        handle_line(&db, r#"{"op":"create","kind":"school","fields":{"name":"S"}}"#);
        let response = handle_line(
            &db,
            r#"{"op":"fetch","kind":"school","id":1,"relation":"shuttles"}"#,
        );
        assert_eq!(response["code"], "CAMPUS_INVALID_RELATION");
    }

    #[test]
    fn test_delete_and_find() {
        let db = Database::new();
        let responses = run_lines(
            &db,
            &[
                r#"{"op":"create","kind":"school","fields":{"name":"Starfleet Academy"}}"#,
                r#"{"op":"find","kind":"school","field":"name","value":"Starfleet Academy"}"#,
                r#"{"op":"delete","kind":"school","id":1}"#,
                r#"{"op":"delete","kind":"school","id":1}"#,
            ],
        );

        assert_eq!(responses[1]["data"].as_array().map(Vec::len), Some(1));
        assert_eq!(responses[2]["data"]["removed"], json!([{"kind":"school","id":1}]));
        assert_eq!(responses[3]["code"], "CAMPUS_NOT_FOUND");
    }
}
