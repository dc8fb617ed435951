//! Engine Tests
//!
//! These tests verify:
//! - Command replies for every command
//! - Only mutating commands reach the AOF, byte-for-byte
//! - Recovery rebuilds the store, including after a torn tail
//! - Replay never writes to the AOF

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use respkv::protocol::{encode, Decoder, Value};
use respkv::KvError;
use respkv::{AofSyncPolicy, Config, Engine};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let aof_path = temp_dir.path().join("appendonly.aof");
    (temp_dir, aof_path)
}

fn open(path: &PathBuf) -> Engine {
    let config = Config::builder()
        .aof_path(path)
        .aof_sync_policy(AofSyncPolicy::Always)
        .build();
    Engine::open(config).unwrap()
}

fn exec(engine: &Engine, args: &[&str]) -> Value {
    engine.execute(&Value::command(args))
}

// =============================================================================
// Command Reply Tests
// =============================================================================

#[test]
fn test_ping() {
    let (_temp, path) = setup();
    let engine = open(&path);

    assert_eq!(exec(&engine, &["PING"]), Value::simple("PONG"));
    assert_eq!(exec(&engine, &["ping", "hello"]), Value::bulk("hello"));
}

#[test]
fn test_set_and_get() {
    let (_temp, path) = setup();
    let engine = open(&path);

    assert_eq!(exec(&engine, &["GET", "k"]), Value::Null);
    assert_eq!(exec(&engine, &["SET", "k", "v"]), Value::ok());
    assert_eq!(exec(&engine, &["GET", "k"]), Value::bulk("v"));
}

#[test]
fn test_hash_commands() {
    let (_temp, path) = setup();
    let engine = open(&path);

    assert_eq!(exec(&engine, &["HGETALL", "user"]), Value::Null);
    assert_eq!(exec(&engine, &["HSET", "user", "name", "ada"]), Value::ok());
    assert_eq!(exec(&engine, &["HSET", "user", "age", "36"]), Value::ok());
    assert_eq!(exec(&engine, &["HGET", "user", "name"]), Value::bulk("ada"));
    assert_eq!(exec(&engine, &["HGET", "user", "nope"]), Value::Null);
    assert_eq!(
        exec(&engine, &["HGETALL", "user"]),
        Value::command(&["age", "36", "name", "ada"])
    );
}

#[test]
fn test_error_replies() {
    let (_temp, path) = setup();
    let engine = open(&path);

    assert_eq!(
        exec(&engine, &["SET", "only-key"]),
        Value::error("ERR wrong number of arguments for 'set' command")
    );
    assert_eq!(
        exec(&engine, &["DEL", "k"]),
        Value::error("ERR unknown command 'DEL'")
    );
    assert_eq!(
        engine.execute(&Value::simple("PING")),
        Value::error("ERR invalid request: expected array of arguments")
    );
    assert_eq!(
        engine.execute(&Value::array(vec![])),
        Value::error("ERR invalid request: expected at least 1 argument")
    );
}

#[test]
fn test_line_break_in_command_name_yields_one_reply() {
    let (_temp, path) = setup();
    let engine = open(&path);

    let reply = engine.execute(&Value::command(&["X\r\n+OK\r\n"]));
    let wire = encode(&reply);

    let mut decoder = Decoder::new(&wire[..]);
    let decoded = decoder.read_value().unwrap();
    assert!(decoded.is_error());
    assert_eq!(decoded, reply);
    assert!(matches!(decoder.read_value(), Err(KvError::EndOfStream)));
}

#[test]
fn test_ping_echo_is_bulk_and_binary_safe() {
    let (_temp, path) = setup();
    let engine = open(&path);

    assert_eq!(
        exec(&engine, &["PING", "a\r\nb"]),
        Value::Bulk(bytes::Bytes::from_static(b"a\r\nb"))
    );
}

#[test]
fn test_hgetall_pairs_fields_with_values() {
    let (_temp, path) = setup();
    let engine = open(&path);
    exec(&engine, &["HSET", "h", "b", "2"]);
    exec(&engine, &["HSET", "h", "a", "1"]);

    // Field first, then its value, ordered by field
    assert_eq!(
        exec(&engine, &["HGETALL", "h"]),
        Value::command(&["a", "1", "b", "2"])
    );
}

// =============================================================================
// AOF Classification Tests
// =============================================================================

#[test]
fn test_set_appends_exactly_its_request() {
    let (_temp, path) = setup();
    let engine = open(&path);
    let request = Value::command(&["SET", "k", "v"]);

    engine.execute(&request);

    assert_eq!(fs::read(&path).unwrap(), encode(&request).to_vec());
}

#[test]
fn test_reads_do_not_touch_aof() {
    let (_temp, path) = setup();
    let engine = open(&path);
    exec(&engine, &["SET", "k", "v"]);
    let before = fs::read(&path).unwrap();

    exec(&engine, &["GET", "k"]);
    exec(&engine, &["HGET", "h", "f"]);
    exec(&engine, &["HGETALL", "h"]);
    exec(&engine, &["PING"]);

    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_rejected_commands_do_not_touch_aof() {
    let (_temp, path) = setup();
    let engine = open(&path);

    exec(&engine, &["SET", "k"]);
    exec(&engine, &["HSET", "h", "f"]);
    exec(&engine, &["NOPE"]);

    assert_eq!(fs::metadata(&path).unwrap().len(), 0);
}

#[test]
fn test_hset_appends_record() {
    let (_temp, path) = setup();
    let engine = open(&path);
    let request = Value::command(&["HSET", "h", "f", "v"]);

    engine.execute(&request);
    assert_eq!(engine.aof().size(), encode(&request).len() as u64);
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_recover_state_after_reopen() {
    let (_temp, path) = setup();
    {
        let engine = open(&path);
        exec(&engine, &["SET", "a", "1"]);
        exec(&engine, &["SET", "b", "2"]);
        exec(&engine, &["SET", "a", "3"]);
        exec(&engine, &["HSET", "h", "f", "v"]);
        engine.close().unwrap();
    }

    let engine = open(&path);
    assert_eq!(exec(&engine, &["GET", "a"]), Value::bulk("3"));
    assert_eq!(exec(&engine, &["GET", "b"]), Value::bulk("2"));
    assert_eq!(exec(&engine, &["HGET", "h", "f"]), Value::bulk("v"));
    assert_eq!(engine.replay_result().records_replayed, 4);
}

#[test]
fn test_replay_does_not_grow_aof() {
    let (_temp, path) = setup();
    {
        let engine = open(&path);
        exec(&engine, &["SET", "k", "v"]);
        exec(&engine, &["HSET", "h", "f", "v"]);
    }
    let size = fs::metadata(&path).unwrap().len();

    for _ in 0..3 {
        let engine = open(&path);
        assert_eq!(engine.aof().size(), size);
        engine.close().unwrap();
    }
    assert_eq!(fs::metadata(&path).unwrap().len(), size);
}

#[test]
fn test_replay_twice_gives_same_store() {
    let (_temp, path) = setup();
    {
        let engine = open(&path);
        for i in 0..20 {
            let key = format!("k{}", i % 5);
            let value = format!("v{}", i);
            exec(&engine, &["SET", key.as_str(), value.as_str()]);
            exec(&engine, &["HSET", "h", key.as_str(), value.as_str()]);
        }
    }

    let first = open(&path);
    let (strings, hashes) = (first.store().strings_snapshot(), first.store().hashes_snapshot());
    drop(first);

    let second = open(&path);
    assert_eq!(second.store().strings_snapshot(), strings);
    assert_eq!(second.store().hashes_snapshot(), hashes);

    // Replaying the same records into an already-populated store changes nothing
    let mut records = Vec::new();
    second.aof().replay(|v| records.push(v)).unwrap();
    for record in &records {
        assert!(second.apply_replayed(record));
    }
    assert_eq!(second.store().strings_snapshot(), strings);
    assert_eq!(second.store().hashes_snapshot(), hashes);
}

#[test]
fn test_recover_after_torn_tail() {
    let (_temp, path) = setup();
    {
        let engine = open(&path);
        exec(&engine, &["SET", "kept", "yes"]);
    }

    // Simulate a crash in the middle of the next append
    let torn = encode(&Value::command(&["SET", "lost", "no"]));
    let mut bytes = fs::read(&path).unwrap();
    bytes.extend_from_slice(&torn[..torn.len() - 3]);
    fs::write(&path, &bytes).unwrap();

    let engine = open(&path);
    assert!(engine.replay_result().was_truncated);
    assert_eq!(exec(&engine, &["GET", "kept"]), Value::bulk("yes"));
    assert_eq!(exec(&engine, &["GET", "lost"]), Value::Null);

    // New writes after recovery survive another restart
    exec(&engine, &["SET", "after", "crash"]);
    engine.close().unwrap();

    let engine = open(&path);
    assert!(!engine.replay_result().was_truncated);
    assert_eq!(exec(&engine, &["GET", "after"]), Value::bulk("crash"));
}

#[test]
fn test_unknown_record_is_skipped_on_replay() {
    let (_temp, path) = setup();
    let mut bytes = encode(&Value::command(&["FLUSHALL"])).to_vec();
    bytes.extend_from_slice(&encode(&Value::command(&["SET", "k", "v"])));
    fs::write(&path, &bytes).unwrap();

    let engine = open(&path);
    assert_eq!(engine.replay_result().records_replayed, 2);
    assert_eq!(exec(&engine, &["GET", "k"]), Value::bulk("v"));
    assert!(!engine.apply_replayed(&Value::command(&["FLUSHALL"])));
}

#[test]
fn test_corrupt_aof_fails_open() {
    let (_temp, path) = setup();
    fs::write(&path, b"this is not a log\r\n").unwrap();

    let config = Config::builder().aof_path(&path).build();
    assert!(Engine::open(config).is_err());
}

#[test]
fn test_open_path_convenience() {
    let (_temp, path) = setup();
    let engine = Engine::open_path(&path).unwrap();
    assert_eq!(engine.config().aof_path, path);
    engine.close().unwrap();
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers_log_matches_state() {
    let (_temp, path) = setup();
    let engine = Arc::new(open(&path));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for i in 0..50 {
                    let value = format!("{}-{}", t, i);
                    exec(&engine, &["SET", "shared", value.as_str()]);
                    let seen = exec(&engine, &["GET", "shared"]);
                    assert!(matches!(seen, Value::Bulk(_)));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let live = exec(&engine, &["GET", "shared"]);
    drop(engine);

    // The last logged SET is the value a restart sees
    let recovered = open(&path);
    assert_eq!(exec(&recovered, &["GET", "shared"]), live);
    assert_eq!(recovered.replay_result().records_replayed, 200);
}
