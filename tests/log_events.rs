//! Console lines the consumer emits when it changes priority

use std::sync::{Mutex, Once};
use std::thread;

use log::{LevelFilter, Log, Metadata};
use tandem_rtos::{Consumer, Record, Task, TaskHandle, TaskPriority};

/// (thread, target, message) for every event, across all tests in this binary
struct Capture {
    lines: Mutex<Vec<(String, String, String)>>,
}

static CAPTURE: Capture = Capture {
    lines: Mutex::new(Vec::new()),
};

impl Log for Capture {
    fn enabled(&self, _: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        let current = thread::current();
        let line = (
            current.name().unwrap_or("?").to_owned(),
            record.target().to_owned(),
            record.args().to_string(),
        );
        self.lines.lock().unwrap().push(line);
    }

    fn flush(&self) {}
}

fn install() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::set_logger(&CAPTURE).unwrap();
        log::set_max_level(LevelFilter::Info);
    });
}

/// Feed `records` to a fresh consumer at P0 = 1 on a named thread and return
/// the consumer's messages in order
fn consumer_lines(name: &str, records: &'static [(u8, i32)]) -> Vec<String> {
    install();
    thread::Builder::new()
        .name(name.to_owned())
        .spawn(move || {
            let task = TaskHandle::new(Task::new("consumer", 1000, TaskPriority(1)));
            let mut consumer = Consumer::new(task);
            for &r in records {
                consumer.handle(Record::from(r));
            }
        })
        .unwrap()
        .join()
        .unwrap();

    CAPTURE
        .lines
        .lock()
        .unwrap()
        .iter()
        .filter(|(thread, target, _)| thread == name && target == "consumer")
        .map(|(_, _, message)| message.clone())
        .collect()
}

fn priority_lines(lines: &[String]) -> Vec<&str> {
    lines
        .iter()
        .map(String::as_str)
        .filter(|m| m.starts_with("Priority"))
        .collect()
}

#[test]
fn test_boost_logs_new_priority() {
    let lines = consumer_lines("boost", &[(1, 0)]);
    assert_eq!(lines[0], "Received → dataID: 1 | DataValue: 0");
    assert_eq!(priority_lines(&lines), vec!["Priority Increased to 3"]);
}

#[test]
fn test_restore_logs_after_boost() {
    let lines = consumer_lines("boost-restore", &[(1, 0), (1, 1)]);
    assert_eq!(
        priority_lines(&lines),
        vec!["Priority Increased to 3", "Priority Decreased to 1"]
    );
}

#[test]
fn test_restore_without_boost_logs_nothing() {
    let lines = consumer_lines("restore-only", &[(1, 1)]);
    assert_eq!(lines, vec!["Received → dataID: 1 | DataValue: 1"]);
    assert!(lines.iter().all(|m| !m.contains("Decreased")));
}

#[test]
fn test_delete_is_announced() {
    let lines = consumer_lines("delete", &[(0, 9), (1, 0)]);
    assert_eq!(
        lines,
        vec!["Received → dataID: 0 | DataValue: 9", "dataID == 0 → deleting task"]
    );
}
