// tests/test_logger.rs
use chrono::NaiveDateTime;
use logmo::loggers::core::{CallSite, MetadataValue};
use logmo::loggers::printer::MALFORMED_METADATA_MESSAGE;
use logmo::{
    ConsolePrinter, Level, Logger, LoggerBuilder, LogmoConfig, LogmoError, Metadata, MetadataKey, Printer,
};
use proptest::prelude::*;
use std::io::Write;
use std::sync::{Arc, Mutex};

// Macros brought in by path so they can sit next to the std ones
use logmo::{debug, error, fault, info, notice};

#[derive(Debug, Clone)]
struct Seen {
    printer: &'static str,
    message: String,
    metadata: Metadata,
    level: Level,
}

type Journal = Arc<Mutex<Vec<Seen>>>;

struct RecordingPrinter {
    label: &'static str,
    journal: Journal,
}

impl Printer for RecordingPrinter {
    fn print(&self, message: &str, metadata: &Metadata, level: Level) -> Result<(), LogmoError> {
        self.journal.lock().unwrap().push(Seen {
            printer: self.label,
            message: message.to_string(),
            metadata: metadata.clone(),
            level,
        });
        Ok(())
    }
}

struct FailingPrinter;

impl Printer for FailingPrinter {
    fn print(&self, _: &str, _: &Metadata, _: Level) -> Result<(), LogmoError> {
        Err(LogmoError::Internal("sink unavailable".into()))
    }
}

struct PanickingPrinter;

impl Printer for PanickingPrinter {
    fn print(&self, _: &str, _: &Metadata, _: Level) -> Result<(), LogmoError> {
        panic!("printer blew up");
    }
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn recorder(label: &'static str, journal: &Journal) -> Arc<dyn Printer> {
    Arc::new(RecordingPrinter {
        label,
        journal: journal.clone(),
    })
}

#[test]
fn every_level_reaches_printers_in_registration_order() {
    let journal = Journal::default();
    let logger = Logger::new(vec![recorder("first", &journal), recorder("second", &journal)]);

    debug!(logger, "d");
    info!(logger, "i");
    notice!(logger, "n");
    error!(logger, "e");
    fault!(logger, "f");

    let seen = journal.lock().unwrap();
    assert_eq!(seen.len(), 10);

    let levels: Vec<_> = seen.iter().step_by(2).map(|s| s.level).collect();
    assert_eq!(levels, Level::ALL.to_vec());

    for pair in seen.chunks(2) {
        assert_eq!(pair[0].printer, "first");
        assert_eq!(pair[1].printer, "second");
        assert_eq!(pair[0].message, pair[1].message);
    }
}

#[test]
fn macros_capture_caller_location() {
    let journal = Journal::default();
    let logger = Logger::new(vec![recorder("only", &journal)]);

    let expected_line = line!() + 1;
    info!(logger, "hello", MetadataKey::CATEGORY => "net");

    let seen = journal.lock().unwrap();
    let metadata = &seen[0].metadata;
    assert_eq!(
        metadata.get(&MetadataKey::FILE_NAME).and_then(|v| v.as_str()),
        Some(file!())
    );
    assert_eq!(
        metadata.get(&MetadataKey::FUNCTION).and_then(|v| v.as_str()),
        Some("macros_capture_caller_location")
    );
    assert_eq!(
        metadata.get(&MetadataKey::LINE).and_then(|v| v.as_int()),
        Some(expected_line as i64)
    );
    assert_eq!(
        metadata.get(&MetadataKey::CATEGORY).and_then(|v| v.as_str()),
        Some("net")
    );
    assert!(metadata.get(&MetadataKey::DATE).and_then(|v| v.as_timestamp()).is_some());
}

#[test]
fn caller_metadata_wins_on_collision() {
    let journal = Journal::default();
    let logger = Logger::new(vec![recorder("only", &journal)]);

    info!(logger, "override", "function" => "custom", "line" => 1, "request_id" => "r-7");

    let seen = journal.lock().unwrap();
    let metadata = &seen[0].metadata;
    assert_eq!(
        metadata.get(&MetadataKey::FUNCTION),
        Some(&MetadataValue::Str("custom".into()))
    );
    assert_eq!(metadata.get(&MetadataKey::LINE), Some(&MetadataValue::Int(1)));
    assert_eq!(
        metadata.get(&MetadataKey::new("request_id")),
        Some(&MetadataValue::Str("r-7".into()))
    );
}

#[test]
fn configure_replaces_printers_wholesale() {
    let journal = Journal::default();
    let logger = Logger::new(vec![recorder("old", &journal)]);
    info!(logger, "before");

    logger.configure(vec![recorder("new", &journal)]);
    info!(logger, "after");

    logger.configure(Vec::new());
    info!(logger, "silenced");

    let seen = journal.lock().unwrap();
    let printers: Vec<_> = seen.iter().map(|s| (s.printer, s.message.as_str())).collect();
    assert_eq!(printers, vec![("old", "before"), ("new", "after")]);
    assert_eq!(logger.printer_count(), 0);
}

#[test]
fn unconfigured_logger_is_a_no_op() {
    let logger = Logger::default();
    fault!(logger, "nobody listens");
    assert_eq!(logger.printer_count(), 0);
}

#[test]
fn failing_printers_do_not_stop_the_fan_out() {
    let journal = Journal::default();
    let logger = Logger::new(vec![
        Arc::new(FailingPrinter) as Arc<dyn Printer>,
        Arc::new(PanickingPrinter) as Arc<dyn Printer>,
        recorder("survivor", &journal),
    ]);

    error!(logger, "first");
    error!(logger, "second");

    let seen = journal.lock().unwrap();
    let messages: Vec<_> = seen.iter().map(|s| s.message.as_str()).collect();
    assert_eq!(messages, vec!["first", "second"]);
}

/// Logs through the logger that is dispatching to it.
struct EchoingPrinter {
    logger: Arc<Mutex<Option<Logger>>>,
    journal: Journal,
}

impl Printer for EchoingPrinter {
    fn print(&self, message: &str, metadata: &Metadata, level: Level) -> Result<(), LogmoError> {
        self.journal.lock().unwrap().push(Seen {
            printer: "echo",
            message: message.to_string(),
            metadata: metadata.clone(),
            level,
        });
        let logger = self.logger.lock().unwrap().clone();
        if let Some(logger) = logger {
            logger.info("echo", Metadata::new(), CallSite::new("echo.rs", "print", 1));
        }
        Ok(())
    }
}

#[test]
fn printer_logging_through_its_own_logger_does_not_block() {
    let journal = Journal::default();
    let slot = Arc::new(Mutex::new(None));
    let logger = Logger::new(vec![Arc::new(EchoingPrinter {
        logger: slot.clone(),
        journal: journal.clone(),
    }) as Arc<dyn Printer>]);
    *slot.lock().unwrap() = Some(logger.clone());

    let (done_tx, done_rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        info!(logger, "outer");
        info!(logger, "second");
        let _ = done_tx.send(());
    });
    done_rx
        .recv_timeout(std::time::Duration::from_secs(2))
        .expect("dispatch returned");

    let seen = journal.lock().unwrap();
    let messages: Vec<_> = seen.iter().map(|s| s.message.as_str()).collect();
    assert_eq!(messages, vec!["outer", "second"]);
    slot.lock().unwrap().take();
}

#[test]
fn events_below_threshold_are_dropped() {
    let journal = Journal::default();
    let logger = LoggerBuilder::new()
        .with_printer(RecordingPrinter {
            label: "only",
            journal: journal.clone(),
        })
        .with_level(Level::Notice)
        .build();

    debug!(logger, "d");
    info!(logger, "i");
    notice!(logger, "n");
    fault!(logger, "f");

    logger.set_level(Level::Debug);
    debug!(logger, "d2");

    let seen = journal.lock().unwrap();
    let messages: Vec<_> = seen.iter().map(|s| s.message.as_str()).collect();
    assert_eq!(messages, vec!["n", "f", "d2"]);
    assert_eq!(logger.level(), Level::Debug);
}

#[test]
fn explicit_call_site_is_used_verbatim() {
    let journal = Journal::default();
    let logger = Logger::new(vec![recorder("only", &journal)]);

    logger.notice("manual", Metadata::new(), CallSite::new("src/app/main.rs", "boot", 12));

    let seen = journal.lock().unwrap();
    let metadata = &seen[0].metadata;
    assert_eq!(seen[0].level, Level::Notice);
    assert_eq!(
        metadata.get(&MetadataKey::FILE_NAME).and_then(|v| v.as_str()),
        Some("src/app/main.rs")
    );
    assert_eq!(metadata.get(&MetadataKey::LINE).and_then(|v| v.as_int()), Some(12));
}

#[test]
fn console_line_has_marker_time_location_category_and_message() {
    let buffer = SharedBuffer::default();
    let logger = LoggerBuilder::new()
        .with_printer(ConsolePrinter::with_writer(buffer.clone()))
        .build();

    let line_no = line!() + 1;
    info!(logger, "hello", "category" => "net");

    let output = buffer.contents();
    let line = output.lines().next().expect("one line");
    let parts: Vec<&str> = line.splitn(5, ' ').collect();

    assert_eq!(parts[0], Level::Info.marker());
    let stamp = format!("{} {}", parts[1], parts[2]);
    assert!(NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%d %H:%M:%S").is_ok());
    assert_eq!(
        parts[3],
        format!("test_logger.rs/console_line_has_marker_time_location_category_and_message/{}", line_no)
    );
    assert_eq!(parts[4], "[net] hello");
}

#[test]
fn console_omits_empty_category() {
    let buffer = SharedBuffer::default();
    let logger = LoggerBuilder::new()
        .with_printer(ConsolePrinter::with_writer(buffer.clone()))
        .build();

    debug!(logger, "plain", "category" => "");

    let output = buffer.contents();
    assert!(output.starts_with(Level::Debug.marker()));
    assert!(!output.contains('['));
    assert!(output.trim_end().ends_with(" plain"));
}

#[test]
fn console_reports_malformed_metadata() {
    let buffer = SharedBuffer::default();
    let logger = LoggerBuilder::new()
        .with_printer(ConsolePrinter::with_writer(buffer.clone()))
        .build();

    // A caller-supplied `date` of the wrong kind wins the merge and trips the check.
    info!(logger, "hello", "date" => "yesterday");

    assert_eq!(buffer.contents(), format!("{}\n", MALFORMED_METADATA_MESSAGE));
}

#[test]
fn console_uses_configured_date_format() {
    let printer = ConsolePrinter::with_writer(SharedBuffer::default()).with_date_format("%H:%M");
    let metadata = Metadata::defaults(&CallSite::new("a/b.rs", "run", 3), chrono::Local::now());
    let line = printer.format("msg", &metadata, Level::Fault).unwrap();

    let parts: Vec<&str> = line.split(' ').collect();
    assert_eq!(parts[0], Level::Fault.marker());
    assert_eq!(parts[1].len(), 5);
    assert_eq!(parts[2], "b.rs/run/3");
    assert_eq!(parts[3], "msg");
}

#[test]
fn unrenderable_date_format_falls_back_to_default() {
    let buffer = SharedBuffer::default();
    let printer = ConsolePrinter::with_writer(buffer.clone()).with_date_format("%Q");
    let logger = LoggerBuilder::new().with_printer(printer).build();

    info!(logger, "hi");

    let output = buffer.contents();
    let parts: Vec<&str> = output.trim_end().splitn(5, ' ').collect();
    let stamp = format!("{} {}", parts[1], parts[2]);
    assert!(NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%d %H:%M:%S").is_ok());
    assert_eq!(parts[4], "hi");
}

#[test]
fn console_printer_takes_date_format_from_config() {
    let config = LogmoConfig {
        date_format: "%H:%M".to_string(),
        ..LogmoConfig::default()
    };
    let printer = ConsolePrinter::from_config(&config);
    let metadata = Metadata::defaults(&CallSite::new("a.rs", "run", 1), chrono::Local::now());
    let line = printer.format("msg", &metadata, Level::Info).unwrap();

    let parts: Vec<&str> = line.split(' ').collect();
    assert_eq!(parts[1].len(), 5);
    assert_eq!(parts[2], "a.rs/run/1");
}

proptest! {
    /// Default keys are always present after dispatch, whatever the caller sends.
    #[test]
    fn default_keys_always_present(extra in prop::collection::hash_map("[a-z]{1,8}", any::<i64>(), 0..6)) {
        let journal = Journal::default();
        let logger = Logger::new(vec![recorder("only", &journal)]);
        let metadata: Metadata = extra.into_iter().collect();
        logger.info("p", metadata, CallSite::new("x.rs", "f", 1));

        let seen = journal.lock().unwrap();
        for key in [MetadataKey::DATE, MetadataKey::FILE_NAME, MetadataKey::FUNCTION, MetadataKey::LINE] {
            prop_assert!(seen[0].metadata.contains_key(&key));
        }
    }

    /// For any key present on both sides, the merged value is the caller's.
    #[test]
    fn caller_wins_law(
        defaults in prop::collection::hash_map("[a-e]", any::<i64>(), 0..5),
        overrides in prop::collection::hash_map("[a-e]", any::<i64>(), 0..5),
    ) {
        let default_meta: Metadata = defaults.clone().into_iter().collect();
        let override_meta: Metadata = overrides.clone().into_iter().collect();
        let merged = override_meta.with_defaults(default_meta);

        for (key, value) in &overrides {
            prop_assert_eq!(merged.get(&MetadataKey::new(key.clone())), Some(&MetadataValue::Int(*value)));
        }
        for (key, value) in &defaults {
            if !overrides.contains_key(key) {
                prop_assert_eq!(merged.get(&MetadataKey::new(key.clone())), Some(&MetadataValue::Int(*value)));
            }
        }
    }
}
