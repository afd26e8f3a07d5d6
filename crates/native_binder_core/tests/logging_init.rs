use native_binder_core::{init_logging, logging_status, LoggingError};

#[test]
fn init_logging_is_idempotent_and_rejects_reconfiguration() {
    let log_dir = tempfile::tempdir().expect("create temp log dir");
    let other_dir = tempfile::tempdir().expect("create second temp log dir");
    let log_dir_str = log_dir.path().to_str().expect("utf-8 temp path");
    let other_dir_str = other_dir.path().to_str().expect("utf-8 temp path");

    init_logging("info", log_dir_str).expect("first init should succeed");
    init_logging("INFO", log_dir_str).expect("same config should be idempotent");

    let err = init_logging("debug", log_dir_str).expect_err("level switch must fail");
    assert!(matches!(err, LoggingError::LevelConflict { .. }));
    assert!(err.to_string().contains("refusing to switch"));

    let err = init_logging("info", other_dir_str).expect_err("directory switch must fail");
    assert!(matches!(err, LoggingError::DirConflict { .. }));

    let (level, dir) = logging_status().expect("logging should be active");
    assert_eq!(level, "info");
    assert_eq!(dir, log_dir.path());

    log::info!("event=logging_smoke module=tests status=ok");
}
