//! # Integration Tests
//!
//! Cross-crate tests for the rotating sink.
//!
//! Covers:
//! - contract snapshots (blueprint defaults, error classification)
//! - end-to-end runs against real files: config file -> sink -> destinations

#[cfg(test)]
mod contract_tests {
    use contracts::{AdapterConfig, ConfigVersion, SinkBlueprint, SinkError};

    #[test]
    fn test_minimal_blueprint_defaults() {
        let bp: SinkBlueprint = serde_json::from_str(r#"{ "sink": { "name": "runtime" } }"#)
            .expect("minimal blueprint parses");

        assert_eq!(bp.version, ConfigVersion::V1);
        assert!(matches!(bp.adapter, AdapterConfig::Text));
        assert_eq!(bp.sink.concurrency, 1);
        assert!(bp.sink.rotation.enabled);
        assert_eq!(bp.sink.naming.suffix, "log");
        assert_eq!(bp.observability.log_level, "info");
        assert!(bp.sink.validate().is_ok());
    }

    #[test]
    fn test_only_open_failures_are_fatal() {
        assert!(SinkError::open("a.log", "denied").is_fatal());
        assert!(!SinkError::write("a.log", "disk full").is_fatal());
        assert!(!SinkError::closed("runtime").is_fatal());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use config_loader::ConfigLoader;
    use contracts::AdapterConfig;
    use serde_json::json;
    use sink_engine::{
        DelimitedFileSystem, DelimitedOptions, JsonLinesFileSystem, RollSnapshot, RotatingSink,
        SinkOptions, TextFileSystem,
    };
    use tempfile::tempdir;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("rotsink.toml");
        fs::write(&path, body).unwrap();
        path
    }

    fn lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    fn sorted_files(dir: &Path, suffix: &str) -> Vec<PathBuf> {
        let mut files: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().is_some_and(|ext| ext == suffix))
            .collect();
        files.sort();
        files
    }

    /// Config file -> text sink -> rotated, pruned files on disk
    #[test]
    fn test_e2e_text_rotation_with_backups() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let config = write_config(
            dir.path(),
            &format!(
                r#"
version = "1"

[sink]
name = "runtime"
path = "{}"

[sink.rotation]
max_rows_per_file = 3
max_backup_files = 2
"#,
                out.display().to_string().replace('\\', "/")
            ),
        );

        let bp = ConfigLoader::load_from_path(&config).unwrap();
        assert!(matches!(bp.adapter, AdapterConfig::Text));

        let rolled: Arc<Mutex<Vec<(PathBuf, RollSnapshot)>>> = Arc::default();
        let seen = rolled.clone();
        let options = SinkOptions::new(bp.sink, ()).on_roll(move |path, snapshot| {
            seen.lock().unwrap().push((path.to_path_buf(), snapshot.clone()));
        });
        let sink: RotatingSink<String, TextFileSystem> = RotatingSink::new(options).unwrap();

        for i in 0..10 {
            sink.write(format!("line {i}")).unwrap();
        }
        sink.close().unwrap();

        let snapshot = sink.snapshot();
        assert_eq!(snapshot.rows_written, 10);
        assert_eq!(snapshot.rotation_count, 4);
        assert_eq!(snapshot.removed_count, 2);

        // 4 destinations produced, the 2 oldest removed
        let files = sorted_files(&out, "log");
        assert_eq!(
            files,
            vec![out.join("runtime_2.log"), out.join("runtime_3.log")]
        );
        assert_eq!(lines(&files[0]), vec!["line 6", "line 7", "line 8"]);
        assert_eq!(lines(&files[1]), vec!["line 9"]);

        let rolled = rolled.lock().unwrap();
        let rows: Vec<u64> = rolled.iter().map(|(_, s)| s.rows).collect();
        assert_eq!(rows, vec![3, 3, 3, 1]);
        let sequences: Vec<u64> = rolled.iter().map(|(_, s)| s.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2, 3]);
        assert_eq!(rolled[3].0, out.join("runtime_3.log"));
    }

    /// Delimited adapter repeats the header in every destination
    #[test]
    fn test_e2e_delimited_headers_per_destination() {
        let dir = tempdir().unwrap();
        let config = write_config(
            dir.path(),
            &format!(
                r#"
[sink]
name = "table"
path = "{}"
concurrency = 2

[sink.naming]
suffix = "csv"

[sink.rotation]
max_rows_per_file = 2

[adapter]
kind = "delimited"
delimiter = ";"
headers = ["id", "note"]
"#,
                dir.path().display().to_string().replace('\\', "/")
            ),
        );

        let bp = ConfigLoader::load_from_path(&config).unwrap();
        let AdapterConfig::Delimited { delimiter, headers } = bp.adapter.clone() else {
            panic!("expected delimited adapter");
        };
        let options = SinkOptions::new(bp.sink, DelimitedOptions { delimiter, headers });
        let sink: RotatingSink<Vec<String>, DelimitedFileSystem> =
            RotatingSink::new(options).unwrap();

        for i in 0..4 {
            sink.write(vec![i.to_string(), format!("a;{i}")]).unwrap();
        }
        sink.close().unwrap();

        let files = sorted_files(dir.path(), "csv");
        assert_eq!(files.len(), 2);
        for file in &files {
            let content = lines(file);
            assert_eq!(content.len(), 3);
            assert_eq!(content[0], "id;note");
            // fields holding the delimiter are quoted
            assert!(content[1..].iter().all(|row| row.contains("\"a;")));
        }
        assert_eq!(sink.snapshot().rows_written, 4);
    }

    /// Batch records count every row toward rotation
    #[test]
    fn test_e2e_jsonl_batches() {
        let dir = tempdir().unwrap();
        let bp = ConfigLoader::load_from_str(
            &format!(
                r#"{{
                    "sink": {{
                        "name": "events",
                        "path": {path},
                        "naming": {{ "suffix": "jsonl" }},
                        "rotation": {{ "max_rows_per_file": 4 }}
                    }},
                    "adapter": {{ "kind": "jsonl" }}
                }}"#,
                path = serde_json::to_string(&dir.path()).unwrap()
            ),
            config_loader::ConfigFormat::Json,
        )
        .unwrap();

        let sink: RotatingSink<Vec<serde_json::Value>, JsonLinesFileSystem> =
            RotatingSink::new(SinkOptions::new(bp.sink, ())).unwrap();

        // 3 + 3 rows: the second batch lands in the first destination,
        // which then holds 6 rows and is retired before the third batch
        sink.write(vec![json!(1), json!(2), json!(3)]).unwrap();
        sink.write(vec![json!({"a": 1}), json!({"a": 2}), json!({"a": 3})])
            .unwrap();
        sink.write(vec![json!("tail")]).unwrap();
        sink.close().unwrap();

        let files = sorted_files(dir.path(), "jsonl");
        assert_eq!(files.len(), 2);
        assert_eq!(lines(&files[0]).len(), 6);
        assert_eq!(lines(&files[1]), vec!["\"tail\""]);
        assert_eq!(sink.snapshot().rows_written, 7);
    }

    /// A second run in the same directory never overwrites the first
    #[test]
    fn test_e2e_restart_skips_existing_destinations() {
        let dir = tempdir().unwrap();
        let mut config = contracts::SinkConfig::new("runtime");
        config.path = dir.path().to_path_buf();
        config.rotation.max_rows_per_file = 2;

        for run in 0..2 {
            let sink: RotatingSink<String, TextFileSystem> =
                RotatingSink::new(SinkOptions::new(config.clone(), ())).unwrap();
            for i in 0..3 {
                sink.write(format!("run {run} line {i}")).unwrap();
            }
            sink.close().unwrap();
        }

        let files = sorted_files(dir.path(), "log");
        assert_eq!(files.len(), 4);
        assert_eq!(lines(&dir.path().join("runtime_0.log"))[0], "run 0 line 0");
        assert_eq!(lines(&dir.path().join("runtime_2.log"))[0], "run 1 line 0");
    }

    /// An unwritable directory fails the sink instead of losing records silently
    #[test]
    fn test_e2e_open_failure_reports_dropped() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "").unwrap();

        let mut config = contracts::SinkConfig::new("runtime");
        config.path = blocker;

        let sink: RotatingSink<String, TextFileSystem> =
            RotatingSink::new(SinkOptions::new(config, ())).unwrap();
        sink.write("lost".to_string()).unwrap();

        assert!(sink.close().is_err());
        assert_eq!(sink.status(), sink_engine::SinkStatus::Failed);
        let snapshot = sink.snapshot();
        assert_eq!(snapshot.rows_written, 0);
        assert_eq!(snapshot.dropped_count, 1);
    }
}
