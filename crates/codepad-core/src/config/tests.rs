//! Tests for configuration parsing, overrides and validation

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::executors::language::Language;
    use serial_test::serial;
    use std::env;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn clear_env() {
        for key in [ENV_SCRATCH_DIR, ENV_TIMEOUT_MS, ENV_BIND_ADDR, ENV_LOG_LEVEL] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_empty_document_uses_defaults() {
        clear_env();
        let config = ConfigLoader::from_str("", None).unwrap();
        assert_eq!(config.execution.timeout_ms, 30_000);
        assert!(config.execution.scratch_dir.ends_with("code-execution"));
        assert_eq!(config.server.bind_addr, "127.0.0.1:3001");
        assert_eq!(config.history.default_limit, 50);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    #[serial]
    fn test_full_document_parses() {
        clear_env();
        let yaml = r#"
execution:
  scratch_dir: /var/tmp/codepad
  timeout_ms: 5000
  languages:
    python:
      program: /usr/local/bin/python3.12
    js:
      check_args: ["--check", "{file}"]
server:
  bind_addr: 0.0.0.0:8080
  enable_cors: false
  max_body_size: 2048
history:
  capacity: 10
  default_limit: 5
logging:
  level: debug
"#;
        let config = ConfigLoader::from_str(yaml, None).unwrap();
        assert_eq!(config.execution.scratch_dir, PathBuf::from("/var/tmp/codepad"));
        assert_eq!(config.execution.timeout().as_millis(), 5000);
        assert!(!config.server.enable_cors);
        assert_eq!(config.server.socket_addr().unwrap().port(), 8080);
        assert_eq!(config.history.capacity, 10);

        let table = config.execution.language_table().unwrap();
        assert_eq!(table.get(Language::Python).program, "/usr/local/bin/python3.12");
        assert_eq!(table.get(Language::JavaScript).program, "node");
    }

    #[test]
    #[serial]
    fn test_example_config_is_valid() {
        clear_env();
        let example = include_str!("../../../../codepad.example.yaml");
        let config = ConfigLoader::from_str(example, None).unwrap();
        assert_eq!(config.execution.timeout_ms, 30_000);
        assert_eq!(config.history.capacity, 1000);
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file_values() {
        clear_env();
        env::set_var(ENV_TIMEOUT_MS, "1234");
        env::set_var(ENV_SCRATCH_DIR, "/tmp/override-scratch");
        env::set_var(ENV_BIND_ADDR, "127.0.0.1:9999");

        let config = ConfigLoader::from_str("execution:\n  timeout_ms: 10\n", None);
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.execution.timeout_ms, 1234);
        assert_eq!(
            config.execution.scratch_dir,
            PathBuf::from("/tmp/override-scratch")
        );
        assert_eq!(config.server.bind_addr, "127.0.0.1:9999");
    }

    #[test]
    #[serial]
    fn test_invalid_timeout_env_is_rejected() {
        clear_env();
        env::set_var(ENV_TIMEOUT_MS, "soon");
        let result = ConfigLoader::from_env();
        clear_env();
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_validation_rejects_bad_values() {
        clear_env();
        assert!(ConfigLoader::from_str("execution:\n  timeout_ms: 0\n", None).is_err());
        assert!(ConfigLoader::from_str("history:\n  capacity: 0\n", None).is_err());
        assert!(ConfigLoader::from_str("server:\n  bind_addr: nowhere\n", None).is_err());
        assert!(ConfigLoader::from_str("logging:\n  level: loud\n", None).is_err());
        assert!(ConfigLoader::from_str(
            "execution:\n  languages:\n    ruby:\n      program: ruby\n",
            None
        )
        .is_err());
        assert!(ConfigLoader::from_str(
            "execution:\n  languages:\n    python:\n      program: \"  \"\n",
            None
        )
        .is_err());
        assert!(ConfigLoader::from_str(
            "execution:\n  languages:\n    js:\n      program: node18\n    node:\n      program: node20\n",
            None
        )
        .is_err());
        assert!(ConfigLoader::from_str(
            "execution:\n  languages:\n    python:\n      extension: ../../etc/x\n",
            None
        )
        .is_err());
    }

    #[test]
    #[serial]
    fn test_malformed_yaml_is_config_error() {
        clear_env();
        let err = ConfigLoader::from_str("execution: [unclosed", None).unwrap_err();
        assert!(err.to_string().contains("Failed to parse YAML config"));
    }

    #[tokio::test]
    #[serial]
    async fn test_from_file_resolves_relative_scratch_dir() {
        clear_env();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "execution:\n  scratch_dir: scratch").unwrap();

        let config = load_config(file.path()).await.unwrap();
        let expected = file.path().parent().unwrap().join("scratch");
        assert_eq!(config.execution.scratch_dir, expected);
        assert!(validate_config(&config).is_ok());
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_file_is_config_error() {
        clear_env();
        let err = ConfigLoader::from_source("/definitely/not/here/codepad.yaml")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
