//! Global subscriber installation.
//!
//! Lives in its own test binary so no other test shares the process-wide
//! subscriber it installs.

use trace_graph_kernel::{init_tracing, LogConfig, LogFormat, LoggingError};

#[test]
fn test_install_once_then_reject() {
    let config = LogConfig {
        format: LogFormat::Json,
        filter: "trace_graph_kernel=debug".to_string(),
    };

    init_tracing(&config).unwrap();
    assert!(matches!(
        init_tracing(&config),
        Err(LoggingError::AlreadyInstalled(_))
    ));
}
