use anyhow::Result;

use crate::config::Config;

/// `(name, status, healthy)` for each connector.
pub fn source_statuses(config: &Config) -> Vec<(&'static str, String, bool)> {
    let microcms = match &config.connectors.microcms {
        Some(cms) => match (cms.api_root(), std::env::var(&cms.api_key_env)) {
            (Ok(_), Ok(_)) => ("OK".to_string(), true),
            (Err(_), _) => ("NOT CONFIGURED (service domain missing)".to_string(), false),
            (_, Err(_)) => (format!("NOT CONFIGURED ({} not set)", cms.api_key_env), false),
        },
        None => ("NOT CONFIGURED".to_string(), false),
    };

    let snapshot = match &config.connectors.snapshot {
        Some(snap) if snap.path.is_file() => ("OK".to_string(), true),
        Some(_) => ("NOT CONFIGURED (file does not exist)".to_string(), false),
        None => ("NOT CONFIGURED".to_string(), false),
    };

    vec![
        ("microcms", microcms.0, microcms.1),
        ("snapshot", snapshot.0, snapshot.1),
    ]
}

pub fn list_sources(config: &Config) -> Result<()> {
    println!("{:<16} {:<40} HEALTHY", "CONNECTOR", "STATUS");
    for (name, status, healthy) in source_statuses(config) {
        println!("{:<16} {:<40} {}", name, status, healthy);
    }
    Ok(())
}
