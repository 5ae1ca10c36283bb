//! Config validation
//!
//! Rules:
//! - engine invariants hold (see `SinkConfig::validate`)
//! - sink name is a plain file-name stem
//! - delimiter is ASCII and cannot clash with quoting or line breaks
//! - header names are non-empty and unique
//! - metrics port is non-zero when set

use std::collections::HashSet;

use contracts::{AdapterConfig, SinkBlueprint, SinkError};

/// Validate a SinkBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &SinkBlueprint) -> Result<(), SinkError> {
    blueprint.sink.validate()?;
    validate_sink_name(blueprint)?;
    validate_adapter(blueprint)?;
    validate_observability(blueprint)?;
    Ok(())
}

fn validate_sink_name(blueprint: &SinkBlueprint) -> Result<(), SinkError> {
    let name = &blueprint.sink.name;
    if name.contains(['/', '\\']) {
        return Err(SinkError::config_validation(
            "sink.name",
            format!("sink name '{name}' must not contain path separators, use sink.path"),
        ));
    }
    Ok(())
}

fn validate_adapter(blueprint: &SinkBlueprint) -> Result<(), SinkError> {
    let AdapterConfig::Delimited { delimiter, headers } = &blueprint.adapter else {
        return Ok(());
    };

    if !delimiter.is_ascii() || matches!(delimiter, '"' | '\n' | '\r') {
        return Err(SinkError::config_validation(
            "adapter.delimiter",
            format!("delimiter {delimiter:?} must be an ASCII char other than a quote or line break"),
        ));
    }

    let mut seen = HashSet::new();
    for (idx, header) in headers.iter().enumerate() {
        if header.is_empty() {
            return Err(SinkError::config_validation(
                format!("adapter.headers[{idx}]"),
                "header name cannot be empty",
            ));
        }
        if !seen.insert(header) {
            return Err(SinkError::config_validation(
                format!("adapter.headers[{idx}]"),
                format!("duplicate header '{header}'"),
            ));
        }
    }
    Ok(())
}

fn validate_observability(blueprint: &SinkBlueprint) -> Result<(), SinkError> {
    let obs = &blueprint.observability;
    if obs.log_level.trim().is_empty() {
        return Err(SinkError::config_validation(
            "observability.log_level",
            "log_level cannot be empty",
        ));
    }
    if obs.metrics_port == Some(0) {
        return Err(SinkError::config_validation(
            "observability.metrics_port",
            "metrics_port must be non-zero when set",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ObservabilitySettings, SinkConfig};

    fn blueprint() -> SinkBlueprint {
        SinkBlueprint {
            version: Default::default(),
            sink: SinkConfig::new("runtime"),
            adapter: AdapterConfig::Text,
            observability: ObservabilitySettings::default(),
        }
    }

    fn field_of(err: SinkError) -> String {
        match err {
            SinkError::ConfigValidation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_blueprint() {
        assert!(validate(&blueprint()).is_ok());
    }

    #[test]
    fn test_engine_rules_apply() {
        let mut bp = blueprint();
        bp.sink.rotation.max_rows_per_file = 0;
        assert_eq!(
            field_of(validate(&bp).unwrap_err()),
            "sink.rotation.max_rows_per_file"
        );
    }

    #[test]
    fn test_name_with_separator() {
        let mut bp = blueprint();
        bp.sink.name = "logs/runtime".into();
        assert_eq!(field_of(validate(&bp).unwrap_err()), "sink.name");
    }

    #[test]
    fn test_reserved_delimiter() {
        let mut bp = blueprint();
        bp.adapter = AdapterConfig::Delimited {
            delimiter: '"',
            headers: vec![],
        };
        assert_eq!(field_of(validate(&bp).unwrap_err()), "adapter.delimiter");
    }

    #[test]
    fn test_duplicate_header() {
        let mut bp = blueprint();
        bp.adapter = AdapterConfig::Delimited {
            delimiter: ',',
            headers: vec!["id".into(), "name".into(), "id".into()],
        };
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
        assert_eq!(field_of(err), "adapter.headers[2]");
    }

    #[test]
    fn test_zero_metrics_port() {
        let mut bp = blueprint();
        bp.observability.metrics_port = Some(0);
        assert_eq!(
            field_of(validate(&bp).unwrap_err()),
            "observability.metrics_port"
        );
    }
}
