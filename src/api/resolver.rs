//! Chooses between mock and real implementations of a capability.

use crate::config::{ApiConfig, ApiSource};

/// Returns the implementation selected by `config.source`.
///
/// Only the selected constructor runs. The choice is logged once per call
/// when `config.logging` is set.
pub fn resolve<T, M, R>(service_name: &str, config: &ApiConfig, mock: M, real: R) -> T
where
    M: FnOnce() -> T,
    R: FnOnce() -> T,
{
    if config.logging {
        let label = match config.source {
            ApiSource::Mock => "Using mock data",
            ApiSource::Real => "Using real API",
        };
        tracing::info!(
            service = service_name,
            source = %config.source,
            "{label} for {service_name}"
        );
    }

    match config.source {
        ApiSource::Mock => mock(),
        ApiSource::Real => real(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn config(source: ApiSource) -> ApiConfig {
        ApiConfig {
            source,
            logging: false,
            ..ApiConfig::default()
        }
    }

    #[test]
    fn mock_source_builds_only_the_mock() {
        let real_built = Cell::new(false);
        let picked = resolve(
            "TestApi",
            &config(ApiSource::Mock),
            || "mock",
            || {
                real_built.set(true);
                "real"
            },
        );
        assert_eq!(picked, "mock");
        assert!(!real_built.get());
    }

    #[test]
    fn real_source_builds_only_the_real() {
        let mock_built = Cell::new(false);
        let picked = resolve(
            "TestApi",
            &config(ApiSource::Real),
            || {
                mock_built.set(true);
                "mock"
            },
            || "real",
        );
        assert_eq!(picked, "real");
        assert!(!mock_built.get());
    }
}
