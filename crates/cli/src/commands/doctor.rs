use maitred_core::config::{AppConfig, LoadOptions};
use maitred_db::connect_with_settings;
use serde_json::json;

struct Check {
    name: &'static str,
    passed: bool,
    detail: String,
}

/// Runs config and database readiness checks. Output is human-readable by
/// default, machine-readable JSON with `--json`.
pub fn run(json: bool) -> String {
    let checks = run_checks();
    let healthy = checks.iter().all(|check| check.passed);

    if json {
        let payload = json!({
            "command": "doctor",
            "status": if healthy { "ok" } else { "error" },
            "checks": checks
                .iter()
                .map(|check| {
                    json!({
                        "name": check.name,
                        "passed": check.passed,
                        "detail": check.detail,
                    })
                })
                .collect::<Vec<_>>(),
        });
        return serde_json::to_string_pretty(&payload).unwrap_or_default();
    }

    let mut lines = vec![format!(
        "maitred doctor: {}",
        if healthy { "all checks passed" } else { "problems found" }
    )];
    for check in &checks {
        lines.push(format!(
            "  [{}] {}: {}",
            if check.passed { "ok" } else { "fail" },
            check.name,
            check.detail,
        ));
    }
    lines.join("\n")
}

fn run_checks() -> Vec<Check> {
    let mut checks = Vec::new();

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(Check {
                name: "config",
                passed: true,
                detail: "configuration loaded and validated".to_string(),
            });
            config
        }
        Err(error) => {
            checks.push(Check {
                name: "config",
                passed: false,
                detail: format!("configuration issue: {error}"),
            });
            return checks;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            checks.push(Check {
                name: "database",
                passed: false,
                detail: format!("failed to initialize async runtime: {error}"),
            });
            return checks;
        }
    };

    let database_check = runtime.block_on(async {
        match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => {
                let probe = sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&pool).await;
                pool.close().await;
                match probe {
                    Ok(_) => Check {
                        name: "database",
                        passed: true,
                        detail: "connected and answered a probe query".to_string(),
                    },
                    Err(error) => Check {
                        name: "database",
                        passed: false,
                        detail: format!("probe query failed: {error}"),
                    },
                }
            }
            Err(error) => Check {
                name: "database",
                passed: false,
                detail: format!("connection failed: {error}"),
            },
        }
    });
    checks.push(database_check);

    checks
}
