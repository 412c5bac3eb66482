use dappazon_core::config::{AppConfig, LoadOptions};
use dappazon_ledger::{CatalogSource, ContractCatalog};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_completion_credentials(&config));
            checks.push(check_search_credentials(&config));
            checks.push(check_ledger_connectivity(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["completion_credentials", "search_credentials", "ledger_connectivity"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_completion_credentials(config: &AppConfig) -> DoctorCheck {
    DoctorCheck {
        name: "completion_credentials",
        status: CheckStatus::Pass,
        details: format!(
            "api key present; cascade: {} against {}",
            config.llm.models.join(" -> "),
            config.llm.base_url
        ),
    }
}

fn check_search_credentials(config: &AppConfig) -> DoctorCheck {
    if config.search_enabled() {
        DoctorCheck {
            name: "search_credentials",
            status: CheckStatus::Pass,
            details: format!("search key present; engine `{}`", config.search.engine),
        }
    } else {
        DoctorCheck {
            name: "search_credentials",
            status: CheckStatus::Skipped,
            details: "no search key configured; web search actions stay unexecuted".to_string(),
        }
    }
}

fn check_ledger_connectivity(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "ledger_connectivity",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        let catalog = ContractCatalog::new(&config.ledger)?;
        catalog.ping().await
    });

    match result {
        Ok(block) => DoctorCheck {
            name: "ledger_connectivity",
            status: CheckStatus::Pass,
            details: format!("`{}` answered at block {block}", config.ledger.rpc_url),
        },
        Err(error) => DoctorCheck {
            name: "ledger_connectivity",
            status: CheckStatus::Fail,
            details: format!(
                "`{}`: {error}; chat falls back to the static prompt",
                config.ledger.rpc_url
            ),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
