use serde::Serialize;
use tourbook_core::config::AppConfig;

use crate::commands::{
    connect, load_catalog, load_config, runtime, CommandResult, StepFailure,
    EXIT_CONFIG,
};

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
    #[serde(skip)]
    exit_code: u8,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into(), exit_code: 0 }
    }

    fn fail(name: &'static str, details: impl Into<String>, exit_code: u8) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into(), exit_code }
    }

    fn skipped(name: &'static str) -> Self {
        Self {
            name,
            status: CheckStatus::Skipped,
            details: "skipped because configuration did not load".to_string(),
            exit_code: 0,
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    /// Exit code of the first failing check, or zero.
    fn exit_code(&self) -> u8 {
        self.checks
            .iter()
            .find(|check| check.status == CheckStatus::Fail)
            .map(|check| check.exit_code)
            .unwrap_or(0)
    }
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code: report.exit_code(), output }
}

fn build_report() -> DoctorReport {
    let checks = match load_config() {
        Ok(config) => vec![
            DoctorCheck::pass("config_validation", "configuration loaded and validated"),
            check_catalog(&config),
            check_database(&config),
            check_llm_mode(&config),
        ],
        Err(failure) => vec![
            DoctorCheck::fail("config_validation", failure.message, EXIT_CONFIG),
            DoctorCheck::skipped("catalog_load"),
            DoctorCheck::skipped("database_connectivity"),
            DoctorCheck::skipped("llm_mode"),
        ],
    };

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    DoctorReport {
        overall_status: if all_pass { CheckStatus::Pass } else { CheckStatus::Fail },
        summary: if all_pass {
            "doctor: all readiness checks passed".to_string()
        } else {
            "doctor: one or more readiness checks failed".to_string()
        },
        checks,
    }
}

fn check_catalog(config: &AppConfig) -> DoctorCheck {
    match load_catalog(config) {
        Ok(catalog) => {
            let source = match &config.catalog.path {
                Some(path) => path.display().to_string(),
                None => "builtin catalog".to_string(),
            };
            DoctorCheck::pass("catalog_load", format!("{} tours from {source}", catalog.len()))
        }
        Err(failure) => DoctorCheck::fail("catalog_load", failure.message, failure.exit_code),
    }
}

fn check_database(config: &AppConfig) -> DoctorCheck {
    let outcome = runtime().and_then(|runtime| {
        runtime.block_on(async {
            let pool = connect(config).await?;
            pool.close().await;
            Ok::<(), StepFailure>(())
        })
    });

    match outcome {
        Ok(()) => DoctorCheck::pass(
            "database_connectivity",
            format!("connected using `{}`", config.database.url),
        ),
        Err(failure) => {
            DoctorCheck::fail("database_connectivity", failure.message, failure.exit_code)
        }
    }
}

/// Reports which reply path the chat assistant will take. Rules mode is a
/// supported configuration, not a failure.
fn check_llm_mode(config: &AppConfig) -> DoctorCheck {
    if config.llm.is_enabled() {
        DoctorCheck::pass(
            "llm_mode",
            format!(
                "llm: model `{}` via {}",
                config.llm.model,
                config.llm.effective_base_url()
            ),
        )
    } else {
        DoctorCheck::pass("llm_mode", "rules: no completion provider configured")
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

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
