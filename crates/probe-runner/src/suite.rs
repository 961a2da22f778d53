use crate::config::CaseConfig;
use anyhow::{Context, Result};
use probe_host::{CallOutcome, ContractManager, HostLimits};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseReport {
    pub name: String,
    pub runs: u32,
    pub failures: Vec<String>,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> bool {
        self.cases.iter().all(CaseReport::passed)
    }

    pub fn failed_count(&self) -> usize {
        self.cases.iter().filter(|c| !c.passed()).count()
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for case in &self.cases {
            if case.passed() {
                writeln!(f, "PASS {} ({} runs)", case.name, case.runs)?;
            } else {
                writeln!(f, "FAIL {} ({} runs)", case.name, case.runs)?;
                for failure in &case.failures {
                    writeln!(f, "    {}", failure)?;
                }
            }
        }
        write!(
            f,
            "{} passed, {} failed",
            self.cases.len() - self.failed_count(),
            self.failed_count()
        )
    }
}

/// Checks one call against the case's expectations.
pub fn check_outcome(case: &CaseConfig, outcome: &CallOutcome) -> Vec<String> {
    let mut failures = Vec::new();

    if let Some(expect) = &case.expect {
        if &outcome.console != expect {
            failures.push(format!("expected {:?}, got {:?}", expect, outcome.console));
        }
    }
    if let Some(prefix) = &case.expect_prefix {
        if !outcome.console.starts_with(prefix.as_str()) {
            failures.push(format!(
                "expected prefix {:?}, got {:?}",
                prefix, outcome.console
            ));
        }
    }
    if outcome.truncated {
        failures.push("console output truncated".to_string());
    }

    if case.check_heap {
        match &outcome.heap {
            Some(heap) if !heap.is_balanced() => failures.push(format!(
                "heap unbalanced: {:+} blocks, {:+} bytes",
                heap.leaked_blocks(),
                heap.bytes_after - heap.bytes_before
            )),
            Some(_) => {}
            None => failures.push(
                "contract does not export heap_live_blocks/heap_live_bytes".to_string(),
            ),
        }
    }

    failures
}

/// Runs suite cases, loading each contract file once.
pub struct SuiteRunner {
    manager: ContractManager,
    loaded: HashMap<PathBuf, String>,
}

impl SuiteRunner {
    pub fn new(limits: HostLimits) -> Result<Self> {
        Ok(Self {
            manager: ContractManager::new(limits)?,
            loaded: HashMap::new(),
        })
    }

    fn ensure_loaded(&mut self, path: &Path) -> Result<String> {
        if let Some(id) = self.loaded.get(path) {
            return Ok(id.clone());
        }

        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read contract {}", path.display()))?;
        let id = path.display().to_string();
        self.manager
            .load_contract(&id, &bytes)
            .with_context(|| format!("Failed to load contract {}", path.display()))?;

        self.loaded.insert(path.to_path_buf(), id.clone());
        Ok(id)
    }

    pub fn run_case(&mut self, case: &CaseConfig) -> CaseReport {
        let mut report = CaseReport {
            name: case.name.clone(),
            runs: 0,
            failures: Vec::new(),
        };

        let id = match self.ensure_loaded(&case.contract) {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(case = %case.name, "{:#}", e);
                report.failures.push(format!("{:#}", e));
                return report;
            }
        };

        for run in 1..=case.repeat {
            report.runs = run;
            match self
                .manager
                .call_entry(&id, &case.function, case.input.as_bytes())
            {
                Ok(outcome) => {
                    for failure in check_outcome(case, &outcome) {
                        report.failures.push(format!("run {}: {}", run, failure));
                    }
                }
                Err(e) => report.failures.push(format!("run {}: {}", run, e)),
            }
        }

        if report.passed() {
            tracing::info!(case = %case.name, runs = report.runs, "case passed");
        } else {
            tracing::warn!(
                case = %case.name,
                failures = report.failures.len(),
                "case failed"
            );
        }
        report
    }

    pub fn run(&mut self, cases: &[CaseConfig]) -> SuiteReport {
        SuiteReport {
            cases: cases.iter().map(|case| self.run_case(case)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probe_host::HeapBalance;

    fn case() -> CaseConfig {
        CaseConfig {
            name: "hello".to_string(),
            contract: PathBuf::from("say_hello.wasm"),
            function: "say_hello".to_string(),
            input: "alice".to_string(),
            expect: Some("hello alice".to_string()),
            expect_prefix: None,
            repeat: 1,
            check_heap: true,
        }
    }

    fn outcome(console: &str, heap: Option<HeapBalance>) -> CallOutcome {
        CallOutcome {
            console: console.to_string(),
            truncated: false,
            heap,
        }
    }

    const BALANCED: HeapBalance = HeapBalance {
        blocks_before: 1,
        blocks_after: 1,
        bytes_before: 16,
        bytes_after: 16,
    };

    #[test]
    fn test_check_outcome_pass() {
        assert!(check_outcome(&case(), &outcome("hello alice", Some(BALANCED))).is_empty());
    }

    #[test]
    fn test_check_outcome_mismatch_and_leak() {
        let leaky = HeapBalance {
            blocks_after: 2,
            bytes_after: 24,
            ..BALANCED
        };
        let failures = check_outcome(&case(), &outcome("hello bob", Some(leaky)));
        assert_eq!(failures.len(), 2);
        assert!(failures[0].contains("expected \"hello alice\""));
        assert_eq!(failures[1], "heap unbalanced: +1 blocks, +8 bytes");
    }

    #[test]
    fn test_check_outcome_prefix_and_missing_probe() {
        let mut c = case();
        c.expect = None;
        c.expect_prefix = Some("hello alice ".to_string());

        assert!(check_outcome(&c, &outcome("hello alice 1048", Some(BALANCED))).is_empty());

        let failures = check_outcome(&c, &outcome("hello alice", None));
        assert_eq!(failures.len(), 2);
        assert!(failures[1].contains("does not export"));

        c.check_heap = false;
        assert_eq!(check_outcome(&c, &outcome("hello alice 8", None)).len(), 0);
    }

    #[test]
    fn test_check_outcome_truncated() {
        let mut out = outcome("hello alice", Some(BALANCED));
        out.truncated = true;
        assert_eq!(check_outcome(&case(), &out), vec!["console output truncated"]);
    }

    #[test]
    fn test_report_display() {
        let report = SuiteReport {
            cases: vec![
                CaseReport {
                    name: "ok".to_string(),
                    runs: 3,
                    failures: vec![],
                },
                CaseReport {
                    name: "bad".to_string(),
                    runs: 1,
                    failures: vec!["run 1: boom".to_string()],
                },
            ],
        };
        assert!(!report.passed());
        assert_eq!(
            report.to_string(),
            "PASS ok (3 runs)\nFAIL bad (1 runs)\n    run 1: boom\n1 passed, 1 failed"
        );
    }
}
