use probe_runner::{SuiteConfig, SuiteRunner};
use std::path::PathBuf;

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../probe-host/tests/fixtures")
        .join(name)
        .display()
        .to_string()
}

fn suite_toml() -> String {
    format!(
        r#"
[engine]
max_epoch_ticks = 200

[[case]]
name = "plain"
contract = "{plain}"
input = "alice"
expect = "hello alice"
repeat = 3

[[case]]
name = "heap"
contract = "{heap}"
input = "bob"
expect_prefix = "hello bob "
repeat = 5

[[case]]
name = "leaky"
contract = "{heap}"
function = "say_hello_leaky"
input = "carol"
expect = "hello carol"
repeat = 2

[[case]]
name = "no-probe"
contract = "{no_probe}"
input = "dave"
expect = "hello dave"

[[case]]
name = "no-probe-unchecked"
contract = "{no_probe}"
input = "erin"
expect = "hello erin"
check_heap = false
"#,
        plain = fixture("say_hello.wat"),
        heap = fixture("say_hello_heap.wat"),
        no_probe = fixture("no_probe.wat"),
    )
}

#[test]
fn test_suite_from_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("suite.toml");
    std::fs::write(&path, suite_toml())?;

    let suite = SuiteConfig::load(&path)?;
    let mut runner = SuiteRunner::new(suite.engine.clone())?;
    let report = runner.run(&suite.cases);

    let by_name = |name: &str| {
        report
            .cases
            .iter()
            .find(|c| c.name == name)
            .expect("case in report")
            .clone()
    };

    let plain = by_name("plain");
    assert!(plain.passed(), "{:?}", plain.failures);
    assert_eq!(plain.runs, 3);

    let heap = by_name("heap");
    assert!(heap.passed(), "{:?}", heap.failures);
    assert_eq!(heap.runs, 5);

    let leaky = by_name("leaky");
    assert_eq!(leaky.failures.len(), 2);
    assert!(leaky.failures[0].starts_with("run 1: heap unbalanced: +1 blocks"));

    let no_probe = by_name("no-probe");
    assert_eq!(no_probe.failures.len(), 1);
    assert!(no_probe.failures[0].contains("does not export"));

    assert!(by_name("no-probe-unchecked").passed());

    assert!(!report.passed());
    assert_eq!(report.failed_count(), 2);
    assert!(report.to_string().ends_with("3 passed, 2 failed"));
    Ok(())
}

#[test]
fn test_missing_contract_fails_case_without_runs() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let toml = r#"
[[case]]
name = "ghost"
contract = "missing.wasm"
expect = "hello"
"#;
    let suite = SuiteConfig::from_toml_str(toml, dir.path())?;
    let mut runner = SuiteRunner::new(suite.engine.clone())?;
    let report = runner.run(&suite.cases);

    let case = &report.cases[0];
    assert_eq!(case.runs, 0);
    assert_eq!(case.failures.len(), 1);
    assert!(case.failures[0].contains("Failed to read contract"));
    Ok(())
}

#[test]
fn test_trap_is_reported_per_run() -> anyhow::Result<()> {
    let toml = format!(
        r#"
[[case]]
name = "trap"
contract = "{}"
function = "say_hello_trap"
repeat = 2
"#,
        fixture("say_hello_heap.wat")
    );
    let suite = SuiteConfig::from_toml_str(&toml, std::path::Path::new("."))?;
    let mut runner = SuiteRunner::new(suite.engine.clone())?;
    let report = runner.run(&suite.cases);

    let case = &report.cases[0];
    assert_eq!(case.runs, 2);
    assert_eq!(case.failures.len(), 2);
    assert!(case.failures[1].starts_with("run 2: Trap in 'say_hello_trap'"));
    Ok(())
}
