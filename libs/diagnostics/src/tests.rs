use crate::*;

#[derive(Debug, Clone)]
pub struct TestIssue {
    severity: Severity,
}

impl Display for TestIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.severity)
    }
}

impl Diagnostic for TestIssue {
    fn severity(&self) -> Severity {
        self.severity
    }
}

impl From<Severity> for TestIssue {
    fn from(severity: Severity) -> Self {
        Self { severity }
    }
}

#[test]
fn issue_set_counters() {
    let mut issues: IssueSet<TestIssue> = IssueSet::new();
    issues.add(Severity::Info.into());
    assert!(!issues.has_error());
    assert!(!issues.has_warning());
    issues.add(Severity::Warning.into());
    issues.add(Severity::Error.into());
    issues.add(Severity::Warning.into());
    assert_eq!(issues.num_errors(), 1);
    assert_eq!(issues.num_warnings(), 2);
    assert!(issues.has_error());
    assert_eq!(
        issues.summary(),
        IssueSummary {
            errors: 1,
            warnings: 2,
            infos: 1,
        }
    );
    assert_eq!(
        issues.summary().to_string(),
        "1 error(s), 2 warning(s), 1 info message(s)"
    );
}

#[test]
fn extend_keeps_counters() {
    let mut a: IssueSet<TestIssue> = IssueSet::new();
    a.add(Severity::Error.into());
    let mut b = IssueSet::new();
    b.add_and_emit(Severity::Warning.into());
    b.add_and_emit(Severity::Info.into());
    a.extend(b);
    assert_eq!(a.len(), 3);
    assert_eq!(a.num_errors(), 1);
    assert_eq!(a.num_warnings(), 1);
    assert_eq!(a.with_severity(Severity::Info).count(), 1);
}

#[test]
fn severity_as_tracing_level() {
    assert_eq!(Severity::Info.as_tracing_level(), tracing::Level::INFO);
    assert_eq!(Severity::Warning.as_tracing_level(), tracing::Level::WARN);
    assert_eq!(Severity::Error.as_tracing_level(), tracing::Level::ERROR);
    assert!(Severity::Error > Severity::Warning);
}
