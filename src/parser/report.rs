//! Explode steps and their outcomes.

use std::fmt;

/// One extraction step of the explode pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    /// File header version
    Header,
    /// Cross-reference summary
    Xref,
    /// Trailer dictionary
    Trailer,
    /// Document catalog
    Catalog,
    /// Per-page atoms
    Pages,
    /// Embedded file names
    Embeds,
    /// JavaScript name tree
    JavaScript,
    /// Digital signatures
    Signatures,
    /// Interactive form fields
    AcroForm,
    /// Encryption dictionary
    Encryption,
    /// Raw object dump
    Raw,
}

impl Step {
    /// Every step, in execution order.
    pub const ALL: [Step; 11] = [
        Step::Header,
        Step::Xref,
        Step::Trailer,
        Step::Catalog,
        Step::Pages,
        Step::Embeds,
        Step::JavaScript,
        Step::Signatures,
        Step::AcroForm,
        Step::Encryption,
        Step::Raw,
    ];

    /// Short lowercase name, matching the atom category where one exists.
    pub fn name(&self) -> &'static str {
        match self {
            Step::Header => "header",
            Step::Xref => "xref",
            Step::Trailer => "trailer",
            Step::Catalog => "catalog",
            Step::Pages => "pages",
            Step::Embeds => "embeds",
            Step::JavaScript => "js",
            Step::Signatures => "signatures",
            Step::AcroForm => "acroform",
            Step::Encryption => "encrypt",
            Step::Raw => "raw",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step stored this many items
    Captured(usize),
    /// The step ran but the document has nothing for it
    Empty,
    /// The step was skipped by configuration
    Skipped,
    /// The step failed; its atoms keep their defaults
    Failed(String),
}

impl StepOutcome {
    /// Outcome for a count: `Empty` for zero.
    pub fn from_count(count: usize) -> Self {
        if count == 0 {
            StepOutcome::Empty
        } else {
            StepOutcome::Captured(count)
        }
    }

    /// Whether the step failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Captured(n) => write!(f, "{} captured", n),
            StepOutcome::Empty => f.write_str("none"),
            StepOutcome::Skipped => f.write_str("skipped"),
            StepOutcome::Failed(msg) => write!(f, "failed: {}", msg),
        }
    }
}

/// Per-step summary of one explode run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplodeReport {
    /// Outcomes in execution order
    pub steps: Vec<(Step, StepOutcome)>,
}

impl ExplodeReport {
    /// Record a step outcome.
    pub fn record(&mut self, step: Step, outcome: StepOutcome) {
        self.steps.push((step, outcome));
    }

    /// Outcome of a step, if it ran.
    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, outcome)| outcome)
    }

    /// Steps that failed, with their messages.
    pub fn failures(&self) -> impl Iterator<Item = (Step, &str)> {
        self.steps.iter().filter_map(|(step, outcome)| match outcome {
            StepOutcome::Failed(msg) => Some((*step, msg.as_str())),
            _ => None,
        })
    }

    /// Whether every step completed without failure.
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }
}

impl fmt::Display for ExplodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (step, outcome)) in self.steps.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{:<11} {}", step.name(), outcome)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_count() {
        assert_eq!(StepOutcome::from_count(0), StepOutcome::Empty);
        assert_eq!(StepOutcome::from_count(3), StepOutcome::Captured(3));
    }

    #[test]
    fn test_report_failures() {
        let mut report = ExplodeReport::default();
        report.record(Step::Header, StepOutcome::Captured(1));
        report.record(Step::Embeds, StepOutcome::Failed("broken name tree".into()));

        assert!(!report.is_clean());
        assert_eq!(
            report.failures().collect::<Vec<_>>(),
            vec![(Step::Embeds, "broken name tree")]
        );
        assert_eq!(report.outcome(Step::Header), Some(&StepOutcome::Captured(1)));
        assert!(report.outcome(Step::Raw).is_none());
    }

    #[test]
    fn test_report_display() {
        let mut report = ExplodeReport::default();
        report.record(Step::Pages, StepOutcome::Captured(3));
        report.record(Step::Signatures, StepOutcome::Empty);
        assert_eq!(report.to_string(), "pages       3 captured\nsignatures  none");
    }
}
