use colored::Colorize;

/// Outcome of one changed file's sub-pipeline.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    Synced { template_id: String },
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub filename: String,
    pub outcome: FileOutcome,
}

/// Aggregate result of a run: one report per qualifying changed file.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub files: Vec<FileReport>,
}

impl RunSummary {
    pub fn synced(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Synced { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.outcome)).count()
    }
}

/// Print the per-file outcomes and totals to the terminal.
pub fn print_summary(summary: &RunSummary) {
    println!();
    for file in &summary.files {
        match &file.outcome {
            FileOutcome::Synced { template_id } => {
                println!(
                    "  {} {} -> template {}",
                    "synced ".green(),
                    file.filename,
                    template_id
                );
            }
            FileOutcome::Skipped { reason } => {
                println!("  {} {} ({})", "skipped".yellow(), file.filename, reason);
            }
            FileOutcome::Failed { error } => {
                println!("  {} {}: {}", "failed ".red(), file.filename, error);
            }
        }
    }
    println!();
    println!(
        "{} synced, {} skipped, {} failed",
        summary.synced(),
        summary.skipped(),
        summary.failed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RunSummary {
        RunSummary {
            files: vec![
                FileReport {
                    filename: "a.mjml".to_string(),
                    outcome: FileOutcome::Synced {
                        template_id: "42".to_string(),
                    },
                },
                FileReport {
                    filename: "b.mjml".to_string(),
                    outcome: FileOutcome::Skipped {
                        reason: "no template marker".to_string(),
                    },
                },
                FileReport {
                    filename: "c.mjml".to_string(),
                    outcome: FileOutcome::Failed {
                        error: "boom".to_string(),
                    },
                },
            ],
        }
    }

    #[test]
    fn test_summary_counts() {
        let summary = summary();
        assert_eq!(summary.synced(), 1);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.failed(), 1);
        assert!(summary.has_failures());
    }

    #[test]
    fn test_empty_summary_has_no_failures() {
        assert!(!RunSummary::default().has_failures());
    }
}
