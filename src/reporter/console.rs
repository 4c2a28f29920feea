//! Console reporter with colored output

use crate::analyzer::criteria::CriterionDef;
use crate::analyzer::engine::EvaluationSummary;
use crate::analyzer::scoring::{DimensionScore, ScoreCalculator};
use crate::evaluation::{Evaluation, EvaluationStatus};
use crate::history::{format_delta, HistoryEntry};
use crate::{CriteriaResult, CriterionStatus, Grade};
use colored::Colorize;

/// Reporter for terminal output
pub struct ConsoleReporter {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show verbose output
    verbose: bool,
}

impl ConsoleReporter {
    /// Create a new console reporter
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
        }
    }

    /// Disable colors
    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    /// Enable verbose output
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Report one finished evaluation. `previous` is the total of the
    /// site's last completed run, if any.
    pub fn report(&self, evaluation: &Evaluation, previous: Option<f64>) {
        self.print_header(evaluation);
        if evaluation.status == EvaluationStatus::Failed {
            println!(
                "   {} {}",
                "✗".red(),
                evaluation.error.as_deref().unwrap_or("evaluation failed")
            );
            println!();
            return;
        }

        self.print_score(evaluation, previous);
        self.print_dimensions(&evaluation.dimension_scores);
        self.print_findings(&evaluation.criteria);
        self.print_text_analysis(evaluation);
        self.print_recommendations(evaluation);
        println!();
    }

    /// Report an evaluation that never produced a stored result
    pub fn report_unpersisted(&self, summary: &EvaluationSummary) {
        println!();
        println!(
            "{}",
            format!("🏛  Website #{}", summary.website_id).bold()
        );
        println!(
            "   {} {}",
            "✗".red(),
            summary.error.as_deref().unwrap_or("evaluation failed")
        );
        println!();
    }

    /// Report in quiet mode (just score)
    pub fn report_quiet(&self, summary: &EvaluationSummary, previous: Option<f64>) {
        match summary.grade {
            Some(grade) if summary.is_completed() => println!(
                "website {}: {:.1} ({}){}",
                summary.website_id,
                summary.total_score,
                self.colorize_grade(&grade),
                format_delta(previous, summary.total_score)
            ),
            _ => println!(
                "website {}: {} ({})",
                summary.website_id,
                "failed".red(),
                summary.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    /// Summary line after several sites
    pub fn report_batch(&self, summaries: &[EvaluationSummary]) {
        let completed: Vec<&EvaluationSummary> =
            summaries.iter().filter(|s| s.is_completed()).collect();
        println!("{}", "═".repeat(60));
        println!("{}", "Summary".bold());
        println!("{}", "═".repeat(60));
        println!("   Websites evaluated: {}", summaries.len().to_string().bold());
        println!(
            "   Completed: {}  Failed: {}",
            completed.len().to_string().green(),
            (summaries.len() - completed.len()).to_string().red()
        );
        if !completed.is_empty() {
            let average =
                completed.iter().map(|s| s.total_score).sum::<f64>() / completed.len() as f64;
            println!(
                "   Average score: {:.1} ({})",
                average,
                self.colorize_grade(&Grade::from_score(average))
            );
        }
        println!();
    }

    /// Evaluation history of one site, oldest first
    pub fn report_history(&self, website_id: u64, entries: &[HistoryEntry]) {
        println!();
        println!("{}", format!("🏛  Evaluation history: website #{}", website_id).bold());
        if entries.is_empty() {
            println!("   No evaluations stored");
            println!();
            return;
        }
        let mut previous: Option<f64> = None;
        for entry in entries {
            let when = entry.created_at.format("%Y-%m-%d %H:%M");
            match entry.status {
                EvaluationStatus::Completed => {
                    println!(
                        "   {} {} {:>5.1} ({}){}",
                        when.to_string().dimmed(),
                        entry.evaluation_id.to_string().dimmed(),
                        entry.total_score,
                        self.colorize_grade(&Grade::from_score(entry.total_score)),
                        format_delta(previous, entry.total_score)
                    );
                    previous = Some(entry.total_score);
                }
                status => println!(
                    "   {} {} {} {}",
                    when.to_string().dimmed(),
                    entry.evaluation_id.to_string().dimmed(),
                    status.to_string().red(),
                    entry.error.as_deref().unwrap_or("")
                ),
            }
        }
        println!();
    }

    /// The criterion catalog grouped by dimension
    pub fn report_catalog(&self, catalog: &[CriterionDef], version: &str) {
        println!();
        println!("{}", format!("📋 Criterion catalog {}", version).bold());
        for dimension in crate::Dimension::ALL {
            let weight = crate::analyzer::scoring::dimension_weight(dimension);
            println!();
            println!(
                "   {} (weight {:.0}%)",
                dimension.to_string().bold(),
                weight * 100.0
            );
            for def in catalog.iter().filter(|d| d.dimension == dimension) {
                let source = if def.is_nlp() { " [text analysis]" } else { "" };
                println!(
                    "   {} {:<40} {:>4.1} pts {}{}",
                    def.code.cyan(),
                    def.name,
                    def.max_score,
                    def.reference.dimmed(),
                    source.dimmed()
                );
                if self.verbose {
                    println!("       {} {}", "↳".dimmed(), def.description.dimmed());
                }
            }
        }
        println!();
    }

    fn print_header(&self, evaluation: &Evaluation) {
        println!();
        println!(
            "{}",
            format!("🏛  Compliance Evaluation: website #{}", evaluation.website_id).bold()
        );
        println!(
            "   Evaluation: {} | Status: {} | Catalog: {}",
            evaluation.id, evaluation.status, evaluation.catalog_version
        );
        if self.verbose {
            if let Some(ref digest) = evaluation.content_digest {
                println!("   Content digest: {}", digest.dimmed());
            }
        }
        println!();
    }

    fn print_score(&self, evaluation: &Evaluation, previous: Option<f64>) {
        let grade = evaluation
            .grade
            .unwrap_or_else(|| Grade::from_score(evaluation.total_score));
        let grade_str = self.colorize_grade(&grade);
        let score_bar = self.create_score_bar(evaluation.total_score);

        println!(
            "   Score: {} {}{}",
            score_bar,
            grade_str.bold(),
            format_delta(previous, evaluation.total_score).dimmed()
        );
        println!("   {}", ScoreCalculator::grade_description(grade).dimmed());
        let counts = evaluation.counts();
        println!(
            "   {} passed, {} partial, {} failed, {} not applicable",
            counts.passed.to_string().green(),
            counts.partial.to_string().yellow(),
            counts.failed.to_string().red(),
            counts.na.to_string().dimmed()
        );
        println!();
    }

    fn print_dimensions(&self, dimensions: &[DimensionScore]) {
        println!("   {}", "Dimensions:".bold());
        for score in dimensions {
            let bar = self.create_mini_bar(score.percentage);
            let pct = format!("{:>5.1}%", score.percentage);
            let colored_pct = if !score.complete {
                pct.dimmed()
            } else if score.percentage >= 80.0 {
                pct.green()
            } else if score.percentage >= 60.0 {
                pct.yellow()
            } else {
                pct.red()
            };
            let note = if score.complete {
                String::new()
            } else {
                " (no applicable criteria)".to_string()
            };
            println!(
                "   {} {} {} (weight {:.0}%, contributes {:.1}){}",
                bar,
                colored_pct,
                score.dimension,
                score.weight * 100.0,
                score.weighted(),
                note.dimmed()
            );
        }
        println!();
    }

    fn print_findings(&self, criteria: &[CriteriaResult]) {
        let failing: Vec<&CriteriaResult> = criteria
            .iter()
            .filter(|c| matches!(c.status, CriterionStatus::Fail | CriterionStatus::Partial))
            .collect();
        let defects: Vec<&CriteriaResult> =
            criteria.iter().filter(|c| c.defect().is_some()).collect();

        if failing.is_empty() && defects.is_empty() {
            return;
        }

        println!("   {}", "Findings:".bold());
        for result in failing {
            self.print_finding(result);
        }
        if self.verbose {
            for result in &defects {
                println!(
                    "   {} [{}] {} {}",
                    "ℹ".blue(),
                    result.criteria_id.dimmed(),
                    result.criteria_name,
                    result.defect().unwrap_or_default().italic()
                );
            }
        } else if !defects.is_empty() {
            println!(
                "   {} {} criteria could not read their data (use --verbose to show)",
                "ℹ".blue(),
                defects.len()
            );
        }
        println!();
    }

    fn print_finding(&self, result: &CriteriaResult) {
        let icon = match result.status {
            CriterionStatus::Fail => "✗".red(),
            _ => "⚠".yellow(),
        };
        println!(
            "   {} [{}] {} {}",
            icon,
            result.criteria_id.dimmed(),
            result.criteria_name,
            format!("{:.1}/{:.1}", result.score, result.max_score).dimmed()
        );
        if let Some(message) = result.details.get("message").and_then(|m| m.as_str()) {
            println!("       {} {}", "→".dimmed(), message.italic());
        }
        let limit = if self.verbose { usize::MAX } else { 3 };
        for line in result.evidence.iter().take(limit) {
            println!("       {} {}", "·".dimmed(), line.dimmed());
        }
        if result.evidence.len() > limit {
            println!(
                "       {} {} more",
                "·".dimmed(),
                result.evidence.len() - limit
            );
        }
    }

    fn print_text_analysis(&self, evaluation: &Evaluation) {
        let Some(ref nlp) = evaluation.nlp else {
            return;
        };
        let source = match nlp.global_score {
            Some(global) => format!("{} (global {:.1})", nlp.source.as_str(), global),
            None => nlp.source.as_str().to_string(),
        };
        println!("   Text analysis: {}", source.dimmed());
        if let Some(ref reason) = nlp.fallback_reason {
            println!("       {} {}", "↳".dimmed(), reason.dimmed());
        }
        println!();
    }

    fn print_recommendations(&self, evaluation: &Evaluation) {
        let mut recs = ScoreCalculator::recommendations(&evaluation.dimension_scores);
        if let Some(ref nlp) = evaluation.nlp {
            recs.extend(nlp.recommendations.iter().cloned());
        }

        if evaluation.total_score < 90.0 {
            println!("   {}", "Recommendations:".bold());
            let limit = if self.verbose { recs.len() } else { 3 };
            for rec in recs.iter().take(limit) {
                println!("   {} {}", "→".cyan(), rec);
            }
        }
    }

    fn colorize_grade(&self, grade: &Grade) -> colored::ColoredString {
        let s = grade.to_string();
        if !self.use_colors {
            return s.normal();
        }
        match grade {
            Grade::A => s.green().bold(),
            Grade::B => s.green(),
            Grade::C => s.yellow(),
            Grade::D => s.red(),
            Grade::F => s.red().bold(),
        }
    }

    fn create_score_bar(&self, score: f64) -> String {
        let filled = bar_cells(score, 20);
        let empty = 20 - filled;

        let bar = format!(
            "[{}{}] {:>5.1}%",
            "█".repeat(filled),
            "░".repeat(empty),
            score
        );

        if self.use_colors {
            if score >= 80.0 {
                bar.green().to_string()
            } else if score >= 60.0 {
                bar.yellow().to_string()
            } else {
                bar.red().to_string()
            }
        } else {
            bar
        }
    }

    fn create_mini_bar(&self, percentage: f64) -> String {
        let filled = bar_cells(percentage, 10);
        format!("[{}{}]", "▓".repeat(filled), "░".repeat(10 - filled))
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of filled cells out of `width` for a 0..=100 percentage
fn bar_cells(percentage: f64, width: usize) -> usize {
    let clamped = if percentage.is_finite() {
        percentage.clamp(0.0, 100.0)
    } else {
        0.0
    };
    ((clamped * width as f64) / 100.0).floor() as usize
}
