//! Spot the Difference: each task shows a grid of text items and asks
//! for the ones that look wrong (mirrored letters, uneven spacing,
//! inconsistent sizing). Selections toggle, and the assessment weighs
//! each task against a screening threshold.

use std::error::Error;

use serde::Deserialize;

use crate::games::level_file_contents;
use crate::insight::RiskTier;
use crate::session::{Phase, SessionRecord};
use crate::util::{mean, pct};

/// Accuracy floors per task; scoring below the floor flags the task
/// as a risk factor.
const TASK_THRESHOLDS: [(&str, f64); 5] = [
    ("letter_reversal", 60.0),
    ("word_spacing", 50.0),
    ("letter_size", 70.0),
    ("line_alignment", 50.0),
    ("mirror_writing", 75.0),
];

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SpotItem {
    pub id: usize,
    pub text: String,
    pub anomalous: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotTask {
    pub id: String,
    pub title: String,
    pub instruction: String,
    pub items: Vec<SpotItem>,
}

#[derive(Debug, Deserialize)]
struct SpotFile {
    name: String,
    tasks: Vec<SpotTask>,
}

pub fn load_spot_tasks() -> Result<Vec<SpotTask>, Box<dyn Error>> {
    let contents = level_file_contents("spot_difference.json")?;
    let file: SpotFile = serde_json::from_str(contents)?;
    if file.name != "spot_difference" {
        return Err(format!("level data is tagged {:?}", file.name).into());
    }
    if file.tasks.is_empty() {
        return Err("level data has no tasks".into());
    }
    for task in &file.tasks {
        if !task.items.iter().any(|i| i.anomalous) {
            return Err(format!("task {:?} has no anomalous items", task.id).into());
        }
        if !TASK_THRESHOLDS.iter().any(|(id, _)| *id == task.id) {
            return Err(format!("task {:?} has no scoring threshold", task.id).into());
        }
    }
    Ok(file.tasks)
}

/// Score card for one finished task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult {
    pub task_id: String,
    /// Anomalous items found, as a percentage of all anomalous items.
    pub accuracy: f64,
    /// Normal items wrongly selected.
    pub false_positives: usize,
    pub average_response_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpotAssessment {
    pub risk: RiskTier,
    pub overall_accuracy: f64,
    pub task_results: Vec<TaskResult>,
    /// Task ids that scored below their threshold.
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

/// A timed selection that has not been locked in yet. Withdrawing the
/// selection drops the whole record, so it never reaches the session.
#[derive(Debug, Clone)]
struct PendingMark {
    item_id: usize,
    anomalous: bool,
    text: String,
    response_ms: u64,
}

#[derive(Debug)]
pub struct SpotDifference {
    tasks: Vec<SpotTask>,
    task_idx: usize,
    pending: Vec<PendingMark>,
    results: Vec<TaskResult>,
    session: SessionRecord,
}

impl SpotDifference {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let tasks = load_spot_tasks()?;
        Ok(Self {
            tasks,
            task_idx: 0,
            pending: Vec::new(),
            results: Vec::new(),
            session: SessionRecord::new("spot_difference"),
        })
    }

    pub fn start(&mut self) {
        self.session.begin();
    }

    pub fn tasks(&self) -> &[SpotTask] {
        &self.tasks
    }

    pub fn current_task(&self) -> Option<&SpotTask> {
        self.tasks.get(self.task_idx)
    }

    pub fn selected(&self) -> Vec<usize> {
        self.pending.iter().map(|m| m.item_id).collect()
    }

    pub fn is_selected(&self, item_id: usize) -> bool {
        self.pending.iter().any(|m| m.item_id == item_id)
    }

    pub fn results(&self) -> &[TaskResult] {
        &self.results
    }

    pub fn session(&self) -> &SessionRecord {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    /// Select or deselect an item on the current task. Each selection
    /// is timed; deselecting withdraws the response entirely, as if the
    /// click never happened.
    pub fn toggle(&mut self, item_id: usize) -> bool {
        if self.phase() != Phase::InProgress {
            return false;
        }
        let found = self.current_task().and_then(|task| {
            task.items
                .iter()
                .find(|i| i.id == item_id)
                .map(|item| (item.anomalous, item.text.clone()))
        });
        let Some((anomalous, text)) = found else {
            return false;
        };

        if let Some(pos) = self.pending.iter().position(|m| m.item_id == item_id) {
            self.pending.remove(pos);
            return false;
        }

        let response_ms = self.session.timer.mark_action();
        self.pending.push(PendingMark {
            item_id,
            anomalous,
            text,
            response_ms,
        });
        true
    }

    /// Lock in the current task's surviving selections and advance.
    /// Finishes the session after the last task.
    pub fn next_task(&mut self) -> Option<&TaskResult> {
        if self.phase() != Phase::InProgress {
            return None;
        }
        let (task_id, anomalous_total) = {
            let task = self.tasks.get(self.task_idx)?;
            (
                task.id.clone(),
                task.items.iter().filter(|i| i.anomalous).count(),
            )
        };

        let mut hits = 0usize;
        let mut false_positives = 0usize;
        let mut times = Vec::with_capacity(self.pending.len());
        for mark in self.pending.drain(..) {
            if mark.anomalous {
                hits += 1;
            } else {
                false_positives += 1;
            }
            times.push(mark.response_ms as f64);
            self.session.record_timed(
                task_id.clone(),
                mark.anomalous,
                mark.text,
                "anomalous item",
                mark.response_ms,
            );
        }

        self.results.push(TaskResult {
            task_id,
            accuracy: pct(hits, anomalous_total),
            false_positives,
            average_response_ms: mean(&times).unwrap_or(0.0),
        });

        self.task_idx += 1;
        if self.task_idx >= self.tasks.len() {
            self.session.finish();
        }
        self.results.last()
    }

    pub fn reset(&mut self) {
        self.task_idx = 0;
        self.pending.clear();
        self.results.clear();
        self.session = SessionRecord::new("spot_difference");
    }

    pub fn assessment(&self) -> Option<SpotAssessment> {
        if self.results.is_empty() {
            return None;
        }

        let accuracies: Vec<f64> = self.results.iter().map(|r| r.accuracy).collect();
        let overall_accuracy = mean(&accuracies).unwrap_or(0.0);

        let mut risk_factors = Vec::new();
        for result in &self.results {
            let threshold = TASK_THRESHOLDS
                .iter()
                .find(|(id, _)| *id == result.task_id)
                .map(|(_, t)| *t)
                .unwrap_or(50.0);
            if result.accuracy < threshold {
                risk_factors.push(result.task_id.clone());
            }
        }

        let risk = match risk_factors.len() {
            4.. => RiskTier::High,
            2..=3 => RiskTier::Moderate,
            _ => RiskTier::Low,
        };

        let mut recommendations = Vec::new();
        if risk_factors.iter().any(|f| f == "letter_reversal" || f == "mirror_writing") {
            recommendations.push(
                "Practice distinguishing mirror-image letters with tracing exercises".to_string(),
            );
        }
        if risk_factors.iter().any(|f| f == "word_spacing" || f == "line_alignment") {
            recommendations.push(
                "Use lined and grid paper to reinforce spacing and alignment".to_string(),
            );
        }
        if risk_factors.iter().any(|f| f == "letter_size") {
            recommendations
                .push("Practice consistent letter sizing with guided handwriting sheets".to_string());
        }
        if risk == RiskTier::High {
            recommendations.push(
                "Consider a professional assessment for visual processing difficulties".to_string(),
            );
        }

        Some(SpotAssessment {
            risk,
            overall_accuracy,
            task_results: self.results.clone(),
            risk_factors,
            recommendations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anomalous_ids(task: &SpotTask) -> Vec<usize> {
        task.items
            .iter()
            .filter(|i| i.anomalous)
            .map(|i| i.id)
            .collect()
    }

    fn normal_ids(task: &SpotTask) -> Vec<usize> {
        task.items
            .iter()
            .filter(|i| !i.anomalous)
            .map(|i| i.id)
            .collect()
    }

    #[test]
    fn test_tasks_load_with_thresholds() {
        let tasks = load_spot_tasks().unwrap();
        assert_eq!(tasks.len(), 5);
        assert_eq!(tasks[0].id, "letter_reversal");
        assert_eq!(tasks[4].id, "mirror_writing");
    }

    #[test]
    fn test_toggle_requires_started_session() {
        let mut game = SpotDifference::new().unwrap();
        assert!(!game.toggle(0));
        assert!(game.selected().is_empty());
    }

    #[test]
    fn test_toggle_selects_and_deselects() {
        let mut game = SpotDifference::new().unwrap();
        game.start();
        let id = game.current_task().unwrap().items[0].id;
        assert!(game.toggle(id));
        assert!(game.is_selected(id));
        assert!(!game.toggle(id));
        assert!(!game.is_selected(id));
    }

    #[test]
    fn test_withdrawn_click_leaves_no_record() {
        let mut game = SpotDifference::new().unwrap();
        game.start();
        let task = game.current_task().unwrap().clone();
        let normal = normal_ids(&task)[0];
        game.toggle(normal);
        game.toggle(normal);
        let result = game.next_task().unwrap().clone();

        assert_eq!(result.false_positives, 0);
        assert_eq!(result.average_response_ms, 0.0);
        assert_eq!(game.session().total(), 0);
    }

    #[test]
    fn test_locked_in_selections_reach_the_session() {
        let mut game = SpotDifference::new().unwrap();
        game.start();
        let task = game.current_task().unwrap().clone();
        game.toggle(anomalous_ids(&task)[0]);
        game.toggle(normal_ids(&task)[0]);
        game.next_task();

        assert_eq!(game.session().total(), 2);
        assert_eq!(game.session().correct_count(), 1);
    }

    #[test]
    fn test_unknown_item_is_ignored() {
        let mut game = SpotDifference::new().unwrap();
        game.start();
        assert!(!game.toggle(9999));
        assert!(game.selected().is_empty());
    }

    #[test]
    fn test_perfect_task_scores_full_accuracy() {
        let mut game = SpotDifference::new().unwrap();
        game.start();
        for id in anomalous_ids(game.current_task().unwrap()) {
            game.toggle(id);
        }
        let result = game.next_task().unwrap();
        assert_eq!(result.accuracy, 100.0);
        assert_eq!(result.false_positives, 0);
    }

    #[test]
    fn test_false_positives_counted() {
        let mut game = SpotDifference::new().unwrap();
        game.start();
        let task = game.current_task().unwrap().clone();
        game.toggle(anomalous_ids(&task)[0]);
        game.toggle(normal_ids(&task)[0]);
        let result = game.next_task().unwrap();
        assert_eq!(result.false_positives, 1);
        assert!(result.accuracy < 100.0);
    }

    #[test]
    fn test_selections_clear_between_tasks() {
        let mut game = SpotDifference::new().unwrap();
        game.start();
        game.toggle(game.current_task().unwrap().items[0].id);
        game.next_task();
        assert!(game.selected().is_empty());
    }

    #[test]
    fn test_session_completes_after_last_task() {
        let mut game = SpotDifference::new().unwrap();
        game.start();
        for _ in 0..game.tasks().len() {
            game.next_task();
        }
        assert_eq!(game.phase(), Phase::Completed);
        assert!(game.current_task().is_none());
        assert!(game.next_task().is_none());
    }

    #[test]
    fn test_perfect_run_is_low_risk() {
        let mut game = SpotDifference::new().unwrap();
        game.start();
        while let Some(task) = game.current_task().cloned() {
            for id in anomalous_ids(&task) {
                game.toggle(id);
            }
            game.next_task();
        }
        let assessment = game.assessment().unwrap();
        assert_eq!(assessment.overall_accuracy, 100.0);
        assert_eq!(assessment.risk, RiskTier::Low);
        assert!(assessment.risk_factors.is_empty());
        assert!(assessment.recommendations.is_empty());
    }

    #[test]
    fn test_skipping_everything_is_high_risk() {
        let mut game = SpotDifference::new().unwrap();
        game.start();
        for _ in 0..game.tasks().len() {
            game.next_task();
        }
        let assessment = game.assessment().unwrap();
        assert_eq!(assessment.overall_accuracy, 0.0);
        assert_eq!(assessment.risk, RiskTier::High);
        assert_eq!(assessment.risk_factors.len(), 5);
        assert!(assessment
            .recommendations
            .iter()
            .any(|r| r.contains("professional assessment")));
    }

    #[test]
    fn test_two_weak_tasks_is_moderate_risk() {
        let mut game = SpotDifference::new().unwrap();
        game.start();
        let mut task_no = 0;
        while let Some(task) = game.current_task().cloned() {
            // miss the first two tasks entirely, ace the rest
            if task_no >= 2 {
                for id in anomalous_ids(&task) {
                    game.toggle(id);
                }
            }
            game.next_task();
            task_no += 1;
        }
        let assessment = game.assessment().unwrap();
        assert_eq!(assessment.risk_factors.len(), 2);
        assert_eq!(assessment.risk, RiskTier::Moderate);
    }

    #[test]
    fn test_assessment_none_before_first_task() {
        let mut game = SpotDifference::new().unwrap();
        game.start();
        assert!(game.assessment().is_none());
    }

    #[test]
    fn test_reset_returns_to_first_task() {
        let mut game = SpotDifference::new().unwrap();
        game.start();
        game.next_task();
        game.reset();
        assert_eq!(game.phase(), Phase::NotStarted);
        assert_eq!(game.current_task().unwrap().id, "letter_reversal");
        assert!(game.results().is_empty());
    }
}
