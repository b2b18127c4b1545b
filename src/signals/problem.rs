use serde::{Deserialize, Serialize};

use crate::signals::vocabulary::Vocabulary;

const CAUSAL_BONUS: f64 = 0.1;
const QUESTION_BONUS: f64 = 0.1;
const CRYING_BONUS: f64 = 0.15;
const HELP_BONUS: f64 = 0.2;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemSignals {
    pub has_problems: bool,
    pub problems: Vec<String>,
    /// Relative ranking signal, not a probability; can exceed 1.
    pub problem_score: f64,
}

pub(crate) fn detect(vocabulary: &Vocabulary, text: &str) -> ProblemSignals {
    let lowercase = text.to_lowercase();
    if lowercase.trim().is_empty() {
        return ProblemSignals::default();
    }

    let problems: Vec<String> = vocabulary
        .problem_keywords
        .iter()
        .filter(|keyword| lowercase.contains(keyword.as_str()))
        .cloned()
        .collect();

    let match_ratio = if vocabulary.problem_keywords.is_empty() {
        0.0
    } else {
        problems.len() as f64 / vocabulary.problem_keywords.len() as f64
    };

    let mut context_bonus = 0.0;
    if contains_any(&lowercase, &vocabulary.causal_connectors) {
        context_bonus += CAUSAL_BONUS;
    }
    if contains_any(&lowercase, &vocabulary.question_markers) {
        context_bonus += QUESTION_BONUS;
    }
    if contains_any(&lowercase, &vocabulary.crying_emoticons) {
        context_bonus += CRYING_BONUS;
    }
    if contains_any(&lowercase, &vocabulary.help_phrases) {
        context_bonus += HELP_BONUS;
    }

    ProblemSignals {
        has_problems: !problems.is_empty(),
        problems,
        problem_score: match_ratio + context_bonus,
    }
}

fn contains_any(text: &str, needles: &[String]) -> bool {
    needles.iter().any(|needle| text.contains(needle.as_str()))
}
