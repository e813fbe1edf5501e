//! Scoring and progress over a catalog and its ledger.
//!
//! Everything here is a pure function of `(Catalog, AnswerLedger)`; callers
//! decide when to invoke it.

use crate::model::{AnswerLedger, Catalog, QuestionReview, SessionOutcome, percentage};

/// Answered/unanswered counts, for progress bars and the submit gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
    pub unanswered: usize,
    pub percentage: u8,
}

/// Count ledger choices that exactly match each question's correct choice.
///
/// Unanswered and defective questions never count as correct.
#[must_use]
pub fn score(catalog: &Catalog, ledger: &AnswerLedger) -> SessionOutcome {
    let correct = catalog
        .questions()
        .iter()
        .filter(|q| q.is_answerable() && ledger.choice(q.id()) == Some(q.correct()))
        .count();

    SessionOutcome::new(to_u32(correct), to_u32(catalog.len()))
}

#[must_use]
pub fn progress(catalog: &Catalog, ledger: &AnswerLedger) -> Progress {
    let total = catalog.len();
    let answered = catalog
        .questions()
        .iter()
        .filter(|q| ledger.contains(q.id()))
        .count();

    Progress {
        answered,
        total,
        unanswered: total - answered,
        percentage: percentage(to_u32(answered), to_u32(total)),
    }
}

/// Per-question breakdown in catalog order.
#[must_use]
pub fn review(catalog: &Catalog, ledger: &AnswerLedger) -> Vec<QuestionReview> {
    catalog
        .questions()
        .iter()
        .map(|q| {
            let chosen = ledger.choice(q.id()).map(str::to_owned);
            let answerable = q.is_answerable();
            QuestionReview {
                id: q.id().clone(),
                prompt: q.prompt().to_owned(),
                is_correct: answerable && chosen.as_deref() == Some(q.correct()),
                chosen,
                correct: q.correct().to_owned(),
                answerable,
                explanation: q.explanation().map(str::to_owned),
            }
        })
        .collect()
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Question, QuestionId};
    use proptest::prelude::*;

    fn catalog_of(correct: &[&str]) -> Catalog {
        let questions = correct
            .iter()
            .enumerate()
            .map(|(i, c)| {
                Question::new(
                    QuestionId::key(format!("q{}", i + 1)),
                    format!("Question {}", i + 1),
                    vec!["A".into(), "B".into(), "C".into(), "X".into()],
                    *c,
                )
            })
            .collect();
        Catalog::new(Category::new("test"), questions).unwrap()
    }

    #[test]
    fn scores_three_question_example() {
        let catalog = catalog_of(&["A", "B", "C"]);
        let mut ledger = AnswerLedger::new();
        ledger.record(QuestionId::key("q1"), "A");
        ledger.record(QuestionId::key("q2"), "X");
        ledger.record(QuestionId::key("q3"), "C");

        let outcome = score(&catalog, &ledger);
        assert_eq!(outcome, SessionOutcome { score: 2, total: 3, percentage: 67 });
    }

    #[test]
    fn empty_catalog_scores_zero() {
        let catalog = Catalog::new(Category::new("empty"), Vec::new()).unwrap();
        let outcome = score(&catalog, &AnswerLedger::new());
        assert_eq!(outcome, SessionOutcome { score: 0, total: 0, percentage: 0 });
        assert_eq!(progress(&catalog, &AnswerLedger::new()).unanswered, 0);
    }

    #[test]
    fn defective_question_never_scores_but_counts_in_total() {
        let broken = Question::new(QuestionId::key("q2"), "broken", Vec::new(), "");
        let ok = Question::new(QuestionId::key("q1"), "ok", vec!["A".into()], "A");
        let catalog = Catalog::new(Category::new("x"), vec![ok, broken]).unwrap();

        let mut ledger = AnswerLedger::new();
        ledger.record(QuestionId::key("q1"), "A");
        // Even a ledger entry matching the (empty) key must not count.
        ledger.record(QuestionId::key("q2"), "");

        let outcome = score(&catalog, &ledger);
        assert_eq!(outcome.score, 1);
        assert_eq!(outcome.total, 2);
        assert_eq!(outcome.percentage, 50);
    }

    #[test]
    fn progress_counts_only_catalog_questions() {
        let catalog = catalog_of(&["A", "B", "C", "A", "B"]);
        let mut ledger = AnswerLedger::new();
        ledger.record(QuestionId::key("q1"), "A");
        ledger.record(QuestionId::key("q4"), "C");
        ledger.record(QuestionId::key("not-in-catalog"), "A");

        let p = progress(&catalog, &ledger);
        assert_eq!(p.answered, 2);
        assert_eq!(p.unanswered, 3);
        assert_eq!(p.percentage, 40);
    }

    #[test]
    fn review_marks_each_question() {
        let catalog = catalog_of(&["A", "B"]);
        let mut ledger = AnswerLedger::new();
        ledger.record(QuestionId::key("q1"), "A");

        let lines = review(&catalog, &ledger);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].is_correct);
        assert_eq!(lines[1].chosen, None);
        assert!(!lines[1].is_correct);
    }

    proptest! {
        #[test]
        fn score_is_order_independent(
            answers in proptest::collection::vec((0usize..4, 0usize..4), 0..20),
            rotation in 0usize..20,
        ) {
            const CHOICES: [&str; 4] = ["A", "B", "C", "X"];
            let questions: Vec<Question> = answers
                .iter()
                .enumerate()
                .map(|(i, (correct, _))| {
                    Question::new(
                        QuestionId::number(i as u64),
                        format!("Q{i}"),
                        CHOICES.iter().map(|c| (*c).to_owned()).collect(),
                        CHOICES[*correct],
                    )
                })
                .collect();

            let mut ledger = AnswerLedger::new();
            let mut permuted_ledger = AnswerLedger::new();
            for (i, (_, chosen)) in answers.iter().enumerate() {
                ledger.record(QuestionId::number(i as u64), CHOICES[*chosen]);
            }
            for (i, (_, chosen)) in answers.iter().enumerate().rev() {
                permuted_ledger.record(QuestionId::number(i as u64), CHOICES[*chosen]);
            }

            let mut permuted = questions.clone();
            if !permuted.is_empty() {
                let len = permuted.len();
                permuted.rotate_left(rotation % len);
                permuted.reverse();
            }

            let original = Catalog::new(Category::new("p"), questions).unwrap();
            let shuffled = Catalog::new(Category::new("p"), permuted).unwrap();

            prop_assert_eq!(score(&original, &ledger), score(&shuffled, &permuted_ledger));
        }
    }
}
