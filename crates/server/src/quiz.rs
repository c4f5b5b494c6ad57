//! The fixed quiz and the collection of submitted answers.
//!
//! Answers are stored as submitted and never graded.

use crate::session::Session;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: [String; 4],
}

impl Question {
    fn new(id: &str, text: &str, options: [&str; 4]) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            options: options.map(str::to_string),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Quiz {
    pub title: String,
    pub questions: Vec<Question>,
}

impl Quiz {
    pub fn general_knowledge() -> Self {
        Self {
            title: "General Knowledge Quiz".to_string(),
            questions: vec![
                Question::new(
                    "q0",
                    "What is the capital of France?",
                    ["Berlin", "Madrid", "Paris", "Rome"],
                ),
                Question::new("q1", "What is 2 + 2?", ["3", "4", "5", "6"]),
                Question::new(
                    "q2",
                    "Which planet is known as the Red Planet?",
                    ["Earth", "Mars", "Jupiter", "Venus"],
                ),
            ],
        }
    }
}

/// Form keys naming a question start with `q`.
pub fn is_question_key(key: &str) -> bool {
    key.starts_with('q')
}

/// Replace the session's answers with the question fields of a submission.
/// A repeated key keeps its last value.
pub fn record_answers<I>(session: &mut Session, fields: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    let answers: BTreeMap<String, String> = fields
        .into_iter()
        .filter(|(key, _)| is_question_key(key))
        .collect();
    session.quiz_answers = Some(answers);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn quiz_is_deterministic() {
        let quiz = Quiz::general_knowledge();
        assert_eq!(quiz, Quiz::general_knowledge());
        let ids: Vec<&str> = quiz.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, ["q0", "q1", "q2"]);
        assert_eq!(quiz.questions[2].options[1], "Mars");
    }

    #[test]
    fn non_question_fields_are_dropped() {
        let mut session = Session::default();
        record_answers(
            &mut session,
            pairs(&[("q0", "Paris"), ("csrf", "x"), ("submit", "Send")]),
        );
        let answers = session.quiz_answers.unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers["q0"], "Paris");
    }

    #[test]
    fn answers_are_stored_verbatim_without_checking_ids() {
        let mut session = Session::default();
        record_answers(&mut session, pairs(&[("q9", "Not an option")]));
        assert_eq!(session.quiz_answers.unwrap()["q9"], "Not an option");
    }

    #[test]
    fn resubmission_overwrites_previous_answers() {
        let mut session = Session::default();
        record_answers(&mut session, pairs(&[("q0", "Rome"), ("q1", "4")]));
        record_answers(&mut session, pairs(&[("q0", "Paris")]));
        let answers = session.quiz_answers.unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers["q0"], "Paris");
    }

    #[test]
    fn repeated_key_keeps_last_value() {
        let mut session = Session::default();
        record_answers(&mut session, pairs(&[("q1", "3"), ("q1", "4")]));
        assert_eq!(session.quiz_answers.unwrap()["q1"], "4");
    }
}
