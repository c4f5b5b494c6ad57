//! Subjects and the topics offered for each.

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Subject {
    pub id: String,
    pub label: String,
    pub topics: Vec<String>,
}

impl Subject {
    fn new(id: &str, label: &str, topics: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Immutable subject → topics mapping, in display order.
#[derive(Clone, Debug)]
pub struct Catalog {
    subjects: Vec<Subject>,
}

impl Catalog {
    pub fn new(subjects: Vec<Subject>) -> Self {
        Self { subjects }
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    /// `None` means the subject is not offered.
    pub fn topics(&self, subject: &str) -> Option<&[String]> {
        self.subject(subject).map(|s| s.topics.as_slice())
    }

    pub fn contains(&self, subject: &str) -> bool {
        self.subject(subject).is_some()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(vec![
            Subject::new(
                "math",
                "Math",
                &["set", "equations", "trigonometry", "algebra", "geometry"],
            ),
            Subject::new(
                "english",
                "English",
                &["article", "sentence", "parts of speech", "phrase", "words"],
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_offers_math_and_english_in_order() {
        let catalog = Catalog::default();
        let ids: Vec<&str> = catalog.subjects().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["math", "english"]);
    }

    #[test]
    fn topics_keep_their_order() {
        let catalog = Catalog::default();
        assert_eq!(
            catalog.topics("english").unwrap(),
            ["article", "sentence", "parts of speech", "phrase", "words"]
        );
        assert_eq!(catalog.topics("math").unwrap()[2], "trigonometry");
    }

    #[test]
    fn unknown_subject_has_no_topics() {
        let catalog = Catalog::default();
        assert!(catalog.topics("chemistry").is_none());
        assert!(!catalog.contains("Math"));
        assert!(!catalog.contains(""));
    }
}
