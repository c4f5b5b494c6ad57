//! Page templates (askama, under `templates/`).

use crate::catalog::Subject;
use crate::error::AppError;
use crate::quiz::Quiz;
use crate::session::IdentityRecord;
use askama::Template;
use axum::response::Html;

pub fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    Ok(Html(template.render()?))
}

#[derive(Template)]
#[template(path = "welcome.html")]
pub struct WelcomeTemplate {
    pub signed_in: bool,
}

#[derive(Template)]
#[template(path = "quiz.html")]
pub struct QuizTemplate<'a> {
    pub quiz: &'a Quiz,
}

#[derive(Template)]
#[template(path = "auth.html")]
pub struct AuthTemplate {
    pub login_url: &'static str,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate<'a> {
    pub user: &'a IdentityRecord,
    pub subject: Option<&'a str>,
    pub topic: Option<&'a str>,
}

/// One entry of a picker list.
pub struct Choice<'a> {
    pub value: &'a str,
    pub label: &'a str,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "subjects.html")]
pub struct SubjectsTemplate<'a> {
    pub subjects: Vec<Choice<'a>>,
}

impl<'a> SubjectsTemplate<'a> {
    pub fn new(subjects: &'a [Subject], selected: Option<&str>) -> Self {
        Self {
            subjects: subjects
                .iter()
                .map(|s| Choice {
                    value: &s.id,
                    label: &s.label,
                    selected: selected == Some(s.id.as_str()),
                })
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "topics.html")]
pub struct TopicsTemplate<'a> {
    pub subject: &'a str,
    pub topics: Vec<Choice<'a>>,
}

impl<'a> TopicsTemplate<'a> {
    pub fn new(subject: &'a Subject, selected: Option<&str>) -> Self {
        Self {
            subject: &subject.label,
            topics: subject
                .topics
                .iter()
                .map(|t| Choice {
                    value: t,
                    label: t,
                    selected: selected == Some(t.as_str()),
                })
                .collect(),
        }
    }
}
