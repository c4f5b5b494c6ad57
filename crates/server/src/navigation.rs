//! Page order and the rules that enforce it.
//!
//! Gated handlers take an [`Authenticated`] extractor; a visitor without a
//! `user` in their session is redirected to the login entry point before the
//! handler (or any form parsing) runs. The transition functions below mutate
//! a [`Session`] only when the transition is allowed.

use crate::catalog::{Catalog, Subject};
use crate::error::ValidationError;
use crate::session::{IdentityRecord, Session, SessionJar, SessionSettings};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::Redirect,
};
use axum_extra::extract::cookie::Key;

pub mod paths {
    pub const WELCOME: &str = "/";
    pub const QUIZ: &str = "/quiz";
    pub const SUBMIT_QUIZ: &str = "/submit-quiz";
    pub const AUTH: &str = "/auth";
    pub const GOOGLE_LOGIN: &str = "/auth/google";
    pub const GOOGLE_CALLBACK: &str = "/auth/google/callback";
    pub const PROFILE: &str = "/profile";
    pub const SUBJECTS: &str = "/subjects";
    pub const SELECT_SUBJECT: &str = "/select-subject";
    pub const TOPICS: &str = "/topics";
    pub const SELECT_TOPIC: &str = "/select-topic";
    pub const LOGOUT: &str = "/logout";
}

/// A request from a signed-in visitor, with their decoded session.
pub struct Authenticated {
    pub user: IdentityRecord,
    pub session: Session,
    pub jar: SessionJar,
}

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
    Key: FromRef<S>,
    SessionSettings: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = match SessionJar::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(never) => match never {},
        };
        let session = jar.get();
        match session.user.clone() {
            Some(user) => Ok(Self { user, session, jar }),
            None => {
                tracing::debug!(path = %parts.uri.path(), "No user in session, redirecting to login");
                Err(Redirect::to(paths::AUTH))
            }
        }
    }
}

/// Store `subject` if the catalog offers it. Switching to a different subject
/// drops the previously chosen topic.
pub fn choose_subject(
    session: &mut Session,
    catalog: &Catalog,
    subject: Option<&str>,
) -> Result<(), ValidationError> {
    let subject = match subject {
        Some(s) if catalog.contains(s) => s,
        other => return Err(ValidationError::UnknownSubject(other.map(str::to_string))),
    };
    if session.selected_subject.as_deref() != Some(subject) {
        session.selected_subject = Some(subject.to_string());
        session.selected_topic = None;
    }
    Ok(())
}

/// The selected subject, if there is one the catalog still offers.
pub fn current_subject<'a>(session: &Session, catalog: &'a Catalog) -> Option<&'a Subject> {
    session
        .selected_subject
        .as_deref()
        .and_then(|id| catalog.subject(id))
}

#[derive(Debug, PartialEq, Eq)]
pub enum TopicChoice {
    Stored,
    /// No valid subject is selected yet; nothing was stored.
    SubjectRequired,
}

pub fn choose_topic(
    session: &mut Session,
    catalog: &Catalog,
    topic: Option<&str>,
) -> Result<TopicChoice, ValidationError> {
    if current_subject(session, catalog).is_none() {
        return Ok(TopicChoice::SubjectRequired);
    }
    let topic = topic
        .filter(|t| !t.is_empty())
        .ok_or(ValidationError::EmptyTopic)?;
    session.selected_topic = Some(topic.to_string());
    Ok(TopicChoice::Stored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_subject_leaves_previous_choice() {
        let catalog = Catalog::default();
        let mut session = Session::default();
        choose_subject(&mut session, &catalog, Some("math")).unwrap();
        let err = choose_subject(&mut session, &catalog, Some("chemistry")).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownSubject(Some("chemistry".into()))
        );
        assert_eq!(session.selected_subject.as_deref(), Some("math"));
    }

    #[test]
    fn missing_subject_is_rejected() {
        let catalog = Catalog::default();
        let mut session = Session::default();
        assert!(choose_subject(&mut session, &catalog, None).is_err());
        assert!(session.is_empty());
    }

    #[test]
    fn reselecting_same_subject_is_idempotent() {
        let catalog = Catalog::default();
        let mut session = Session::default();
        choose_subject(&mut session, &catalog, Some("math")).unwrap();
        choose_topic(&mut session, &catalog, Some("algebra")).unwrap();
        let once = session.clone();
        choose_subject(&mut session, &catalog, Some("math")).unwrap();
        assert_eq!(session, once);
    }

    #[test]
    fn switching_subject_drops_topic() {
        let catalog = Catalog::default();
        let mut session = Session::default();
        choose_subject(&mut session, &catalog, Some("math")).unwrap();
        choose_topic(&mut session, &catalog, Some("algebra")).unwrap();
        choose_subject(&mut session, &catalog, Some("english")).unwrap();
        assert_eq!(session.selected_subject.as_deref(), Some("english"));
        assert_eq!(session.selected_topic, None);
    }

    #[test]
    fn empty_topic_keeps_previous_topic() {
        let catalog = Catalog::default();
        let mut session = Session::default();
        choose_subject(&mut session, &catalog, Some("english")).unwrap();
        choose_topic(&mut session, &catalog, Some("phrase")).unwrap();
        assert_eq!(
            choose_topic(&mut session, &catalog, Some("")),
            Err(ValidationError::EmptyTopic)
        );
        assert_eq!(
            choose_topic(&mut session, &catalog, None),
            Err(ValidationError::EmptyTopic)
        );
        assert_eq!(session.selected_topic.as_deref(), Some("phrase"));
    }

    #[test]
    fn topic_needs_a_subject_first() {
        let catalog = Catalog::default();
        let mut session = Session::default();
        assert_eq!(
            choose_topic(&mut session, &catalog, Some("algebra")),
            Ok(TopicChoice::SubjectRequired)
        );
        assert_eq!(session.selected_topic, None);
    }

    #[test]
    fn stale_subject_is_not_current() {
        let catalog = Catalog::default();
        let session = Session {
            selected_subject: Some("latin".into()),
            ..Session::default()
        };
        assert!(current_subject(&session, &catalog).is_none());
    }
}
