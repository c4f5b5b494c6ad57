//! Quiz and study-selection pages.
//!
//! - `/`, `/quiz`, `/submit-quiz` are open to everyone
//! - `/profile`, `/subjects`, `/select-subject`, `/topics`, `/select-topic`
//!   require a signed-in visitor (see [`Authenticated`])
//! - `/logout` clears the session

use crate::{
    AppState,
    error::AppError,
    navigation::{self, Authenticated, TopicChoice, paths},
    oidc::IdentityProvider,
    quiz,
    session::SessionJar,
    templates::{
        ProfileTemplate, QuizTemplate, SubjectsTemplate, TopicsTemplate, WelcomeTemplate, render,
    },
};
use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Tag for OpenAPI documentation.
pub const PAGES_TAG: &str = "Pages";

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubjectForm {
    /// One of the catalog's subject identifiers (`math`, `english`).
    pub subject: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TopicForm {
    /// Topic name; must not be empty.
    pub topic: Option<String>,
}

pub fn router<P: IdentityProvider>() -> OpenApiRouter<AppState<P>> {
    OpenApiRouter::new()
        .routes(routes!(welcome))
        .routes(routes!(quiz_page))
        .routes(routes!(submit_quiz))
        .routes(routes!(profile))
        .routes(routes!(subjects))
        .routes(routes!(select_subject))
        .routes(routes!(topics))
        .routes(routes!(select_topic))
        .routes(routes!(logout))
}

#[tracing::instrument(skip(session))]
#[utoipa::path(
    get,
    path = "/",
    tag = PAGES_TAG,
    operation_id = "Welcome Page",
    responses((status = 200, description = "Welcome page HTML", content_type = "text/html"))
)]
async fn welcome(session: SessionJar) -> Result<Html<String>, AppError> {
    tracing::info!("Welcome page accessed");
    render(&WelcomeTemplate {
        signed_in: session.get().is_authenticated(),
    })
}

#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/quiz",
    tag = PAGES_TAG,
    operation_id = "Quiz Page",
    summary = "Render the fixed general knowledge quiz",
    responses((status = 200, description = "Quiz form HTML", content_type = "text/html"))
)]
async fn quiz_page<P: IdentityProvider>(
    State(state): State<AppState<P>>,
) -> Result<Html<String>, AppError> {
    tracing::info!("Quiz page accessed");
    render(&QuizTemplate { quiz: &state.quiz })
}

#[tracing::instrument(skip(session, fields))]
#[utoipa::path(
    post,
    path = "/submit-quiz",
    tag = PAGES_TAG,
    operation_id = "Submit Quiz",
    description = "Stores every form field whose name starts with `q` as the visitor's answers \
                   (replacing earlier ones) and continues to the sign-in page. Answers are not graded.",
    responses((status = 303, description = "Redirect to `/auth`"))
)]
async fn submit_quiz(session: SessionJar, Form(fields): Form<Vec<(String, String)>>) -> Response {
    let mut current = session.get();
    quiz::record_answers(&mut current, fields);
    tracing::info!(
        answers = current.quiz_answers.as_ref().map_or(0, |a| a.len()),
        "Quiz submitted"
    );
    (session.set(&current), Redirect::to(paths::AUTH)).into_response()
}

#[tracing::instrument(skip_all, fields(user_id = %auth.user.id))]
#[utoipa::path(
    get,
    path = "/profile",
    tag = PAGES_TAG,
    operation_id = "Profile Page",
    summary = "Signed-in landing page",
    responses(
        (status = 200, description = "Profile HTML with user, subject and topic", content_type = "text/html"),
        (status = 303, description = "Not signed in; redirect to `/auth`"),
    )
)]
async fn profile<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    auth: Authenticated,
) -> Result<Html<String>, AppError> {
    let subject = auth.session.selected_subject.as_deref().map(|id| {
        state
            .catalog
            .subject(id)
            .map_or(id, |s| s.label.as_str())
    });
    render(&ProfileTemplate {
        user: &auth.user,
        subject,
        topic: auth.session.selected_topic.as_deref(),
    })
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/subjects",
    tag = PAGES_TAG,
    operation_id = "Subjects Page",
    responses(
        (status = 200, description = "Subject picker HTML", content_type = "text/html"),
        (status = 303, description = "Not signed in; redirect to `/auth`"),
    )
)]
async fn subjects<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    auth: Authenticated,
) -> Result<Html<String>, AppError> {
    render(&SubjectsTemplate::new(
        state.catalog.subjects(),
        auth.session.selected_subject.as_deref(),
    ))
}

#[tracing::instrument(skip(state, auth))]
#[utoipa::path(
    post,
    path = "/select-subject",
    tag = PAGES_TAG,
    operation_id = "Select Subject",
    request_body(content = SubjectForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Subject stored; redirect to `/topics`, or to `/auth` when not signed in"),
        (status = 400, description = "Unknown subject; nothing stored", content_type = "application/json"),
    )
)]
async fn select_subject<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    auth: Authenticated,
    Form(form): Form<SubjectForm>,
) -> Result<Response, AppError> {
    let Authenticated {
        mut session, jar, ..
    } = auth;
    navigation::choose_subject(&mut session, &state.catalog, form.subject.as_deref())?;
    Ok((jar.set(&session), Redirect::to(paths::TOPICS)).into_response())
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/topics",
    tag = PAGES_TAG,
    operation_id = "Topics Page",
    responses(
        (status = 200, description = "Topic list for the selected subject", content_type = "text/html"),
        (status = 303, description = "Redirect to `/auth` when not signed in, `/subjects` when no subject is selected"),
    )
)]
async fn topics<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    auth: Authenticated,
) -> Result<Response, AppError> {
    let Some(subject) = navigation::current_subject(&auth.session, &state.catalog) else {
        return Ok(Redirect::to(paths::SUBJECTS).into_response());
    };
    Ok(render(&TopicsTemplate::new(
        subject,
        auth.session.selected_topic.as_deref(),
    ))?
    .into_response())
}

#[tracing::instrument(skip(state, auth))]
#[utoipa::path(
    post,
    path = "/select-topic",
    tag = PAGES_TAG,
    operation_id = "Select Topic",
    request_body(content = TopicForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Topic stored; redirect to `/profile` (or `/auth`, `/subjects` when a step is missing)"),
        (status = 400, description = "Empty topic; nothing stored", content_type = "application/json"),
    )
)]
async fn select_topic<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    auth: Authenticated,
    Form(form): Form<TopicForm>,
) -> Result<Response, AppError> {
    let Authenticated {
        mut session, jar, ..
    } = auth;
    match navigation::choose_topic(&mut session, &state.catalog, form.topic.as_deref())? {
        TopicChoice::Stored => Ok((jar.set(&session), Redirect::to(paths::PROFILE)).into_response()),
        TopicChoice::SubjectRequired => Ok(Redirect::to(paths::SUBJECTS).into_response()),
    }
}

#[tracing::instrument(skip(session))]
#[utoipa::path(
    get,
    path = "/logout",
    tag = PAGES_TAG,
    operation_id = "Logout",
    responses((status = 303, description = "Session cleared; redirect to `/`"))
)]
async fn logout(session: SessionJar) -> Response {
    tracing::info!("Session cleared");
    (session.clear(), Redirect::to(paths::WELCOME)).into_response()
}
