use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, Response},
    Form,
};
use serde::Deserialize;
use tracing::error;

use crate::models::SCHOOLS;
use crate::services::idcard;
use crate::services::registration::{
    self, FieldErrors, IdCardView, RegistrationInput, SubmitOutcome,
};
use crate::web::AppState;

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub values: RegistrationInput,
    pub errors: FieldErrors,
    pub alert: Option<String>,
    pub schools: Vec<String>,
}

impl RegisterTemplate {
    fn blank() -> Self {
        Self {
            values: RegistrationInput::default(),
            errors: FieldErrors::default(),
            alert: None,
            schools: SCHOOLS.iter().map(ToString::to_string).collect(),
        }
    }

    fn with_values(values: RegistrationInput) -> Self {
        Self {
            values,
            ..Self::blank()
        }
    }
}

#[derive(Template)]
#[template(path = "register_done.html")]
pub struct ConfirmationTemplate {
    pub card: IdCardView,
}

pub async fn register_page() -> Html<String> {
    Html(RegisterTemplate::blank().render().unwrap())
}

pub async fn register_submit(
    State(state): State<AppState>,
    Form(input): Form<RegistrationInput>,
) -> Html<String> {
    let template = match registration::submit(state.api.as_ref(), &input).await {
        Ok(SubmitOutcome::Registered(card)) => {
            return Html(ConfirmationTemplate { card }.render().unwrap());
        }
        Ok(SubmitOutcome::AlreadyRegistered { name }) => RegisterTemplate {
            alert: Some(format!("Anda sudah terdaftar dengan nama {name}")),
            ..RegisterTemplate::with_values(input)
        },
        Ok(SubmitOutcome::Invalid(errors)) => RegisterTemplate {
            errors,
            ..RegisterTemplate::with_values(input)
        },
        Err(e) => {
            error!("registration submit failed: {e}");
            RegisterTemplate {
                alert: Some(e.user_message().to_string()),
                ..RegisterTemplate::with_values(input)
            }
        }
    };
    Html(template.render().unwrap())
}

#[derive(Debug, Deserialize)]
pub struct IdCardQuery {
    pub name: String,
    pub school: String,
    pub code: String,
    #[serde(default)]
    pub download: Option<u8>,
}

/// Serve the composed ID card. The confirmation page embeds it inline;
/// with `download=1` it is sent as an attachment named
/// `<name>-idcard.jpg`.
pub async fn idcard_jpeg(Query(query): Query<IdCardQuery>) -> Result<Response, StatusCode> {
    let jpeg = idcard::render_jpeg(&query.name, &query.school, &query.code).map_err(|e| {
        error!("id card render failed for {}: {e}", query.name);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "image/jpeg");
    if query.download == Some(1) {
        builder = builder.header(
            "Content-Disposition",
            format!(
                "attachment; filename=\"{}\"",
                idcard::download_filename(&query.name)
            ),
        );
    }

    Ok(builder.body(axum::body::Body::from(jpeg)).unwrap())
}
