use utoipa::openapi::{Contact, InfoBuilder, Tag};
use utoipa::OpenApi;

use super::handlers::{auth, categories, expenses, health, projects, report, trips};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::login::login,
        auth::register::register,
        auth::session::session,
        auth::session::logout,
        report::report,
        trips::list_trips,
        expenses::list_expenses,
        expenses::create_expense,
        projects::list_projects,
        categories::list_categories,
    ),
    components(schemas(
        health::Health,
        auth::principal::Identity,
        auth::types::LoginRequest,
        auth::types::LoginResponse,
        auth::types::RegisterRequest,
        auth::types::RegisterResponse,
        report::ReportResponse,
        report::stats::Stats,
        report::stats::CategoryGroup,
        report::stats::TripGroup,
        report::stats::StatusGroup,
        report::stats::ProjectGroup,
        trips::TrasfertaResponse,
        expenses::SpesaResponse,
        expenses::NewSpesaRequest,
        expenses::NewSpesaResponse,
        projects::ProgettoResponse,
        categories::CategoriaResponse,
    ))
)]
struct ApiDoc;

/// Build the OpenAPI spec with info taken from Cargo.toml metadata.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut spec = ApiDoc::openapi();

    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();
    info.contact = cargo_contact();
    spec.info = info;

    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Login, registration and session endpoints".to_string());

    let mut report_tag = Tag::new("report");
    report_tag.description = Some("Aggregated expense reporting".to_string());

    spec.tags = Some(vec![auth_tag, report_tag]);

    spec
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let mut contact = Contact::new();
    if let Some(start) = primary.find('<') {
        let name = primary[..start].trim();
        let email = primary[start + 1..].trim_end_matches('>').trim();
        contact.name = (!name.is_empty()).then(|| name.to_string());
        contact.email = (!email.is_empty()).then(|| email.to_string());
    } else {
        contact.name = Some(primary.to_string());
    }
    Some(contact)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
