use crate::AppState;
use crate::api::error::AppError;
use crate::config::AppConfig;
use crate::services::catalog::{CLASSIFY_CATEGORIES, Capability, SUPPORTED_LANGUAGES};
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct Language {
    pub name: String,
    pub code: String,
}

#[derive(Serialize, ToSchema)]
pub struct PageDescriptor {
    pub slug: String,
    pub title: String,
    pub capability: Capability,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_instruction: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<Language>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Stage files are uploaded to, for pages working on staged files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl PageDescriptor {
    pub fn for_config(capability: Capability, config: &AppConfig) -> Self {
        let mut page = Self::from(capability);
        if capability.uses_stage() {
            page.stage = Some(config.default_stage.clone());
        }
        page
    }
}

impl From<Capability> for PageDescriptor {
    fn from(capability: Capability) -> Self {
        let languages = match capability {
            Capability::Translate => SUPPORTED_LANGUAGES
                .iter()
                .map(|(name, code)| Language {
                    name: name.to_string(),
                    code: code.to_string(),
                })
                .collect(),
            _ => Vec::new(),
        };
        let categories = match capability {
            Capability::Classify => CLASSIFY_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            _ => Vec::new(),
        };

        Self {
            slug: capability.slug().to_string(),
            title: capability.title().to_string(),
            capability,
            models: capability.models().iter().map(|m| m.to_string()).collect(),
            default_instruction: capability.default_instruction().map(str::to_string),
            languages,
            categories,
            stage: None,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct WelcomeResponse {
    pub title: String,
    pub pages: Vec<PageDescriptor>,
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Welcome page and page selector", body = WelcomeResponse)
    ),
    tag = "pages"
)]
pub async fn index(State(state): State<AppState>) -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        title: "Welcome to Your New Generative AI Tools App!".to_string(),
        pages: Capability::ALL
            .into_iter()
            .map(|c| PageDescriptor::for_config(c, &state.config))
            .collect(),
    })
}

#[utoipa::path(
    get,
    path = "/pages/{slug}",
    params(
        ("slug" = String, Path, description = "Page slug, e.g. ask-question")
    ),
    responses(
        (status = 200, description = "Page descriptor", body = PageDescriptor),
        (status = 404, description = "Unknown page")
    ),
    tag = "pages"
)]
pub async fn get_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PageDescriptor>, AppError> {
    let capability = Capability::from_slug(&slug)
        .ok_or_else(|| AppError::NotFound(format!("Page '{}' not found", slug)))?;
    Ok(Json(PageDescriptor::for_config(capability, &state.config)))
}
