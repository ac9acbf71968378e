use serde::Serialize;
use utoipa::ToSchema;

/// Models offered on the general completion pages.
pub const COMPLETION_MODELS: &[&str] = &[
    "claude-3-5-sonnet",
    "snowflake-arctic",
    "llama4-maverick",
    "llama4-scout",
    "deepseek-r1",
    "mistral-large",
    "mistral-large2",
    "reka-flash",
    "reka-core",
    "jamba-instruct",
    "jamba-1.5-mini",
    "jamba-1.5-large",
    "mixtral-8x7b",
    "llama2-70b-chat",
    "llama3-8b",
    "llama3-70b",
    "llama3.1-8b",
    "llama3.1-70b",
    "llama3.1-405b",
    "llama3.2-1b",
    "llama3.2-3b",
    "mistral-7b",
    "gemma-7b",
];

/// Models that accept a staged file next to the instruction.
pub const MULTIMODAL_MODELS: &[&str] = &["claude-3-5-sonnet", "pixtral-large"];

pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("English", "en"),
    ("French", "fr"),
    ("German", "de"),
    ("Italian", "it"),
    ("Japanese", "ja"),
    ("Korean", "ko"),
    ("Polish", "pl"),
    ("Portuguese", "pt"),
    ("Russian", "ru"),
    ("Spanish", "es"),
    ("Swedish", "sv"),
];

pub const CLASSIFY_CATEGORIES: &[&str] = &["Refund", "Exchange", "No Category"];

pub const DEFAULT_IMAGE_PROMPT: &str = "Please provide a concise description of this image.";

/// Resolves a language given either by display name or by code.
pub fn language_code(language: &str) -> Option<&'static str> {
    let language = language.trim();
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(name, code)| name.eq_ignore_ascii_case(language) || code.eq_ignore_ascii_case(language))
        .map(|(_, code)| *code)
}

/// One page of the app, and the inference capability behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Translate,
    Sentiment,
    Summarize,
    NextBestAction,
    Classify,
    GenerateEmail,
    AskQuestion,
    CodeConversion,
    ImageAnalysis,
    AudioTranscription,
}

impl Capability {
    pub const ALL: [Capability; 10] = [
        Capability::Translate,
        Capability::Sentiment,
        Capability::Summarize,
        Capability::NextBestAction,
        Capability::Classify,
        Capability::GenerateEmail,
        Capability::AskQuestion,
        Capability::CodeConversion,
        Capability::ImageAnalysis,
        Capability::AudioTranscription,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Capability::Translate => "translate",
            Capability::Sentiment => "sentiment",
            Capability::Summarize => "summarize",
            Capability::NextBestAction => "next-best-action",
            Capability::Classify => "classify",
            Capability::GenerateEmail => "generate-email",
            Capability::AskQuestion => "ask-question",
            Capability::CodeConversion => "code-conversion",
            Capability::ImageAnalysis => "image-analysis",
            Capability::AudioTranscription => "audio-transcription",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.slug() == slug)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Capability::Translate => "Translation",
            Capability::Sentiment => "Sentiment Analysis",
            Capability::Summarize => "Summarize",
            Capability::NextBestAction => "Next Best Action",
            Capability::Classify => "Classify",
            Capability::GenerateEmail => "Generate E-Mail",
            Capability::AskQuestion => "Ask a Question",
            Capability::CodeConversion => "Code Conversion",
            Capability::ImageAnalysis => "Multi-Modal Image Analysis",
            Capability::AudioTranscription => "Audio Transcription",
        }
    }

    /// Allow-list for the model selector; empty for fixed-function pages.
    pub fn models(&self) -> &'static [&'static str] {
        match self {
            Capability::NextBestAction
            | Capability::GenerateEmail
            | Capability::AskQuestion
            | Capability::CodeConversion => COMPLETION_MODELS,
            Capability::ImageAnalysis => MULTIMODAL_MODELS,
            _ => &[],
        }
    }

    /// Freeform completion pages, reachable through `/complete/{slug}`.
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            Capability::NextBestAction
                | Capability::GenerateEmail
                | Capability::AskQuestion
                | Capability::CodeConversion
        )
    }

    /// Pages that work on a staged file rather than on typed text.
    pub fn uses_stage(&self) -> bool {
        matches!(
            self,
            Capability::ImageAnalysis | Capability::AudioTranscription
        )
    }

    pub fn default_instruction(&self) -> Option<&'static str> {
        match self {
            Capability::NextBestAction => {
                Some("Based on these data, please provide the next best action")
            }
            Capability::GenerateEmail => Some(
                "Please create an email for me that describes the issue in detail and provides a solution. \
                 Make the e-mail from me, the Director of Customer Relations at Ski Gear Co, and also give \
                 the customer a 10% discount with code: CS10OFF",
            ),
            Capability::CodeConversion => Some(
                "Please convert this code for use in Snowflake SQL and validate that it will run in Snowflake:",
            ),
            Capability::ImageAnalysis => Some(DEFAULT_IMAGE_PROMPT),
            _ => None,
        }
    }
}
