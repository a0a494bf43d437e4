//! Request module - what the user asked the pipeline to do

use serde::{Deserialize, Serialize};

/// Pipeline mode for one extraction
///
/// The two user-facing toggles are independent booleans, but exactly one
/// mode runs per request:
/// - Standard: one extraction call
/// - Questionnaire: extraction, then a rewrite pass over the HDA field
/// - Mixed: one extraction call with the narrative-plus-questionnaire prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineMode {
    /// Plain narrative input
    #[default]
    Standard,

    /// Questionnaire-style input; the HDA gets a second condensation pass
    Questionnaire,

    /// Narrative plus completed questionnaire, handled in a single pass
    Mixed,
}

impl PipelineMode {
    /// Resolve the two toggles into one mode with the default precedence
    /// (mixed, then questionnaire, then standard).
    pub fn from_flags(questionnaire: bool, mixed: bool) -> Self {
        ModePrecedence::default().resolve(questionnaire, mixed)
    }

    /// Get the mode name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineMode::Standard => "standard",
            PipelineMode::Questionnaire => "questionnaire",
            PipelineMode::Mixed => "mixed",
        }
    }

    /// Whether this mode runs the HDA rewrite pass
    pub fn rewrites_history(&self) -> bool {
        matches!(self, PipelineMode::Questionnaire)
    }
}

impl std::fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PipelineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(PipelineMode::Standard),
            "questionnaire" => Ok(PipelineMode::Questionnaire),
            "mixed" => Ok(PipelineMode::Mixed),
            _ => Err(format!("Invalid pipeline mode: {}", s)),
        }
    }
}

/// Which mode wins when both toggles are on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModePrecedence {
    /// Mixed wins: one combined pass, no rewrite
    #[default]
    Mixed,

    /// Questionnaire wins: extraction plus the HDA rewrite pass
    Questionnaire,
}

impl ModePrecedence {
    /// Resolve the two toggles into exactly one mode
    pub fn resolve(self, questionnaire: bool, mixed: bool) -> PipelineMode {
        match (questionnaire, mixed, self) {
            (true, true, ModePrecedence::Mixed) => PipelineMode::Mixed,
            (true, true, ModePrecedence::Questionnaire) => PipelineMode::Questionnaire,
            (_, true, _) => PipelineMode::Mixed,
            (true, _, _) => PipelineMode::Questionnaire,
            _ => PipelineMode::Standard,
        }
    }
}

/// Raw input plus the two mode toggles, held for one user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    /// Free-text patient history as pasted by the clinician
    pub text: String,

    /// Input is questionnaire-style
    pub questionnaire: bool,

    /// Input mixes narrative with questionnaire answers
    pub mixed: bool,
}

impl ExtractionRequest {
    /// Create a standard request for the given text
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            questionnaire: false,
            mixed: false,
        }
    }

    /// Set the questionnaire toggle
    pub fn with_questionnaire(mut self, questionnaire: bool) -> Self {
        self.questionnaire = questionnaire;
        self
    }

    /// Set the mixed-input toggle
    pub fn with_mixed(mut self, mixed: bool) -> Self {
        self.mixed = mixed;
        self
    }

    /// The single mode this request runs in, with the default precedence
    pub fn mode(&self) -> PipelineMode {
        self.mode_with(ModePrecedence::default())
    }

    /// The single mode this request runs in under `precedence`
    pub fn mode_with(&self, precedence: ModePrecedence) -> PipelineMode {
        precedence.resolve(self.questionnaire, self.mixed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_questionnaire_precedence() {
        let both = ExtractionRequest::new("x")
            .with_questionnaire(true)
            .with_mixed(true);
        assert_eq!(both.mode_with(ModePrecedence::Questionnaire), PipelineMode::Questionnaire);
        assert_eq!(both.mode_with(ModePrecedence::Mixed), PipelineMode::Mixed);

        let mixed_only = ExtractionRequest::new("x").with_mixed(true);
        assert_eq!(mixed_only.mode_with(ModePrecedence::Questionnaire), PipelineMode::Mixed);
        assert_eq!(
            ExtractionRequest::new("x").mode_with(ModePrecedence::Questionnaire),
            PipelineMode::Standard
        );
    }

    #[test]
    fn test_mode_from_flags() {
        assert_eq!(PipelineMode::from_flags(false, false), PipelineMode::Standard);
        assert_eq!(PipelineMode::from_flags(true, false), PipelineMode::Questionnaire);
        assert_eq!(PipelineMode::from_flags(false, true), PipelineMode::Mixed);
    }

    #[test]
    fn test_mixed_wins_over_questionnaire() {
        let request = ExtractionRequest::new("texto")
            .with_questionnaire(true)
            .with_mixed(true);
        assert_eq!(request.mode(), PipelineMode::Mixed);
        assert!(!request.mode().rewrites_history());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Mixed".parse::<PipelineMode>(), Ok(PipelineMode::Mixed));
        assert_eq!("standard".parse::<PipelineMode>(), Ok(PipelineMode::Standard));
        assert!("both".parse::<PipelineMode>().is_err());
    }

    #[test]
    fn test_only_questionnaire_rewrites() {
        assert!(PipelineMode::Questionnaire.rewrites_history());
        assert!(!PipelineMode::Standard.rewrites_history());
        assert!(!PipelineMode::Mixed.rewrites_history());
    }
}
