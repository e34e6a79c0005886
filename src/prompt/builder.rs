use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::prompt::templates::{
    Facet, TemplateOption, BACKGROUND_OPTIONS, LIGHTING_OPTIONS, MOOD_OPTIONS, QUALITY_BOOST,
    SUBJECT_OPTIONS,
};

/// Input to the prompt compositor: the user's core idea plus optional
/// template selections. Facet keys that do not resolve in the catalog
/// contribute nothing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequest {
    pub base_prompt: String,
    #[serde(default)]
    pub subject_type: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub lighting: Option<String>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default = "default_true")]
    pub include_quality_boost: bool,
    #[serde(default)]
    pub extra_modifiers: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptPreview {
    pub enhanced_prompt: String,
    pub word_count: usize,
    pub has_all_selections: bool,
}

const MIN_BASE_PROMPT_CHARS: usize = 3;
const MAX_BASE_PROMPT_CHARS: usize = 500;

/// Merges the base prompt with the resolved template selections into one
/// comma-separated prompt string.
///
/// Token order is deliberate prompt engineering and must stay fixed:
/// subject framing, then the user's idea, then setting, lighting, mood,
/// caller-supplied extras, and finally the generic quality tail. The
/// subject contribution is truncated to its first two keywords to keep the
/// opening concise. Duplicate tokens are dropped keeping the first
/// occurrence; matching is exact and case-sensitive.
pub fn build_enhanced_prompt(request: &PromptRequest) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(subject) = resolve(Facet::SubjectType, request.subject_type.as_deref()) {
        parts.extend(subject.keywords.iter().take(2).map(|kw| kw.to_string()));
    }

    let base = request.base_prompt.trim();
    if !base.is_empty() {
        parts.push(base.to_string());
    }

    for (facet, selection) in [
        (Facet::Background, request.background.as_deref()),
        (Facet::Lighting, request.lighting.as_deref()),
        (Facet::Mood, request.mood.as_deref()),
    ] {
        if let Some(option) = resolve(facet, selection) {
            parts.extend(option.keywords.iter().map(|kw| kw.to_string()));
        }
    }

    parts.extend(request.extra_modifiers.iter().cloned());

    if request.include_quality_boost {
        parts.extend(QUALITY_BOOST.iter().map(|kw| kw.to_string()));
    }

    let mut seen = HashSet::with_capacity(parts.len());
    let mut unique = Vec::with_capacity(parts.len());
    for part in parts {
        if part.is_empty() || !seen.insert(part.clone()) {
            continue;
        }
        unique.push(part);
    }

    unique.join(", ")
}

fn resolve(facet: Facet, selection: Option<&str>) -> Option<&'static TemplateOption> {
    facet.lookup(selection?)
}

/// Structural checks on the base prompt. Both length checks run
/// independently so the caller sees every problem at once; `is_valid` is
/// true exactly when `errors` is empty. Lengths are counted in characters.
pub fn validate_prompt_request(request: &PromptRequest) -> PromptValidation {
    let mut errors = Vec::new();

    if request.base_prompt.trim().chars().count() < MIN_BASE_PROMPT_CHARS {
        errors.push(format!(
            "Base prompt must be at least {} characters",
            MIN_BASE_PROMPT_CHARS
        ));
    }

    if request.base_prompt.chars().count() > MAX_BASE_PROMPT_CHARS {
        errors.push(format!(
            "Base prompt is too long (max {} characters)",
            MAX_BASE_PROMPT_CHARS
        ));
    }

    PromptValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Preview of the composed prompt for display before generation.
///
/// `has_all_selections` reports whether every facet field was supplied,
/// regardless of whether the keys resolve in the catalog.
pub fn build_prompt_preview(request: &PromptRequest) -> PromptPreview {
    let enhanced_prompt = build_enhanced_prompt(request);
    let word_count = enhanced_prompt.split_whitespace().count();
    let has_all_selections = !request.base_prompt.is_empty()
        && request.subject_type.is_some()
        && request.background.is_some()
        && request.lighting.is_some()
        && request.mood.is_some();

    PromptPreview {
        enhanced_prompt,
        word_count,
        has_all_selections,
    }
}

/// Display projection of one catalog option for facet pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateInfo {
    pub value: &'static str,
    pub label: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogSnapshot {
    pub subjects: Vec<TemplateInfo>,
    pub backgrounds: Vec<TemplateInfo>,
    pub lighting: Vec<TemplateInfo>,
    pub moods: Vec<TemplateInfo>,
}

/// Flattens the catalog for UI rendering, preserving declaration order.
pub fn catalog_snapshot() -> CatalogSnapshot {
    fn project(options: &'static [TemplateOption]) -> Vec<TemplateInfo> {
        options
            .iter()
            .map(|option| TemplateInfo {
                value: option.key,
                label: option.label,
                emoji: option.glyph,
                description: option.description,
            })
            .collect()
    }

    CatalogSnapshot {
        subjects: project(SUBJECT_OPTIONS),
        backgrounds: project(BACKGROUND_OPTIONS),
        lighting: project(LIGHTING_OPTIONS),
        moods: project(MOOD_OPTIONS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request(base_prompt: impl Into<String>) -> PromptRequest {
        PromptRequest {
            base_prompt: base_prompt.into(),
            subject_type: None,
            background: None,
            lighting: None,
            mood: None,
            include_quality_boost: true,
            extra_modifiers: Vec::new(),
        }
    }

    fn full_request() -> PromptRequest {
        PromptRequest {
            base_prompt: "a cup of coffee".to_string(),
            subject_type: Some("lifestyle".to_string()),
            background: Some("natural_outdoor".to_string()),
            lighting: Some("golden_hour".to_string()),
            mood: Some("bright_airy".to_string()),
            include_quality_boost: true,
            extra_modifiers: Vec::new(),
        }
    }

    fn tokens(prompt: &str) -> Vec<&str> {
        if prompt.is_empty() {
            Vec::new()
        } else {
            prompt.split(", ").collect()
        }
    }

    #[test]
    fn composes_in_the_documented_order_for_a_full_request() {
        let prompt = build_enhanced_prompt(&full_request());

        let mut expected: Vec<&str> = Vec::new();
        let subject = Facet::SubjectType.lookup("lifestyle").unwrap();
        expected.extend(subject.keywords.iter().take(2));
        expected.push("a cup of coffee");
        expected.extend(Facet::Background.lookup("natural_outdoor").unwrap().keywords);
        expected.extend(Facet::Lighting.lookup("golden_hour").unwrap().keywords);
        expected.extend(Facet::Mood.lookup("bright_airy").unwrap().keywords);
        expected.extend(QUALITY_BOOST);

        assert_eq!(prompt, expected.join(", "));
    }

    #[test]
    fn output_of_a_full_request_has_no_duplicate_tokens() {
        let prompt = build_enhanced_prompt(&full_request());
        let parts = tokens(&prompt);
        let unique: HashSet<&str> = parts.iter().copied().collect();
        assert_eq!(parts.len(), unique.len());
    }

    #[test]
    fn repeated_composition_is_byte_identical() {
        let request = full_request();
        assert_eq!(
            build_enhanced_prompt(&request),
            build_enhanced_prompt(&request)
        );
    }

    #[test]
    fn subject_contribution_is_truncated_to_two_keywords() {
        let mut request = base_request("sunlit desk");
        request.subject_type = Some("portrait".to_string());
        request.include_quality_boost = false;

        let prompt = build_enhanced_prompt(&request);
        let parts = tokens(&prompt);
        let portrait = Facet::SubjectType.lookup("portrait").unwrap();

        assert_eq!(parts[0], portrait.keywords[0]);
        assert_eq!(parts[1], portrait.keywords[1]);
        for dropped in &portrait.keywords[2..] {
            assert!(!parts.contains(dropped), "unexpected token {dropped}");
        }
    }

    #[test]
    fn non_subject_facets_contribute_all_keywords_in_declared_order() {
        let mut request = base_request("city street at night");
        request.background = Some("urban_city".to_string());
        request.include_quality_boost = false;

        let prompt = build_enhanced_prompt(&request);
        let parts = tokens(&prompt);
        let background = Facet::Background.lookup("urban_city").unwrap();

        assert_eq!(parts[0], "city street at night");
        assert_eq!(&parts[1..], background.keywords);
    }

    #[test]
    fn duplicate_extra_modifier_keeps_the_first_occurrence() {
        let mut request = base_request("hot tea");
        request.mood = Some("warm_cozy".to_string());
        request.include_quality_boost = false;
        request.extra_modifiers = vec!["cozy mood".to_string(), "macro shot".to_string()];

        let prompt = build_enhanced_prompt(&request);
        let parts = tokens(&prompt);
        let mood = Facet::Mood.lookup("warm_cozy").unwrap();

        assert_eq!(
            parts.iter().filter(|part| **part == "cozy mood").count(),
            1
        );
        // "cozy mood" stays where the mood facet put it, not at the extras slot.
        let mood_start = 1;
        assert_eq!(parts[mood_start + 1], mood.keywords[1]);
        assert_eq!(parts.last(), Some(&"macro shot"));
    }

    #[test]
    fn whitespace_base_prompt_contributes_no_token() {
        let mut request = base_request("   ");
        request.include_quality_boost = true;

        let prompt = build_enhanced_prompt(&request);
        assert_eq!(prompt, QUALITY_BOOST.join(", "));
    }

    #[test]
    fn empty_extra_modifiers_are_dropped() {
        let mut request = base_request("forest path");
        request.include_quality_boost = false;
        request.extra_modifiers = vec!["".to_string(), "misty".to_string()];

        assert_eq!(build_enhanced_prompt(&request), "forest path, misty");
    }

    #[test]
    fn fully_empty_request_yields_an_empty_string() {
        let mut request = base_request("");
        request.include_quality_boost = false;

        assert_eq!(build_enhanced_prompt(&request), "");
    }

    #[test]
    fn unknown_facet_key_behaves_like_an_unset_facet() {
        let mut with_unknown = base_request("red bicycle");
        with_unknown.lighting = Some("candlelight".to_string());
        let unset = base_request("red bicycle");

        assert_eq!(
            build_enhanced_prompt(&with_unknown),
            build_enhanced_prompt(&unset)
        );
    }

    #[test]
    fn quality_boost_can_be_disabled() {
        let mut request = full_request();
        request.include_quality_boost = false;

        let prompt = build_enhanced_prompt(&request);
        for phrase in QUALITY_BOOST {
            assert!(!tokens(&prompt).contains(phrase));
        }
    }

    #[test]
    fn validator_enforces_the_minimum_after_trimming() {
        let request = base_request("  ab  ");
        let validation = validate_prompt_request(&request);
        assert!(!validation.is_valid);
        assert_eq!(validation.errors.len(), 1);
        assert!(validation.errors[0].contains("at least 3 characters"));

        let request = base_request("abc");
        assert!(validate_prompt_request(&request).is_valid);
    }

    #[test]
    fn validator_enforces_the_maximum_on_the_raw_prompt() {
        let request = base_request("a".repeat(500));
        assert!(validate_prompt_request(&request).is_valid);

        let request = base_request("a".repeat(501));
        let validation = validate_prompt_request(&request);
        assert!(!validation.is_valid);
        assert_eq!(validation.errors.len(), 1);
        assert!(validation.errors[0].contains("too long"));
    }

    #[test]
    fn validator_counts_characters_not_bytes() {
        let request = base_request("日".repeat(500));
        assert!(validate_prompt_request(&request).is_valid);

        let request = base_request("日".repeat(501));
        assert!(!validate_prompt_request(&request).is_valid);
    }

    #[test]
    fn validator_reports_both_errors_together() {
        // 501 spaces: trims to nothing and still exceeds the raw maximum.
        let request = base_request(" ".repeat(501));
        let validation = validate_prompt_request(&request);
        assert!(!validation.is_valid);
        assert_eq!(validation.errors.len(), 2);
    }

    #[test]
    fn preview_counts_words_across_whitespace_runs() {
        let mut request = base_request("a cup  of\tcoffee");
        request.include_quality_boost = false;

        let preview = build_prompt_preview(&request);
        assert_eq!(preview.enhanced_prompt, "a cup  of\tcoffee");
        assert_eq!(preview.word_count, 4);
    }

    #[test]
    fn preview_flags_full_specification_by_presence_not_resolution() {
        let mut request = full_request();
        request.mood = Some("not_a_real_mood".to_string());
        assert!(build_prompt_preview(&request).has_all_selections);

        request.mood = None;
        assert!(!build_prompt_preview(&request).has_all_selections);

        let mut request = full_request();
        request.base_prompt = String::new();
        assert!(!build_prompt_preview(&request).has_all_selections);
    }

    #[test]
    fn catalog_snapshot_is_stable_and_ordered() {
        let first = catalog_snapshot();
        let second = catalog_snapshot();
        assert_eq!(first, second);

        let subject_keys: Vec<&str> = first.subjects.iter().map(|info| info.value).collect();
        let declared: Vec<&str> = SUBJECT_OPTIONS.iter().map(|option| option.key).collect();
        assert_eq!(subject_keys, declared);
    }
}
