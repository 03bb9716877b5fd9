//! Known-bad completions and what the recovery cascade makes of them.

use pretty_assertions::assert_eq;
use serde_json::json;
use vibe_tars::brief::{GenerationResult, TerritoryExpansion};
use vibe_tars::recover::{recover, recover_as, shape, Stage};
use vibe_tars::VibeError;

#[test]
fn chatty_preamble_and_signoff() {
    let text = "Sure! {\"Approach\": {\"vibes\": [\"bold\"], \"intent\": \"Own the night.\"}} Let me know if you need more.";
    let r = recover(text).unwrap();
    assert_eq!(r.stage, Stage::Extracted);
    let g: GenerationResult = shape(json!(r.value)).unwrap();
    assert_eq!(g.approach.intent, "Own the night.");
    assert!(!g.has_territories());
}

#[test]
fn markdown_fence_with_language_tag() {
    let text = "```json\n{\n  \"Brainstorm\": {\"workthrough\": \"Paragraph one.\"}\n}\n```\n";
    let g: GenerationResult = recover_as(text).unwrap();
    assert_eq!(g.brainstorm.workthrough, "Paragraph one.");
}

#[test]
fn raw_line_breaks_inside_the_workthrough() {
    let text = "{\"Brainstorm\": {\"workthrough\": \"Start with the archive.\n\nThen break it.\"}}";
    let r = recover(text).unwrap();
    assert_eq!(r.stage, Stage::Sanitized);
    let g: GenerationResult = shape(json!(r.value)).unwrap();
    assert_eq!(g.brainstorm.workthrough, "Start with the archive.Then break it.");
}

#[test]
fn raw_tab_and_accented_text() {
    let text = "{\"Approach\": {\"intent\": \"Caf\u{e9}\tculture\", \"vibes\": []}}";
    let g: GenerationResult = recover_as(text).unwrap();
    assert_eq!(g.approach.intent, "Cafculture");
}

#[test]
fn typographic_quotes_throughout() {
    let text = "{\u{201C}Approach\u{201D}: {\u{201C}intent\u{201D}: \u{201C}Quiet confidence\u{201D}}}";
    let r = recover(text).unwrap();
    assert_eq!(r.stage, Stage::QuotesNormalized);
    let g: GenerationResult = shape(json!(r.value)).unwrap();
    assert_eq!(g.approach.intent, "Quiet confidence");
}

#[test]
fn wrapped_expansion_with_trailing_note() {
    let text = "{\"territory_expansion\": {\"activation_opportunities\": {\"key_moments\": [\"drop day\"]}}}\n\nNote: adjust as needed.";
    let r = recover(text).unwrap();
    let e: TerritoryExpansion = shape(TerritoryExpansion::unwrap_envelope(json!(r.value))).unwrap();
    assert_eq!(e.activation_opportunities.key_moments, vec!["drop day"]);
}

#[test]
fn refusal_is_never_turned_into_an_object() {
    for text in [
        "I'm sorry, but I can't help with that.",
        "",
        "   ",
        "{",
        "}{",
        "{\"Approach\": {\"intent\": \"cut off mid",
    ] {
        match recover(text) {
            Err(VibeError::FormatRecovery(msg)) => assert!(msg.contains("simpler")),
            other => panic!("{text:?} gave {other:?}"),
        }
    }
}

#[test]
fn wrong_field_types_are_a_shape_mismatch() {
    let err = recover_as::<GenerationResult>("{\"Creative_Territories\": \"none\"}").unwrap_err();
    assert!(matches!(err, VibeError::ShapeMismatch(_)));
}
