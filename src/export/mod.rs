use std::fmt::Write as _;

use crate::brief::{CreativeBrief, GenerationResult, OriginalContext, Territory, TerritoryExpansion, UserContext};

/// `Neon  Nostalgia` -> `neon-nostalgia-expansion.md`
pub fn export_file_name(territory: &Territory) -> String {
    let slug = territory
        .name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    format!("{slug}-expansion.md")
}

fn section(out: &mut String, heading: &str, items: &[String]) {
    let _ = writeln!(out, "### {heading}");
    for item in items {
        let _ = writeln!(out, "- {item}");
    }
    out.push('\n');
}

pub fn expansion_markdown(
    territory: &Territory,
    expansion: &TerritoryExpansion,
    ctx: &UserContext,
    original: &OriginalContext,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {} - Expansion\n", territory.name);

    if !ctx.is_empty() {
        out.push_str("## Context\n");
        if let Some(focus) = &ctx.focus_area {
            let _ = writeln!(out, "- Focus Area: {focus}");
        }
        if let Some(channel) = &ctx.primary_channel {
            let _ = writeln!(out, "- Primary Channel: {}", channel.as_str());
        }
        if let Some(audience) = &ctx.target_audience {
            let _ = writeln!(out, "- Target Audience: {audience}");
        }
        out.push('\n');
    }

    out.push_str("## Original Brief\n");
    let _ = writeln!(out, "- Product: {}", original.product);
    let _ = writeln!(out, "- Direction: {}", original.direction);
    let _ = writeln!(out, "- Vibes: {}\n", original.vibes.join(", "));

    let vw = &expansion.visual_world;
    out.push_str("## Visual World\n\n");
    section(&mut out, "Aesthetics", &vw.aesthetics);
    section(&mut out, "Inspiration", &vw.inspiration);
    section(&mut out, "Signature Elements", &vw.signature_elements);

    let na = &expansion.narrative_angles;
    out.push_str("## Narrative Angles\n\n");
    section(&mut out, "Key Stories", &na.key_stories);
    section(&mut out, "Messaging Themes", &na.messaging_themes);
    let _ = writeln!(out, "### Tone Guidance\n{}\n", na.tone_guidance);

    let ao = &expansion.activation_opportunities;
    out.push_str("## Activation Opportunities\n\n");
    section(&mut out, "Key Moments", &ao.key_moments);
    section(&mut out, "Platform Ideas", &ao.platform_ideas);
    section(&mut out, "Engagement Hooks", &ao.engagement_hooks);

    out.push_str("## Evolution Questions\n");
    for q in &expansion.evolution_questions {
        let _ = writeln!(out, "- {q}");
    }
    out
}

pub fn generation_markdown(brief: &CreativeBrief, result: &GenerationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {} - {}\n", brief.product, brief.direction);

    out.push_str("## Approach\n");
    let _ = writeln!(out, "Vibes: {}\n", result.approach.vibes.join(", "));
    let _ = writeln!(out, "{}\n", result.approach.intent);

    out.push_str("## Brainstorm\n");
    let _ = writeln!(out, "{}\n", result.brainstorm.workthrough);

    out.push_str("## Creative Territories\n\n");
    if !result.has_territories() {
        out.push_str("_No territories were returned._\n");
    }
    for t in &result.territories {
        let _ = writeln!(out, "### {}\n", t.name);
        let _ = writeln!(out, "**Mood & Tone:** {}\n", t.mood_and_tone);
        out.push_str("**Unique Angles**\n");
        for a in &t.unique_angles {
            let _ = writeln!(out, "- {a}");
        }
        out.push_str("\n**Key Questions**\n");
        for q in &t.key_questions {
            let _ = writeln!(out, "- {q}");
        }
        out.push('\n');
    }
    out
}
