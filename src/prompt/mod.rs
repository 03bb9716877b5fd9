use crate::brief::{CreativeBrief, OriginalContext, Territory, UserContext};
use crate::provider::ProviderKind;
use crate::wire::Instruction;

const JSON_ONLY: &str = "Return ONLY valid JSON, no additional text.";

fn role() -> &'static str {
r#"You are a strategic thought partner to experienced heads of marketing and design. Your goal is to guide creative brainstorming that will eventually lead to campaign directions, in a natural, exploratory way. Anchor the thinking for the creative team to build upon with their own ideas, and lend your expertise on *how* to approach the brief. Give high-level rationale for any direction you guide towards."#
}

fn style_guidance() -> &'static str {
r#"Style and content guidance:
- Approach: describe YOUR approach to brainstorming around the opportunity, not a suggested direction. Professional but casual, direct with strategic nuance, no marketing jargon. Highlight specific insights about the product or brand that frame how we break down the problem, and dig below the surface for what makes the end result stand out.
- Brainstorm: a natural, thoughtful exploration that builds connected ideas. Start by breaking down the situation and its core elements before any specific direction. Avoid generic contrasts, call out common pitfalls, and push for surprising, fresh, high-impact ideas that produce highly shareable digital moments. Pose at least one rhetorical question and highlight at least one tradeoff. Use paragraph breaks for flow.
- Creative Territories: detailed but leaving room for interpretation. Provide 2-3 territories, each with a distinct name, and end each with thought-provoking questions that take the team a step further."#
}

fn generation_schema() -> &'static str {
r#"Required response format:
{
  "Approach": {
    "vibes": ["vibe1", "vibe2", "vibe3"],
    "intent": "3-4 concise, professional sentences identifying key insights and opportunities."
  },
  "Brainstorm": {
    "workthrough": "3-4 paragraphs exploring connected creative possibilities, separated by \n\n."
  },
  "Creative_Territories": [
    {
      "territory": "Unique name for this direction",
      "Mood & Tone": "Emotional landscape and feel",
      "Unique_Angles": ["Cultural relevance, timely trends, or differentiators"],
      "Key_Questions": ["Thought-provoking questions that set this direction apart"]
    }
  ]
}"#
}

fn expansion_schema() -> &'static str {
r#"{
  "territory_expansion": {
    "visual_world": {
      "aesthetics": ["Key visual elements or principles"],
      "inspiration": ["Reference points or examples"],
      "signature_elements": ["Unique visual identifiers"]
    },
    "narrative_angles": {
      "key_stories": ["Potential narrative threads"],
      "messaging_themes": ["Core messages to explore"],
      "tone_guidance": "How to capture the voice"
    },
    "activation_opportunities": {
      "key_moments": ["Specific campaign moments"],
      "platform_ideas": ["Platform-specific opportunities"],
      "engagement_hooks": ["Ways to drive participation"]
    },
    "evolution_questions": ["Additional questions for further exploration"]
  }
}"#
}

fn brief_inputs(brief: &CreativeBrief) -> String {
    let mut s = format!(
        "Product: {}\nDirection: {}\nVibes: {}\n",
        brief.product,
        brief.direction,
        brief.vibes_joined()
    );
    if let Some(audience) = &brief.target_audience {
        s.push_str(&format!("Target Audience: {audience}\n"));
    }
    s
}

/// Claude receives everything as one user message; OpenAI gets the role,
/// schema and guidance as a system message and the inputs as the user turn.
pub fn generation_prompt(kind: ProviderKind, brief: &CreativeBrief) -> Instruction {
    match kind {
        ProviderKind::Claude => Instruction::user(format!(
"{role} Generate high-level thinking and guide towards creative directions matching the following format exactly. {json_only}

Input:
{inputs}
{schema}

{style}

Remember: {json_only}",
            role = role(),
            json_only = JSON_ONLY,
            inputs = brief_inputs(brief),
            schema = generation_schema(),
            style = style_guidance(),
        )),
        ProviderKind::OpenAi => Instruction::with_system(
            format!(
"{role} This is an API integration that relies on the response shape, so any deviation will break it. {json_only}

{schema}

{style}",
                role = role(),
                json_only = JSON_ONLY,
                schema = generation_schema(),
                style = style_guidance(),
            ),
            brief_inputs(brief).trim_end().to_string(),
        ),
    }
}

fn context_lines(ctx: &UserContext) -> String {
    let mut lines = Vec::new();
    if let Some(focus) = &ctx.focus_area {
        lines.push(format!("Focus Area: {focus}"));
    }
    if let Some(channel) = &ctx.primary_channel {
        lines.push(format!("Primary Channel: {}", channel.as_str()));
    }
    if let Some(audience) = &ctx.target_audience {
        lines.push(format!("Target Audience: {audience}"));
    }
    lines.join("\n")
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    items.iter().map(|i| format!("- {i}")).collect::<Vec<_>>().join("\n")
}

pub fn expansion_prompt(
    territory: &Territory,
    original: &OriginalContext,
    ctx: &UserContext,
    is_update: bool,
) -> Instruction {
    let intent = original
        .approach
        .as_ref()
        .map(|a| a.intent.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("(not provided)");

    let mut sections = vec![
        format!("Given this creative territory for {}:", original.product),
        format!(
            "Territory: {}\nMood & Tone: {}\nUnique Angles:\n{}",
            territory.name,
            territory.mood_and_tone,
            bullet_list(&territory.unique_angles)
        ),
        format!(
            "Original Direction: {}\nOriginal Intent: {}\nOriginal Vibes: {}",
            original.direction,
            intent,
            original.vibes.join(", ")
        ),
    ];

    let ctx_block = context_lines(ctx);
    if !ctx_block.is_empty() {
        sections.push(ctx_block);
    }
    if is_update {
        sections.push(
            "This territory was already expanded. Re-angle the whole expansion around the context above rather than repeating the previous version."
                .to_string(),
        );
    }
    sections.push(format!(
        "Provide a detailed expansion of this territory in exactly this JSON format ({JSON_ONLY}):\n\n{}",
        expansion_schema()
    ));

    Instruction::user(sections.join("\n\n"))
}
