use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{VibeError, VibeResult};

/// ========================================
/// Creative brief and generated structures
/// ========================================

/// Normalized user input. Built once from form state and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreativeBrief {
    pub product: String,
    pub direction: String,
    pub vibes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
}

impl CreativeBrief {
    pub fn new<I, S>(
        product: &str,
        direction: &str,
        vibes: I,
        target_audience: Option<&str>,
    ) -> VibeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let product = product.trim();
        let direction = direction.trim();
        if product.is_empty() {
            return Err(VibeError::InvalidInput("product is required".into()));
        }
        if direction.is_empty() {
            return Err(VibeError::InvalidInput("direction is required".into()));
        }
        Ok(Self {
            product: product.to_string(),
            direction: direction.to_string(),
            vibes: normalize_vibes(vibes),
            target_audience: non_empty(target_audience),
        })
    }

    pub fn vibes_joined(&self) -> String {
        self.vibes.join(", ")
    }
}

/// Trim, lower-case, drop empties and de-duplicate, keeping first-seen order.
pub fn normalize_vibes<I, S>(vibes: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for v in vibes {
        let v = v.as_ref().trim().to_lowercase();
        if !v.is_empty() && !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

/// The comma-joined form used over HTTP.
pub fn parse_vibes(joined: &str) -> Vec<String> {
    normalize_vibes(joined.split(','))
}

pub(crate) fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approach {
    #[serde(default, deserialize_with = "lenient_list")]
    pub vibes: Vec<String>,
    #[serde(default)]
    pub intent: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brainstorm {
    #[serde(default, deserialize_with = "lenient_text")]
    pub workthrough: String,
}

/// A named creative direction. `name` keys the expansion cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Territory {
    #[serde(default, alias = "territory")]
    pub name: String,
    #[serde(default, alias = "Mood & Tone", alias = "mood_and_tone")]
    pub mood_and_tone: String,
    #[serde(default, alias = "Unique_Angles", alias = "unique_angles", deserialize_with = "lenient_list")]
    pub unique_angles: Vec<String>,
    #[serde(default, alias = "Key_Questions", alias = "key_questions", deserialize_with = "lenient_list")]
    pub key_questions: Vec<String>,
}

/// Missing keys decode to empty values; callers treat those as an empty
/// display state rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    #[serde(default, alias = "Approach")]
    pub approach: Approach,
    #[serde(default, alias = "Brainstorm")]
    pub brainstorm: Brainstorm,
    #[serde(default, alias = "Creative_Territories", alias = "creative_territories")]
    pub territories: Vec<Territory>,
}

impl GenerationResult {
    pub fn has_territories(&self) -> bool {
        !self.territories.is_empty()
    }

    /// Names appearing more than once. The cache assumes there are none.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        let mut dups: Vec<&str> = Vec::new();
        for t in &self.territories {
            if seen.contains(&t.name.as_str()) {
                if !dups.contains(&t.name.as_str()) {
                    dups.push(&t.name);
                }
            } else {
                seen.push(&t.name);
            }
        }
        dups
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Social,
    Digital,
    Experiential,
    Integrated,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Social => "Social",
            Channel::Digital => "Digital",
            Channel::Experiential => "Experiential",
            Channel::Integrated => "Integrated",
        }
    }
}

impl std::str::FromStr for Channel {
    type Err = VibeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "social" => Ok(Channel::Social),
            "digital" => Ok(Channel::Digital),
            "experiential" => Ok(Channel::Experiential),
            "integrated" => Ok(Channel::Integrated),
            other => Err(VibeError::InvalidInput(format!("unknown channel '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub focus_area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "blank_channel_as_none")]
    pub primary_channel: Option<Channel>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub target_audience: Option<String>,
}

impl UserContext {
    pub fn is_empty(&self) -> bool {
        self.focus_area.is_none() && self.primary_channel.is_none() && self.target_audience.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualWorld {
    #[serde(default, deserialize_with = "lenient_list")]
    pub aesthetics: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub inspiration: Vec<String>,
    #[serde(default, alias = "signature_elements", deserialize_with = "lenient_list")]
    pub signature_elements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeAngles {
    #[serde(default, alias = "key_stories", deserialize_with = "lenient_list")]
    pub key_stories: Vec<String>,
    #[serde(default, alias = "messaging_themes", deserialize_with = "lenient_list")]
    pub messaging_themes: Vec<String>,
    #[serde(default, alias = "tone_guidance", deserialize_with = "lenient_text")]
    pub tone_guidance: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationOpportunities {
    #[serde(default, alias = "key_moments", deserialize_with = "lenient_list")]
    pub key_moments: Vec<String>,
    #[serde(default, alias = "platform_ideas", deserialize_with = "lenient_list")]
    pub platform_ideas: Vec<String>,
    #[serde(default, alias = "engagement_hooks", deserialize_with = "lenient_list")]
    pub engagement_hooks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerritoryExpansion {
    #[serde(default, alias = "visual_world")]
    pub visual_world: VisualWorld,
    #[serde(default, alias = "narrative_angles")]
    pub narrative_angles: NarrativeAngles,
    #[serde(default, alias = "activation_opportunities")]
    pub activation_opportunities: ActivationOpportunities,
    #[serde(default, alias = "evolution_questions", deserialize_with = "lenient_list")]
    pub evolution_questions: Vec<String>,
}

impl TerritoryExpansion {
    /// The expansion prompt asks for `{"territory_expansion": {...}}`; models
    /// sometimes drop the wrapper, so both forms are accepted.
    pub fn unwrap_envelope(value: serde_json::Value) -> serde_json::Value {
        match value {
            serde_json::Value::Object(mut map) => {
                let key = ["territory_expansion", "territoryExpansion", "expansion"]
                    .into_iter()
                    .find(|k| map.get(*k).is_some_and(|v| v.is_object()));
                match key {
                    Some(k) => map.remove(k).unwrap_or_default(),
                    None => serde_json::Value::Object(map),
                }
            }
            other => other,
        }
    }
}

/// Brief plus the parts of the generation an expansion builds on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalContext {
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub direction: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub vibes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approach: Option<Approach>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brainstorm: Option<Brainstorm>,
}

impl OriginalContext {
    pub fn from_generation(brief: &CreativeBrief, result: &GenerationResult) -> Self {
        Self {
            product: brief.product.clone(),
            direction: brief.direction.clone(),
            vibes: brief.vibes.clone(),
            approach: Some(result.approach.clone()),
            brainstorm: Some(result.brainstorm.clone()),
        }
    }
}

/// Accepts a list of strings, a single string (split on commas), or null.
fn lenient_list<'de, D>(de: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrText {
        List(Vec<String>),
        Text(String),
    }
    Ok(match Option::<ListOrText>::deserialize(de)? {
        None => Vec::new(),
        Some(ListOrText::List(v)) => v,
        Some(ListOrText::Text(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

/// Accepts a string, a list of paragraphs (joined with blank lines), or null.
fn lenient_text<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrList {
        Text(String),
        List(Vec<String>),
    }
    Ok(match Option::<TextOrList>::deserialize(de)? {
        None => String::new(),
        Some(TextOrList::Text(s)) => s,
        Some(TextOrList::List(v)) => v.join("\n\n"),
    })
}

fn blank_as_none<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(de)?;
    Ok(non_empty(raw.as_deref()))
}

fn blank_channel_as_none<'de, D>(de: D) -> Result<Option<Channel>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(de)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn vibes_are_trimmed_lowercased_and_deduplicated() {
        let brief = CreativeBrief::new(
            " Sneakers ",
            "launch",
            [" Bold", "retro", "BOLD", "", "  "],
            Some("  "),
        )
        .unwrap();
        assert_eq!(brief.product, "Sneakers");
        assert_eq!(brief.vibes, vec!["bold", "retro"]);
        assert_eq!(brief.target_audience, None);
    }

    #[test]
    fn comma_joined_vibes_are_split() {
        assert_eq!(parse_vibes("bold, retro,,Retro ,playful"), vec!["bold", "retro", "playful"]);
    }

    #[test]
    fn missing_product_is_invalid_input() {
        let err = CreativeBrief::new("  ", "launch", ["bold"], None).unwrap_err();
        assert!(matches!(err, VibeError::InvalidInput(_)));
    }

    #[test]
    fn generation_accepts_prompt_schema_keys() {
        let v = json!({
            "Approach": { "vibes": ["bold", "retro"], "intent": "Make it loud." },
            "Brainstorm": { "workthrough": ["First.", "Second."] },
            "Creative_Territories": [{
                "territory": "Neon Nostalgia",
                "Mood & Tone": "Electric",
                "Unique_Angles": ["arcades"],
                "Key_Questions": ["What glows?"]
            }]
        });
        let g: GenerationResult = serde_json::from_value(v).unwrap();
        assert_eq!(g.approach.vibes, vec!["bold", "retro"]);
        assert_eq!(g.brainstorm.workthrough, "First.\n\nSecond.");
        assert_eq!(g.territories[0].name, "Neon Nostalgia");
        assert_eq!(g.territories[0].mood_and_tone, "Electric");
        assert_eq!(g.territories[0].key_questions, vec!["What glows?"]);
    }

    #[test]
    fn generation_serializes_camel_case() {
        let g = GenerationResult {
            territories: vec![Territory { name: "A".into(), ..Default::default() }],
            ..Default::default()
        };
        let v = serde_json::to_value(&g).unwrap();
        assert_eq!(v["territories"][0]["name"], "A");
        assert!(v["territories"][0].get("moodAndTone").is_some());
    }

    #[test]
    fn missing_keys_decode_to_empty_state() {
        let g: GenerationResult = serde_json::from_value(json!({ "Approach": {} })).unwrap();
        assert!(!g.has_territories());
        assert_eq!(g.approach.intent, "");
    }

    #[test]
    fn duplicate_territory_names_are_reported() {
        let t = |n: &str| Territory { name: n.into(), ..Default::default() };
        let g = GenerationResult { territories: vec![t("a"), t("b"), t("a"), t("a")], ..Default::default() };
        assert_eq!(g.duplicate_names(), vec!["a"]);
    }

    #[test]
    fn expansion_envelope_is_unwrapped() {
        let wrapped = json!({ "territory_expansion": {
            "visual_world": { "aesthetics": ["grain"], "signature_elements": ["chrome"] },
            "narrative_angles": { "tone_guidance": "wry" },
            "evolution_questions": ["Next?"]
        }});
        let e: TerritoryExpansion =
            serde_json::from_value(TerritoryExpansion::unwrap_envelope(wrapped)).unwrap();
        assert_eq!(e.visual_world.aesthetics, vec!["grain"]);
        assert_eq!(e.visual_world.signature_elements, vec!["chrome"]);
        assert_eq!(e.narrative_angles.tone_guidance, "wry");
        assert_eq!(e.evolution_questions, vec!["Next?"]);

        let bare = json!({ "evolution_questions": ["Why?"] });
        let e: TerritoryExpansion =
            serde_json::from_value(TerritoryExpansion::unwrap_envelope(bare)).unwrap();
        assert_eq!(e.evolution_questions, vec!["Why?"]);
    }

    #[test]
    fn user_context_treats_blank_fields_as_absent() {
        let ctx: UserContext = serde_json::from_value(json!({
            "focusArea": "",
            "primaryChannel": "social",
            "targetAudience": " Gen Z "
        }))
        .unwrap();
        assert_eq!(ctx.focus_area, None);
        assert_eq!(ctx.primary_channel, Some(Channel::Social));
        assert_eq!(ctx.target_audience.as_deref(), Some("Gen Z"));

        let empty: UserContext = serde_json::from_value(json!({ "primaryChannel": "" })).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn unknown_channel_is_rejected() {
        let res: Result<UserContext, _> = serde_json::from_value(json!({ "primaryChannel": "Radio" }));
        assert!(res.is_err());
    }
}
