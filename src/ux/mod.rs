use colored::Colorize;
use std::io::{self, Write};

use crate::brief::{GenerationResult, Territory, TerritoryExpansion, UserContext};
use crate::errors::VibeError;

fn bullets(items: &[String]) {
    if items.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for i in items {
        println!("  • {i}");
    }
}

pub fn show_generation(result: &GenerationResult) {
    println!("\n{}", "=== APPROACH ===".bold());
    if !result.approach.vibes.is_empty() {
        let tags: Vec<String> = result.approach.vibes.iter().map(|v| format!("#{v}")).collect();
        println!("{}", tags.join(" ").cyan());
    }
    println!("{}", result.approach.intent);

    println!("\n{}", "=== BRAINSTORM ===".bold());
    println!("{}", result.brainstorm.workthrough);

    println!("\n{}", "=== CREATIVE TERRITORIES ===".bold());
    if !result.has_territories() {
        println!("{}", "(no territories returned)".dimmed());
        return;
    }
    for (i, t) in result.territories.iter().enumerate() {
        show_territory(i + 1, t);
    }
    println!();
}

fn show_territory(n: usize, t: &Territory) {
    println!("\n{}. {}", n, t.name.green().bold());
    println!("  {} {}", "Mood & Tone:".yellow(), t.mood_and_tone);
    println!("  {}", "Unique Angles:".yellow());
    bullets(&t.unique_angles);
    println!("  {}", "Key Questions:".yellow());
    bullets(&t.key_questions);
}

pub fn show_expansion(territory: &Territory, expansion: &TerritoryExpansion, ctx: &UserContext, from_cache: bool) {
    let tag = if from_cache { " (cached)".dimmed().to_string() } else { String::new() };
    println!("\n{}{}", format!("=== {} ===", territory.name).bold(), tag);
    if let Some(channel) = &ctx.primary_channel {
        println!("{} {}", "Channel:".yellow(), channel.as_str());
    }

    println!("\n{}", "Visual World".magenta().bold());
    println!("{}", "Aesthetics".yellow());
    bullets(&expansion.visual_world.aesthetics);
    println!("{}", "Inspiration".yellow());
    bullets(&expansion.visual_world.inspiration);
    println!("{}", "Signature Elements".yellow());
    bullets(&expansion.visual_world.signature_elements);

    println!("\n{}", "Narrative Angles".magenta().bold());
    println!("{}", "Key Stories".yellow());
    bullets(&expansion.narrative_angles.key_stories);
    println!("{}", "Messaging Themes".yellow());
    bullets(&expansion.narrative_angles.messaging_themes);
    println!("{} {}", "Tone Guidance:".yellow(), expansion.narrative_angles.tone_guidance);

    println!("\n{}", "Activation Opportunities".magenta().bold());
    println!("{}", "Key Moments".yellow());
    bullets(&expansion.activation_opportunities.key_moments);
    println!("{}", "Platform Ideas".yellow());
    bullets(&expansion.activation_opportunities.platform_ideas);
    println!("{}", "Engagement Hooks".yellow());
    bullets(&expansion.activation_opportunities.engagement_hooks);

    println!("\n{}", "Evolution Questions".magenta().bold());
    bullets(&expansion.evolution_questions);
    println!();
}

/// The single dismissible banner the user sees for a failed action.
pub fn show_error(err: &VibeError) {
    let hint = match err {
        VibeError::Provider(_) => " The provider could not be reached; try again in a moment.",
        _ => "",
    };
    eprintln!("{} {}{}", "error:".red().bold(), err, hint);
}

/// Asks for a 1-based territory number; empty input or EOF means none.
pub fn choose_territory(result: &GenerationResult) -> Option<usize> {
    if !result.has_territories() {
        return None;
    }
    loop {
        print!("Expand which territory? [1-{}, enter to skip]: ", result.territories.len());
        let _ = io::stdout().flush();
        let mut s = String::new();
        match io::stdin().read_line(&mut s) {
            Ok(0) | Err(_) => return None,
            Ok(_) => {}
        }
        match parse_choice(&s, result.territories.len()) {
            Ok(choice) => return choice,
            Err(msg) => println!("{}", msg.red()),
        }
    }
}

fn parse_choice(input: &str, count: usize) -> Result<Option<usize>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Ok(Some(n - 1)),
        _ => Err(format!("enter a number between 1 and {count}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choices_are_one_based_and_bounded() {
        assert_eq!(parse_choice("2\n", 3), Ok(Some(1)));
        assert_eq!(parse_choice("  \n", 3), Ok(None));
        assert!(parse_choice("0", 3).is_err());
        assert!(parse_choice("4", 3).is_err());
        assert!(parse_choice("two", 3).is_err());
    }
}
