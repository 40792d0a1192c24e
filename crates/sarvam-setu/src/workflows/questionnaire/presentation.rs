use std::fmt::Write;

use super::matching::MatchReport;
use crate::workflows::schemes::EligibilityRule;

pub const WELCOME_MESSAGE: &str = "Welcome to Sarvam Setu!\n\n\
I can help you find government schemes you might be eligible for.\n\n\
Type /check to start the eligibility questionnaire.";
pub const SEARCHING_MESSAGE: &str = "Searching for schemes based on your answers...";
pub const MATCHES_HEADER: &str = "Here are some schemes you might be eligible for:";
pub const NO_MATCH_MESSAGE: &str =
    "No matching schemes found based on your answers. You can try again with different options.";
pub const INSUFFICIENT_INPUT_MESSAGE: &str =
    "I could not use your answers to search for schemes. Type /check to start again.";
pub const FAILURE_MESSAGE: &str = "Something went wrong while searching for schemes.";

const DESCRIPTION_PREVIEW_CHARS: usize = 100;

pub fn received_notice(value: &str) -> String {
    format!("Received: {value}")
}

/// Chat text for a terminal match outcome.
pub fn render_report(report: &MatchReport) -> String {
    match report {
        MatchReport::Matches(rules) => render_matches(rules),
        MatchReport::NoMatch => NO_MATCH_MESSAGE.to_string(),
        MatchReport::InsufficientInput => INSUFFICIENT_INPUT_MESSAGE.to_string(),
        MatchReport::Unavailable(_) => FAILURE_MESSAGE.to_string(),
    }
}

pub fn render_matches(rules: &[EligibilityRule]) -> String {
    let mut message = format!("{MATCHES_HEADER}\n\n");
    for rule in rules {
        let _ = writeln!(message, "*{}*", rule.name());
        let _ = writeln!(message, "{}", preview(&rule.description));
        if let Some(link) = rule.link() {
            let _ = writeln!(message, "[Learn More]({link})");
        }
        message.push('\n');
    }
    message.truncate(message.trim_end().len());
    message
}

fn preview(description: &str) -> String {
    let description = description.trim();
    match description.char_indices().nth(DESCRIPTION_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", description[..cut].trim_end()),
        None => description.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme(name: &str, description: &str, link: Option<&str>) -> EligibilityRule {
        EligibilityRule {
            scheme_name: name.to_string(),
            description: description.to_string(),
            application_link: link.map(str::to_string),
            ..EligibilityRule::default()
        }
    }

    #[test]
    fn renders_name_description_and_link() {
        let rendered = render_matches(&[scheme(
            "PM Kisan",
            "Income support for farmers.",
            Some("https://pmkisan.gov.in"),
        )]);

        assert_eq!(
            rendered,
            "Here are some schemes you might be eligible for:\n\n*PM Kisan*\nIncome support for farmers.\n[Learn More](https://pmkisan.gov.in)"
        );
    }

    #[test]
    fn long_descriptions_are_cut_on_char_boundaries() {
        let description = "आ".repeat(150);
        let rendered = render_matches(&[scheme("Hindi", &description, None)]);
        let line = rendered.lines().nth(3).expect("description line");

        assert!(line.ends_with("..."));
        assert_eq!(line.chars().count(), DESCRIPTION_PREVIEW_CHARS + 3);
    }

    #[test]
    fn failure_reports_hide_details() {
        let rendered = render_report(&MatchReport::Unavailable("socket closed".to_string()));
        assert_eq!(rendered, FAILURE_MESSAGE);
        assert!(!rendered.contains("socket"));
    }
}
