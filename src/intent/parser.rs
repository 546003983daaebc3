//! Priority grammar mapping free text to an [`Intent`].
//!
//! Rules are tried in a fixed order and the first one that applies wins:
//!
//! 1. **Calculate** - the whole input is an arithmetic expression that evaluates
//! 2. **CreateTask** - an action verb followed by a target and/or a date phrase
//! 3. **Navigate** - the input names (or prefixes) a known route alias
//! 4. **Search** - anything else at least `min_query_len` characters long
//! 5. **Unknown** - empty or shorter input
//!
//! A structured rule (1-3) only applies when its confidence reaches the
//! configured threshold, so `intent.is_structured()` holds exactly when
//! `confidence >= threshold`. Search sits below the threshold and Unknown is
//! always zero.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::calculator;
use super::dates::parse_date_at;
use super::text::{fold, folded_tokens};
use crate::config::{PaletteConfig, ParserConfig};
use crate::models::{EntityValue, Intent, ParsedCommand, entity_keys};

/// Words dropped between the target and a date (`appeler Jean pour demain`)
const DATE_CONNECTORS: &[&str] = &["pour", "le", "d'ici", "avant", "for", "on", "by", "before"];

/// Optional phrases in front of a route alias
const NAVIGATION_LEAD_INS: &[&str] =
    &["aller a ", "aller vers ", "ouvrir ", "go to ", "goto ", "open "];

pub struct IntentParser {
    config: ParserConfig,
    min_query_len: usize,
    /// Folded verb phrases split into tokens, longest first
    verbs: Vec<(String, Vec<String>)>,
    /// Folded alias and its route, in configuration order
    aliases: Vec<(String, String)>,
}

impl IntentParser {
    pub fn new(config: ParserConfig, min_query_len: usize) -> Self {
        let mut verbs: Vec<(String, Vec<String>)> = config
            .action_verbs
            .iter()
            .map(|verb| {
                let tokens = folded_tokens(verb);
                (tokens.join(" "), tokens)
            })
            .filter(|(_, tokens)| !tokens.is_empty())
            .collect();
        // Stable sort keeps configuration order among equal lengths
        verbs.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

        let aliases = config
            .routes
            .iter()
            .flat_map(|route| {
                route
                    .aliases
                    .iter()
                    .map(move |alias| (folded_tokens(alias).join(" "), route.route.clone()))
            })
            .filter(|(alias, _)| !alias.is_empty())
            .collect();

        Self { config, min_query_len, verbs, aliases }
    }

    pub fn from_config(config: &PaletteConfig) -> Self {
        Self::new(config.parser.clone(), config.min_query_len)
    }

    pub fn threshold(&self) -> f64 {
        self.config.threshold
    }

    /// Classify `raw_text`. Total and pure: never fails, never reads the clock.
    pub fn parse(&self, raw_text: &str) -> ParsedCommand {
        let trimmed = raw_text.trim();
        if trimmed.is_empty() {
            return ParsedCommand::unknown(raw_text);
        }

        if let Some(command) = self.parse_calculation(raw_text, trimmed) {
            return command;
        }
        if let Some(command) = self.parse_task(raw_text, trimmed) {
            return command;
        }
        if let Some(command) = self.parse_navigation(raw_text, trimmed) {
            return command;
        }

        if trimmed.chars().count() >= self.min_query_len {
            let mut entities = BTreeMap::new();
            entities.insert(entity_keys::QUERY.to_string(), EntityValue::Text(trimmed.to_string()));
            return build(raw_text, Intent::Search, self.config.search_confidence, entities);
        }

        ParsedCommand::unknown(raw_text)
    }

    fn parse_calculation(&self, raw_text: &str, trimmed: &str) -> Option<ParsedCommand> {
        let value = calculator::evaluate(trimmed).ok()?;
        let mut entities = BTreeMap::new();
        entities.insert(entity_keys::CALCULATION.to_string(), EntityValue::Number(value));
        Some(build(raw_text, Intent::Calculate, 1.0, entities))
    }

    fn parse_task(&self, raw_text: &str, trimmed: &str) -> Option<ParsedCommand> {
        let words: Vec<&str> = trimmed.split_whitespace().collect();
        let folded: Vec<String> = words.iter().map(|word| fold(word)).collect();

        let (verb, verb_len) = self
            .verbs
            .iter()
            .find(|(_, tokens)| folded.starts_with(tokens))
            .map(|(verb, tokens)| (verb.clone(), tokens.len()))?;

        let date = (verb_len..folded.len())
            .find_map(|start| parse_date_at(&folded, start).map(|(date, span)| (date, start, span)));

        let mut target_words: Vec<&str> = Vec::new();
        match date {
            Some((_, start, span)) => {
                target_words.extend_from_slice(&words[verb_len..start]);
                trim_connectors(&mut target_words);
                target_words.extend_from_slice(&words[start + span..]);
            }
            None => target_words.extend_from_slice(&words[verb_len..]),
        }
        trim_connectors(&mut target_words);

        let target = (!target_words.is_empty()).then(|| target_words.join(" "));
        let slots = 1 + usize::from(target.is_some()) + usize::from(date.is_some());
        let confidence = (slots as f64 * self.config.slot_weight).min(self.config.slot_cap);
        if confidence < self.config.threshold {
            return None;
        }

        let mut entities = BTreeMap::new();
        entities.insert(entity_keys::ACTION_VERB.to_string(), EntityValue::Text(verb));
        if let Some(target) = target {
            entities.insert(entity_keys::TARGET_NAME.to_string(), EntityValue::Text(target));
        }
        if let Some((due, _, _)) = date {
            entities.insert(entity_keys::DUE_DATE.to_string(), EntityValue::Date(due));
        }
        Some(build(raw_text, Intent::CreateTask, confidence, entities))
    }

    fn parse_navigation(&self, raw_text: &str, trimmed: &str) -> Option<ParsedCommand> {
        let normalized = folded_tokens(trimmed).join(" ");
        let candidate = NAVIGATION_LEAD_INS
            .iter()
            .find_map(|lead_in| normalized.strip_prefix(lead_in))
            .unwrap_or(normalized.as_str())
            .trim();
        if candidate.is_empty() {
            return None;
        }

        let route = self.resolve_route(candidate)?;
        let mut entities = BTreeMap::new();
        entities.insert(entity_keys::ROUTE.to_string(), EntityValue::Text(route));
        Some(build(raw_text, Intent::Navigate, self.config.navigate_confidence, entities))
    }

    fn resolve_route(&self, candidate: &str) -> Option<String> {
        if candidate.starts_with('/') {
            return self
                .config
                .routes
                .iter()
                .find(|route| fold(&route.route) == candidate)
                .map(|route| route.route.clone());
        }

        if let Some((_, route)) = self.aliases.iter().find(|(alias, _)| alias == candidate) {
            return Some(route.clone());
        }

        if candidate.chars().count() < self.config.min_route_prefix {
            return None;
        }
        self.aliases
            .iter()
            .find(|(alias, _)| alias.starts_with(candidate))
            .map(|(_, route)| route.clone())
    }
}

impl Default for IntentParser {
    fn default() -> Self {
        Self::from_config(&PaletteConfig::default())
    }
}

/// Parse with the default configuration
pub fn parse(raw_text: &str) -> ParsedCommand {
    static PARSER: OnceLock<IntentParser> = OnceLock::new();
    PARSER.get_or_init(IntentParser::default).parse(raw_text)
}

fn build(
    raw_text: &str,
    intent: Intent,
    confidence: f64,
    entities: BTreeMap<String, EntityValue>,
) -> ParsedCommand {
    ParsedCommand { raw_text: raw_text.to_string(), intent, confidence, entities }
}

fn trim_connectors(words: &mut Vec<&str>) {
    while let Some(last) = words.last() {
        if DATE_CONNECTORS.contains(&fold(last).as_str()) {
            words.pop();
        } else {
            break;
        }
    }
}
