//! Secondary actions offered once a search result has been selected.

use crate::intent::fold;
use crate::models::{SearchSuggestion, SuggestedAction};

struct ChainEntry {
    label: &'static str,
    description: &'static str,
    action_ref: &'static str,
}

const fn entry(
    label: &'static str,
    description: &'static str,
    action_ref: &'static str,
) -> ChainEntry {
    ChainEntry { label, description, action_ref }
}

const OPEN_RECORD: ChainEntry = entry("Ouvrir la fiche", "Afficher le détail", "chain.open_record");
const CREATE_TASK: ChainEntry =
    entry("Créer une tâche", "Nouvelle tâche liée à cette fiche", "chain.create_task");

const PERSON: &[ChainEntry] = &[
    OPEN_RECORD,
    CREATE_TASK,
    entry("Envoyer un email", "Écrire à ce contact", "chain.send_email"),
    entry("Appeler", "Composer le numéro du contact", "chain.call"),
    entry("Voir l'organisation", "Ouvrir l'organisation du contact", "chain.open_organisation"),
];

const ORGANISATION: &[ChainEntry] = &[
    OPEN_RECORD,
    CREATE_TASK,
    entry("Voir les contacts", "Personnes rattachées à l'organisation", "chain.list_people"),
    entry("Ajouter à une campagne", "Inclure dans une campagne", "chain.add_to_campaign"),
];

const TASK: &[ChainEntry] = &[
    OPEN_RECORD,
    entry("Marquer comme terminée", "Clore la tâche", "chain.complete_task"),
    entry("Reporter à demain", "Décaler l'échéance d'un jour", "chain.postpone_task"),
];

const DEFAULT: &[ChainEntry] = &[OPEN_RECORD, CREATE_TASK];

fn catalogue(entity_type: &str) -> &'static [ChainEntry] {
    match entity_type {
        "person" | "people" | "contact" => PERSON,
        "organisation" | "organization" | "company" => ORGANISATION,
        "task" => TASK,
        _ => DEFAULT,
    }
}

/// Chain actions for `entity` whose label or description contains `filter`,
/// ignoring case and accents. An empty filter keeps everything.
pub fn chain_actions(entity: &SearchSuggestion, filter: &str) -> Vec<SuggestedAction> {
    let needle = fold(filter.trim());
    catalogue(&entity.entity_type)
        .iter()
        .filter(|action| {
            needle.is_empty()
                || fold(action.label).contains(&needle)
                || fold(action.description).contains(&needle)
        })
        .map(|action| SuggestedAction {
            label: action.label.to_string(),
            description: action.description.to_string(),
            action_ref: action.action_ref.to_string(),
        })
        .collect()
}
