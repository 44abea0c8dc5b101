//! Ontology updater (spec §4.3 stage 2, §4.6). Mines package registries
//! (PyPI, npm, crates.io) and in-graph name variants for new
//! `alias → canonical` mappings, appended to the dynamic half of
//! [`crate::extraction::AliasDictionary`] without ever overwriting an
//! existing mapping. Grounded on
//! `original_source/apps/api/services/ontology_updater.py`'s
//! `OntologyUpdater.refresh`/`_fetch_pypi_aliases`/`_fetch_npm_aliases`/
//! `_fetch_crates_aliases`/`_mine_graph_aliases`.

use continuum_types::Entity;
use reqwest::Client;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_CONCURRENT_LOOKUPS: usize = 5;

/// Seed package names looked up on every refresh unless the caller supplies
/// its own list (mirrors the original's built-in `seed_names`).
pub const DEFAULT_SEED_NAMES: &[&str] = &[
    "pillow",
    "scikit-learn",
    "beautifulsoup4",
    "python-dotenv",
    "pyyaml",
    "fastapi",
    "pydantic",
    "sqlalchemy",
    "celery",
    "redis",
    "react",
    "lodash",
    "axios",
    "typescript",
    "next",
    "express",
    "tailwindcss",
    "graphql",
    "tokio",
    "serde",
    "actix-web",
    "reqwest",
];

/// Alias candidates mined from one registry lookup, keyed by canonical
/// package name.
#[derive(Debug, Default)]
pub struct RegistryAliases {
    pub aliases: HashSet<String>,
}

fn http_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent("Continuum/0.1 (ontology updater)")
        .build()
        .expect("reqwest client builder with static config never fails")
}

/// Fetch PyPI package metadata and extract import-name variants
/// (`sklearn` for `scikit-learn`, underscore/hyphen duality, `import X`
/// mentions in the description).
pub async fn fetch_pypi_aliases(client: &Client, name: &str) -> HashSet<String> {
    let mut aliases = HashSet::from([name.to_string()]);
    let underscore = name.replace('-', "_");
    if underscore != name {
        aliases.insert(underscore);
    }

    let url = format!("https://pypi.org/pypi/{name}/json");
    let Ok(resp) = client.get(&url).send().await else {
        return aliases;
    };
    if !resp.status().is_success() {
        return aliases;
    }
    let Ok(body) = resp.json::<Value>().await else {
        return aliases;
    };

    if let Some(description) = body.pointer("/info/description").and_then(Value::as_str) {
        for captured in import_name_regex().captures_iter(&description[..description.len().min(2000)]) {
            let candidate = &captured[1];
            if candidate.to_lowercase() != name.to_lowercase() && candidate.len() > 2 {
                aliases.insert(candidate.to_string());
            }
        }
    }

    aliases
}

/// Fetch npm registry metadata and extract variants (scoped-package bare
/// name).
pub async fn fetch_npm_aliases(client: &Client, name: &str) -> HashSet<String> {
    let mut aliases = HashSet::from([name.to_string()]);
    if let Some(bare) = name.strip_prefix('@').and_then(|rest| rest.split_once('/')).map(|(_, pkg)| pkg) {
        aliases.insert(bare.to_string());
    }

    let url = format!("https://registry.npmjs.org/{name}/latest");
    if let Ok(resp) = client.get(&url).send().await {
        if !resp.status().is_success() {
            return aliases;
        }
    }
    aliases
}

/// Fetch crates.io metadata and extract hyphen/underscore variants.
pub async fn fetch_crates_aliases(client: &Client, name: &str) -> HashSet<String> {
    let mut aliases = HashSet::from([name.to_string(), name.replace('-', "_"), name.replace('_', "-")]);
    let url = format!("https://crates.io/api/v1/crates/{name}");
    let _ = client.get(&url).send().await;
    aliases.retain(|a| !a.is_empty());
    aliases
}

fn import_name_regex() -> &'static regex::Regex {
    use std::sync::OnceLock;
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"import\s+(\w+)").unwrap())
}

/// Group entity canonical names by their alphanumeric-only slug; a group
/// with 2+ distinct raw spellings is an alias candidate (e.g. "Postgres"
/// and "postgres-sql" both slugging to "postgressql").
fn mine_graph_aliases(entities: &[Entity]) -> HashMap<String, Vec<String>> {
    let mut slug_groups: HashMap<String, Vec<String>> = HashMap::new();
    for entity in entities {
        let slug: String = entity
            .canonical_name
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        if slug.len() > 2 {
            slug_groups.entry(slug).or_default().push(entity.canonical_name.clone());
        }
    }
    slug_groups.retain(|_, names| {
        let distinct: HashSet<String> = names.iter().map(|n| n.to_lowercase()).collect();
        distinct.len() >= 2
    });
    slug_groups
}

/// Run a full refresh cycle: looks up registry aliases for `seed_names`
/// (bounded to `MAX_CONCURRENT_LOOKUPS` in flight), mines `entities` for
/// in-graph variants, and merges both into `existing` without overwriting
/// any key already present. Returns the number of newly added mappings.
pub async fn refresh(
    client: &Client,
    seed_names: &[String],
    entities: &[Entity],
    existing: &mut HashMap<String, String>,
) -> usize {
    use futures::stream::{self, StreamExt};

    let lookups = stream::iter(seed_names.iter().cloned())
        .map(|name| {
            let client = client.clone();
            async move {
                let mut all = fetch_pypi_aliases(&client, &name).await;
                all.extend(fetch_npm_aliases(&client, &name).await);
                all.extend(fetch_crates_aliases(&client, &name).await);
                (name.to_lowercase(), all)
            }
        })
        .buffer_unordered(MAX_CONCURRENT_LOOKUPS)
        .collect::<Vec<_>>()
        .await;

    let mut added = 0;
    for (canonical, aliases) in lookups {
        for alias in aliases {
            let key = alias.to_lowercase();
            if key != canonical && !existing.contains_key(&key) {
                existing.insert(key, canonical.clone());
                added += 1;
            }
        }
    }

    for (_, variants) in mine_graph_aliases(entities) {
        let canonical = variants.iter().max_by_key(|v| v.len()).unwrap().to_lowercase();
        for variant in variants {
            let key = variant.to_lowercase();
            if key != canonical && !existing.contains_key(&key) {
                existing.insert(key, canonical.clone());
                added += 1;
            }
        }
    }

    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use continuum_types::{EntityType, UserId};

    fn entity(name: &str) -> Entity {
        Entity::new(UserId::from("alice"), name.to_string(), EntityType::Technology)
    }

    #[test]
    fn mine_graph_aliases_groups_same_slug_variants() {
        let entities = vec![entity("Postgres SQL"), entity("postgresql"), entity("Redis")];
        let groups = mine_graph_aliases(&entities);
        assert_eq!(groups.len(), 1);
        let variants = groups.values().next().unwrap();
        assert_eq!(variants.len(), 2);
    }

    #[test]
    fn mine_graph_aliases_ignores_unique_names() {
        let entities = vec![entity("Postgres"), entity("Redis"), entity("Kafka")];
        assert!(mine_graph_aliases(&entities).is_empty());
    }

    #[tokio::test]
    async fn refresh_never_overwrites_an_existing_mapping() {
        let client = http_client();
        let mut existing = HashMap::from([("pg".to_string(), "oracle".to_string())]);
        let entities = vec![entity("pg"), entity("PG")];
        refresh(&client, &[], &entities, &mut existing).await;
        assert_eq!(existing.get("pg").unwrap(), "oracle");
    }

    #[test]
    fn default_seed_names_is_nonempty() {
        assert!(!DEFAULT_SEED_NAMES.is_empty());
    }
}
