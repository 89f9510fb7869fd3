//! Type affinity tables - damage multipliers between type tags

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One resolved `(attacker, defender, multiplier)` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffinityTriple {
    pub attacker: String,
    pub defender: String,
    pub multiplier: f64,
}

impl AffinityTriple {
    #[cfg(test)]
    pub fn new(attacker: impl Into<String>, defender: impl Into<String>, multiplier: f64) -> Self {
        Self {
            attacker: attacker.into(),
            defender: defender.into(),
            multiplier,
        }
    }
}

/// Flat triple lists for both attack directions of one floor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AffinityTriples {
    #[serde(default)]
    pub player_vs_enemy: Vec<AffinityTriple>,
    #[serde(default)]
    pub enemy_vs_player: Vec<AffinityTriple>,
}

/// attacker-tag -> defender-tag -> multiplier
pub type AffinityLookup = BTreeMap<String, BTreeMap<String, f64>>;

/// Two-direction lookup of damage multipliers for a single floor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AffinityTable {
    pub player_vs_enemy: AffinityLookup,
    pub enemy_vs_player: AffinityLookup,
}

impl AffinityTable {
    /// Build a table from the resolver's flat triple lists.
    ///
    /// Only pairs present in the input end up in the lookup; nothing is
    /// defaulted. A repeated `(attacker, defender)` pair keeps the last
    /// multiplier. Non-positive or non-finite multipliers are dropped.
    pub fn from_triples(triples: &AffinityTriples) -> Self {
        Self {
            player_vs_enemy: build_lookup(&triples.player_vs_enemy),
            enemy_vs_player: build_lookup(&triples.enemy_vs_player),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.player_vs_enemy.is_empty() && self.enemy_vs_player.is_empty()
    }

    #[cfg(test)]
    pub fn player_multiplier(&self, attacker: &str, defender: &str) -> Option<f64> {
        self.player_vs_enemy.get(attacker).and_then(|row| row.get(defender)).copied()
    }
}

fn build_lookup(triples: &[AffinityTriple]) -> AffinityLookup {
    let mut table = AffinityLookup::new();
    for triple in triples {
        if !triple.multiplier.is_finite() || triple.multiplier <= 0.0 {
            continue;
        }
        table
            .entry(triple.attacker.clone())
            .or_default()
            .insert(triple.defender.clone(), triple.multiplier);
    }
    table
}
