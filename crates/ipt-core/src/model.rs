use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// All tables found in one save dump, keyed by table name ("filter", "nat", ...).
pub type Tables = HashMap<String, Table>;

/// Chains of a single table, keyed by chain name ("INPUT", "FORWARD", ...).
pub type Table = HashMap<String, Chain>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    /// Default target, or "-" for user-defined chains
    pub policy: String,
    /// Packets that fell through to the policy
    pub packets: u64,
    pub bytes: u64,
    /// Rules in file order
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub packets: u64,
    pub bytes: u64,
    /// Match and target flags, without the `-A <chain>` directive or counters
    pub rule: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub name: String,
    pub chains: usize,
    pub rules: usize,
    /// Sum of all rule counters in the table
    pub rule_packets: u64,
    pub rule_bytes: u64,
}

impl Chain {
    pub fn new(policy: &str, packets: u64, bytes: u64) -> Self {
        Self {
            policy: policy.to_string(),
            packets,
            bytes,
            rules: vec![],
        }
    }

    /// Sum of this chain's rule counters as (packets, bytes).
    ///
    /// This is unrelated to the chain's own counters, which only count
    /// traffic that matched no rule.
    pub fn rule_totals(&self) -> (u64, u64) {
        self.rules.iter().fold((0u64, 0u64), |(packets, bytes), rule| {
            (
                packets.saturating_add(rule.packets),
                bytes.saturating_add(rule.bytes),
            )
        })
    }
}

impl Rule {
    pub fn new(packets: u64, bytes: u64, rule: &str) -> Self {
        Self {
            packets,
            bytes,
            rule: rule.to_string(),
        }
    }
}

/// Per-table chain and rule counts, sorted by table name.
pub fn summarize(tables: &Tables) -> Vec<TableSummary> {
    let mut summaries: Vec<TableSummary> = tables
        .iter()
        .map(|(name, table)| {
            let (rule_packets, rule_bytes) = table.values().map(Chain::rule_totals).fold(
                (0u64, 0u64),
                |(packets, bytes), (p, b)| (packets.saturating_add(p), bytes.saturating_add(b)),
            );
            TableSummary {
                name: name.clone(),
                chains: table.len(),
                rules: table.values().map(|chain| chain.rules.len()).sum(),
                rule_packets,
                rule_bytes,
            }
        })
        .collect();
    summaries.sort_by(|a, b| a.name.cmp(&b.name));
    summaries
}
