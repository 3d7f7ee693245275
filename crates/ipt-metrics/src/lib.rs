use anyhow::Result;
use ipt_core::{ExporterConfig, Tables};
use ipt_save::SaveCommand;
use prometheus::{Encoder, Gauge, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::error;

/// Metrics collector for save-command counters
pub struct MetricsCollector {
    registry: Arc<Registry>,

    // Scrape bookkeeping
    scrape_duration: Gauge,
    scrape_success: IntGauge,

    // Chain policy counters
    default_packets: IntCounterVec,
    default_bytes: IntCounterVec,

    // Rule counters
    rule_packets: IntCounterVec,
    rule_bytes: IntCounterVec,
}

impl MetricsCollector {
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let scrape_duration = Gauge::new(
            "iptables_scrape_duration_seconds",
            "iptables_exporter: Duration of scraping iptables.",
        )?;
        registry.register(Box::new(scrape_duration.clone()))?;

        let scrape_success = IntGauge::new(
            "iptables_scrape_success",
            "iptables_exporter: Whether scraping iptables succeeded.",
        )?;
        registry.register(Box::new(scrape_success.clone()))?;

        let default_bytes = IntCounterVec::new(
            Opts::new(
                "iptables_default_bytes_total",
                "iptables_exporter: Total bytes matching a chain's default policy.",
            ),
            &["command", "table", "chain", "policy"],
        )?;
        registry.register(Box::new(default_bytes.clone()))?;

        let default_packets = IntCounterVec::new(
            Opts::new(
                "iptables_default_packets_total",
                "iptables_exporter: Total packets matching a chain's default policy.",
            ),
            &["command", "table", "chain", "policy"],
        )?;
        registry.register(Box::new(default_packets.clone()))?;

        let rule_bytes = IntCounterVec::new(
            Opts::new(
                "iptables_rule_bytes_total",
                "iptables_exporter: Total bytes matching a rule.",
            ),
            &["command", "table", "chain", "rule"],
        )?;
        registry.register(Box::new(rule_bytes.clone()))?;

        let rule_packets = IntCounterVec::new(
            Opts::new(
                "iptables_rule_packets_total",
                "iptables_exporter: Total packets matching a rule.",
            ),
            &["command", "table", "chain", "rule"],
        )?;
        registry.register(Box::new(rule_packets.clone()))?;

        Ok(Self {
            registry,
            scrape_duration,
            scrape_success,
            default_packets,
            default_bytes,
            rule_packets,
            rule_bytes,
        })
    }

    /// Record every chain and rule counter of one command's output.
    ///
    /// Counters are added to the current values, so call [`Self::reset`]
    /// before recording a fresh scrape. Identical rules in the same chain
    /// share a label set and are summed.
    pub fn record_tables(&self, command: &str, tables: &Tables) {
        for (table_name, table) in tables {
            for (chain_name, chain) in table {
                let labels = [
                    command,
                    table_name.as_str(),
                    chain_name.as_str(),
                    chain.policy.as_str(),
                ];
                self.default_packets
                    .with_label_values(&labels)
                    .inc_by(chain.packets);
                self.default_bytes
                    .with_label_values(&labels)
                    .inc_by(chain.bytes);

                for rule in &chain.rules {
                    let labels = [
                        command,
                        table_name.as_str(),
                        chain_name.as_str(),
                        rule.rule.as_str(),
                    ];
                    self.rule_packets
                        .with_label_values(&labels)
                        .inc_by(rule.packets);
                    self.rule_bytes.with_label_values(&labels).inc_by(rule.bytes);
                }
            }
        }
    }

    /// Record how long a scrape took and whether it succeeded
    pub fn record_scrape(&self, duration: Duration, success: bool) {
        self.scrape_duration.set(duration.as_secs_f64());
        self.scrape_success.set(if success { 1 } else { 0 });
    }

    /// Drop all counter series from the previous scrape
    pub fn reset(&self) {
        self.default_packets.reset();
        self.default_bytes.reset();
        self.rule_packets.reset();
        self.rule_bytes.reset();
    }

    /// Get the registry for an external exposition layer
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Render metrics in Prometheus text format
    pub fn render_metrics(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Runs the configured save commands and feeds their counters to a collector
pub struct Scraper {
    collector: MetricsCollector,
    commands: Vec<SaveCommand>,
}

impl Scraper {
    pub fn new(collector: MetricsCollector, commands: Vec<SaveCommand>) -> Self {
        Self {
            collector,
            commands,
        }
    }

    pub fn from_config(config: &ExporterConfig) -> Result<Self> {
        let commands = config.commands.iter().map(SaveCommand::from).collect();
        Ok(Self::new(MetricsCollector::new()?, commands))
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }

    /// Scrape every command in order, stopping at the first failure.
    ///
    /// The failure is logged and returned; counters recorded for earlier
    /// commands are kept and `iptables_scrape_success` is set to 0.
    pub async fn scrape(&self) -> Result<()> {
        self.collector.reset();
        let start = Instant::now();

        let mut result = Ok(());
        for command in &self.commands {
            match command.collect().await {
                Ok(tables) => self.collector.record_tables(command.label(), &tables),
                Err(e) => {
                    error!(command = command.label(), "scrape failed: {}", e);
                    result = Err(e.into());
                    break;
                }
            }
        }

        self.collector.record_scrape(start.elapsed(), result.is_ok());
        result
    }
}
