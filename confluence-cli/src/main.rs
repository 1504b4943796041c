//! Confluence CLI: run decision cycles, regime checks and quick assessments.
//!
//! Commands:
//! - `analyze`: full multi-period decision over a snapshot JSON file
//! - `regime`: regime classification, exhaustion and pullback zone
//! - `quick`: single-period quick assessment over a candle JSON file
//! - `demo`: both analyses over seeded synthetic data
//! - `config show`: print the effective configuration as TOML

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use confluence_core::domain::{Bias, Candle, Period};
use confluence_core::refine::Corroboration;
use confluence_core::regime::DailyContext;
use confluence_core::synthetic::{SyntheticMarket, WalkParams};
use confluence_core::{
    Decision, DecisionEngine, EngineConfig, MarketSnapshot, QuickAnalyzer, QuickAssessment,
    RegimeAnalysis, RegimeAnalyzer, RegimeContext,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, Level};

#[derive(Parser)]
#[command(
    name = "confluence",
    about = "Confluence CLI: multi-period signal fusion and regime gate"
)]
struct Cli {
    /// Increase log verbosity (-v for debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Print JSON instead of a human summary.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a decision cycle over a snapshot JSON file.
    Analyze {
        /// Snapshot JSON: a map from period label to {price, candles}.
        snapshot: PathBuf,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Trading symbol, used to pick the asset-class profile.
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Classify the market regime of a snapshot JSON file.
    Regime {
        snapshot: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        symbol: Option<String>,

        /// Daily-context bias reported by an upstream analysis.
        #[arg(long, value_enum)]
        daily_bias: Option<BiasArg>,

        /// External veto: block all trades.
        #[arg(long, default_value_t = false)]
        block_all: bool,

        /// Composite score from an upstream analysis (0..100).
        #[arg(long, default_value_t = 50.0)]
        composite_score: f64,
    },
    /// Single-period quick assessment over a candle JSON array.
    Quick {
        candles: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        symbol: Option<String>,

        /// Optional corroboration JSON (pattern and wave readings).
        #[arg(long)]
        corroboration: Option<PathBuf>,
    },
    /// Analyze seeded synthetic data covering all six periods.
    Demo {
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Mean return per 5-minute step.
        #[arg(long, default_value_t = 0.0)]
        drift: f64,

        /// Return dispersion per 5-minute step.
        #[arg(long, default_value_t = 0.002)]
        volatility: f64,

        /// Candles per period.
        #[arg(long, default_value_t = 120)]
        candles: usize,

        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Configuration commands.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        symbol: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BiasArg {
    Bullish,
    Bearish,
    Neutral,
}

impl From<BiasArg> for Bias {
    fn from(arg: BiasArg) -> Self {
        match arg {
            BiasArg::Bullish => Bias::Bullish,
            BiasArg::Bearish => Bias::Bearish,
            BiasArg::Neutral => Bias::Neutral,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze {
            snapshot,
            config,
            symbol,
        } => run_analyze(&snapshot, config.as_deref(), symbol.as_deref(), cli.json),
        Commands::Regime {
            snapshot,
            config,
            symbol,
            daily_bias,
            block_all,
            composite_score,
        } => {
            if !(0.0..=100.0).contains(&composite_score) {
                bail!("--composite-score must be within 0..100, got {composite_score}");
            }
            let daily = (daily_bias.is_some() || block_all).then(|| DailyContext {
                block_all,
                bias: daily_bias.map(Bias::from).unwrap_or_default(),
            });
            let context = RegimeContext {
                daily,
                composite_score,
            };
            run_regime(&snapshot, config.as_deref(), symbol.as_deref(), context, cli.json)
        }
        Commands::Quick {
            candles,
            config,
            symbol,
            corroboration,
        } => run_quick(
            &candles,
            config.as_deref(),
            symbol.as_deref(),
            corroboration.as_deref(),
            cli.json,
        ),
        Commands::Demo {
            seed,
            drift,
            volatility,
            candles,
            config,
        } => {
            let params = WalkParams {
                drift,
                volatility,
                candles,
                ..WalkParams::default()
            };
            run_demo(seed, &params, config.as_deref(), cli.json)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { config, symbol } => {
                let config = load_config(config.as_deref(), symbol.as_deref())?;
                print!("{}", config.to_toml().context("serializing config")?);
                Ok(())
            }
        },
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>, symbol: Option<&str>) -> Result<EngineConfig> {
    let config = match path {
        Some(p) => EngineConfig::load(p)
            .with_context(|| format!("loading config from {}", p.display()))?,
        None => EngineConfig::default(),
    };
    Ok(match symbol {
        Some(s) => config.for_asset(s),
        None => config,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {what} from {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {what} JSON in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("serializing output")?);
    Ok(())
}

fn run_analyze(path: &Path, config: Option<&Path>, symbol: Option<&str>, json: bool) -> Result<()> {
    let config = load_config(config, symbol)?;
    let snapshot: MarketSnapshot = read_json(path, "snapshot")?;
    debug!(periods = snapshot.len(), "snapshot loaded");

    let decision = DecisionEngine::new(config).evaluate(&snapshot);
    if json {
        return print_json(&decision);
    }
    print_decision(&decision);
    Ok(())
}

fn run_regime(
    path: &Path,
    config: Option<&Path>,
    symbol: Option<&str>,
    context: RegimeContext,
    json: bool,
) -> Result<()> {
    let config = load_config(config, symbol)?;
    let snapshot: MarketSnapshot = read_json(path, "snapshot")?;

    let analysis = RegimeAnalyzer::new(config).analyze(&snapshot, context);
    if json {
        return print_json(&analysis);
    }
    print_regime(&analysis);
    Ok(())
}

fn run_quick(
    path: &Path,
    config: Option<&Path>,
    symbol: Option<&str>,
    corroboration: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = load_config(config, None)?;
    let candles: Vec<Candle> = read_json(path, "candles")?;
    let corroboration: Corroboration = match corroboration {
        Some(p) => read_json(p, "corroboration")?,
        None => Corroboration::default(),
    };

    let mut analyzer = match symbol {
        Some(s) => QuickAnalyzer::for_symbol(config, s),
        None => QuickAnalyzer::new(config),
    };
    let assessment = analyzer
        .analyze(&candles, &corroboration)
        .with_context(|| format!("assessing {}", path.display()))?;
    if json {
        return print_json(&assessment);
    }
    print_quick(&assessment);
    Ok(())
}

#[derive(Serialize)]
struct DemoReport<'a> {
    seed: u64,
    params: &'a WalkParams,
    decision: &'a Decision,
    regime: &'a RegimeAnalysis,
    quick: Option<&'a QuickAssessment>,
}

fn run_demo(seed: u64, params: &WalkParams, config: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config, None)?;
    let market = SyntheticMarket::new(seed);
    let snapshot = market.snapshot(params);

    let decision = DecisionEngine::new(config.clone()).evaluate(&snapshot);
    let regime = RegimeAnalyzer::new(config.clone()).analyze(&snapshot, RegimeContext::default());
    let fine = market.candles(Period::M5, params);
    let quick = match QuickAnalyzer::new(config).analyze(&fine, &Corroboration::default()) {
        Ok(q) => Some(q),
        Err(e) => {
            debug!(error = %e, "quick assessment skipped");
            None
        }
    };

    if json {
        return print_json(&DemoReport {
            seed,
            params,
            decision: &decision,
            regime: &regime,
            quick: quick.as_ref(),
        });
    }

    println!();
    println!("=== Synthetic Demo ===");
    println!("Seed:           {seed}");
    println!("Drift:          {}", params.drift);
    println!("Volatility:     {}", params.volatility);
    println!("Candles:        {} per period", params.candles);
    print_decision(&decision);
    print_regime(&regime);
    if let Some(q) = &quick {
        print_quick(q);
    }
    println!("WARNING: Results based on SYNTHETIC data");
    println!();
    Ok(())
}

fn print_decision(d: &Decision) {
    println!();
    println!("=== Decision ===");
    println!("Signal:         {}", d.headline());
    println!("Price:          {:.5}", d.current_price);
    if let Some(period) = d.dominant_period {
        println!("Dominant:       {period}");
    }
    if let Some(priority) = &d.priority {
        println!("Priority rule:  {}", priority.rule);
    }
    println!(
        "Force:          BUY {:.1} / SELL {:.1} ({})",
        d.force.buy, d.force.sell, d.force.winner
    );
    if let Some(error) = &d.error {
        println!("Error:          {error}");
    }
    if let Some(ts) = d.timestamp {
        println!("As of:          {}", ts.format("%Y-%m-%d %H:%M UTC"));
    }

    println!();
    println!("--- Periods ---");
    println!(
        "{:<6} {:<6} {:>8} {:>7} {:>7} {:<10}",
        "Period", "Signal", "Strength", "RSI", "ADX", "Trend"
    );
    println!("{}", "-".repeat(50));
    for a in &d.analyses {
        println!(
            "{:<6} {:<6} {:>8.1} {:>7.1} {:>7.1} {:<10}",
            a.period.label(),
            a.signal,
            a.strength,
            a.oscillator,
            a.trend_strength,
            a.trend
        );
    }

    let l = &d.levels;
    println!();
    println!("--- Levels ---");
    println!("Entry:          {:.5}", l.entry);
    println!("Stop loss:      {:.5}", l.stop_loss);
    println!("Targets:        {:.5} / {:.5}", l.targets[0], l.targets[1]);
    println!(
        "Supports:       {:.5} / {:.5} / {:.5}",
        l.supports[0], l.supports[1], l.supports[2]
    );
    println!(
        "Resistances:    {:.5} / {:.5} / {:.5}",
        l.resistances[0], l.resistances[1], l.resistances[2]
    );

    if !d.divergences.is_empty() {
        println!();
        println!("--- Divergences ---");
        for div in &d.divergences {
            println!("[{}] {}", div.severity, div.describe());
        }
    }
    if !d.alerts.is_empty() {
        println!();
        println!("--- Alerts ---");
        for alert in &d.alerts {
            println!("ALERT: {alert}");
        }
    }
    println!();
    println!("--- Rationale ---");
    for line in &d.rationale {
        println!("{line}");
    }
    println!();
}

fn print_regime(r: &RegimeAnalysis) {
    let s = &r.summary;
    println!();
    println!("=== Regime ===");
    println!("State:          {}", s.state);
    println!("Signal type:    {}", s.signal_type);
    println!("Signal:         {} ({:.0}% confidence)", s.signal, s.confidence);
    println!(
        "Trade allowed:  {}",
        if s.trade_allowed { "yes" } else { "no" }
    );
    println!("Reason:         {}", s.reason);
    println!(
        "Weights:        MACD {:.0} / ADX {:.0} / RSI {:.0}",
        r.weights.macd, r.weights.adx, r.weights.rsi
    );
    if let Some(ex) = &r.exhaustion {
        let signs: Vec<String> = ex.signs.iter().map(ToString::to_string).collect();
        println!(
            "Exhaustion:     {} ({})",
            if ex.exhausted { "yes" } else { "no" },
            if signs.is_empty() { "no signs".to_string() } else { signs.join(", ") }
        );
    }
    if let Some(zone) = &r.pullback {
        println!(
            "Pullback zone:  {:.5} - {:.5} ({} {:.0}%)",
            zone.low, zone.high, zone.direction, zone.confidence
        );
    }
    println!();
}

fn print_quick(q: &QuickAssessment) {
    println!();
    println!("=== Quick Assessment ===");
    println!("Signal:         {} @ {:.0}%", q.signal, q.probability * 100.0);
    println!("Quick call:     {}", q.quick_call);
    println!("MACD trend:     {}", q.trend);
    println!(
        "Dual trend:     {} -> {}",
        q.dual_trend.alignment, q.dual_trend.recommendation
    );
    println!(
        "Reliability:    {} ({})",
        q.reliability.category, q.reliability.action
    );
    println!("Condition:      {}", q.conditions.condition);
    println!("Volatility:     {:.2}%", q.volatility_pct);
    println!("RSI / ADX:      {:.1} / {:.1}", q.oscillator, q.trend_strength);
    if let Some(class) = q.asset_class {
        println!("Asset class:    {class:?}");
    }
    println!("Rule:           {}", q.rule);
    println!();
}
