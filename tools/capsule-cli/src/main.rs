use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy_primitives::Address;
use anyhow::{anyhow, bail, Context, Result};
use capsule_planner::{
    abi::{encode_approve, encode_create_capsule},
    remaining, CapsuleDraft, CountdownClock, Frequency, PeriodType, PlannerConfig, SystemClock,
    TokenList,
};
use capsule_types::{Asset, TokenRegistry};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tokio::sync::watch;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Plan a time capsule: validate the inputs, print the release schedule and the calls to submit.
///
/// Nothing is signed or sent; the output is meant for a wallet or a deployment script.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Planner configuration (JSON). Missing fields keep their defaults.
    #[arg(long, env = "CAPSULE_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a capsule and print its schedule plus encoded calls.
    Plan(PlanArgs),
    /// Show the time left until a distribution date.
    Countdown(CountdownArgs),
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// `immediate` or `staggered`.
    #[arg(long = "type", default_value = "immediate")]
    period_type: PeriodType,

    /// Distribution (start) date, mm/dd/yyyy.
    #[arg(long)]
    date: String,

    /// Release frequency for staggered capsules.
    #[arg(long, default_value = "monthly")]
    frequency: Frequency,

    /// Number of releases for staggered capsules.
    #[arg(long, default_value = "")]
    periods: String,

    /// Address receiving the assets.
    #[arg(long, env = "CAPSULE_BENEFICIARY")]
    beneficiary: String,

    /// Asset to lock, eg `ETH:1.5` or `0x6B17...1d0F:250`. Repeat for several; order is approval order.
    #[arg(long = "asset", value_name = "TOKEN:AMOUNT", value_parser = parse_asset)]
    assets: Vec<Asset>,

    /// Token list JSON (Uniswap token-list shape) used for symbols and decimals.
    #[arg(long, env = "CAPSULE_TOKEN_LIST")]
    tokens: Option<PathBuf>,

    /// Capsule contract address; when set, approval calldata is printed for every token.
    #[arg(long, env = "CAPSULE_CONTRACT")]
    capsule_contract: Option<Address>,

    /// Lock the asset set once the capsule is created.
    #[arg(long)]
    no_adding_assets: bool,
}

#[derive(Args, Debug)]
struct CountdownArgs {
    /// Distribution date (RFC 3339).
    #[arg(long)]
    target: String,

    /// Keep printing every tick until the capsule opens.
    #[arg(long)]
    watch: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Plan(args) => {
            let plan = plan(&args, &config)?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Command::Countdown(args) => countdown(&args, &config).await?,
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PlannerConfig> {
    let Some(path) = path else {
        return Ok(PlannerConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    PlannerConfig::from_json(&raw)
        .with_context(|| format!("failed parsing config JSON in {}", path.display()))
}

fn load_tokens(path: Option<&Path>) -> Result<TokenList> {
    let Some(path) = path else {
        return Ok(TokenList::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    TokenList::from_json(&raw).with_context(|| format!("invalid token list {}", path.display()))
}

fn parse_asset(raw: &str) -> Result<Asset, String> {
    let (token, amount) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("expected TOKEN:AMOUNT, got `{raw}`"))?;
    let token = token.parse().map_err(|e| format!("{e}"))?;
    Asset::new(token, amount.trim()).map_err(|e| format!("{e}"))
}

fn plan(args: &PlanArgs, config: &PlannerConfig) -> Result<Value> {
    let registry = load_tokens(args.tokens.as_deref())?;
    let draft = CapsuleDraft {
        period_type: args.period_type,
        distribution_date: args.date.clone(),
        frequency: args.frequency,
        period_count: args.periods.clone(),
        beneficiary: args.beneficiary.clone(),
        assets: args.assets.clone(),
        adding_assets_allowed: !args.no_adding_assets,
    };

    let validated = match draft.validate(OffsetDateTime::now_utc()) {
        Ok(validated) => validated,
        Err(errors) => {
            for (field, err) in errors.iter() {
                eprintln!("{field}: {err}");
            }
            bail!("capsule input is invalid");
        }
    };
    let schedule = validated.schedule;
    let releases = schedule
        .release_instants()?
        .into_iter()
        .map(|t| t.format(&Rfc3339))
        .collect::<Result<Vec<_>, _>>()
        .context("failed formatting release dates")?;

    let request = validated.into_request()?;
    debug!(?request, "validated capsule");
    let encoded = encode_create_capsule(&request, &registry)?;

    let approvals: Vec<Value> = match args.capsule_contract {
        Some(spender) => request
            .assets
            .iter()
            .filter(|asset| !asset.is_native())
            .map(|asset| {
                json!({
                    "token": asset.token.to_string(),
                    "symbol": registry.symbol(&asset.token),
                    "data": format!("0x{}", hex::encode(encode_approve(spender, config.approval_amount))),
                })
            })
            .collect(),
        None => Vec::new(),
    };

    Ok(json!({
        "schedule": {
            "period_type": schedule.period_type().to_string(),
            "frequency": schedule.frequency().map(|f| f.to_string()),
            "period_count": request.period_count,
            "period_size": request.period_size,
            "releases": releases,
        },
        "approvals": approvals,
        "create": {
            "beneficiary": request.beneficiary.as_str(),
            "data": format!("0x{}", hex::encode(&encoded.data)),
            "value": encoded.value.to_string(),
        },
    }))
}

async fn countdown(args: &CountdownArgs, config: &PlannerConfig) -> Result<()> {
    let target = OffsetDateTime::parse(&args.target, &Rfc3339)
        .map_err(|e| anyhow!("invalid --target `{}`: {e}", args.target))?;
    let units = config.countdown_units;

    if !args.watch {
        println!("{}", remaining(OffsetDateTime::now_utc(), target).render(units));
        return Ok(());
    }

    let clock = CountdownClock::new(target).with_interval(config.tick_interval());
    let (tx, mut rx) = watch::channel(clock.state_at(OffsetDateTime::now_utc()));
    let ticker = tokio::spawn(async move { clock.run(&SystemClock, tx).await });

    while rx.changed().await.is_ok() {
        let state = *rx.borrow_and_update();
        println!("{}", state.render(units));
        if state.is_open() {
            break;
        }
    }
    ticker.await.context("countdown task failed")?;
    Ok(())
}
