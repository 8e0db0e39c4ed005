use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use url::Url;
use wikiwalk_core::links::{LABEL_DELIMITER, clean_label};
use wikiwalk_core::report::{
    ReportFormat, WalkOutcome, WalkReport, extract_title, generate_json_report,
    generate_text_report, save_report,
};
use wikiwalk_core::score::target_tokens;
use wikiwalk_core::site::WIKIPEDIA_PREFIX;
use wikiwalk_core::traverse::DEFAULT_MAX_STEPS;
use wikiwalk_core::{
    EmbeddingTable, MaxSimilarityPolicy, Navigator, SelectionPolicy, Site, StepCallback, Strategy,
    UniformRandomPolicy, WalkConfig,
};
use wikiwalk_scanner::WikiClient;
use wikiwalk_scanner::fetcher::DEFAULT_TIMEOUT_SECS;

/// Everything needed to run a walk, apart from the strategy and the endpoints.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub site: String,
    pub config: WalkConfig,
    pub timeout_secs: u64,
    pub seed: Option<u64>,
    pub show_progress: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            site: WIKIPEDIA_PREFIX.to_string(),
            config: WalkConfig::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            seed: None,
            show_progress: false,
        }
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over the default level.
pub fn init_logging(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn print_banner() {
    println!("{}", "═".repeat(60).bright_blue().bold());
    println!("{}", "  WIKIWALK - playing the wiki game".bright_white().bold());
    println!("{}", "═".repeat(60).bright_blue().bold());
}

/// Map the shared walk flags onto options.
pub fn walk_options_from_args(args: &ArgMatches, quiet: bool) -> WalkOptions {
    let config = WalkConfig {
        max_steps: args
            .get_one::<usize>("max-steps")
            .copied()
            .unwrap_or(DEFAULT_MAX_STEPS),
        max_duration: args
            .get_one::<u64>("max-time")
            .map(|secs| Duration::from_secs(*secs)),
        fetch_retries: args.get_one::<u32>("retries").copied().unwrap_or(2),
        strict_locators: !args.get_flag("lenient"),
        ..WalkConfig::default()
    };

    WalkOptions {
        site: args
            .get_one::<String>("site")
            .cloned()
            .unwrap_or_else(|| WIKIPEDIA_PREFIX.to_string()),
        config,
        timeout_secs: args
            .get_one::<u64>("timeout")
            .copied()
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
        seed: args.get_one::<u64>("seed").copied(),
        // log lines already narrate every hop unless they are silenced
        show_progress: quiet,
    }
}

pub fn expand_model_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Load a model behind a spinner; this can take minutes for a full Wikipedia vocabulary.
pub fn load_model(path: &Path) -> Result<Arc<EmbeddingTable>> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!(
        "Loading word2vec model from {}. This may take a few minutes...",
        path.display()
    ));

    let loaded = EmbeddingTable::load(path);
    spinner.finish_and_clear();

    let table = loaded.with_context(|| format!("Failed to load model {}", path.display()))?;
    println!(
        "{} Loaded {} words ({} dimensions)",
        "✓".green().bold(),
        table.vocabulary_len(),
        table.dim()
    );
    Ok(Arc::new(table))
}

/// Render a report in the requested format.
pub fn render_report(report: &WalkReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(report)),
        ReportFormat::Json => Ok(generate_json_report(report)?),
    }
}

pub fn print_outcome(report: &WalkReport) {
    match &report.outcome {
        WalkOutcome::Found { steps } => println!(
            "{} Reached {} in {} steps",
            "✓".green().bold(),
            extract_title(&report.target).bright_white(),
            steps
        ),
        WalkOutcome::Unreachable { reason } => println!(
            "{} {} is unreachable: {}",
            "✗".red().bold(),
            extract_title(&report.target).bright_white(),
            reason
        ),
        WalkOutcome::Exhausted { steps, budget } => println!(
            "{} Gave up after {} steps, {} exhausted",
            "⚠".yellow().bold(),
            steps,
            budget
        ),
    }
}

/// Run one walk against the live site.
pub async fn run_walk(
    strategy: Strategy,
    start: &str,
    target: &str,
    model: Option<Arc<EmbeddingTable>>,
    options: &WalkOptions,
) -> Result<WalkReport> {
    let site = Site::new(&options.site)?;
    let client = WikiClient::with_timeout(options.timeout_secs)?;

    let spinner = options.show_progress.then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Walking from {}", extract_title(start)));
        pb
    });

    let report = match strategy {
        Strategy::Random => {
            let policy = options
                .seed
                .map(UniformRandomPolicy::seeded)
                .unwrap_or_default();
            drive(Navigator::new(client, policy), site, options, &spinner, start, target).await
        }
        Strategy::Semantic => {
            let table = model.ok_or_else(|| {
                anyhow!("The semantic strategy needs a word2vec model (--model)")
            })?;
            let policy = MaxSimilarityPolicy::new(table);
            drive(Navigator::new(client, policy), site, options, &spinner, start, target).await
        }
    };

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    report
}

async fn drive<P: SelectionPolicy>(
    navigator: Navigator<WikiClient, P>,
    site: Site,
    options: &WalkOptions,
    spinner: &Option<ProgressBar>,
    start: &str,
    target: &str,
) -> Result<WalkReport> {
    let mut navigator = navigator.with_site(site).with_config(options.config.clone());

    if let Some(pb) = spinner {
        let pb = pb.clone();
        let callback: StepCallback = Arc::new(move |step: usize, locator: &str| {
            pb.set_message(format!("step {}: {}", step, extract_title(locator)));
        });
        navigator = navigator.with_step_callback(callback);
    }

    Ok(navigator.walk(start, target).await?)
}

pub async fn handle_walk(args: &ArgMatches, quiet: bool) -> Result<()> {
    let strategy = args
        .get_one::<String>("strategy")
        .and_then(|s| Strategy::from_str(s))
        .unwrap_or(Strategy::Random);
    let start = args
        .get_one::<Url>("start")
        .ok_or_else(|| anyhow!("--start is required"))?;
    let target = args
        .get_one::<Url>("target")
        .ok_or_else(|| anyhow!("--target is required"))?;
    let format = args
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);
    let options = walk_options_from_args(args, quiet);

    let model = match (strategy, args.get_one::<String>("model")) {
        (Strategy::Semantic, Some(path)) => Some(load_model(&expand_model_path(path))?),
        _ => None,
    };

    let report = run_walk(strategy, start.as_str(), target.as_str(), model, &options).await?;
    print_outcome(&report);

    let rendered = render_report(&report, format)?;
    match args.get_one::<PathBuf>("output") {
        Some(path) => {
            save_report(&rendered, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("{} Report saved to {}", "✓".green().bold(), path.display());
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

/// Pick a strategy from the menu answer. Semantic is refused without a model.
pub fn parse_strategy_choice(choice: &str, model_loaded: bool) -> Option<Strategy> {
    match Strategy::from_str(choice)? {
        Strategy::Semantic if !model_loaded => None,
        strategy => Some(strategy),
    }
}

fn prompt<R: BufRead>(input: &mut R, msg: &str) -> Result<Option<String>> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;

    let mut response = String::new();
    if input.read_line(&mut response)? == 0 {
        return Ok(None);
    }
    Ok(Some(response.trim().to_string()))
}

pub async fn handle_play(args: &ArgMatches, quiet: bool) -> Result<()> {
    let options = walk_options_from_args(args, quiet);
    let model = match args.get_one::<String>("model") {
        Some(path) => Some(load_model(&expand_model_path(path))?),
        None => {
            println!(
                "{} No word2vec model specified, only the random strategy is available.",
                "ℹ".blue()
            );
            None
        }
    };

    println!("{}", "_____ Playing the wiki-game _____".bright_white().bold());
    println!("Press ctrl-c during a walk to abandon it, ctrl-d or 'quit' to leave.");

    let stdin = io::stdin();
    let mut input = stdin.lock();

    loop {
        let Some(choice) = prompt(&mut input, "Run 1-Random or 2-NLP model (enter 1 or 2):")? else {
            break;
        };
        if choice == "quit" || choice == "exit" {
            break;
        }
        let Some(strategy) = parse_strategy_choice(&choice, model.is_some()) else {
            println!("{} Invalid selection, retry.", "✗".red().bold());
            continue;
        };

        let Some(start) = prompt(&mut input, "Enter a start page:")? else {
            break;
        };
        let Some(target) = prompt(&mut input, "Enter a target page:")? else {
            break;
        };

        tokio::select! {
            result = run_walk(strategy, &start, &target, model.clone(), &options) => match result {
                Ok(report) => print_outcome(&report),
                Err(e) => error!("Walk from {} to {} failed: {:#}", start, target, e),
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                warn!("Walk from {} to {} abandoned", start, target);
            }
        }
    }

    Ok(())
}

/// Words to look up for a model query: article URLs contribute their title words.
pub fn lookup_words(query: &str) -> Vec<String> {
    if Url::parse(query).is_ok() {
        return target_tokens(query);
    }
    clean_label(query)
        .split(LABEL_DELIMITER)
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn handle_model(args: &ArgMatches) -> Result<()> {
    let path = args
        .get_one::<String>("model")
        .ok_or_else(|| anyhow!("--model is required"))?;
    let table = load_model(&expand_model_path(path))?;

    for query in args.get_many::<String>("WORDS").into_iter().flatten() {
        let words = lookup_words(query);
        let known = words.iter().filter(|w| table.contains(w)).count();

        println!("{}", query.bright_white().bold());
        for word in &words {
            match table.index_of(word) {
                Some(row) => println!("  {} {} (row {})", "✓".green(), word, row),
                None => println!("  {} {}", "✗".red(), word),
            }
        }
        if known == 0 {
            println!("  {}", "not usable as a semantic target".yellow());
        }
    }

    Ok(())
}
