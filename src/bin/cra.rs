use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use cra_rs::consent::DISCLAIMER;
use cra_rs::eval::{self, EvalSettings};
use cra_rs::{
    Config, ConsentPreference, ConsentState, FilePreferenceStore, HttpTransport, SearchClient,
    SearchState, aggregate, chart, storage,
};
use num_format::{Locale, ToFormattedString};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "cra",
    version,
    about = "Fetch, summarize, chart & evaluate Reddit post recommendations"
)]
struct Cli {
    /// Search endpoint URL (default http://127.0.0.1:8000/search).
    #[arg(long, env = "CRA_ENDPOINT", global = true)]
    endpoint: Option<String>,
    /// Request timeout in seconds (0 = wait forever).
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    /// Preferences file holding the consent flag.
    #[arg(long, env = "CRA_CONFIG_FILE", global = true)]
    config_file: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search posts about a topic (and optionally save, plot, and print stats).
    Search(SearchArgs),
    /// Show or record the disclaimer acknowledgement.
    Consent(ConsentArgs),
    /// Measure Precision@K / Similarity@K over a batch of queries.
    Eval(EvalArgs),
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Topic to search for (e.g., Bitcoin)
    #[arg(short, long)]
    topic: String,
    /// Maximum number of posts (blank or invalid falls back to 5)
    #[arg(short = 'n', long)]
    posts: Option<String>,
    /// Minimum upvotes (blank or invalid falls back to 0)
    #[arg(short = 'u', long)]
    min_upvotes: Option<String>,
    /// Save posts to file (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
    /// Create an upvotes chart at the given path (.svg or .png).
    #[arg(long)]
    plot: Option<PathBuf>,
    /// Width of the plot (default 900).
    #[arg(long, default_value_t = 900)]
    width: u32,
    /// Height of the plot (default 420).
    #[arg(long, default_value_t = 420)]
    height: u32,
    /// Print totals and the chart series.
    #[arg(long, default_value_t = false)]
    stats: bool,
    /// Print the derived view as JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Acknowledge the disclaimer for this run.
    #[arg(long, default_value_t = false)]
    acknowledge: bool,
    /// With --acknowledge: do not ask again.
    #[arg(long, default_value_t = false, requires = "acknowledge")]
    remember: bool,
}

#[derive(Args, Debug)]
struct ConsentArgs {
    /// Only print the current state.
    #[arg(long, default_value_t = false)]
    status: bool,
    /// Persist the acknowledgement.
    #[arg(long, default_value_t = false)]
    remember: bool,
}

#[derive(Args, Debug)]
struct EvalArgs {
    /// Queries separated by comma or semicolon (default: 10 common crypto topics)
    #[arg(short, long)]
    queries: Option<String>,
    /// Results requested per query.
    #[arg(short = 'n', long, default_value_t = eval::DEFAULT_N_RESULTS)]
    n_results: u32,
    /// Minimum upvotes passed to the service.
    #[arg(long, default_value_t = 0)]
    upvotes_min: u32,
    /// Similarity at or above which a post counts as relevant.
    #[arg(long, default_value_t = eval::DEFAULT_THRESHOLD)]
    threshold: f64,
    /// Cut-offs separated by comma (default 1,3,5,10,15,20)
    #[arg(long)]
    ks: Option<String>,
    /// Directory for eval_report.json and charts.
    #[arg(long)]
    out_dir: Option<PathBuf>,
    #[arg(long, default_value_t = 800)]
    width: u32,
    #[arg(long, default_value_t = 480)]
    height: u32,
}

fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn fmt_count(v: u64) -> String {
    v.to_formatted_string(&Locale::en)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut cfg = Config::from_env();
    if let Some(endpoint) = cli.endpoint {
        cfg.endpoint = endpoint;
    }
    if let Some(secs) = cli.timeout_secs {
        cfg.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    if let Some(path) = cli.config_file {
        cfg.consent_path = path;
    }

    match cli.cmd {
        Command::Search(args) => cmd_search(&cfg, args),
        Command::Consent(args) => cmd_consent(&cfg, args),
        Command::Eval(args) => cmd_eval(&cfg, args),
    }
}

fn cmd_search(cfg: &Config, args: SearchArgs) -> Result<()> {
    let mut consent = ConsentPreference::new(
        FilePreferenceStore::new(&cfg.consent_path),
        cfg.consent_key.as_str(),
    );
    if !consent.is_acknowledged() {
        if !args.acknowledge {
            eprintln!("{DISCLAIMER}\n");
            bail!("disclaimer not acknowledged; rerun with --acknowledge (add --remember to stop asking)");
        }
        consent.acknowledge(args.remember)?;
    }

    let mut client = SearchClient::new(HttpTransport::new(cfg)?);
    client.search_raw(
        &args.topic,
        args.posts.as_deref(),
        args.min_upvotes.as_deref(),
    )?;

    let (topic, payload) = match client.wait() {
        SearchState::Success { query, payload } => (query.topic().to_string(), payload.clone()),
        SearchState::Failed { message, .. } => bail!("{message}"),
        other => bail!("search did not complete: {other:?}"),
    };
    let view = aggregate::derive_view(&payload);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_posts(&topic, &view);
    }

    if let Some(path) = args.out.as_ref() {
        let fmt = match args.format {
            Some(OutFormat::Csv) => "csv",
            Some(OutFormat::Json) => "json",
            None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
        }
        .to_ascii_lowercase();
        match fmt.as_str() {
            "csv" => storage::save_csv(&payload.posts, path)?,
            "json" => storage::save_json(&payload.posts, path)?,
            other => bail!("unsupported format: {}", other),
        }
        eprintln!("Saved {} posts to {}", payload.posts.len(), path.display());
    }

    if let Some(plot_path) = args.plot.as_ref() {
        if view.chart_series.is_empty() {
            eprintln!("No posts to plot");
        } else {
            chart::plot_series(&view.chart_series, plot_path, args.width, args.height)?;
            eprintln!("Wrote plot to {}", plot_path.display());
        }
    }

    if args.stats {
        println!(
            "total upvotes={}  total comments={}  results={}",
            fmt_count(view.total_upvotes),
            fmt_count(view.total_comments),
            payload.total_results
        );
        for p in &view.chart_series {
            println!("{:>4}  {:>8}  {}", p.label, fmt_count(p.value), p.tooltip_title);
        }
    }

    Ok(())
}

fn print_posts(topic: &str, view: &cra_rs::DerivedView) {
    if view.display_posts.is_empty() {
        println!("No posts found about {topic}.");
        return;
    }
    println!("Top posts about {topic}\n");
    for (idx, p) in view.display_posts.iter().enumerate() {
        println!("#{} {}", idx + 1, p.title);
        let flair = p
            .flair
            .as_deref()
            .map(|f| format!(" [{f}]"))
            .unwrap_or_default();
        println!(
            "   r/{} • u/{}{} • {} upvotes • {} comments • relevance {:.2}",
            p.subreddit,
            p.author,
            flair,
            fmt_count(p.upvotes),
            fmt_count(p.num_comments),
            p.relevance_score
        );
        if !p.text.trim().is_empty() {
            println!("   {}", p.text.replace('\n', "\n   "));
        }
        if !p.url.is_empty() {
            println!("   {}", p.url);
        }
        println!();
    }
}

fn cmd_consent(cfg: &Config, args: ConsentArgs) -> Result<()> {
    let mut consent = ConsentPreference::new(
        FilePreferenceStore::new(&cfg.consent_path),
        cfg.consent_key.as_str(),
    );
    if args.status {
        let label = match consent.state() {
            ConsentState::Pending => "pending",
            ConsentState::Acknowledged => "acknowledged",
        };
        println!("{label}");
        return Ok(());
    }

    eprintln!("{DISCLAIMER}\n");
    consent.acknowledge(args.remember)?;
    if args.remember {
        eprintln!("Acknowledged; saved to {}", cfg.consent_path.display());
    } else {
        eprintln!("Acknowledged for this run only; pass --remember to stop being asked.");
    }
    Ok(())
}

fn cmd_eval(cfg: &Config, args: EvalArgs) -> Result<()> {
    let mut settings = EvalSettings {
        n_results: args.n_results,
        upvotes_min: args.upvotes_min,
        threshold: args.threshold,
        ..EvalSettings::default()
    };
    if let Some(q) = args.queries.as_deref() {
        settings.queries = parse_list(q);
    }
    if let Some(ks) = args.ks.as_deref() {
        settings.ks = parse_list(ks)
            .iter()
            .map(|k| {
                k.parse::<usize>()
                    .map_err(|_| anyhow::anyhow!("invalid --ks entry: {k:?}"))
            })
            .collect::<Result<Vec<_>>>()?;
    }
    if settings.queries.is_empty() {
        bail!("at least one query required");
    }
    if settings.ks.is_empty() {
        bail!("at least one K required");
    }

    let transport = HttpTransport::new(cfg)?;
    let report = eval::evaluate(&transport, &settings)?;

    for q in &report.queries {
        if let Some(e) = report.per_query.get(q) {
            let parts: Vec<String> = settings
                .ks
                .iter()
                .map(|k| {
                    let key = eval::precision_key(*k);
                    format!("{key}={:.2}", e.precision.get(&key).copied().unwrap_or(0.0))
                })
                .collect();
            println!("{q}: {}", parts.join(" "));
        }
    }
    for k in &settings.ks {
        let pk = eval::precision_key(*k);
        let sk = eval::similarity_key(*k);
        println!(
            "{pk:>6} {:.3}   {sk:>7} {:.3}",
            report.precision_per_k.get(&pk).copied().unwrap_or(0.0),
            report.similarity_per_k.get(&sk).copied().unwrap_or(0.0)
        );
    }

    if let Some(dir) = args.out_dir.as_ref() {
        for path in eval::write_outputs(&report, dir, args.width, args.height)? {
            eprintln!("Wrote {}", path.display());
        }
    }
    Ok(())
}
