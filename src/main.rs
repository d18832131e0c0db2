//! Cluster points from a delimited text-file, then inspect the partition at any cluster-count.

use std::io::{self, BufRead, Write as _};
use std::path::PathBuf;

use agglomerative_clustering::loader::load_points_from_path;
use agglomerative_clustering::render::{glyph, render_ascii};
use agglomerative_clustering::{Config, Hierarchy, Linkage, MergeEngine, Metric};
use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// Agglomerative hierarchical clustering of points read from a file
#[derive(Parser)]
#[command(name = "agglomerative-clustering")]
#[command(version)]
#[command(about = "Agglomerative hierarchical clustering with a replayable merge history")]
struct Cli {
    /// File with one point per line, coordinates separated by `,` or `;`
    file: PathBuf,

    /// Point-to-point distance: euclidean, squared_euclidean or manhattan
    #[arg(short, long, default_value = "euclidean")]
    metric: Metric,

    /// Cluster-to-cluster distance: single, complete or average
    #[arg(short, long, default_value = "single")]
    linkage: Linkage,

    /// Stop merging once this many clusters remain (default: build the full hierarchy)
    #[arg(short = 'k', long)]
    clusters: Option<usize>,

    /// Show this cluster-count and exit, instead of asking interactively
    #[arg(short, long)]
    show: Option<usize>,

    /// Width of the rendered grid
    #[arg(long, default_value_t = 60)]
    width: usize,

    /// Height of the rendered grid
    #[arg(long, default_value_t = 20)]
    height: usize,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let points = load_points_from_path(&cli.file)
        .with_context(|| format!("failed to load {}", cli.file.display()))?;

    let mut config = Config::new(cli.metric, cli.linkage);
    if let Some(goal) = cli.clusters {
        config = config.with_goal_clusters(goal);
    }
    let hierarchy = MergeEngine::new(&points, config)
        .context("cannot start clustering")?
        .run();

    let mut stdout = io::stdout().lock();
    if let Some(count) = cli.show {
        if !show(&mut stdout, &hierarchy, count, cli.width, cli.height)? {
            anyhow::bail!("no clustering with {count} clusters was recorded");
        }
        return Ok(());
    }
    inspect(io::stdin().lock(), &mut stdout, &hierarchy, cli.width, cli.height)
}

/// Ask for cluster-counts until the user quits, showing each recorded one.
fn inspect(
    input: impl BufRead,
    out: &mut impl io::Write,
    hierarchy: &Hierarchy,
    width: usize,
    height: usize,
) -> anyhow::Result<()> {
    let counts: Vec<String> = hierarchy
        .history()
        .counts()
        .map(|count| count.to_string())
        .collect();
    if counts.is_empty() {
        writeln!(out, "Nothing was merged, there is nothing to inspect.")?;
        return Ok(());
    }

    let mut lines = input.lines();
    loop {
        write!(
            out,
            "Number of clusters to show ({} to {}, q to quit): ",
            counts.last().map_or("", String::as_str),
            counts.first().map_or("", String::as_str),
        )?;
        out.flush()?;
        let Some(line) = lines.next() else {
            writeln!(out)?;
            return Ok(());
        };
        let line = line?;
        let answer = line.trim();
        if answer.eq_ignore_ascii_case("q") {
            return Ok(());
        }
        match answer.parse::<usize>() {
            Ok(count) => {
                if !show(out, hierarchy, count, width, height)? {
                    writeln!(out, "Not found: no clustering with {count} clusters was recorded.")?;
                }
            }
            Err(_) => writeln!(out, "Please enter a whole number.")?,
        }
    }
}

/// Print the partition into `count` clusters. Returns `false` if it was never recorded.
fn show(
    out: &mut impl io::Write,
    hierarchy: &Hierarchy,
    count: usize,
    width: usize,
    height: usize,
) -> io::Result<bool> {
    let Some(clustering) = hierarchy.get(count) else {
        return Ok(false);
    };
    let config = hierarchy.config();
    writeln!(
        out,
        "{count} clusters ({} distance, {} linkage):",
        config.metric, config.linkage
    )?;
    for (cluster_ix, cluster) in clustering.iter().enumerate() {
        writeln!(
            out,
            "  [{}] {} points: {cluster}",
            glyph(cluster_ix),
            cluster.len()
        )?;
    }
    write!(
        out,
        "{}",
        render_ascii(hierarchy.points(), clustering, width, height)
    )?;
    Ok(true)
}
