use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use wikiqa::{build_index, evaluate, search};
use wikiqa_core::{Config, LineLimit, RankingMode, DEFAULT_TOP_K, NO_ANSWER};

#[derive(Parser)]
#[command(name = "wikiqa")]
#[command(about = "Answer trivia questions from a Wikipedia dump", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct IndexArgs {
    /// Directory holding the corpus files and the question file
    #[arg(long, default_value = "resources")]
    corpus: PathBuf,
    /// Only files whose name contains this are indexed
    #[arg(long, default_value = "enwiki")]
    filter: String,
    /// Index directory
    #[arg(long, default_value = "index")]
    index: PathBuf,
    /// Disable English stemming
    #[arg(long, default_value_t = false)]
    no_stem: bool,
    /// Lemmatize text before indexing and querying
    #[arg(long, default_value_t = false)]
    lemma: bool,
    /// Extra form<TAB>lemma entries for the lemmatizer
    #[arg(long)]
    lemma_file: Option<PathBuf>,
    /// Body lines kept per document, -1 for all
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    max_lines: i64,
}

#[derive(Args)]
struct RankArgs {
    /// Ranking function: boolean or tfidf
    #[arg(long, default_value_t = RankingMode::Boolean)]
    ranking: RankingMode,
    /// Number of results to return
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the corpus and write a fresh index
    Build {
        #[command(flatten)]
        index: IndexArgs,
    },
    /// Run a single query against the index
    Search {
        #[command(flatten)]
        index: IndexArgs,
        #[command(flatten)]
        rank: RankArgs,
        /// Rebuild the index before searching
        #[arg(long, default_value_t = false)]
        rebuild: bool,
        query: String,
    },
    /// Answer every question of the question file and report accuracy
    Evaluate {
        #[command(flatten)]
        index: IndexArgs,
        #[command(flatten)]
        rank: RankArgs,
        /// Rebuild the index before evaluating
        #[arg(long, default_value_t = false)]
        rebuild: bool,
        /// Question file name (matched as a substring inside the corpus directory)
        #[arg(long, default_value = "questions.txt")]
        questions: String,
        /// Also compute mean reciprocal rank
        #[arg(long, default_value_t = false)]
        mrr: bool,
        /// Print the report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn config_from(index: IndexArgs) -> Result<Config> {
    Ok(Config {
        corpus_dir: index.corpus,
        corpus_filter: index.filter,
        index_dir: index.index,
        use_stemming: !index.no_stem,
        use_lemmatization: index.lemma,
        lemma_file: index.lemma_file,
        max_lines_per_document: LineLimit::try_from(index.max_lines)?,
        ..Config::default()
    })
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { index } => {
            let config = Config { rebuild_index: true, ..config_from(index)? };
            config.validate()?;
            let index = build_index(&config)?;
            println!("indexed {} documents, {} terms", index.num_docs(), index.num_terms());
        }
        Commands::Search { index, rank, rebuild, query } => {
            let config = Config {
                rebuild_index: rebuild,
                ranking_mode: rank.ranking,
                top_k: rank.top_k,
                ..config_from(index)?
            };
            let hits = search(&config, &query)?;
            if hits.is_empty() {
                println!("{NO_ANSWER}");
            }
            for (i, (title, score)) in hits.iter().enumerate() {
                println!("{:>3}. {title} ({score:.4})", i + 1);
            }
        }
        Commands::Evaluate { index, rank, rebuild, questions, mrr, json } => {
            let config = Config {
                rebuild_index: rebuild,
                ranking_mode: rank.ranking,
                top_k: rank.top_k,
                questions,
                compute_mrr: mrr,
                ..config_from(index)?
            };
            let report = evaluate(&config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for outcome in &report.outcomes {
                    println!("EXPECTED: {}", outcome.expected);
                    println!("ANSWER: {}", outcome.produced);
                    if let Some(r) = outcome.rank {
                        println!("RANK: {r}");
                    }
                    println!();
                }
                println!("CORRECT: {} / {}", report.correct_count, report.total_questions);
                if let Some(mrr) = report.mrr {
                    println!("MRR: {mrr:.4}");
                }
            }
        }
    }
    Ok(())
}
