use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use log::error;
use thiserror::Error;

use db::concordance::clamp_search_limit;
use db::{establish_connection, load_file, Concordance, DbError, SqliteConcordance};

/// Loads and queries the Biblia corpus database
#[derive(Parser)]
#[command(name = "biblia", version)]
struct Cli {
    /// SQLite database to use
    #[arg(long, env = "DATABASE_URL", default_value = "biblia.db")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replaces the stored corpus with the contents of a JSON document
    Load {
        #[arg(default_value = "json/biblia_jerusalen_1976.json")]
        file: PathBuf,
    },
    /// Prints one verse, e.g. `biblia verse Juan 3 16`
    Verse {
        book: String,
        chapter: i32,
        verse: i32,
    },
    /// Prints the verses that contain the given text
    Search {
        text: String,
        #[arg(long)]
        limit: Option<i64>,
    },
}

#[derive(Error, Debug)]
enum Failure {
    #[error("{0}")]
    Db(#[from] DbError),

    #[error("Could not write output: {0}")]
    Io(#[from] io::Error),
}

fn run(cli: Cli) -> Result<(), Failure> {
    let mut conn = establish_connection(&cli.database_url)?;
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Load { file } => {
            let summary = load_file(&file, &mut conn)?;
            writeln!(out, "Total libros: {}", summary.books)?;
            writeln!(out, "Total capítulos: {}", summary.chapters)?;
            writeln!(out, "Total versículos: {}", summary.verses)?;
            if summary.skipped_chapters > 0 || summary.skipped_verses > 0 {
                writeln!(
                    out,
                    "Omitidos: {} capítulos sin versículos, {} versículos",
                    summary.skipped_chapters, summary.skipped_verses
                )?;
            }
        }
        Command::Verse {
            book,
            chapter,
            verse,
        } => {
            let v = SqliteConcordance::verse_by_reference(&book, chapter, verse, &mut conn)?;
            writeln!(out, "{} {}:{}", v.book, v.chapter, v.number)?;
            writeln!(out, "{}", v.text)?;
        }
        Command::Search { text, limit } => {
            let results =
                SqliteConcordance::search(&text, clamp_search_limit(limit), &mut conn)?;
            for v in results {
                writeln!(out, "{} {}:{} {}", v.book, v.chapter, v.number, v.text)?;
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
