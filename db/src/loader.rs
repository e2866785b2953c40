//! One-shot import of a corpus document into the database.
//!
//! The document is a JSON object shaped like
//!
//! ```json
//! { "books": [ { "name": "Génesis", "chapters": [ { "chapter": 1, "verses": { "1": "..." } } ] } ] }
//! ```
//!
//! Loading replaces the whole corpus: the tables are dropped and rebuilt
//! before any row is written.
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use diesel::prelude::*;
use log::{debug, info, warn};
use serde_derive::Deserialize;
use serde_json::{Map, Value};

use crate::models::{NewBook, NewChapter, NewVerse};
use crate::schema::{capitulos, libros, versiculos};
use crate::{reset_schema, DbError};

/// Verse numbers that get a progress sample in the log, besides the first.
const PROGRESS_EVERY: i32 = 50;

/// Root of a corpus document.
#[derive(Debug, Deserialize)]
pub struct Document {
    pub books: Vec<BookEntry>,
}

#[derive(Debug, Deserialize)]
pub struct BookEntry {
    pub name: String,
    #[serde(default)]
    pub chapters: Vec<ChapterEntry>,
}

/// A chapter as found in the document.
///
/// `verses` is kept untyped: a chapter with missing or malformed verses is
/// still loaded, just without verses.
#[derive(Debug, Deserialize)]
pub struct ChapterEntry {
    pub chapter: i32,
    #[serde(default)]
    pub verses: Value,
}

/// Counts of what a load wrote and skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub books: usize,
    pub chapters: usize,
    pub verses: usize,
    /// Chapters whose verse collection was absent or not an object.
    pub skipped_chapters: usize,
    /// Verses with a non-numeric key, a duplicate number or no text.
    pub skipped_verses: usize,
    /// Every data anomaly met during the load, as logged.
    pub warnings: Vec<String>,
}

impl LoadSummary {
    /// Logs a data anomaly and keeps it in the summary.
    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} books, {} chapters, {} verses",
            self.books, self.chapters, self.verses
        )?;
        if self.skipped_chapters > 0 || self.skipped_verses > 0 {
            write!(
                f,
                " ({} chapters without verses, {} verses skipped)",
                self.skipped_chapters, self.skipped_verses
            )?;
        }
        Ok(())
    }
}

/// Reads and parses a corpus document from disk, then loads it.
pub fn load_file<P: AsRef<Path>>(
    path: P,
    conn: &mut SqliteConnection,
) -> Result<LoadSummary, DbError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|e| DbError::Document {
        cause: format!("{}: {}", path.display(), e),
    })?;
    let document: Document = serde_json::from_str(&raw).map_err(|e| DbError::Document {
        cause: format!("{}: {}", path.display(), e),
    })?;

    info!("Loading {} books from {}", document.books.len(), path.display());
    load_document(&document, conn)
}

/// Replaces the stored corpus with the contents of `document`.
///
/// Rows are written parent before child, one insert at a time, inside a
/// single transaction: any database error leaves the tables empty.
pub fn load_document(
    document: &Document,
    conn: &mut SqliteConnection,
) -> Result<LoadSummary, DbError> {
    reset_schema(conn)?;

    let summary = conn.transaction::<_, DbError, _>(|conn| {
        let mut summary = LoadSummary::default();
        for book in &document.books {
            load_book(book, conn, &mut summary)?;
        }
        Ok(summary)
    })?;

    info!("Loaded {}", summary);
    Ok(summary)
}

fn load_book(
    book: &BookEntry,
    conn: &mut SqliteConnection,
    summary: &mut LoadSummary,
) -> Result<(), DbError> {
    info!("Loading book: {}", book.name);
    let book_id: i32 = diesel::insert_into(libros::table)
        .values(&NewBook { name: &book.name })
        .returning(libros::id)
        .get_result(conn)?;
    summary.books += 1;

    for chapter in &book.chapters {
        debug!("  Chapter: {}", chapter.chapter);
        let chapter_id: i32 = diesel::insert_into(capitulos::table)
            .values(&NewChapter {
                book_id,
                number: chapter.chapter,
            })
            .returning(capitulos::id)
            .get_result(conn)?;
        summary.chapters += 1;

        let verses = match chapter.verses {
            Value::Object(ref verses) => verses,
            _ => {
                summary.warn(format!(
                    "Book '{}', chapter {} has no valid verses; it is kept without verses",
                    book.name, chapter.chapter
                ));
                summary.skipped_chapters += 1;
                continue;
            }
        };

        for (number, text) in in_verse_order(&book.name, chapter.chapter, verses, summary) {
            if number == 1 || number % PROGRESS_EVERY == 0 {
                debug!("    Verse {}: {}...", number, preview(text));
            }
            diesel::insert_into(versiculos::table)
                .values(&NewVerse {
                    chapter_id,
                    number,
                    text,
                })
                .execute(conn)?;
            summary.verses += 1;
        }
    }

    Ok(())
}

/// Parses verse keys as numbers and orders the verses by them.
///
/// Object key order in the document is not meaningful, so `"10"` sorts after
/// `"9"` regardless of where either appears.
fn in_verse_order<'a>(
    book: &str,
    chapter: i32,
    verses: &'a Map<String, Value>,
    summary: &mut LoadSummary,
) -> BTreeMap<i32, &'a str> {
    let mut ordered = BTreeMap::new();

    for (key, value) in verses {
        let number = match key.trim().parse::<i32>() {
            Ok(n) => n,
            Err(_) => {
                summary.warn(format!(
                    "{} {}: verse key '{}' is not a number, skipped",
                    book, chapter, key
                ));
                summary.skipped_verses += 1;
                continue;
            }
        };
        let text = match value.as_str() {
            Some(t) if !t.is_empty() => t,
            _ => {
                summary.warn(format!("{} {}:{} has no text, skipped", book, chapter, number));
                summary.skipped_verses += 1;
                continue;
            }
        };
        if ordered.insert(number, text).is_some() {
            summary.warn(format!(
                "{} {}:{} appears more than once, keeping the last",
                book, chapter, number
            ));
            summary.skipped_verses += 1;
        }
    }

    ordered
}

/// First 30 characters of a verse, for progress output.
fn preview(text: &str) -> &str {
    match text.char_indices().nth(30) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}
