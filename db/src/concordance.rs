use diesel::prelude::*;
use diesel::result::Error;

use crate::fold_case;
use crate::models::*;
use crate::{DbError, Entity};

/// Default number of search results when the caller does not ask for a count.
pub const DEFAULT_SEARCH_LIMIT: i64 = 20;

/// Largest number of search results a single query may return.
pub const MAX_SEARCH_LIMIT: i64 = 200;

/// Clamps a requested search result count to `1..=MAX_SEARCH_LIMIT`.
pub fn clamp_search_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT)
}

/// Trait implemented by types that can look up books, chapters and verses.
///
/// Every function is a read. Implementations hold no state, so handlers pick
/// one at compile time (`api::book::<SqliteConcordance>`) and tests swap in
/// their own.
pub trait Concordance: 'static {
    /// Gets all books, ordered by id.
    fn all_books(conn: &mut SqliteConnection) -> Result<Vec<Book>, DbError>;

    /// Gets one book by id.
    fn book(id: i32, conn: &mut SqliteConnection) -> Result<Book, DbError>;

    /// Gets the chapters of a book, ordered by chapter number.
    ///
    /// Fails with `NotFound` when the book itself does not exist.
    fn chapters(book_id: i32, conn: &mut SqliteConnection) -> Result<Vec<Chapter>, DbError>;

    /// Gets one chapter by id.
    fn chapter(id: i32, conn: &mut SqliteConnection) -> Result<Chapter, DbError>;

    /// Gets the verses of a chapter, ordered by verse number.
    ///
    /// Fails with `NotFound` when the chapter itself does not exist.
    fn verses(chapter_id: i32, conn: &mut SqliteConnection) -> Result<Vec<Verse>, DbError>;

    /// Gets one verse by id.
    fn verse(id: i32, conn: &mut SqliteConnection) -> Result<Verse, DbError>;

    /// Looks up a verse by book name, chapter number and verse number.
    ///
    /// The book name is compared case-insensitively, so `génesis` finds
    /// `Génesis`.
    fn verse_by_reference(
        book_name: &str,
        chapter: i32,
        verse: i32,
        conn: &mut SqliteConnection,
    ) -> Result<VerseReference, DbError>;

    /// Finds verses whose text contains `term`, ignoring case.
    ///
    /// `term` is matched literally: `%` and `_` are not wildcards. Results
    /// are in corpus order and capped at `limit` rows.
    fn search(
        term: &str,
        limit: i64,
        conn: &mut SqliteConnection,
    ) -> Result<Vec<VerseReference>, DbError>;
}

/// Main implementation for the [Concordance](crate::concordance::Concordance) trait.
pub struct SqliteConcordance;

/// Maps a diesel error to `NotFound` for the given entity, or a generic database error.
fn lookup_err(entity: Entity) -> impl Fn(Error) -> DbError {
    move |e| match e {
        Error::NotFound => DbError::NotFound { entity },
        e => DbError::Other {
            cause: e.to_string(),
        },
    }
}

/// Escapes LIKE metacharacters so the term matches literally.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl Concordance for SqliteConcordance {
    fn all_books(conn: &mut SqliteConnection) -> Result<Vec<Book>, DbError> {
        use crate::schema::libros::dsl::*;

        Ok(libros.order_by(id).load(conn)?)
    }

    fn book(book_id: i32, conn: &mut SqliteConnection) -> Result<Book, DbError> {
        use crate::schema::libros::dsl::*;

        libros
            .find(book_id)
            .first(conn)
            .map_err(lookup_err(Entity::Book))
    }

    fn chapters(book_id: i32, conn: &mut SqliteConnection) -> Result<Vec<Chapter>, DbError> {
        use crate::schema::capitulos as c;

        let chapters: Vec<Chapter> = c::table
            .filter(c::libro_id.eq(book_id))
            .order_by((c::numero.asc(), c::id.asc()))
            .load(conn)?;

        // An empty list is only an answer if the book exists
        if chapters.is_empty() {
            Self::book(book_id, conn)?;
        }
        Ok(chapters)
    }

    fn chapter(chapter_id: i32, conn: &mut SqliteConnection) -> Result<Chapter, DbError> {
        use crate::schema::capitulos::dsl::*;

        capitulos
            .find(chapter_id)
            .first(conn)
            .map_err(lookup_err(Entity::Chapter))
    }

    fn verses(chapter_id: i32, conn: &mut SqliteConnection) -> Result<Vec<Verse>, DbError> {
        use crate::schema::versiculos as v;

        let verses: Vec<Verse> = v::table
            .filter(v::capitulo_id.eq(chapter_id))
            .order_by((v::numero.asc(), v::id.asc()))
            .load(conn)?;

        if verses.is_empty() {
            Self::chapter(chapter_id, conn)?;
        }
        Ok(verses)
    }

    fn verse(verse_id: i32, conn: &mut SqliteConnection) -> Result<Verse, DbError> {
        use crate::schema::versiculos::dsl::*;

        versiculos
            .find(verse_id)
            .first(conn)
            .map_err(lookup_err(Entity::Verse))
    }

    fn verse_by_reference(
        book_name: &str,
        chapter: i32,
        verse: i32,
        conn: &mut SqliteConnection,
    ) -> Result<VerseReference, DbError> {
        use crate::schema::capitulos as c;
        use crate::schema::libros as l;
        use crate::schema::versiculos as v;

        v::table
            .inner_join(c::table.inner_join(l::table))
            .filter(fold_case(l::nombre).eq(book_name.to_lowercase()))
            .filter(c::numero.eq(chapter))
            .filter(v::numero.eq(verse))
            .select((v::id, v::numero, v::texto, c::numero, l::nombre))
            .order_by(v::id)
            .first::<VerseReference>(conn)
            .map_err(lookup_err(Entity::Verse))
    }

    fn search(
        term: &str,
        limit: i64,
        conn: &mut SqliteConnection,
    ) -> Result<Vec<VerseReference>, DbError> {
        use crate::schema::capitulos as c;
        use crate::schema::libros as l;
        use crate::schema::versiculos as v;

        Ok(v::table
            .inner_join(c::table.inner_join(l::table))
            .filter(fold_case(v::texto).like(like_pattern(term)).escape('\\'))
            .select((v::id, v::numero, v::texto, c::numero, l::nombre))
            .order_by(v::id)
            .limit(limit)
            .load::<VerseReference>(conn)?)
    }
}
