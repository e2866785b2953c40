use actix_web::{web, HttpResponse};

use db::concordance::clamp_search_limit;
use db::models::{Book, Chapter, Verse, VerseReference};
use db::{Concordance, DbConnection, DbError};

use crate::controllers::SearchParams;
use crate::error::Error;
use crate::ServerData;

pub const MISSING_SEARCH_TERM: &str = "Parámetro de búsqueda requerido (q)";
pub const INVALID_SEARCH_PARAMS: &str = "Parámetros de búsqueda inválidos";

/// Result for JSON response handlers
type JsonResult<T> = Result<web::Json<T>, Error>;

/// Runs one lookup on the blocking pool with a pooled connection.
///
/// The connection goes back to the pool when the closure returns.
async fn query<T, F>(data: &ServerData, f: F) -> Result<T, Error>
where
    F: FnOnce(&mut DbConnection) -> Result<T, DbError> + Send + 'static,
    T: Send + 'static,
{
    let pool = data.db.clone();
    let result = web::block(move || -> Result<T, DbError> {
        let mut conn = pool.get()?;
        f(&mut *conn)
    })
    .await?;

    Ok(result?)
}

/// Handles `GET /api/libros`.
pub async fn all_books<C>(data: web::Data<ServerData>) -> JsonResult<Vec<Book>>
where
    C: Concordance,
{
    Ok(web::Json(query(&data, C::all_books).await?))
}

/// Handles `GET /api/libros/{id}`.
pub async fn book<C>(data: web::Data<ServerData>, params: web::Path<(i32,)>) -> JsonResult<Book>
where
    C: Concordance,
{
    let (id,) = params.into_inner();
    Ok(web::Json(query(&data, move |conn| C::book(id, conn)).await?))
}

/// Handles `GET /api/libros/{id}/capitulos`.
pub async fn chapters<C>(
    data: web::Data<ServerData>,
    params: web::Path<(i32,)>,
) -> JsonResult<Vec<Chapter>>
where
    C: Concordance,
{
    let (book_id,) = params.into_inner();
    Ok(web::Json(
        query(&data, move |conn| C::chapters(book_id, conn)).await?,
    ))
}

/// Handles `GET /api/capitulos/{id}`.
pub async fn chapter<C>(
    data: web::Data<ServerData>,
    params: web::Path<(i32,)>,
) -> JsonResult<Chapter>
where
    C: Concordance,
{
    let (id,) = params.into_inner();
    Ok(web::Json(query(&data, move |conn| C::chapter(id, conn)).await?))
}

/// Handles `GET /api/capitulos/{id}/versiculos`.
pub async fn verses<C>(
    data: web::Data<ServerData>,
    params: web::Path<(i32,)>,
) -> JsonResult<Vec<Verse>>
where
    C: Concordance,
{
    let (chapter_id,) = params.into_inner();
    Ok(web::Json(
        query(&data, move |conn| C::verses(chapter_id, conn)).await?,
    ))
}

/// Handles `GET /api/versiculos/{id}`.
pub async fn verse<C>(data: web::Data<ServerData>, params: web::Path<(i32,)>) -> JsonResult<Verse>
where
    C: Concordance,
{
    let (id,) = params.into_inner();
    Ok(web::Json(query(&data, move |conn| C::verse(id, conn)).await?))
}

/// Handles `GET /api/versiculo/{libro}/{capitulo}/{versiculo}` (e.g. /api/versiculo/Juan/3/16).
pub async fn verse_by_reference<C>(
    data: web::Data<ServerData>,
    params: web::Path<(String, i32, i32)>,
) -> JsonResult<VerseReference>
where
    C: Concordance,
{
    let (book, chapter, verse) = params.into_inner();
    Ok(web::Json(
        query(&data, move |conn| {
            C::verse_by_reference(&book, chapter, verse, conn)
        })
        .await?,
    ))
}

/// Handles `GET /api/buscar?q=...&limit=...`.
///
/// `q` is required and non-empty. `limit` defaults to 20 and is clamped to
/// 1..=200.
pub async fn search<C>(
    data: web::Data<ServerData>,
    params: web::Query<SearchParams>,
) -> JsonResult<Vec<VerseReference>>
where
    C: Concordance,
{
    let SearchParams { q, limit } = params.into_inner();
    let term = match q {
        Some(q) if !q.is_empty() => q,
        _ => return Err(Error::BadRequest(MISSING_SEARCH_TERM)),
    };
    let limit = clamp_search_limit(limit);

    Ok(web::Json(
        query(&data, move |conn| C::search(&term, limit, conn)).await?,
    ))
}

/// Fallback for every unknown route.
pub async fn not_found() -> Result<HttpResponse, Error> {
    Err(Error::RouteNotFound)
}
