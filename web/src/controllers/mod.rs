use actix_web::error::{PathError, QueryPayloadError};
use actix_web::{web, HttpRequest};
use log::warn;
use serde_derive::Deserialize;

use db::Concordance;

use crate::error::Error;

/// Query parameters for the search endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

/// Path parameters that fail to parse are reported as internal errors.
fn path_error(e: PathError, req: &HttpRequest) -> actix_web::Error {
    warn!("Bad path parameters for {}: {}", req.path(), e);
    Error::Internal.into()
}

fn query_error(e: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    warn!("Bad query string for {}: {}", req.path(), e);
    Error::BadRequest(api::INVALID_SEARCH_PARAMS).into()
}

/// Registers the API under `/api`, backed by the concordance `C`.
pub fn routes<C: Concordance>(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PathConfig::default().error_handler(path_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .service(
            web::scope("/api")
                .route("/libros", web::get().to(api::all_books::<C>))
                .route("/libros/{id}", web::get().to(api::book::<C>))
                .route("/libros/{id}/capitulos", web::get().to(api::chapters::<C>))
                .route("/capitulos/{id}", web::get().to(api::chapter::<C>))
                .route(
                    "/capitulos/{id}/versiculos",
                    web::get().to(api::verses::<C>),
                )
                .route("/versiculos/{id}", web::get().to(api::verse::<C>))
                .route(
                    "/versiculo/{libro}/{capitulo}/{versiculo}",
                    web::get().to(api::verse_by_reference::<C>),
                )
                .route("/buscar", web::get().to(api::search::<C>)),
        );
}

pub mod api;
