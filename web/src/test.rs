use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use tempfile::TempDir;

use db::models::*;
use db::*;

use crate::controllers::{api, routes};
use crate::ServerData;

const CORPUS: &str = r#"{
    "books": [
        {
            "name": "Génesis",
            "chapters": [
                { "chapter": 1, "verses": {
                    "3": "Dijo Dios: Haya luz, y hubo luz.",
                    "1": "En el principio...",
                    "2": "La tierra era caos y vacío"
                } },
                { "chapter": 2, "verses": { "1": "Concluyéronse, pues, los cielos y la tierra" } }
            ]
        },
        {
            "name": "Éxodo",
            "chapters": [
                { "chapter": 1, "verses": { "1": "Estos son los nombres de los hijos de Israel" } },
                { "chapter": 2 }
            ]
        }
    ]
}"#;

/// A pool over a fresh database file holding `CORPUS`.
///
/// The directory must outlive the pool.
fn fixture_pool() -> (TempDir, SqliteConnectionPool) {
    let dir = tempfile::tempdir().expect("Could not create temp dir");
    let url = dir.path().join("biblia.db");
    let pool = build_pool(url.to_str().unwrap(), 2).expect("Could not build pool");

    let document: Document = serde_json::from_str(CORPUS).unwrap();
    load_document(&document, &mut pool.get().unwrap()).expect("Could not load corpus");

    (dir, pool)
}

/// Calls `uri` on an app backed by the concordance `C` and returns the status and JSON body.
async fn call<C: Concordance>(pool: SqliteConnectionPool, uri: &str) -> (StatusCode, Value) {
    let srv = test::init_service(
        App::new()
            .app_data(web::Data::new(ServerData { db: pool }))
            .configure(routes::<C>)
            .default_service(web::route().to(api::not_found)),
    )
    .await;

    let req = test::TestRequest::with_uri(uri).to_request();
    let resp = test::call_service(&srv, req).await;
    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;

    (status, body)
}

async fn get(uri: &str) -> (StatusCode, Value) {
    let (_dir, pool) = fixture_pool();
    call::<SqliteConcordance>(pool, uri).await
}

fn assert_error(body: &Value, message: &str) {
    assert_eq!(body, &json!({ "error": message }));
}

#[actix_web::test]
async fn all_books() {
    let (status, body) = get("/api/libros").await;
    assert_eq!(status, StatusCode::OK);

    let books: Vec<Book> = serde_json::from_value(body).unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0].name, "Génesis");
    assert_eq!(books[1].name, "Éxodo");
}

#[actix_web::test]
async fn book_by_id() {
    let (status, body) = get("/api/libros/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": 2, "nombre": "Éxodo" }));

    let (status, body) = get("/api/libros/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "Libro no encontrado");
}

#[actix_web::test]
async fn chapters_of_book() {
    let (status, body) = get("/api/libros/1/capitulos").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            { "id": 1, "libro_id": 1, "numero": 1 },
            { "id": 2, "libro_id": 1, "numero": 2 },
        ])
    );

    let (status, body) = get("/api/libros/99/capitulos").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "Libro no encontrado");
}

#[actix_web::test]
async fn chapter_by_id() {
    let (status, body) = get("/api/capitulos/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": 3, "libro_id": 2, "numero": 1 }));

    let (status, body) = get("/api/capitulos/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "Capítulo no encontrado");
}

#[actix_web::test]
async fn verses_of_chapter() {
    let (status, body) = get("/api/capitulos/1/versiculos").await;
    assert_eq!(status, StatusCode::OK);

    let verses: Vec<Verse> = serde_json::from_value(body).unwrap();
    assert_eq!(
        verses.iter().map(|v| v.number).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert!(verses.iter().all(|v| v.chapter_id == 1));

    // A chapter loaded without verses exists but is empty
    let (status, body) = get("/api/capitulos/4/versiculos").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = get("/api/capitulos/99/versiculos").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "Capítulo no encontrado");
}

#[actix_web::test]
async fn verse_by_id() {
    let (status, body) = get("/api/versiculos/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "id": 3,
            "capitulo_id": 1,
            "numero": 3,
            "texto": "Dijo Dios: Haya luz, y hubo luz."
        })
    );

    let (status, body) = get("/api/versiculos/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "Versículo no encontrado");
}

#[actix_web::test]
async fn verse_by_reference() {
    let (status, body) = get("/api/versiculo/G%C3%A9nesis/1/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "id": 1,
            "numero": 1,
            "texto": "En el principio...",
            "capitulo": 1,
            "libro": "Génesis"
        })
    );

    // Book names are matched without regard to case
    let (status, body) = get("/api/versiculo/%C3%A9xodo/1/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["libro"], "Éxodo");

    let (status, body) = get("/api/versiculo/G%C3%A9nesis/1/40").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "Versículo no encontrado");

    let (status, _) = get("/api/versiculo/Apocalipsis/1/1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn search() {
    // Exactly one verse
    let (status, body) = get("/api/buscar?q=HAYA%20LUZ").await;
    assert_eq!(status, StatusCode::OK);
    let results: Vec<VerseReference> = serde_json::from_value(body).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].book, "Génesis");
    assert_eq!(results[0].chapter, 1);
    assert_eq!(results[0].text, "Dijo Dios: Haya luz, y hubo luz.");

    // Limit caps the result count
    let (_, body) = get("/api/buscar?q=tierra").await;
    assert_eq!(body.as_array().unwrap().len(), 2);
    let (_, body) = get("/api/buscar?q=tierra&limit=1").await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    let (status, body) = get("/api/buscar?q=tierra&limit=0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // No match is an empty list, not an error
    let (status, body) = get("/api/buscar?q=zarza").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[actix_web::test]
async fn search_requires_a_term() {
    let (status, body) = get("/api/buscar").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, api::MISSING_SEARCH_TERM);

    let (status, _) = get("/api/buscar?q=&limit=5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get("/api/buscar?q=luz&limit=muchos").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, api::INVALID_SEARCH_PARAMS);
}

#[actix_web::test]
async fn malformed_path_parameter() {
    let (status, body) = get("/api/libros/uno").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error(&body, "Error interno del servidor");
}

#[actix_web::test]
async fn unknown_route() {
    let (status, body) = get("/api/salmos").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "Recurso no encontrado");
}

/// Concordance whose storage is always broken.
pub struct BrokenConcordance;

fn broken<T>() -> Result<T, DbError> {
    Err(DbError::Other {
        cause: "disk I/O error at /var/lib/biblia.db".to_string(),
    })
}

impl Concordance for BrokenConcordance {
    fn all_books(_: &mut DbConnection) -> Result<Vec<Book>, DbError> {
        broken()
    }

    fn book(_: i32, _: &mut DbConnection) -> Result<Book, DbError> {
        broken()
    }

    fn chapters(_: i32, _: &mut DbConnection) -> Result<Vec<Chapter>, DbError> {
        broken()
    }

    fn chapter(_: i32, _: &mut DbConnection) -> Result<Chapter, DbError> {
        broken()
    }

    fn verses(_: i32, _: &mut DbConnection) -> Result<Vec<Verse>, DbError> {
        broken()
    }

    fn verse(_: i32, _: &mut DbConnection) -> Result<Verse, DbError> {
        broken()
    }

    fn verse_by_reference(
        _: &str,
        _: i32,
        _: i32,
        _: &mut DbConnection,
    ) -> Result<VerseReference, DbError> {
        broken()
    }

    fn search(_: &str, _: i64, _: &mut DbConnection) -> Result<Vec<VerseReference>, DbError> {
        broken()
    }
}

#[actix_web::test]
async fn storage_failures_hide_details() {
    for uri in &[
        "/api/libros",
        "/api/libros/1",
        "/api/capitulos/1/versiculos",
        "/api/versiculo/Rut/1/1",
        "/api/buscar?q=luz",
    ] {
        let (_dir, pool) = fixture_pool();
        let (status, body) = call::<BrokenConcordance>(pool, uri).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        assert_error(&body, "Error interno del servidor");
    }
}
