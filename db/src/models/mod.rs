use diesel::prelude::*;
use serde_derive::{Deserialize, Serialize};

use crate::schema::{capitulos, libros, versiculos};

/// Model representing a book of the corpus.
#[derive(Clone, Debug, PartialEq, Queryable, Serialize, Deserialize)]
pub struct Book {
    pub id: i32,
    #[serde(rename = "nombre")]
    pub name: String,
}

/// Model representing a chapter, owned by a [Book].
#[derive(Clone, Debug, PartialEq, Queryable, Serialize, Deserialize)]
pub struct Chapter {
    pub id: i32,
    #[serde(rename = "libro_id")]
    pub book_id: i32,
    #[serde(rename = "numero")]
    pub number: i32,
}

/// Model representing a verse, owned by a [Chapter].
#[derive(Clone, Debug, PartialEq, Queryable, Serialize, Deserialize)]
pub struct Verse {
    pub id: i32,
    #[serde(rename = "capitulo_id")]
    pub chapter_id: i32,
    #[serde(rename = "numero")]
    pub number: i32,
    #[serde(rename = "texto")]
    pub text: String,
}

/// A verse joined with its chapter number and book name.
///
/// Returned by reference lookups and text searches.
#[derive(Clone, Debug, PartialEq, Queryable, Serialize, Deserialize)]
pub struct VerseReference {
    pub id: i32,
    #[serde(rename = "numero")]
    pub number: i32,
    #[serde(rename = "texto")]
    pub text: String,
    #[serde(rename = "capitulo")]
    pub chapter: i32,
    #[serde(rename = "libro")]
    pub book: String,
}

#[derive(Insertable)]
#[diesel(table_name = libros)]
pub(crate) struct NewBook<'a> {
    #[diesel(column_name = nombre)]
    pub name: &'a str,
}

#[derive(Insertable)]
#[diesel(table_name = capitulos)]
pub(crate) struct NewChapter {
    #[diesel(column_name = libro_id)]
    pub book_id: i32,
    #[diesel(column_name = numero)]
    pub number: i32,
}

#[derive(Insertable)]
#[diesel(table_name = versiculos)]
pub(crate) struct NewVerse<'a> {
    #[diesel(column_name = capitulo_id)]
    pub chapter_id: i32,
    #[diesel(column_name = numero)]
    pub number: i32,
    #[diesel(column_name = texto)]
    pub text: &'a str,
}
