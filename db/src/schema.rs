table! {
    libros (id) {
        id -> Integer,
        nombre -> Text,
    }
}

table! {
    capitulos (id) {
        id -> Integer,
        libro_id -> Integer,
        numero -> Integer,
    }
}

table! {
    versiculos (id) {
        id -> Integer,
        capitulo_id -> Integer,
        numero -> Integer,
        texto -> Text,
    }
}

joinable!(capitulos -> libros (libro_id));
joinable!(versiculos -> capitulos (capitulo_id));

allow_tables_to_appear_in_same_query!(libros, capitulos, versiculos);
