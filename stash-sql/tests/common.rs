#![allow(dead_code)]
//! Shared helpers for `stash-sql` integration tests.

use stash_sql::*;

pub fn translate(query: &str) -> Translation {
    Translator::new().translate(query, None)
}

pub fn translate_with(query: &str, status: &str) -> Translation {
    Translator::new().translate(query, Some(status))
}

pub fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

pub fn placeholders(sql: &str) -> usize {
    sql.matches('?').count()
}

pub fn assert_well_formed(translation: &Translation) {
    assert_eq!(
        placeholders(&translation.sql),
        translation.params.len(),
        "placeholder mismatch in {translation:?}"
    );
}
