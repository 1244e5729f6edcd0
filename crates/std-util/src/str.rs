use heck::ToSnakeCase;

pub fn snake_case(src: &str) -> String {
    src.to_snake_case()
}

pub fn pluralize(src: &str) -> String {
    pluralizer::pluralize(src, 2, false)
}

pub fn singularize(src: &str) -> String {
    pluralizer::pluralize(src, 1, false)
}

/// Default table name for an entity type: pluralized snake case.
///
/// Only the last word is pluralized, so `BlogPost` becomes `blog_posts`.
pub fn table_name(entity: &str) -> String {
    let snake = snake_case(entity);
    match snake.rsplit_once('_') {
        Some((head, last)) => format!("{head}_{}", pluralize(last)),
        None => pluralize(&snake),
    }
}
