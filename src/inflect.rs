//! Name inflection for presenting: request names ("workspaces") map to record
//! types ("Workspace") and back to output keys ("workspaces"); association keys
//! are singularized for `<name>_id` / `<name>_ids`.

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
];

const UNCOUNTABLE: &[&str] = &["data", "equipment", "information", "metadata", "series", "species"];

/// Lowercase words of a type or request name joined by `_`: "TaskItem" and
/// "taskItem" both give "task_item"; names already in snake_case pass through.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

/// Record type spelling of a snake_case name: "task_item" -> "TaskItem".
pub fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Singularizes the last word of a snake_case identifier.
pub fn singularize(word: &str) -> String {
    let (head, last) = split_last_word(word);
    format!("{}{}", head, singularize_word(last))
}

/// Pluralizes the last word of a snake_case identifier.
pub fn pluralize(word: &str) -> String {
    let (head, last) = split_last_word(word);
    format!("{}{}", head, pluralize_word(last))
}

/// Record type for a presenting name: "task_items" -> "TaskItem".
pub fn classify(name: &str) -> String {
    to_pascal_case(&singularize(&to_snake_case(name)))
}

/// Output key for a record type or name: "TaskItem" -> "task_items".
pub fn tableize(name: &str) -> String {
    pluralize(&to_snake_case(name))
}

fn split_last_word(word: &str) -> (&str, &str) {
    match word.rfind('_') {
        Some(i) => (&word[..=i], &word[i + 1..]),
        None => ("", word),
    }
}

fn singularize_word(word: &str) -> String {
    let lower = word.to_lowercase();
    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((singular, _)) = IRREGULAR.iter().find(|(_, plural)| *plural == lower) {
        return (*singular).to_string();
    }
    if IRREGULAR.iter().any(|(singular, _)| *singular == lower) {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }
    for suffix in ["sses", "shes", "ches", "xes", "zzes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    match word.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => word.to_string(),
    }
}

fn pluralize_word(word: &str) -> String {
    let lower = word.to_lowercase();
    if word.is_empty() || UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == lower) {
        return (*plural).to_string();
    }
    if IRREGULAR.iter().any(|(_, plural)| *plural == lower) {
        return word.to_string();
    }
    // already plural
    if singularize_word(word) != word {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix('y') {
        let before_vowel = stem
            .chars()
            .last()
            .is_some_and(|c| "aeiou".contains(c));
        if !stem.is_empty() && !before_vowel {
            return format!("{stem}ies");
        }
    }
    if ["s", "sh", "ch", "x", "z"].iter().any(|s| word.ends_with(s)) {
        return format!("{word}es");
    }
    format!("{word}s")
}
