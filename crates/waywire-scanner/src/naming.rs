//! Identifier helpers injected into templates.
//!
//! All functions are pure string transforms over protocol names such as
//! `wl_surface` or `set_buffer_scale`.

/// Words reserved in Rust, including edition-2024 and reserved-for-future
/// keywords.
const RESERVED: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "static", "struct", "super", "trait", "true", "try", "type", "typeof",
    "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// PascalCase concatenation: `exported(&["wl_surface", "frame"])` is
/// `WlSurfaceFrame`.
///
/// Underscores are word breaks and are removed. Any other character that is
/// not alphanumeric also starts a new word but is kept (`foo-bar` becomes
/// `Foo-Bar`). Only the first letter of each word changes case.
pub fn exported<S: AsRef<str>>(parts: &[S]) -> String {
    let mut out = String::new();
    for part in parts {
        for word in part.as_ref().split('_') {
            let mut boundary = true;
            for c in word.chars() {
                if boundary {
                    out.extend(c.to_uppercase());
                } else {
                    out.push(c);
                }
                boundary = !c.is_alphanumeric();
            }
        }
    }
    out
}

/// [`exported`] with the first letter lower-cased, made safe to use as a
/// binding name.
///
/// Reserved words get a trailing `_`; `error` becomes `err`.
pub fn unexported<S: AsRef<str>>(parts: &[S]) -> String {
    let name = exported(parts);
    let mut chars = name.chars();
    let mut out = match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect::<String>(),
        None => return name,
    };
    if out == "error" {
        out = "err".to_string();
    } else if RESERVED.contains(&out.as_str()) {
        out.push('_');
    }
    out
}

/// A protocol name used verbatim as a Rust identifier.
///
/// Reserved words get a trailing `_`; a leading digit gets a leading `_`.
pub fn ident(name: &str) -> String {
    if RESERVED.contains(&name) {
        format!("{name}_")
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{name}")
    } else {
        name.to_string()
    }
}

/// Upper-cased parts joined with `_`: `const_name(&["wl_shm", "format"])`
/// is `WL_SHM_FORMAT`.
pub fn const_name<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|part| part.as_ref().to_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Line comment block: every line trimmed and prefixed with `// `.
pub fn comment(text: &str) -> String {
    text.split('\n')
        .map(|line| format!("// {}", line.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
