// src/mirror/rewrite.rs
// Points references inside a saved page at the local copies.

use std::collections::HashMap;

/// Relative link from one mirrored file to another.
///
/// HTML targets named `index.html` are linked as their directory
/// (`docs/index.html` -> `docs/`), so the mirror reads like the live site.
pub fn relative_link(from: &str, to: &str) -> String {
    let from_dirs: Vec<&str> = match from.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let to_parts: Vec<&str> = to.split('/').collect();
    let (to_dirs, file) = to_parts.split_at(to_parts.len() - 1);

    let common = from_dirs
        .iter()
        .zip(to_dirs.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut link = "../".repeat(from_dirs.len() - common);
    for dir in &to_dirs[common..] {
        link.push_str(dir);
        link.push('/');
    }

    if file[0] != "index.html" {
        link.push_str(file[0]);
    }
    if link.is_empty() {
        link.push_str("./");
    }
    link
}

/// Replaces `href`/`src` values found in `replacements`, in one pass.
///
/// Only attributes of real start tags are touched. Text, comments and the
/// bodies of `<script>`/`<style>` are copied through as they are. Keys are
/// attribute values as the parser returns them: entity-decoded and trimmed.
pub fn rewrite_references(html: &str, replacements: &HashMap<String, String>) -> String {
    let bytes = html.as_bytes();
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;

    while let Some(offset) = html[pos..].find('<') {
        let start = pos + offset;
        out.push_str(&html[pos..start]);

        if html[start..].starts_with("<!--") {
            let end = html[start..]
                .find("-->")
                .map(|i| start + i + 3)
                .unwrap_or(html.len());
            out.push_str(&html[start..end]);
            pos = end;
            continue;
        }

        // End tags, doctypes and stray '<' in text
        if !bytes.get(start + 1).is_some_and(|b| b.is_ascii_alphabetic()) {
            out.push('<');
            pos = start + 1;
            continue;
        }

        let (tag, end) = rewrite_start_tag(html, start, replacements, &mut out);
        pos = end;

        if tag.eq_ignore_ascii_case("script") || tag.eq_ignore_ascii_case("style") {
            let closing = format!("</{}", tag.to_ascii_lowercase());
            let body_end = html[pos..]
                .to_ascii_lowercase()
                .find(&closing)
                .map(|i| pos + i)
                .unwrap_or(html.len());
            out.push_str(&html[pos..body_end]);
            pos = body_end;
        }
    }

    out.push_str(&html[pos..]);
    out
}

// Copies one start tag beginning at `start` into `out`, substituting
// reference attributes. Returns the tag name and the index after the tag.
fn rewrite_start_tag<'h>(
    html: &'h str,
    start: usize,
    replacements: &HashMap<String, String>,
    out: &mut String,
) -> (&'h str, usize) {
    let bytes = html.as_bytes();
    let len = bytes.len();

    let mut i = start + 1;
    while i < len && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-') {
        i += 1;
    }
    let tag = &html[start + 1..i];
    out.push_str(&html[start..i]);

    loop {
        let gap = i;
        while i < len && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        out.push_str(&html[gap..i]);
        if i >= len {
            return (tag, len);
        }
        if bytes[i] == b'>' {
            out.push('>');
            return (tag, i + 1);
        }

        let name_start = i;
        while i < len && !bytes[i].is_ascii_whitespace() && !matches!(bytes[i], b'=' | b'>' | b'/') {
            i += 1;
        }
        let name = &html[name_start..i];
        out.push_str(name);

        let mut j = i;
        while j < len && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j >= len || bytes[j] != b'=' {
            // Attribute without a value
            continue;
        }
        j += 1;
        while j < len && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        out.push_str(&html[i..j]);
        i = j;

        let (value, quote, end) = match bytes.get(i) {
            Some(&q @ (b'"' | b'\'')) => {
                let close = html[i + 1..]
                    .find(q as char)
                    .map(|c| i + 1 + c)
                    .unwrap_or(len);
                (&html[i + 1..close], q as char, (close + 1).min(len))
            }
            _ => {
                let mut e = i;
                while e < len && !bytes[e].is_ascii_whitespace() && bytes[e] != b'>' {
                    e += 1;
                }
                (&html[i..e], '"', e)
            }
        };

        let local = if is_reference_attr(name) {
            lookup(value, replacements)
        } else {
            None
        };
        match local {
            Some(local) => {
                out.push(quote);
                out.push_str(local);
                out.push(quote);
            }
            None => out.push_str(&html[i..end]),
        }
        i = end;
    }
}

fn is_reference_attr(name: &str) -> bool {
    name.eq_ignore_ascii_case("href") || name.eq_ignore_ascii_case("src")
}

fn lookup<'r>(value: &str, replacements: &'r HashMap<String, String>) -> Option<&'r str> {
    let decoded = value.replace("&amp;", "&");
    replacements.get(decoded.trim()).map(String::as_str)
}
