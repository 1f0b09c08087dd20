use sha2::{Digest, Sha256};

const MAX_SLUG_LEN: usize = 60;

/// URL- and filesystem-safe name for a template page: `{slug(title)}--{short_hash(id)}.md`.
///
/// The hash keys the file to the template id, so renamed titles with the same
/// id still land next to each other and different ids never collide.
pub fn deterministic_filename(title: &str, id: &str) -> String {
    format!("{}{}", slugify(title), id_suffix(id))
}

/// The id-derived tail shared by every name of one template: `--{short_hash(id)}.md`.
pub fn id_suffix(id: &str) -> String {
    format!("--{}.md", short_hash(id))
}

fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut prev_dash = true;
    for c in input.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        return "untitled".to_string();
    }
    if is_reserved_windows_name(slug) {
        return format!("{slug}_");
    }
    slug.to_string()
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
