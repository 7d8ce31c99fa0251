//! Title extraction from LaTeX sources and name sanitization.
use std::fs;
use std::path::{Path, PathBuf};

/// Preferred entrypoint file of an Overleaf project.
pub(crate) const MAIN_TEX: &str = "main.tex";

/// Maximum length GitLab accepts for a project name or path.
const GITLAB_NAME_MAX: usize = 255;

/// Extract the document title from a project directory.
///
/// Looks for the first `\title{...}` command, preferring `main.tex`,
/// then the remaining top-level `.tex` files in sorted order. Returns
/// `None` when no file declares a title; the caller falls back to the
/// project hash.
pub fn find_title(dir: &Path) -> std::io::Result<Option<String>> {
    let main_path = dir.join(MAIN_TEX);
    if main_path.is_file() {
        if let Some(title) = title_from_file(&main_path)? {
            return Ok(Some(title));
        }
    }
    for path in tex_files(dir)? {
        if path.file_name().is_some_and(|n| n == MAIN_TEX) {
            continue;
        }
        if let Some(title) = title_from_file(&path)? {
            return Ok(Some(title));
        }
    }
    Ok(None)
}

/// The primary document the build pipeline should compile.
///
/// `main.tex` when present, otherwise the first top-level `.tex` file
/// in sorted order, otherwise `main.tex` as a last resort.
pub fn primary_document(dir: &Path) -> std::io::Result<String> {
    if dir.join(MAIN_TEX).is_file() {
        return Ok(MAIN_TEX.to_string());
    }
    let first = tex_files(dir)?
        .into_iter()
        .next()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()));
    Ok(first.unwrap_or_else(|| MAIN_TEX.to_string()))
}

/// Top-level `.tex` files of a directory, sorted for determinism.
fn tex_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|e| e == "tex"))
        .collect();
    files.sort();
    Ok(files)
}

/// Extract the title declared in one TeX file, if any.
fn title_from_file(path: &Path) -> std::io::Result<Option<String>> {
    let raw = fs::read(path)?;
    let content = String::from_utf8_lossy(&raw);
    let mut buf = String::new();
    for line in content.lines() {
        let line = strip_comment(line).trim();
        if !line.is_empty() {
            buf.push_str(line);
            buf.push(' ');
        }
    }
    let title = find_title_command(&buf)
        .map(flatten_latex)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    Ok(title)
}

/// Strip the comment portion of one line of TeX source.
///
/// A comment starts at the first `%` not escaped by a backslash.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'%' && (i == 0 || bytes[i - 1] != b'\\') {
            return &line[..i];
        }
    }
    line
}

/// Find the argument of the first `\title{...}` command in `buf`.
///
/// Skips lookalike commands such as `\titlepage` or `\titleformat`; an
/// optional `[short title]` argument is tolerated.
fn find_title_command(buf: &str) -> Option<&str> {
    let marker = "\\title";
    let mut offset = 0;
    while let Some(pos) = buf[offset..].find(marker) {
        let after = offset + pos + marker.len();
        let mut rest = buf[after..].trim_start();
        if let Some(stripped) = rest.strip_prefix('[') {
            rest = match stripped.find(']') {
                Some(end) => stripped[end + 1..].trim_start(),
                None => "",
            };
        }
        if rest.starts_with('{') {
            if let Some(inner) = brace_group(rest) {
                return Some(inner);
            }
        }
        offset = after;
    }
    None
}

/// The content of the first balanced brace group in `text`.
///
/// Escaped `\{` and `\}` do not affect nesting depth. Returns `None`
/// when braces do not balance.
fn brace_group(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut start = None;
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        let escaped = i > 0 && bytes[i - 1] == b'\\';
        match b {
            b'{' if !escaped => {
                if start.is_none() {
                    start = Some(i + 1);
                }
                depth += 1;
            }
            b'}' if !escaped => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start?..i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Reduce LaTeX markup inside a title to plain text.
///
/// Command tokens are dropped, brace groups are unwrapped, `\\` and
/// `~` become spaces.
fn flatten_latex(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some('\\') => {
                    chars.next();
                    out.push(' ');
                }
                Some(next) if next.is_ascii_alphabetic() => {
                    while chars.peek().is_some_and(|n| n.is_ascii_alphabetic()) {
                        chars.next();
                    }
                }
                Some(&escaped) => {
                    chars.next();
                    out.push(escaped);
                }
                None => {}
            },
            '{' | '}' => {}
            '~' => out.push(' '),
            other => out.push(other),
        }
    }
    out
}

/// Clamp a display name to GitLab's maximum name length.
///
/// Cuts on a char boundary so multi-byte titles stay valid UTF-8.
pub fn clamp_name(text: &str) -> String {
    if text.len() <= GITLAB_NAME_MAX {
        return text.to_string();
    }
    let mut end = GITLAB_NAME_MAX;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].trim_end().to_string()
}

/// Sanitize a title into a repository-safe kebab-case identifier.
///
/// Unsafe characters are stripped, whitespace and separator runs
/// collapse to a single hyphen, the result is lowercased and truncated
/// to GitLab's maximum name length. Idempotent: sanitizing an already
/// sanitized string yields the same string.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_sep = false;
    for c in text.trim().chars() {
        if c.is_whitespace() || c == '-' || c == '_' {
            pending_sep = !out.is_empty();
        } else if c.is_ascii_alphanumeric() {
            if pending_sep {
                out.push('-');
                pending_sep = false;
            }
            out.push(c.to_ascii_lowercase());
        }
    }
    out.truncate(GITLAB_NAME_MAX);
    while out.ends_with('-') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    /// Write a fixture file into `dir`.
    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut f = File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn slugify_kebab_cases_titles() {
        assert_eq!(slugify("My Thesis 2024"), "my-thesis-2024");
    }

    #[test]
    fn slugify_is_idempotent() {
        for raw in ["My Thesis 2024", "Planck: Results, Paper I", "  a _ b  "] {
            let once = slugify(raw);
            assert_eq!(slugify(&once), once);
        }
    }

    #[test]
    fn slugify_strips_unsafe_characters() {
        assert_eq!(slugify("Planck: Results, Paper I"), "planck-results-paper-i");
        assert_eq!(slugify("a/b\\c"), "abc");
        assert_eq!(slugify("déjà vu"), "dj-vu");
        assert_eq!(slugify("___"), "");
    }

    #[test]
    fn clamp_name_respects_limit_and_char_boundaries() {
        let short = "My Thesis 2024";
        assert_eq!(clamp_name(short), short);
        let long = "a".repeat(300);
        assert_eq!(clamp_name(&long).len(), 255);
        let wide = "é".repeat(200);
        let clamped = clamp_name(&wide);
        assert!(clamped.len() <= 255);
        assert!(clamped.chars().all(|c| c == 'é'));
    }

    #[test]
    fn slugify_truncates_long_titles() {
        let long = "a ".repeat(400);
        let slug = slugify(&long);
        assert!(slug.len() <= 255);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn strips_comments_but_not_escaped_percent() {
        assert_eq!(strip_comment("text % comment"), "text ");
        assert_eq!(strip_comment("% all comment"), "");
        assert_eq!(strip_comment("100\\% sure"), "100\\% sure");
    }

    #[test]
    fn brace_group_matches_nested_braces() {
        assert_eq!(brace_group("{A {nested} title} rest"), Some("A {nested} title"));
        assert_eq!(brace_group("{unbalanced"), None);
        assert_eq!(brace_group("no braces"), None);
    }

    #[test]
    fn finds_title_skipping_lookalikes_and_comments() {
        let buf = "\\titleformat{\\section} \\title{My Thesis 2024} \\titlepage";
        assert_eq!(find_title_command(buf), Some("My Thesis 2024"));
    }

    #[test]
    fn finds_title_with_short_form() {
        let buf = "\\title[Short]{The Long Title}";
        assert_eq!(find_title_command(buf), Some("The Long Title"));
    }

    #[test]
    fn flattens_markup_in_titles() {
        assert_eq!(flatten_latex("\\textbf{Bold} Title"), "Bold Title");
        assert_eq!(flatten_latex("A\\\\B"), "A B");
        assert_eq!(flatten_latex("Tilde~Spaced"), "Tilde Spaced");
        assert_eq!(flatten_latex("50\\% Done"), "50% Done");
    }

    #[test]
    fn prefers_main_tex_over_sorted_order() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "aaa.tex", "\\title{Wrong One}");
        write_file(dir.path(), "main.tex", "% preamble\n\\title{My Thesis 2024}\n");
        let title = find_title(dir.path()).unwrap();
        assert_eq!(title.as_deref(), Some("My Thesis 2024"));
        assert_eq!(primary_document(dir.path()).unwrap(), "main.tex");
    }

    #[test]
    fn scans_other_tex_files_when_main_has_no_title() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "main.tex", "\\input{chapters/intro}\n");
        write_file(dir.path(), "thesis.tex", "\\title{Found Elsewhere}");
        let title = find_title(dir.path()).unwrap();
        assert_eq!(title.as_deref(), Some("Found Elsewhere"));
    }

    #[test]
    fn missing_title_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "notes.txt", "no tex here");
        assert_eq!(find_title(dir.path()).unwrap(), None);
        assert_eq!(primary_document(dir.path()).unwrap(), "main.tex");
    }

    #[test]
    fn primary_document_falls_back_to_sorted_tex() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "zeta.tex", "");
        write_file(dir.path(), "alpha.tex", "");
        assert_eq!(primary_document(dir.path()).unwrap(), "alpha.tex");
    }

    #[test]
    fn commented_titles_are_ignored() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "main.tex",
            "% \\title{Commented Out}\n\\title{Real Title}\n",
        );
        let title = find_title(dir.path()).unwrap();
        assert_eq!(title.as_deref(), Some("Real Title"));
    }
}
