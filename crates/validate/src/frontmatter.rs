//! YAML frontmatter codec for Markdown artifacts.
//!
//! A file with frontmatter looks like:
//!
//! ```text
//! ---
//! name: reviewer
//! description: Reviews code
//! ---
//! Body text.
//! ```
//!
//! The metadata is the region between the opening `---` line and the next
//! line consisting only of `---`. Everything after that line is the body.
//! [`format`] always ends the file with one newline after the body and
//! [`parse`] removes exactly that newline, so `parse(format(m, b)) == (m, b)`
//! for every body `b`.

use aix_state::AixError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

const DELIMITER: &str = "---";

/// Malformed YAML inside the frontmatter block.
///
/// Positions are 1-indexed and relative to the whole file, not the YAML
/// fragment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid YAML frontmatter at line {line}, column {column}: {message}")]
pub struct FrontmatterError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Returns true if `content` opens with a frontmatter delimiter line.
pub fn has_frontmatter(content: &str) -> bool {
    opening_len(content).is_some()
}

fn opening_len(content: &str) -> Option<usize> {
    if content.starts_with("---\n") {
        Some(4)
    } else if content.starts_with("---\r\n") {
        Some(5)
    } else {
        None
    }
}

/// Splits `content` into the raw YAML block and the body.
///
/// Returns `None` when there is no complete delimiter pair.
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let start = opening_len(content)?;
    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let bare = line.trim_end_matches('\n').trim_end_matches('\r');
        if bare == DELIMITER {
            let yaml = &content[start..offset];
            let body = &content[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}

/// Parses `content` into typed metadata and the body.
///
/// Without a delimiter pair the metadata is `T::default()` and the body is the
/// whole input.
pub fn parse<T>(content: &str) -> Result<(T, String), FrontmatterError>
where
    T: DeserializeOwned + Default,
{
    let Some((yaml, body)) = split_frontmatter(content) else {
        return Ok((T::default(), content.to_string()));
    };

    let meta = if yaml.trim().is_empty() {
        T::default()
    } else {
        serde_yaml::from_str(yaml).map_err(|e| {
            let (line, column) = e
                .location()
                .map(|loc| (loc.line() + 1, loc.column()))
                .unwrap_or((2, 1));
            FrontmatterError {
                line,
                column,
                message: strip_location(&e.to_string()),
            }
        })?
    };

    let body = body.strip_suffix('\n').unwrap_or(body);
    Ok((meta, body.to_string()))
}

// serde_yaml appends "at line X column Y" using fragment-relative positions;
// the error carries file-relative ones instead.
fn strip_location(msg: &str) -> String {
    match msg.find(" at line ") {
        Some(idx) => msg[..idx].to_string(),
        None => msg.to_string(),
    }
}

/// Emits `---\n<yaml>---\n<body>\n`.
pub fn format<T: Serialize>(meta: &T, body: &str) -> Result<String, AixError> {
    let yaml = serde_yaml::to_string(meta).map_err(|e| AixError::Marshal {
        format: "yaml",
        message: e.to_string(),
    })?;
    let mut out = String::with_capacity(yaml.len() + body.len() + 9);
    out.push_str("---\n");
    out.push_str(&yaml);
    if !yaml.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("---\n");
    out.push_str(body);
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SkillMeta;
    use proptest::prelude::*;

    #[test]
    fn split_finds_closing_delimiter() {
        let content = "---\nname: test\ndescription: A test skill\n---\n# Heading\nBody";
        let (yaml, body) = split_frontmatter(content).unwrap();
        assert_eq!(yaml, "name: test\ndescription: A test skill\n");
        assert_eq!(body, "# Heading\nBody");
    }

    #[test]
    fn split_handles_crlf() {
        let content = "---\r\nname: test\r\n---\r\nBody";
        let (yaml, body) = split_frontmatter(content).unwrap();
        assert_eq!(yaml, "name: test\r\n");
        assert_eq!(body, "Body");
    }

    #[test]
    fn no_frontmatter_keeps_everything_as_body() {
        let content = "# Just markdown\nNo frontmatter here.";
        let (meta, body): (SkillMeta, String) = parse(content).unwrap();
        assert_eq!(meta, SkillMeta::default());
        assert_eq!(body, content);
    }

    #[test]
    fn unterminated_frontmatter_is_body() {
        let content = "---\nname: x\nno closing line";
        assert!(split_frontmatter(content).is_none());
        let (_, body): (SkillMeta, String) = parse(content).unwrap();
        assert_eq!(body, content);
    }

    #[test]
    fn delimiter_must_be_whole_line() {
        let content = "---\nname: x\n----\n--- trailing\n---\nbody";
        let (yaml, body) = split_frontmatter(content).unwrap();
        assert_eq!(yaml, "name: x\n----\n--- trailing\n");
        assert_eq!(body, "body");
    }

    #[test]
    fn body_keeps_leading_blank_lines() {
        let content = "---\nname: x\n---\n\n\nBody\n";
        let (_, body): (SkillMeta, String) = parse(content).unwrap();
        assert_eq!(body, "\n\nBody");
    }

    #[test]
    fn malformed_yaml_reports_file_position() {
        let content = "---\nname: ok\ndescription: [unclosed\n---\nBody";
        let err = parse::<SkillMeta>(content).unwrap_err();
        assert!(err.line >= 2, "line should be file-relative: {err:?}");
        assert!(err.to_string().starts_with("invalid YAML frontmatter at line"));
    }

    #[test]
    fn format_layout() {
        let meta = SkillMeta {
            name: "reviewer".into(),
            description: "Reviews code".into(),
            ..Default::default()
        };
        let out = format(&meta, "Be careful.").unwrap();
        assert_eq!(
            out,
            "---\nname: reviewer\ndescription: Reviews code\n---\nBe careful.\n"
        );
    }

    proptest! {
        #[test]
        fn round_trip(
            name in "[a-z][a-z0-9-]{0,20}",
            description in "[ -~]{0,60}",
            body in "(?s)[ -~\t\r\n]{0,200}",
        ) {
            let meta = SkillMeta {
                name,
                description,
                ..Default::default()
            };
            let text = format(&meta, &body).unwrap();
            let (parsed, parsed_body): (SkillMeta, String) = parse(&text).unwrap();
            prop_assert_eq!(parsed, meta);
            prop_assert_eq!(parsed_body, body);
        }
    }
}
