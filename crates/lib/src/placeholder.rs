//! Placeholder parsing and substitution for action strings.
//!
//! Built-in actions may reference build properties that are only known once
//! earlier targets have run (for example a version computed by a `capture`
//! command). Placeholders are resolved against the [`BuildContext`] right
//! before the action executes.
//!
//! # Placeholder Formats
//!
//! - `$${prop:KEY}` - value of the build property `KEY`
//! - `$${root}` - the project working directory
//!
//! # Shell Variables
//!
//! Single `$` characters pass through unchanged, so shell variables like
//! `$HOME` and `$PATH` work without any escaping.
//!
//! # Escaping
//!
//! Use `$$$` before `{` to produce a literal `$${` sequence.
//!
//! # Example
//!
//! ```
//! use tgraph_lib::placeholder::{parse, Placeholder, Segment};
//!
//! let segments = parse("$${prop:output_dir}/bin:$HOME").unwrap();
//! assert_eq!(segments, vec![
//!     Segment::Placeholder(Placeholder::Property("output_dir".to_string())),
//!     Segment::Literal("/bin:$HOME".to_string()),
//! ]);
//! ```

use thiserror::Error;

use crate::context::BuildContext;

/// A parsed placeholder reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
  /// `$${prop:KEY}`
  Property(String),

  /// `$${root}`
  Root,
}

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  Literal(String),
  Placeholder(Placeholder),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
  #[error("unclosed placeholder at position {0}")]
  Unclosed(usize),

  #[error("unknown placeholder type: {0}")]
  UnknownType(String),

  #[error("malformed placeholder: {0}")]
  Malformed(String),

  #[error("unresolved property: {0}")]
  UnresolvedProperty(String),
}

/// Source of placeholder values.
pub trait Resolver {
  fn resolve_property(&self, key: &str) -> Result<String, PlaceholderError>;

  fn resolve_root(&self) -> Result<String, PlaceholderError>;
}

impl Resolver for BuildContext {
  fn resolve_property(&self, key: &str) -> Result<String, PlaceholderError> {
    self
      .get(key)
      .ok_or_else(|| PlaceholderError::UnresolvedProperty(key.to_string()))
  }

  fn resolve_root(&self) -> Result<String, PlaceholderError> {
    Ok(self.working_dir().to_string_lossy().to_string())
  }
}

/// Parse a string containing placeholders into segments.
///
/// # Errors
///
/// Returns an error if a placeholder is unclosed, has an unknown type or is
/// missing its key.
pub fn parse(input: &str) -> Result<Vec<Segment>, PlaceholderError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut chars = input.char_indices().peekable();

  while let Some((pos, ch)) = chars.next() {
    if ch != '$' {
      literal.push(ch);
      continue;
    }

    if !matches!(chars.peek(), Some((_, '$'))) {
      // Lone $, shell variables pass through
      literal.push('$');
      continue;
    }
    chars.next();

    match chars.peek() {
      Some((_, '$')) => {
        chars.next();
        if matches!(chars.peek(), Some((_, '{'))) {
          // $$${ -> literal $${
          chars.next();
          literal.push_str("$${");
        } else {
          literal.push_str("$$$");
        }
      }
      Some((_, '{')) => {
        chars.next();

        if !literal.is_empty() {
          segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }

        let mut content = String::new();
        let mut closed = false;
        for (_, c) in chars.by_ref() {
          if c == '}' {
            closed = true;
            break;
          }
          content.push(c);
        }

        if !closed {
          return Err(PlaceholderError::Unclosed(pos));
        }

        segments.push(Segment::Placeholder(parse_placeholder_content(&content)?));
      }
      _ => literal.push_str("$$"),
    }
  }

  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  Ok(segments)
}

/// Parse the content between `$${` and `}`.
fn parse_placeholder_content(content: &str) -> Result<Placeholder, PlaceholderError> {
  if content == "root" {
    return Ok(Placeholder::Root);
  }

  let (kind, rest) = content
    .split_once(':')
    .ok_or_else(|| PlaceholderError::Malformed(format!("missing colon in '{content}'")))?;

  match kind {
    "prop" => {
      if rest.is_empty() {
        return Err(PlaceholderError::Malformed(format!("empty property key in '{content}'")));
      }
      Ok(Placeholder::Property(rest.to_string()))
    }
    _ => Err(PlaceholderError::UnknownType(kind.to_string())),
  }
}

/// Parse and substitute in one step.
///
/// # Errors
///
/// Returns an error if parsing fails or any placeholder cannot be resolved.
pub fn substitute(input: &str, resolver: &impl Resolver) -> Result<String, PlaceholderError> {
  let segments = parse(input)?;
  substitute_segments(&segments, resolver)
}

pub fn substitute_segments(segments: &[Segment], resolver: &impl Resolver) -> Result<String, PlaceholderError> {
  let mut result = String::new();

  for segment in segments {
    match segment {
      Segment::Literal(s) => result.push_str(s),
      Segment::Placeholder(Placeholder::Property(key)) => result.push_str(&resolver.resolve_property(key)?),
      Segment::Placeholder(Placeholder::Root) => result.push_str(&resolver.resolve_root()?),
    }
  }

  Ok(result)
}
