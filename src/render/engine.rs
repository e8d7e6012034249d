//! Pure configuration rendering.
//!
//! `render` turns a YAML source document and a Jinja-style template into
//! the bytes of the runtime configuration file. It performs no I/O.

use minijinja::{Environment, UndefinedBehavior};
use serde::de::Error as _;
use serde_yaml::{Mapping, Value};

use crate::render::error::{RenderError, RenderResult};

/// Render `template` against the YAML mapping in `source`.
///
/// Missing field references are errors rather than empty strings, so a
/// template that no longer matches its source is never half-applied.
pub fn render(source: &[u8], template: &[u8]) -> RenderResult<Vec<u8>> {
    let document = parse_document(source)?;
    let template = std::str::from_utf8(template)?;

    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);

    let template = env
        .template_from_str(template)
        .map_err(RenderError::Template)?;
    let rendered = template.render(&document).map_err(RenderError::Render)?;

    Ok(rendered.into_bytes())
}

fn parse_document(source: &[u8]) -> RenderResult<Mapping> {
    if source.iter().all(u8::is_ascii_whitespace) {
        return Ok(Mapping::new());
    }

    match serde_yaml::from_slice::<Value>(source)? {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        other => Err(RenderError::Parse(serde_yaml::Error::custom(format!(
            "expected a mapping at the top level, found {}",
            value_kind(&other)
        )))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
