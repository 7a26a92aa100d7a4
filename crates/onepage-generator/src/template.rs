//! Mustache-style template rendering.
//!
//! Templates are parsed into a node tree up front, so syntax errors surface
//! regardless of the content they are rendered with. Supported tags:
//!
//! - `{{ name }}` HTML-escaped value, `{{{ name }}}` / `{{& name }}` raw value
//! - `{{ a.b.c }}` dotted lookup, `{{ . }}` current item
//! - `{{ name? }}` optional value, empty when the key is missing
//! - `{{# name }}...{{/ name }}` section, `{{^ name }}...{{/ name }}` inverted section
//! - `{{! comment }}`

use onepage_core::Content;
use serde_yaml::Value;
use thiserror::Error;

/// Template rendering errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// A `{{` without its closing delimiter.
    #[error("unclosed tag on line {line}")]
    UnclosedTag { line: usize },

    /// A tag with no name, e.g. `{{ }}` or `{{#}}`.
    #[error("empty tag on line {line}")]
    EmptyTag { line: usize },

    /// A section opened but never closed.
    #[error("section `{name}` is never closed")]
    UnclosedSection { name: String },

    /// A closing tag without a matching opening tag.
    #[error("unexpected closing tag `{name}` on line {line}")]
    UnexpectedClose { name: String, line: usize },

    /// A closing tag that closes a different section than the open one.
    #[error("section `{expected}` closed by `{found}` on line {line}")]
    MismatchedSection {
        expected: String,
        found: String,
        line: usize,
    },

    /// Partials and delimiter changes are not available.
    #[error("unsupported tag `{tag}` on line {line}")]
    Unsupported { tag: String, line: usize },

    /// A required value is absent from the content.
    #[error("missing content key: {0}")]
    MissingKey(String),

    /// A value tag points at a list or mapping.
    #[error("content key `{0}` is not a scalar value")]
    NotScalar(String),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Value {
        name: String,
        escape: bool,
        optional: bool,
    },
    Section {
        name: String,
        inverted: bool,
        children: Vec<Node>,
    },
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

struct Frame {
    name: String,
    inverted: bool,
    nodes: Vec<Node>,
}

impl Template {
    /// Parse template source into a renderable tree.
    pub fn parse(source: &str) -> Result<Self> {
        let mut stack = vec![Frame {
            name: String::new(),
            inverted: false,
            nodes: Vec::new(),
        }];
        let mut pos = 0;

        while let Some(offset) = source[pos..].find("{{") {
            let start = pos + offset;
            let line = line_at(source, start);

            // Triple mustache: {{{ name }}}
            if source[start..].starts_with("{{{") {
                push_text(&mut stack, &source[pos..start]);
                let end = source[start..]
                    .find("}}}")
                    .ok_or(RenderError::UnclosedTag { line })?;
                let name = source[start + 3..start + end].trim();
                push_node(&mut stack, value_node(name, false, line)?);
                pos = start + end + 3;
                continue;
            }

            let end = source[start..]
                .find("}}")
                .ok_or(RenderError::UnclosedTag { line })?;
            let tag = source[start + 2..start + end].trim();
            let tag_end = start + end + 2;

            // A section or comment tag alone on its line takes the line with it.
            let standalone = tag
                .starts_with(['#', '^', '/', '!'])
                .then(|| standalone_span(source, pos, start, tag_end))
                .flatten();
            let (text_end, next) = standalone.unwrap_or((start, tag_end));
            push_text(&mut stack, &source[pos..text_end]);
            pos = next;

            let mut chars = tag.chars();
            match chars.next() {
                Some('!') => {}
                Some(sigil @ ('#' | '^')) => {
                    let name = non_empty(chars.as_str().trim(), line)?;
                    stack.push(Frame {
                        name: name.to_string(),
                        inverted: sigil == '^',
                        nodes: Vec::new(),
                    });
                }
                Some('/') => {
                    let name = non_empty(chars.as_str().trim(), line)?;
                    if stack.len() == 1 {
                        return Err(RenderError::UnexpectedClose {
                            name: name.to_string(),
                            line,
                        });
                    }
                    let frame = stack.pop().ok_or(RenderError::UnexpectedClose {
                        name: name.to_string(),
                        line,
                    })?;
                    if frame.name != name {
                        return Err(RenderError::MismatchedSection {
                            expected: frame.name,
                            found: name.to_string(),
                            line,
                        });
                    }
                    push_node(
                        &mut stack,
                        Node::Section {
                            name: frame.name,
                            inverted: frame.inverted,
                            children: frame.nodes,
                        },
                    );
                }
                Some('&') => {
                    push_node(&mut stack, value_node(chars.as_str().trim(), false, line)?);
                }
                Some('>' | '=') => {
                    return Err(RenderError::Unsupported {
                        tag: tag.to_string(),
                        line,
                    });
                }
                Some(_) => push_node(&mut stack, value_node(tag, true, line)?),
                None => return Err(RenderError::EmptyTag { line }),
            }
        }

        push_text(&mut stack, &source[pos..]);

        if stack.len() > 1 {
            let open = stack.pop().map(|f| f.name).unwrap_or_default();
            return Err(RenderError::UnclosedSection { name: open });
        }

        let nodes = stack.pop().map(|f| f.nodes).unwrap_or_default();
        Ok(Self { nodes })
    }

    /// Render the template against a content value.
    pub fn render(&self, context: &Value) -> Result<String> {
        let mut out = String::new();
        let mut scopes = vec![context];
        render_nodes(&self.nodes, &mut scopes, &mut out)?;
        Ok(out)
    }
}

/// Render `template` with `content`.
///
/// Pure: the same inputs always produce the same markup.
pub fn render(content: &Content, template: &str) -> Result<String> {
    Template::parse(template)?.render(content.value())
}

fn push_text(stack: &mut [Frame], text: &str) {
    if !text.is_empty() {
        push_node(stack, Node::Text(text.to_string()));
    }
}

/// Bounds of the line holding the tag at `start..end`, if nothing else is on it.
///
/// Returns the start of the line and the start of the next one. `pos` is the
/// end of the previous tag; a line shared with another tag is never standalone.
fn standalone_span(source: &str, pos: usize, start: usize, end: usize) -> Option<(usize, usize)> {
    let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
    if line_start < pos || !is_blank(&source[line_start..start]) {
        return None;
    }

    let rest = &source[end..];
    let (trailing, next) = match rest.find('\n') {
        Some(i) => (&rest[..i], end + i + 1),
        None => (rest, source.len()),
    };
    is_blank(trailing).then_some((line_start, next))
}

fn is_blank(s: &str) -> bool {
    s.chars().all(|c| matches!(c, ' ' | '\t' | '\r'))
}

fn push_node(stack: &mut [Frame], node: Node) {
    if let Some(frame) = stack.last_mut() {
        frame.nodes.push(node);
    }
}

fn non_empty(name: &str, line: usize) -> Result<&str> {
    if name.is_empty() {
        Err(RenderError::EmptyTag { line })
    } else {
        Ok(name)
    }
}

fn value_node(tag: &str, escape: bool, line: usize) -> Result<Node> {
    let (name, optional) = match tag.strip_suffix('?') {
        Some(stripped) => (stripped.trim_end(), true),
        None => (tag, false),
    };
    let name = non_empty(name, line)?;
    Ok(Node::Value {
        name: name.to_string(),
        escape,
        optional,
    })
}

fn line_at(source: &str, pos: usize) -> usize {
    source[..pos].matches('\n').count() + 1
}

fn render_nodes<'a>(nodes: &[Node], scopes: &mut Vec<&'a Value>, out: &mut String) -> Result<()> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Value {
                name,
                escape,
                optional,
            } => match lookup(name, scopes) {
                Some(value) => {
                    let text = scalar_text(name, value)?;
                    if *escape {
                        out.push_str(&escape_html(&text));
                    } else {
                        out.push_str(&text);
                    }
                }
                None if *optional => {}
                None => return Err(RenderError::MissingKey(name.clone())),
            },
            Node::Section {
                name,
                inverted: true,
                children,
            } => {
                if !lookup(name, scopes).is_some_and(is_truthy) {
                    render_nodes(children, scopes, out)?;
                }
            }
            Node::Section {
                name,
                inverted: false,
                children,
            } => {
                let Some(value) = lookup(name, scopes).filter(|v| is_truthy(v)) else {
                    continue;
                };
                match untagged(value) {
                    Value::Sequence(items) => {
                        for item in items {
                            scopes.push(item);
                            let result = render_nodes(children, scopes, out);
                            scopes.pop();
                            result?;
                        }
                    }
                    other => {
                        scopes.push(other);
                        let result = render_nodes(children, scopes, out);
                        scopes.pop();
                        result?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Resolve a (possibly dotted) name against the scope stack, innermost first.
fn lookup<'a>(name: &str, scopes: &[&'a Value]) -> Option<&'a Value> {
    if name == "." {
        return scopes.last().copied();
    }

    let mut segments = name.split('.');
    let first = segments.next()?;
    let mut current = scopes
        .iter()
        .rev()
        .find_map(|&scope| child(scope, first))?;

    for segment in segments {
        current = child(current, segment)?;
    }
    Some(current)
}

fn child<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match untagged(value) {
        Value::Mapping(map) => map.get(key),
        Value::Sequence(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn untagged(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untagged(&tagged.value),
        other => other,
    }
}

fn is_truthy(value: &Value) -> bool {
    match untagged(value) {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Sequence(items) => !items.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(_) => true,
    }
}

fn scalar_text(name: &str, value: &Value) -> Result<String> {
    match untagged(value) {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s.clone()),
        _ => Err(RenderError::NotScalar(name.to_string())),
    }
}

fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
