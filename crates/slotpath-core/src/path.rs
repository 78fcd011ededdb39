//! Path expressions: `/`-rooted segments of the form `[field][[key]]`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSel {
    Name(String),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySel {
    Literal(String),
    Wildcard,
}

/// One `/`-separated unit. Both parts absent selects the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segment {
    pub field: Option<FieldSel>,
    pub key: Option<KeySel>,
}

impl Segment {
    /// Returns `None` on unbalanced brackets.
    pub fn parse(text: &str) -> Option<Segment> {
        let (field, key) = match text.strip_suffix(']') {
            Some(head) => {
                let open = head.find('[')?;
                (&head[..open], Some(&head[open + 1..]))
            }
            None => (text, None),
        };
        if field.contains(['[', ']']) {
            return None;
        }

        let field = match field {
            "" | "." => None,
            "*" => Some(FieldSel::Wildcard),
            name => Some(FieldSel::Name(name.to_string())),
        };
        let key = key.map(|k| match k {
            "*" => KeySel::Wildcard,
            lit => KeySel::Literal(lit.to_string()),
        });
        Some(Segment { field, key })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Op<'p> {
    Field(&'p FieldSel),
    Key(&'p KeySel),
}

impl Path {
    /// Returns `None` for empty or unrooted expressions and malformed segments.
    pub fn parse(expr: &str) -> Option<Path> {
        if !expr.starts_with('/') {
            return None;
        }
        let cleaned = clean(expr);
        let segments = cleaned[1..]
            .split('/')
            .filter(|s| !s.is_empty())
            .map(Segment::parse)
            .collect::<Option<Vec<_>>>()?;
        Some(Path { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub(crate) fn ops(&self) -> Vec<Op<'_>> {
        let mut ops = Vec::with_capacity(self.segments.len() * 2);
        for seg in &self.segments {
            if let Some(field) = &seg.field {
                ops.push(Op::Field(field));
            }
            if let Some(key) = &seg.key {
                ops.push(Op::Key(key));
            }
        }
        ops
    }
}

/// Lexical path normalization: drops `.` and empty elements and resolves
/// `..` against the preceding element. `..` never climbs above the root.
pub fn clean(expr: &str) -> String {
    let rooted = expr.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in expr.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            _ => parts.push(part),
        }
    }
    let joined = parts.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}
