//! In-place text edits on block-style YAML.
//!
//! Edited values are written into the original text line by line, so
//! comments, blank lines, quoting and key order everywhere else survive.
//! Every function returns `None` for a layout it does not understand (flow
//! mappings on the path, anchors, multi-document files, CRLF line endings);
//! the caller then renders the whole document instead. The result is
//! always re-parsed by the caller before it is trusted.

use super::node::{self, Node};
use super::path::{FieldPath, Segment};

/// Write the value of every touched path in `after` into `text`.
///
/// `before` is the parse of `text`. Paths whose value did not change are
/// skipped; a path under another touched path is covered by its ancestor.
pub(super) fn patch(
    text: &str,
    before: &Node,
    after: &Node,
    touched: &[FieldPath],
) -> Option<String> {
    if text.contains('\r') {
        return None;
    }
    let mut out = text.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }

    for path in outermost(touched) {
        let segments = path.segments();
        let new = lookup(after, segments)?;
        if lookup(before, segments) == Some(new) {
            continue;
        }
        let next = Layout::new(&out).patch(before, after, segments)?;
        out = next;
    }
    Some(out)
}

/// Touched paths without the ones nested under another touched path.
fn outermost(touched: &[FieldPath]) -> Vec<&FieldPath> {
    let mut kept: Vec<&FieldPath> = Vec::new();
    for path in touched {
        let covered = touched.iter().any(|other| {
            let (o, p) = (other.segments(), path.segments());
            o.len() < p.len() && p.starts_with(o)
        });
        if !covered && !kept.iter().any(|k| k.segments() == path.segments()) {
            kept.push(path);
        }
    }
    kept
}

fn lookup<'a>(root: &'a Node, segments: &[Segment]) -> Option<&'a Node> {
    let mut node = root;
    for segment in segments {
        node = match segment {
            Segment::Key(key) => node.get(key)?,
            Segment::Index(i) => node.as_sequence()?.get(*i)?,
            Segment::Append => return None,
        };
    }
    Some(node)
}

fn indent(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn is_trivia(line: &str) -> bool {
    let t = line.trim();
    t.is_empty() || t.starts_with('#')
}

fn is_item_at(line: &str, col: usize) -> bool {
    match line.get(col..) {
        Some(rest) => rest == "-" || rest.starts_with("- ") || rest.starts_with("-\t"),
        None => false,
    }
}

fn spaces(n: usize) -> String {
    " ".repeat(n)
}

/// One-line form of a scalar or empty collection.
fn inline_text(node: &Node) -> Option<String> {
    if !node.is_inline() {
        return None;
    }
    let rendered = node::render(node).ok()?;
    let rendered = rendered.trim_end_matches('\n');
    if rendered.contains('\n') {
        return None;
    }
    Some(rendered.to_string())
}

/// Block form of a node, every line shifted right by `by`.
fn block_lines(node: &Node, by: usize) -> Option<Vec<String>> {
    let rendered = node::render(node).ok()?;
    Some(
        rendered
            .lines()
            .map(|l| if l.is_empty() { String::new() } else { format!("{}{}", spaces(by), l) })
            .collect(),
    )
}

/// A sequence item whose dash sits at column `col`.
fn item_lines(node: &Node, col: usize) -> Option<Vec<String>> {
    if let Some(text) = inline_text(node) {
        return Some(vec![format!("{}- {}", spaces(col), text)]);
    }
    let mut lines = block_lines(node, col + 2)?;
    let first = lines.first_mut().filter(|l| l.len() > col + 2)?;
    first.replace_range(col..col + 2, "- ");
    Some(lines)
}

fn key_text(key: &str) -> Option<String> {
    inline_text(&Node::String(key.to_string()))
}

/// Scan a value starting at byte `from`: `(start, end, comment)` where the
/// value is `line[start..end]` with surrounding blanks trimmed.
fn scan_value(line: &str, from: usize) -> (usize, usize, Option<usize>) {
    let bytes = line.as_bytes();
    let mut start = from;
    while start < bytes.len() && (bytes[start] == b' ' || bytes[start] == b'\t') {
        start += 1;
    }

    let mut comment = None;
    let (mut single, mut double) = (false, false);
    let mut i = start;
    while i < bytes.len() {
        let c = bytes[i];
        if double {
            if c == b'\\' {
                i += 1;
            } else if c == b'"' {
                double = false;
            }
        } else if single {
            if c == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 1;
                } else {
                    single = false;
                }
            }
        } else if c == b'#' && (i == start || bytes[i - 1] == b' ' || bytes[i - 1] == b'\t') {
            comment = Some(i);
            break;
        } else if c == b'"' || c == b'\'' {
            let opens = line[start..i]
                .trim_end()
                .chars()
                .last()
                .map_or(true, |p| matches!(p, '[' | '{' | ',' | ':'));
            if opens {
                double = c == b'"';
                single = c == b'\'';
            }
        }
        i += 1;
    }

    let end = start + line[start..comment.unwrap_or(bytes.len())].trim_end().len();
    (start, end, comment)
}

/// Key at the start of `rest`, and the offset of its `:`.
fn parse_key(rest: &str) -> Option<(String, usize)> {
    let first = rest.chars().next()?;
    let (key, after) = match first {
        '"' => {
            let mut escaped = false;
            let close = rest[1..].char_indices().find_map(|(i, c)| {
                let hit = c == '"' && !escaped;
                escaped = c == '\\' && !escaped;
                hit.then_some(i + 1)
            })?;
            let key = rest[1..close].replace("\\\"", "\"").replace("\\\\", "\\");
            (key, close + 1)
        }
        '\'' => {
            let bytes = rest.as_bytes();
            let mut i = 1;
            let close = loop {
                match *bytes.get(i)? {
                    b'\'' if bytes.get(i + 1) == Some(&b'\'') => i += 2,
                    b'\'' => break i,
                    _ => i += 1,
                }
            };
            (rest[1..close].replace("''", "'"), close + 1)
        }
        '?' | '-' | '[' | '{' | '&' | '*' | '!' | '|' | '>' | '#' | '%' | '@' | '`' => return None,
        _ => {
            let colon = rest.char_indices().find_map(|(i, c)| {
                let next = rest[i + c.len_utf8()..].chars().next();
                (c == ':' && matches!(next, None | Some(' ') | Some('\t'))).then_some(i)
            })?;
            let key = rest[..colon].trim_end();
            if key.contains(" #") {
                return None;
            }
            return Some((key.to_string(), colon));
        }
    };

    let gap = rest[after..].len() - rest[after..].trim_start_matches(' ').len();
    let colon = after + gap;
    let next = rest[colon..].chars().nth(1);
    (rest[colon..].starts_with(':') && matches!(next, None | Some(' ') | Some('\t')))
        .then_some((key, colon))
}

#[derive(Debug, Clone, Copy)]
enum Block {
    /// Entries begin at column `col`; the first one on line `first`.
    Mapping { first: usize, col: usize, end: usize },
    /// Dashes at column `col`; the first item on line `first`.
    Sequence { first: usize, col: usize, end: usize },
}

/// A `key: value` entry.
#[derive(Debug)]
struct Entry {
    line: usize,
    key: String,
    /// Column the key starts at.
    col: usize,
    /// Byte offset of the `:` in the line.
    colon: usize,
    value: (usize, usize),
    comment: Option<usize>,
    /// One past the entry's last non-blank line.
    end: usize,
}

/// A `- value` sequence item.
#[derive(Debug)]
struct Item {
    line: usize,
    col: usize,
    value: (usize, usize),
    comment: Option<usize>,
    end: usize,
}

struct Layout<'a> {
    lines: Vec<&'a str>,
}

impl<'a> Layout<'a> {
    fn new(text: &'a str) -> Self {
        let mut lines: Vec<&str> = text.split('\n').collect();
        if text.is_empty() || text.ends_with('\n') {
            lines.pop();
        }
        Self { lines }
    }

    /// Replace lines `from..to` with `new`.
    fn splice(&self, from: usize, to: usize, new: Vec<String>) -> String {
        let mut out = String::new();
        let kept = self.lines[..from].iter().map(|l| l.to_string());
        let rest = self.lines[to..].iter().map(|l| l.to_string());
        for line in kept.chain(new).chain(rest) {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    fn last_content(&self, from: usize, to: usize) -> Option<usize> {
        (from..to).rev().find(|&i| !is_trivia(self.lines[i]))
    }

    /// The block starting at the first non-blank line of `from..to`.
    fn block_at(&self, from: usize, to: usize) -> Option<Block> {
        let first = (from..to).find(|&i| !is_trivia(self.lines[i]))?;
        let line = self.lines[first];
        let col = indent(line);
        let end = self.last_content(first, to)? + 1;
        Some(if is_item_at(line, col) {
            Block::Sequence { first, col, end }
        } else {
            Block::Mapping { first, col, end }
        })
    }

    /// Content range of the root node, after an optional `---` marker.
    fn root(&self) -> Option<Option<Block>> {
        let mut from = 0;
        for (i, &line) in self.lines.iter().enumerate() {
            if is_trivia(line) {
                continue;
            }
            let bare = line.split(" #").next().unwrap_or(line).trim_end();
            if bare == "---" && from == 0 && !self.lines[..i].iter().any(|l| !is_trivia(l)) {
                from = i + 1;
                continue;
            }
            if line.starts_with("---") || line.starts_with("...") || line.starts_with('%') {
                return None;
            }
        }
        match self.block_at(from, self.lines.len()) {
            None => Some(None),
            Some(block @ (Block::Mapping { col: 0, .. } | Block::Sequence { col: 0, .. })) => {
                if let Block::Mapping { first, .. } = block {
                    parse_key(self.lines[first])?;
                }
                Some(Some(block))
            }
            Some(_) => None,
        }
    }

    fn patch(&self, before: &Node, after: &Node, segments: &[Segment]) -> Option<String> {
        let Some(mut block) = self.root()? else {
            return self.append_root(after);
        };

        for (i, segment) in segments.iter().enumerate() {
            let last = i + 1 == segments.len();
            let prefix = &segments[..=i];
            let new = lookup(after, prefix)?;
            match (block, segment) {
                (Block::Mapping { .. }, Segment::Key(key)) => {
                    let Some(entry) = self.find_entry(block, key)? else {
                        return self.insert_entry(block, key, new);
                    };
                    match self.entry_child(&entry) {
                        Some(child) if !last => block = child,
                        _ => return self.replace_entry(&entry, lookup(before, prefix), new),
                    }
                }
                (Block::Sequence { .. }, Segment::Index(n)) => {
                    let items = self.items(block)?;
                    let item = items.get(*n)?;
                    match self.item_child(item) {
                        Some(child) if !last => block = child,
                        _ => return self.replace_item(item, new),
                    }
                }
                _ => return None,
            }
        }
        None
    }

    fn append_root(&self, after: &Node) -> Option<String> {
        if after.is_inline() {
            return None;
        }
        Some(self.splice(self.lines.len(), self.lines.len(), block_lines(after, 0)?))
    }

    fn entry_starts(&self, block: Block) -> Option<Vec<usize>> {
        let Block::Mapping { first, col, end } = block else {
            return None;
        };
        let mut starts = vec![first];
        for i in first + 1..end {
            let line = self.lines[i];
            if is_trivia(line) {
                continue;
            }
            match indent(line) {
                ind if ind < col => return None,
                ind if ind == col && !is_item_at(line, col) => starts.push(i),
                _ => {}
            }
        }
        Some(starts)
    }

    /// `Some(None)` when the key is absent, `None` when the layout is not understood.
    fn find_entry(&self, block: Block, key: &str) -> Option<Option<Entry>> {
        let Block::Mapping { end, .. } = block else {
            return None;
        };
        let starts = self.entry_starts(block)?;
        for (n, &line) in starts.iter().enumerate() {
            let limit = starts.get(n + 1).copied().unwrap_or(end);
            let entry = self.entry(block, line, limit)?;
            if entry.key == key {
                return Some(Some(entry));
            }
        }
        Some(None)
    }

    fn entry(&self, block: Block, line: usize, limit: usize) -> Option<Entry> {
        let Block::Mapping { col, .. } = block else {
            return None;
        };
        let text = self.lines[line];
        let (key, offset) = parse_key(text.get(col..)?)?;
        let colon = col + offset;
        let (start, stop, comment) = scan_value(text, colon + 1);
        let inline_empty = start == stop;
        if text[start..stop].starts_with(&['&', '*'][..]) {
            return None;
        }

        let mut end = line + 1;
        for i in line + 1..limit {
            let l = self.lines[i];
            if is_trivia(l) {
                continue;
            }
            let ind = indent(l);
            if ind > col || (ind == col && inline_empty && is_item_at(l, col)) {
                end = i + 1;
            } else {
                break;
            }
        }
        Some(Entry {
            line,
            key,
            col,
            colon,
            value: (start, stop),
            comment,
            end,
        })
    }

    fn entry_child(&self, entry: &Entry) -> Option<Block> {
        if entry.value.0 != entry.value.1 {
            return None;
        }
        self.block_at(entry.line + 1, entry.end)
    }

    fn items(&self, block: Block) -> Option<Vec<Item>> {
        let Block::Sequence { first, col, end } = block else {
            return None;
        };
        let mut starts = Vec::new();
        for i in first..end {
            let line = self.lines[i];
            if is_trivia(line) {
                continue;
            }
            match indent(line) {
                ind if ind < col => return None,
                ind if ind == col && is_item_at(line, col) => starts.push(i),
                ind if ind == col => return None,
                _ => {}
            }
        }
        let items = starts
            .iter()
            .enumerate()
            .map(|(n, &line)| {
                let limit = starts.get(n + 1).copied().unwrap_or(end);
                let (start, stop, comment) = scan_value(self.lines[line], col + 1);
                Item {
                    line,
                    col,
                    value: (start, stop),
                    comment,
                    end: self.last_content(line, limit).map_or(line + 1, |l| l + 1),
                }
            })
            .collect();
        Some(items)
    }

    fn item_child(&self, item: &Item) -> Option<Block> {
        let (start, stop) = item.value;
        if start == stop {
            return self.block_at(item.line + 1, item.end);
        }
        let block = Block::Mapping {
            first: item.line,
            col: start,
            end: item.end,
        };
        parse_key(&self.lines[item.line][start..])?;
        Some(block)
    }

    /// `<gap><# comment>` to carry over from a rewritten line.
    fn trailing_comment(
        &self,
        line: usize,
        value: (usize, usize),
        comment: Option<usize>,
    ) -> String {
        let text = self.lines[line];
        match comment {
            Some(_) if value.0 != value.1 => text[value.1..].to_string(),
            Some(at) => format!(" {}", &text[at..]),
            None => String::new(),
        }
    }

    fn replace_entry(&self, entry: &Entry, old: Option<&Node>, new: &Node) -> Option<String> {
        let text = self.lines[entry.line];
        let head = &text[..=entry.colon];
        let comment = self.trailing_comment(entry.line, entry.value, entry.comment);

        if let Some(value) = self.inline_sequence(entry, new).or_else(|| inline_text(new)) {
            let line = format!("{} {}{}", head, value, comment);
            return Some(self.splice(entry.line, entry.end, vec![line]));
        }

        if let (
            Some(Block::Sequence { first, col, end }),
            Some(Node::Sequence(old)),
            Node::Sequence(new),
        ) = (self.entry_child(entry), old, new)
        {
            let items = self.items(Block::Sequence { first, col, end })?;
            let mut lines = Vec::new();
            for (n, value) in new.iter().enumerate() {
                match (items.get(n), old.get(n)) {
                    (Some(item), Some(previous)) if previous == value => {
                        let to = items.get(n + 1).map_or(item.end, |next| next.line);
                        lines.extend(self.lines[item.line..to].iter().map(|l| l.to_string()));
                    }
                    _ => lines.extend(item_lines(value, col)?),
                }
            }
            return Some(self.splice(first, end, lines));
        }

        let trimmed = comment.trim_start();
        let mut lines = vec![if trimmed.is_empty() {
            head.to_string()
        } else {
            format!("{} {}", head, trimmed)
        }];
        lines.extend(block_lines(new, entry.col + 2)?);
        Some(self.splice(entry.line, entry.end, lines))
    }

    /// `[a, b]` kept in flow style when it was written that way.
    fn inline_sequence(&self, entry: &Entry, new: &Node) -> Option<String> {
        let Node::Sequence(items) = new else {
            return None;
        };
        let current = &self.lines[entry.line][entry.value.0..entry.value.1];
        let inner = current.strip_prefix('[')?.strip_suffix(']')?;
        if inner.trim().is_empty() || items.is_empty() {
            return None;
        }
        let parts: Option<Vec<String>> = items
            .iter()
            .map(|item| match item {
                Node::Sequence(_) | Node::Mapping(_) | Node::Tagged(..) => None,
                scalar => inline_text(scalar),
            })
            .collect();
        Some(format!("[{}]", parts?.join(", ")))
    }

    fn replace_item(&self, item: &Item, new: &Node) -> Option<String> {
        let text = self.lines[item.line];
        let (start, stop) = item.value;
        let is_scalar_line = start != stop && parse_key(&text[start..]).is_none();
        if let (true, Some(value)) = (is_scalar_line, inline_text(new)) {
            let comment = self.trailing_comment(item.line, item.value, item.comment);
            let line = format!("{}{}{}", &text[..start], value, comment);
            return Some(self.splice(item.line, item.end, vec![line]));
        }
        Some(self.splice(item.line, item.end, item_lines(new, item.col)?))
    }

    fn insert_entry(&self, block: Block, key: &str, value: &Node) -> Option<String> {
        let Block::Mapping { first, col, end } = block else {
            return None;
        };
        let at = self.last_content(first, end).map_or(first, |l| l + 1);
        let key = key_text(key)?;
        let lines = match inline_text(value) {
            Some(text) => vec![format!("{}{}: {}", spaces(col), key, text)],
            None => {
                let mut lines = vec![format!("{}{}:", spaces(col), key)];
                lines.extend(block_lines(value, col + 2)?);
                lines
            }
        };
        Some(self.splice(at, at, lines))
    }
}
