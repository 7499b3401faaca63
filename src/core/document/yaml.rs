//! In-process YAML editing.
//!
//! A [`Document`] keeps the file text, its parse as loaded, and the edited
//! tree. Edits are applied to the tree; change detection compares the two
//! trees, so formatting never counts as a change. When saving, only the
//! edited values are rewritten in the original text, leaving comments and
//! layout elsewhere as they were. If the layout can't be patched in place
//! the whole document is rendered instead.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::{debug, trace, warn};

use super::layout;
use super::node::{self, Node};
use super::path::{FieldPath, Segment};
use super::{DocumentEditor, Edit};
use crate::error::{DocumentError, Result};

/// A YAML file loaded for editing.
#[derive(Debug)]
pub struct Document {
    path: PathBuf,
    text: String,
    original: Node,
    current: Node,
    /// Paths edited since the last load or save, `[+]` stripped.
    touched: Vec<FieldPath>,
}

impl Document {
    /// Load and parse a YAML file. An empty file is an empty document.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Read` or `DocumentError::Parse`.
    pub fn open(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let parsed = node::parse(&text).map_err(|source| DocumentError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            text,
            original: parsed.clone(),
            current: parsed,
            touched: Vec::new(),
        })
    }

    /// Look up the node at `path` in the edited document.
    pub fn get(&self, path: &str) -> Option<&Node> {
        let path: FieldPath = path.parse().ok()?;
        let mut node = &self.current;
        for segment in path.segments() {
            node = match segment {
                Segment::Key(key) => node.get(key)?,
                Segment::Index(i) => node.as_sequence()?.get(*i)?,
                Segment::Append => return None,
            };
        }
        Some(node)
    }

    /// Set the value at `path`, creating missing mappings on the way.
    ///
    /// A path ending in `[+]` appends instead.
    pub fn set_field(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        let path: FieldPath = path.parse()?;
        let value = Node::from(&value.into());
        if path.is_append() {
            return self.append_path(path.without_append(), value);
        }
        self.transact(path, |root, path| {
            *resolve_mut(root, path)? = value;
            Ok(())
        })
    }

    /// Append `value` to the sequence at `path`, creating it if missing.
    pub fn append_to_sequence(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        let path: FieldPath = path.parse()?;
        self.append_path(path.without_append(), Node::from(&value.into()))
    }

    /// Replace the sequence at `path` with an empty one.
    pub fn clear_sequence(&mut self, path: &str) -> Result<()> {
        let path: FieldPath = path.parse()?;
        self.transact(path, |root, path| {
            let node = resolve_mut(root, path)?;
            match node {
                Node::Null | Node::Sequence(_) => {
                    *node = Node::Sequence(Vec::new());
                    Ok(())
                }
                other => Err(not_resolvable(
                    path,
                    format!("{} is not a sequence", other.type_name()),
                )),
            }
        })
    }

    /// Apply one edit.
    pub fn apply(&mut self, edit: &Edit) -> Result<()> {
        trace!(edit = ?edit, "applying edit");
        match edit {
            Edit::Set { path, value } => self.set_field(path, value.clone()),
            Edit::Append { path, value } => self.append_to_sequence(path, value.clone()),
            Edit::Clear { path } => self.clear_sequence(path),
        }
    }

    /// Whether the edited document differs structurally from the loaded one.
    pub fn is_changed(&self) -> bool {
        self.original != self.current
    }

    /// The text [`save`](Self::save) would write.
    pub fn render(&self) -> Result<String> {
        let patched = layout::patch(&self.text, &self.original, &self.current, &self.touched)
            .filter(|text| node::parse(text).ok().as_ref() == Some(&self.current));
        match patched {
            Some(text) => Ok(text),
            None => {
                warn!(
                    path = %self.path.display(),
                    "layout not editable in place, rewriting whole document"
                );
                node::render(&self.current).map_err(|e| DocumentError::Serialize(e).into())
            }
        }
    }

    /// Write the document back if it changed.
    ///
    /// The new content goes to a temporary file in the same directory which
    /// then replaces the original, so readers never see a partial file.
    ///
    /// Returns whether anything was written.
    pub fn save(&mut self) -> Result<bool> {
        if !self.is_changed() {
            debug!(path = %self.path.display(), "document unchanged, not writing");
            return Ok(false);
        }

        let rendered = self.render()?;
        let write_err = |source| DocumentError::Write {
            path: self.path.display().to_string(),
            source,
        };

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(rendered.as_bytes()).map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        debug!(path = %self.path.display(), bytes = rendered.len(), "document written");
        self.text = rendered;
        self.original = self.current.clone();
        self.touched.clear();
        Ok(true)
    }

    fn append_path(&mut self, path: FieldPath, value: Node) -> Result<()> {
        self.transact(path, |root, path| {
            let node = resolve_mut(root, path)?;
            if node.is_null() {
                *node = Node::Sequence(Vec::new());
            }
            match node {
                Node::Sequence(items) => {
                    items.push(value);
                    Ok(())
                }
                other => Err(not_resolvable(
                    path,
                    format!("{} is not a sequence", other.type_name()),
                )),
            }
        })
    }

    /// Run `f` against a copy of the document and keep the result only if it
    /// succeeds, so a failed edit leaves no trace.
    fn transact<F>(&mut self, path: FieldPath, f: F) -> Result<()>
    where
        F: FnOnce(&mut Node, &FieldPath) -> Result<()>,
    {
        let mut next = self.current.clone();
        f(&mut next, &path)?;
        self.current = next;
        self.touched.push(path);
        Ok(())
    }
}

/// Walk to the node at `path`, creating missing mapping keys.
fn resolve_mut<'a>(root: &'a mut Node, path: &FieldPath) -> Result<&'a mut Node> {
    let mut node = root;
    for segment in path.segments() {
        node = match segment {
            Segment::Key(key) => {
                if node.is_null() {
                    *node = Node::Mapping(Vec::new());
                }
                match node {
                    Node::Mapping(entries) => {
                        let found = entries
                            .iter()
                            .position(|(k, _)| k.as_str() == Some(key.as_str()));
                        let at = match found {
                            Some(at) => at,
                            None => {
                                entries.push((Node::String(key.clone()), Node::Null));
                                entries.len() - 1
                            }
                        };
                        &mut entries[at].1
                    }
                    other => {
                        return Err(not_resolvable(
                            path,
                            format!("cannot descend into {} at {:?}", other.type_name(), key),
                        ))
                    }
                }
            }
            Segment::Index(i) => match node {
                Node::Sequence(items) => {
                    let len = items.len();
                    items.get_mut(*i).ok_or_else(|| {
                        not_resolvable(path, format!("index {} out of range (len {})", i, len))
                    })?
                }
                other => {
                    return Err(not_resolvable(
                        path,
                        format!("cannot index into {}", other.type_name()),
                    ))
                }
            },
            Segment::Append => {
                return Err(not_resolvable(path, "'[+]' cannot be resolved".to_string()))
            }
        };
    }
    Ok(node)
}

fn not_resolvable(path: &FieldPath, reason: String) -> crate::error::Error {
    DocumentError::PathNotResolvable {
        path: path.to_string(),
        reason,
    }
    .into()
}

/// [`DocumentEditor`] backed by `serde_yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlEditor;

impl DocumentEditor for YamlEditor {
    fn edit(&self, file: &Path, edits: &[Edit]) -> Result<bool> {
        let mut document = Document::open(file)?;
        for edit in edits {
            document.apply(edit)?;
        }
        document.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CLUSTER: &str = "\
apiVersion: cluster.x-k8s.io/v1alpha3
kind: MachinePool
spec:
  state: present
  template:
    metadata:
      name: template-cluster
  profiles:
  - a
  - b
";

    fn doc(contents: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cluster.yaml");
        std::fs::write(&path, contents).unwrap();
        (tmp, path)
    }

    fn strings(value: &Node) -> Vec<&str> {
        value
            .as_sequence()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect()
    }

    #[test]
    fn test_set_existing_field() {
        let (_tmp, path) = doc(CLUSTER);
        let mut document = Document::open(&path).unwrap();

        document.set_field("spec.state", "absent").unwrap();

        assert_eq!(document.get("spec.state").unwrap().as_str(), Some("absent"));
        assert_eq!(document.get("kind").unwrap().as_str(), Some("MachinePool"));
        assert!(document.is_changed());
    }

    #[test]
    fn test_set_same_value_is_unchanged() {
        let (_tmp, path) = doc(CLUSTER);
        let mut document = Document::open(&path).unwrap();

        document.set_field("spec.state", "present").unwrap();

        assert!(!document.is_changed());
        assert!(!document.save().unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), CLUSTER);
    }

    #[test]
    fn test_set_creates_missing_mappings() {
        let (_tmp, path) = doc("kind: Cluster\n");
        let mut document = Document::open(&path).unwrap();

        document
            .set_field("spec.template.metadata.name", "acme-prod")
            .unwrap();

        assert_eq!(
            document.get("spec.template.metadata.name").unwrap().as_str(),
            Some("acme-prod")
        );
    }

    #[test]
    fn test_empty_file_becomes_mapping() {
        let (_tmp, path) = doc("");
        let mut document = Document::open(&path).unwrap();

        document.set_field("spec.state", "absent").unwrap();
        assert!(document.save().unwrap());

        let reopened = Document::open(&path).unwrap();
        assert_eq!(reopened.get("spec.state").unwrap().as_str(), Some("absent"));
    }

    #[test]
    fn test_append_preserves_order() {
        let (_tmp, path) = doc(CLUSTER);
        let mut document = Document::open(&path).unwrap();

        document.append_to_sequence("spec.profiles", "c").unwrap();
        document.set_field("spec.profiles[+]", "d").unwrap();

        assert_eq!(strings(document.get("spec.profiles").unwrap()), ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_clear_then_append_replaces_sequence() {
        let (_tmp, path) = doc(CLUSTER);
        let mut document = Document::open(&path).unwrap();

        document.clear_sequence("spec.profiles").unwrap();
        document.append_to_sequence("spec.profiles[+]", "c").unwrap();
        document.append_to_sequence("spec.profiles[+]", "d").unwrap();

        assert_eq!(strings(document.get("spec.profiles").unwrap()), ["c", "d"]);
    }

    #[test]
    fn test_clear_and_reappend_same_list_is_unchanged() {
        let (_tmp, path) = doc(CLUSTER);
        let mut document = Document::open(&path).unwrap();

        document.clear_sequence("spec.profiles").unwrap();
        document.append_to_sequence("spec.profiles", "a").unwrap();
        document.append_to_sequence("spec.profiles", "b").unwrap();

        assert!(!document.is_changed());
    }

    #[test]
    fn test_index_set() {
        let (_tmp, path) = doc(CLUSTER);
        let mut document = Document::open(&path).unwrap();

        document.set_field("spec.profiles[1]", "z").unwrap();
        assert_eq!(strings(document.get("spec.profiles").unwrap()), ["a", "z"]);

        assert!(document.set_field("spec.profiles[5]", "z").is_err());
    }

    #[test]
    fn test_unresolvable_path_leaves_document_untouched() {
        let (_tmp, path) = doc(CLUSTER);
        let mut document = Document::open(&path).unwrap();

        let err = document.set_field("spec.state.inner", "x").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Document);

        let err = document
            .append_to_sequence("spec.template", "x")
            .unwrap_err();
        assert!(err.to_string().contains("not a sequence"));

        assert!(document.set_field("spec.newkey.list[0]", "x").is_err());
        assert!(document.get("spec.newkey").is_none());
        assert!(!document.is_changed());
    }

    #[test]
    fn test_reordered_keys_are_not_a_change() {
        let (_tmp, path) = doc("spec:\n  b: 1\n  a: 2\n");
        let mut document = Document::open(&path).unwrap();

        document.set_field("spec.a", 2).unwrap();
        assert!(!document.is_changed());
    }

    #[test]
    fn test_editor_writes_once_and_reports_change() {
        let (_tmp, path) = doc(CLUSTER);

        let changed = YamlEditor
            .edit(
                &path,
                &[
                    Edit::set("spec.state", "absent"),
                    Edit::set("spec.template.metadata.name", "acme-prod"),
                ],
            )
            .unwrap();
        assert!(changed);

        let changed = YamlEditor
            .edit(&path, &[Edit::set("spec.state", "absent")])
            .unwrap();
        assert!(!changed);

        let document = Document::open(&path).unwrap();
        assert_eq!(
            document.get("spec.template.metadata.name").unwrap().as_str(),
            Some("acme-prod")
        );
    }

    #[test]
    fn test_editor_failure_does_not_write() {
        let (_tmp, path) = doc(CLUSTER);

        let result = YamlEditor.edit(
            &path,
            &[
                Edit::set("spec.state", "absent"),
                Edit::append("spec.template", "oops"),
            ],
        );

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), CLUSTER);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let err = YamlEditor
            .edit(&tmp.path().join("cluster.yaml"), &[Edit::clear("spec.profiles")])
            .unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let (_tmp, path) = doc("spec: [unclosed\n");
        assert!(Document::open(&path).is_err());
    }

    const COMMENTED: &str = "\
# Managed by platform team. Edit through the API.
apiVersion: cluster.x-k8s.io/v1alpha3
kind: MachinePool

spec:
  state: present # desired
  template:
    metadata:
      name: template-cluster   # renamed on clone
  profiles:
    # order matters
    - a
    - b
";

    #[test]
    fn test_comments_survive_edits() {
        let (_tmp, path) = doc(COMMENTED);

        let changed = YamlEditor
            .edit(
                &path,
                &[
                    Edit::set("spec.state", "absent"),
                    Edit::set("spec.template.metadata.name", "acme-prod"),
                ],
            )
            .unwrap();
        assert!(changed);

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            COMMENTED
                .replace("state: present # desired", "state: absent # desired")
                .replace("name: template-cluster   #", "name: acme-prod   #")
        );
    }

    #[test]
    fn test_profile_replacement_keeps_surrounding_text() {
        let (_tmp, path) = doc(COMMENTED);

        YamlEditor
            .edit(
                &path,
                &[
                    Edit::clear("spec.profiles"),
                    Edit::append("spec.profiles", "a"),
                    Edit::append("spec.profiles", "monitoring"),
                ],
            )
            .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Managed by platform team."));
        assert!(written.contains("    # order matters\n    - a\n    - monitoring\n"));
        assert!(!written.contains("- b"));
    }

    #[test]
    fn test_wide_integers_are_editable_and_kept_verbatim() {
        let text = "serial: 123456789012345678901234 # from the registry\nspec:\n  state: present\n";
        let (_tmp, path) = doc(text);

        assert!(YamlEditor.edit(&path, &[Edit::set("spec.state", "absent")]).unwrap());

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, text.replace("present", "absent"));
        let reopened = Document::open(&path).unwrap();
        assert_eq!(
            reopened.get("serial"),
            Some(&Node::Integer("123456789012345678901234".to_string()))
        );
    }

    #[test]
    fn test_unpatchable_layout_falls_back_to_full_render() {
        let (_tmp, path) = doc("spec: &base\n  state: present\nother: *base\n");
        let mut document = Document::open(&path).unwrap();

        document.set_field("spec.state", "absent").unwrap();
        assert!(document.save().unwrap());

        let reopened = Document::open(&path).unwrap();
        assert_eq!(reopened.get("spec.state").unwrap().as_str(), Some("absent"));
        assert_eq!(reopened.get("other.state").unwrap().as_str(), Some("present"));
    }
}
