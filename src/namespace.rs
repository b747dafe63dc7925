//! Ordered option trees.
//!
//! A [`Namespace`] holds options and child namespaces in declaration order.
//! Options and namespaces share one name space per level, and a leaf is
//! addressed from the root by its dotted path (`database.pool_size`).
//!
//! Schemas declared in several places are combined with
//! [`merge`](Namespace::merge): children are unioned, an identical
//! redeclaration is a no-op, and anything else is a
//! [`SchemaConflict`](LayerfigError::SchemaConflict).

use crate::error::LayerfigError;
use crate::option::{ConfigOption, OptionSpec};
use crate::value::Value;
use crate::writer::OptionEntry;

/// Separator between the segments of a dotted path.
pub const SEPARATOR: char = '.';

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Option(ConfigOption),
    Namespace(Namespace),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    doc: Option<String>,
    children: Vec<(String, Node)>,
}

pub(crate) fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}{SEPARATOR}{name}")
    }
}

fn segments(path: &str) -> Result<Vec<&str>, LayerfigError> {
    let segments: Vec<&str> = path.split(SEPARATOR).collect();
    if segments.iter().any(|s| s.trim().is_empty()) {
        return Err(LayerfigError::InvalidName(path.to_string()));
    }
    Ok(segments)
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_doc(doc: &str) -> Self {
        Self {
            doc: Some(doc.to_string()),
            children: Vec::new(),
        }
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn set_doc(&mut self, doc: &str) {
        self.doc = Some(doc.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Direct children, in declaration order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(name, node)| (name.as_str(), node))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.children.iter().position(|(n, _)| n == name)
    }

    /// Declare an option. A dotted name creates the intermediate namespaces.
    pub fn add_option(&mut self, spec: OptionSpec) -> Result<&mut ConfigOption, LayerfigError> {
        let path = spec.name.clone().ok_or(LayerfigError::MissingName)?;
        let option =
            ConfigOption::new(spec).map_err(|e| LayerfigError::conversion(path.clone(), e))?;
        self.insert_option(&path, option)
    }

    /// Place an already-built option at `path`, naming it after the last segment.
    pub fn insert_option(
        &mut self,
        path: &str,
        mut option: ConfigOption,
    ) -> Result<&mut ConfigOption, LayerfigError> {
        let segs = segments(path)?;
        let (leaf, parents) = segs
            .split_last()
            .ok_or_else(|| LayerfigError::InvalidName(path.to_string()))?;

        let mut parent = self;
        for (depth, segment) in parents.iter().enumerate() {
            parent = parent.child_namespace(segment, &segs[..=depth].join("."))?;
        }

        if parent.position(leaf).is_some() {
            return Err(LayerfigError::SchemaConflict {
                key: path.to_string(),
                reason: "name already declared at this level".into(),
            });
        }

        option.set_name(leaf);
        parent
            .children
            .push((leaf.to_string(), Node::Option(option)));
        parent
            .option_mut(leaf)
            .ok_or_else(|| LayerfigError::InvalidName(path.to_string()))
    }

    /// Get or create the child namespace at `path`.
    pub fn namespace(&mut self, path: &str) -> Result<&mut Namespace, LayerfigError> {
        let segs = segments(path)?;
        let mut current = self;
        for (depth, segment) in segs.iter().enumerate() {
            current = current.child_namespace(segment, &segs[..=depth].join("."))?;
        }
        Ok(current)
    }

    fn child_namespace(
        &mut self,
        name: &str,
        full_path: &str,
    ) -> Result<&mut Namespace, LayerfigError> {
        let index = match self.position(name) {
            Some(i) => i,
            None => {
                self.children
                    .push((name.to_string(), Node::Namespace(Namespace::new())));
                self.children.len() - 1
            }
        };
        match &mut self.children[index].1 {
            Node::Namespace(ns) => Ok(ns),
            Node::Option(_) => Err(LayerfigError::SchemaConflict {
                key: full_path.to_string(),
                reason: "already declared as an option".into(),
            }),
        }
    }

    pub fn get(&self, path: &str) -> Option<&Node> {
        let mut current = self;
        let mut segs = path.split(SEPARATOR).peekable();
        while let Some(segment) = segs.next() {
            let index = current.position(segment)?;
            let node = &current.children[index].1;
            if segs.peek().is_none() {
                return Some(node);
            }
            match node {
                Node::Namespace(ns) => current = ns,
                Node::Option(_) => return None,
            }
        }
        None
    }

    pub fn option(&self, path: &str) -> Option<&ConfigOption> {
        match self.get(path)? {
            Node::Option(option) => Some(option),
            Node::Namespace(_) => None,
        }
    }

    pub fn option_mut(&mut self, path: &str) -> Option<&mut ConfigOption> {
        let (parents, leaf) = match path.rsplit_once(SEPARATOR) {
            Some((parents, leaf)) => (Some(parents), leaf),
            None => (None, path),
        };
        let mut current = self;
        if let Some(parents) = parents {
            for segment in parents.split(SEPARATOR) {
                let index = current.position(segment)?;
                current = match &mut current.children[index].1 {
                    Node::Namespace(ns) => ns,
                    Node::Option(_) => return None,
                };
            }
        }
        let index = current.position(leaf)?;
        match &mut current.children[index].1 {
            Node::Option(option) => Some(option),
            Node::Namespace(_) => None,
        }
    }

    /// Current value of the option at `path`.
    pub fn value(&self, path: &str) -> Option<&Value> {
        self.option(path)?.value()
    }

    pub fn contains_option(&self, path: &str) -> bool {
        self.option(path).is_some()
    }

    /// Every option, depth-first in declaration order.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves {
            stack: vec![(String::new(), self.children.iter())],
        }
    }

    /// Union `other` into this namespace.
    pub fn merge(&mut self, other: Namespace) -> Result<(), LayerfigError> {
        self.merge_at("", other)
    }

    fn merge_at(&mut self, prefix: &str, other: Namespace) -> Result<(), LayerfigError> {
        if self.doc.is_none() {
            self.doc = other.doc;
        }
        for (name, theirs) in other.children {
            let key = join(prefix, &name);
            let Some(index) = self.position(&name) else {
                self.children.push((name, theirs));
                continue;
            };
            match (&mut self.children[index].1, theirs) {
                (Node::Namespace(mine), Node::Namespace(theirs)) => mine.merge_at(&key, theirs)?,
                (Node::Option(mine), Node::Option(theirs)) => {
                    if !mine.same_declaration(&theirs) {
                        return Err(LayerfigError::SchemaConflict {
                            key,
                            reason: "option declared twice with different metadata".into(),
                        });
                    }
                }
                _ => {
                    return Err(LayerfigError::SchemaConflict {
                        key,
                        reason: "declared as both an option and a namespace".into(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Combine several schemas into one.
    pub fn union(schemas: impl IntoIterator<Item = Namespace>) -> Result<Namespace, LayerfigError> {
        let mut merged = Namespace::new();
        for schema in schemas {
            merged.merge(schema)?;
        }
        Ok(merged)
    }

    pub(crate) fn try_for_each_option_mut<E>(
        &mut self,
        f: &mut dyn FnMut(&str, &mut ConfigOption) -> Result<(), E>,
    ) -> Result<(), E> {
        self.walk_mut("", f)
    }

    fn walk_mut<E>(
        &mut self,
        prefix: &str,
        f: &mut dyn FnMut(&str, &mut ConfigOption) -> Result<(), E>,
    ) -> Result<(), E> {
        for (name, node) in &mut self.children {
            let path = join(prefix, name);
            match node {
                Node::Option(option) => f(&path, option)?,
                Node::Namespace(ns) => ns.walk_mut(&path, f)?,
            }
        }
        Ok(())
    }
}

/// Lazy depth-first walk over a namespace's options.
pub struct Leaves<'a> {
    stack: Vec<(String, std::slice::Iter<'a, (String, Node)>)>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = OptionEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (prefix, iter) = self.stack.last_mut()?;
            match iter.next() {
                None => {
                    self.stack.pop();
                }
                Some((name, Node::Option(option))) => {
                    return Some(OptionEntry {
                        path: join(prefix, name),
                        name,
                        option,
                    });
                }
                Some((name, Node::Namespace(ns))) => {
                    let path = join(prefix, name);
                    self.stack.push((path, ns.children.iter()));
                }
            }
        }
    }
}
