//! In-memory hierarchical store.

use super::store::{join, split_path, EntryKind, VirtualStore};
use crate::error::{BridgeError, BridgeResult};

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir(DirNode),
}

/// Directory children kept in creation order.
#[derive(Debug, Clone, Default)]
struct DirNode {
    entries: Vec<(String, Node)>,
}

impl DirNode {
    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }

    fn get(&self, name: &str) -> Option<&Node> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, node)| node)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }
}

/// Simple in-memory store, the stand-in for the sandbox filesystem.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    root: DirNode,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the directories a browser sandbox
    /// provides before the bridge starts (`home/web_user` and `tmp`).
    pub fn with_sandbox_defaults() -> Self {
        let mut store = Self::new();
        for dir in ["home", "home/web_user", "tmp"] {
            // Fresh store, parents are created first.
            let _ = store.make_dir(dir);
        }
        store
    }

    fn dir(&self, comps: &[&str]) -> BridgeResult<&DirNode> {
        let mut current = &self.root;
        for (i, comp) in comps.iter().enumerate() {
            match current.get(comp) {
                Some(Node::Dir(dir)) => current = dir,
                Some(Node::File(_)) => {
                    return Err(BridgeError::NotADirectory(comps[..=i].join("/")))
                }
                None => return Err(BridgeError::NotFound(comps[..=i].join("/"))),
            }
        }
        Ok(current)
    }

    fn dir_mut(&mut self, comps: &[&str]) -> BridgeResult<&mut DirNode> {
        let mut current = &mut self.root;
        for (i, comp) in comps.iter().enumerate() {
            match current.get_mut(comp) {
                Some(Node::Dir(dir)) => current = dir,
                Some(Node::File(_)) => {
                    return Err(BridgeError::NotADirectory(comps[..=i].join("/")))
                }
                None => return Err(BridgeError::NotFound(comps[..=i].join("/"))),
            }
        }
        Ok(current)
    }

    fn node(&self, path: &str) -> BridgeResult<&Node> {
        let comps = split_path(path)?;
        let (name, parent) = comps
            .split_last()
            .ok_or_else(|| BridgeError::IsADirectory("/".to_string()))?;
        self.dir(parent)?
            .get(name)
            .ok_or_else(|| BridgeError::NotFound(path.to_string()))
    }
}

/// Split `path` into (parent components, final name).
fn parent_and_name(path: &str) -> BridgeResult<(Vec<&str>, &str)> {
    let mut comps = split_path(path)?;
    let name = comps
        .pop()
        .ok_or_else(|| BridgeError::InvalidName(path.to_string()))?;
    Ok((comps, name))
}

impl VirtualStore for MemoryStore {
    fn read_file(&self, path: &str) -> BridgeResult<Vec<u8>> {
        match self.node(path)? {
            Node::File(data) => Ok(data.clone()),
            Node::Dir(_) => Err(BridgeError::IsADirectory(path.to_string())),
        }
    }

    fn write_file(&mut self, path: &str, data: &[u8]) -> BridgeResult<()> {
        let (parent, name) = parent_and_name(path)?;
        let dir = self.dir_mut(&parent)?;
        match dir.get_mut(name) {
            Some(Node::File(existing)) => *existing = data.to_vec(),
            Some(Node::Dir(_)) => return Err(BridgeError::IsADirectory(path.to_string())),
            None => dir.entries.push((name.to_string(), Node::File(data.to_vec()))),
        }
        Ok(())
    }

    fn remove_file(&mut self, path: &str) -> BridgeResult<()> {
        let (parent, name) = parent_and_name(path)?;
        let dir = self.dir_mut(&parent)?;
        let idx = dir
            .position(name)
            .ok_or_else(|| BridgeError::NotFound(path.to_string()))?;
        if let Node::Dir(_) = dir.entries[idx].1 {
            return Err(BridgeError::IsADirectory(path.to_string()));
        }
        dir.entries.remove(idx);
        Ok(())
    }

    fn list_dir(&self, path: &str) -> BridgeResult<Vec<String>> {
        let comps = split_path(path)?;
        let dir = self.dir(&comps)?;
        let mut names = vec![".".to_string(), "..".to_string()];
        names.extend(dir.entries.iter().map(|(n, _)| n.clone()));
        Ok(names)
    }

    fn kind(&self, path: &str) -> Option<EntryKind> {
        let comps = split_path(path).ok()?;
        if comps.is_empty() {
            return Some(EntryKind::Directory);
        }
        match self.node(path).ok()? {
            Node::File(_) => Some(EntryKind::File),
            Node::Dir(_) => Some(EntryKind::Directory),
        }
    }

    fn make_dir(&mut self, path: &str) -> BridgeResult<()> {
        let (parent, name) = parent_and_name(path)?;
        let dir = self.dir_mut(&parent)?;
        match dir.get(name) {
            Some(Node::Dir(_)) => Ok(()),
            Some(Node::File(_)) => Err(BridgeError::NotADirectory(join(&parent.join("/"), name))),
            None => {
                dir.entries.push((name.to_string(), Node::Dir(DirNode::default())));
                Ok(())
            }
        }
    }

    fn remove_dir(&mut self, path: &str) -> BridgeResult<()> {
        let (parent, name) = parent_and_name(path)?;
        let dir = self.dir_mut(&parent)?;
        let idx = dir
            .position(name)
            .ok_or_else(|| BridgeError::NotFound(path.to_string()))?;
        match &dir.entries[idx].1 {
            Node::Dir(child) if child.entries.is_empty() => {}
            Node::Dir(_) => return Err(BridgeError::NotEmpty(path.to_string())),
            Node::File(_) => return Err(BridgeError::NotADirectory(path.to_string())),
        }
        dir.entries.remove(idx);
        Ok(())
    }
}
