//! Directory tree rendering from a [`FileIndex`].
//!
//! Rendering works from the index, so the scan stays a single traversal.

use std::collections::BTreeMap;

use super::file_index::FileIndex;
use crate::constants::scan::TREE_MAX_FILES_PER_DIR;

#[derive(Default)]
struct DirNode<'a> {
    dirs: BTreeMap<&'a str, DirNode<'a>>,
    files: Vec<&'a str>,
}

/// Render directories down to `max_depth` levels below the root.
///
/// Two spaces of indentation per level, directories end in `/`, and a
/// directory with more than fifty files shows a count instead of names.
pub fn render_tree(root_name: &str, index: &FileIndex, max_depth: usize) -> String {
    let mut root = DirNode::default();
    for record in index.iter() {
        let mut parts: Vec<&str> = record.path.split('/').collect();
        let Some(file) = parts.pop() else {
            continue;
        };
        let mut node = &mut root;
        for dir in parts {
            node = node.dirs.entry(dir).or_default();
        }
        node.files.push(file);
    }

    let mut lines = Vec::new();
    render_dir(root_name, &root, 0, max_depth, &mut lines);
    if index.is_truncated() {
        lines.push(format!("... (truncated after {} files)", index.len()));
    }
    lines.join("\n")
}

fn render_dir(
    name: &str,
    node: &DirNode<'_>,
    level: usize,
    max_depth: usize,
    out: &mut Vec<String>,
) {
    if level > max_depth {
        return;
    }
    out.push(format!("{}{}/", "  ".repeat(level), name));

    let indent = "  ".repeat(level + 1);
    if node.files.len() > TREE_MAX_FILES_PER_DIR {
        out.push(format!("{}... ({} files)", indent, node.files.len()));
    } else {
        for file in &node.files {
            out.push(format!("{}{}", indent, file));
        }
    }

    for (dir_name, child) in &node.dirs {
        render_dir(dir_name, child, level + 1, max_depth, out);
    }
}
