//! Char-offset mapping between the flat story text and the editor's
//! rendered text nodes, plus range splicing for AI edits.
//!
//! The webview reports selections as (node index, offset-within-node)
//! over the text nodes of the editable surface; every offset here is a
//! char offset, never a byte offset.

/// Position inside the rendered node list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePosition {
    pub node_index: usize,
    pub node_offset: usize,
}

/// Flattens a node-local position into an offset from the start of the
/// concatenated text. Out-of-range inputs clamp to the end of content.
pub fn locate(nodes: &[String], pos: NodePosition) -> usize {
    let mut offset = 0;
    for (i, node) in nodes.iter().enumerate() {
        let len = node.chars().count();
        if i == pos.node_index {
            return offset + pos.node_offset.min(len);
        }
        offset += len;
    }
    offset
}

/// Inverse of [`locate`]: finds the node containing `offset`. Offsets
/// past the total length clamp to the end of the last node; an empty
/// node list yields position (0, 0).
pub fn restore(nodes: &[String], offset: usize) -> NodePosition {
    let mut remaining = offset;
    let mut last = NodePosition {
        node_index: 0,
        node_offset: 0,
    };
    for (i, node) in nodes.iter().enumerate() {
        let len = node.chars().count();
        if remaining <= len {
            return NodePosition {
                node_index: i,
                node_offset: remaining,
            };
        }
        remaining -= len;
        last = NodePosition {
            node_index: i,
            node_offset: len,
        };
    }
    last
}

pub fn total_len(nodes: &[String]) -> usize {
    nodes.iter().map(|n| n.chars().count()).sum()
}

/// Replaces the char range `[start, end)` of `content` with
/// `replacement`. Both bounds clamp to the content length and to each
/// other, so a selection that outlived a shrinking edit degrades to an
/// insertion at the end rather than panicking.
pub fn splice(content: &str, start: usize, end: usize, replacement: &str) -> String {
    let char_count = content.chars().count();
    let start = start.min(char_count);
    let end = end.clamp(start, char_count);
    let byte_start = char_to_byte(content, start);
    let byte_end = char_to_byte(content, end);
    let mut out = String::with_capacity(content.len() + replacement.len());
    out.push_str(&content[..byte_start]);
    out.push_str(replacement);
    out.push_str(&content[byte_end..]);
    out
}

fn char_to_byte(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(b, _)| b)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn locate_sums_prior_node_lengths() {
        let n = nodes(&["The cat ", "sat on ", "the mat."]);
        assert_eq!(
            locate(&n, NodePosition { node_index: 0, node_offset: 4 }),
            4
        );
        assert_eq!(
            locate(&n, NodePosition { node_index: 1, node_offset: 0 }),
            8
        );
        assert_eq!(
            locate(&n, NodePosition { node_index: 2, node_offset: 3 }),
            18
        );
    }

    #[test]
    fn locate_clamps_out_of_range() {
        let n = nodes(&["abc", "def"]);
        // Offset past the node length clamps to the node end.
        assert_eq!(
            locate(&n, NodePosition { node_index: 0, node_offset: 99 }),
            3
        );
        // Node index past the end clamps to total length.
        assert_eq!(
            locate(&n, NodePosition { node_index: 9, node_offset: 0 }),
            6
        );
    }

    #[test]
    fn restore_round_trips_every_offset() {
        let n = nodes(&["The cat ", "sat on ", "the mat."]);
        let total = total_len(&n);
        for offset in 0..=total {
            assert_eq!(locate(&n, restore(&n, offset)), offset);
        }
    }

    #[test]
    fn restore_clamps_past_the_end() {
        let n = nodes(&["abc", "de"]);
        assert_eq!(
            restore(&n, 100),
            NodePosition { node_index: 1, node_offset: 2 }
        );
    }

    #[test]
    fn restore_on_empty_content() {
        assert_eq!(
            restore(&[], 5),
            NodePosition { node_index: 0, node_offset: 0 }
        );
        assert_eq!(locate(&[], NodePosition { node_index: 0, node_offset: 3 }), 0);
    }

    #[test]
    fn splice_replaces_char_range() {
        assert_eq!(splice("The cat sat.", 4, 7, "dog"), "The dog sat.");
        assert_eq!(splice("abc", 1, 1, "xyz"), "axyzbc");
        assert_eq!(splice("abc", 0, 3, ""), "");
    }

    #[test]
    fn splice_uses_char_offsets_not_bytes() {
        // Multi-byte chars before the range must not shift it.
        assert_eq!(splice("héllo wörld", 6, 11, "there"), "héllo there");
    }

    #[test]
    fn splice_clamps_degenerate_ranges() {
        assert_eq!(splice("abc", 10, 20, "!"), "abc!");
        assert_eq!(splice("abc", 2, 1, "!"), "ab!c");
    }
}
