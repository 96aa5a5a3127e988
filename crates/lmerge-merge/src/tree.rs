use tracing::debug;

use lmerge_reader::EofReader;
use lmerge_types::{BoxedReader, SharedTraceSink};

use crate::order::LessThan;
use crate::pair::MergePair;

/// Merge any number of sorted readers into one sorted reader.
///
/// Readers are combined pairwise in a balanced binary tree. Zero readers
/// give an empty reader; a single reader is returned as-is.
///
/// Building the tree pre-fetches the first line of every leaf, so this
/// blocks until each leaf has produced something.
pub fn merge_all(less: LessThan, readers: Vec<BoxedReader>) -> BoxedReader {
    merge_all_traced(less, readers, None)
}

/// Like [`merge_all`], recording every merge decision on `trace`.
pub fn merge_all_traced(
    less: LessThan,
    readers: Vec<BoxedReader>,
    trace: Option<SharedTraceSink>,
) -> BoxedReader {
    let leaves = readers.len();
    // Each slot is taken by exactly one path down the tree.
    let mut arena: Vec<Option<BoxedReader>> = readers.into_iter().map(Some).collect();
    let builder = TreeBuilder {
        less: &less,
        trace: trace.as_ref(),
    };
    let root = builder.build(&mut arena, 0, leaves);
    debug!(leaves, depth = tree_depth(leaves), "merge tree built");
    root
}

/// Depth of the tree built over `leaves` readers: ⌈log2 leaves⌉.
pub fn tree_depth(leaves: usize) -> u32 {
    if leaves <= 1 {
        0
    } else {
        usize::BITS - (leaves - 1).leading_zeros()
    }
}

struct TreeBuilder<'a> {
    less: &'a LessThan,
    trace: Option<&'a SharedTraceSink>,
}

impl TreeBuilder<'_> {
    /// Build the subtree over `arena[lo..hi]`.
    fn build(&self, arena: &mut [Option<BoxedReader>], lo: usize, hi: usize) -> BoxedReader {
        match hi - lo {
            0 => Box::new(EofReader),
            1 => arena[lo].take().unwrap_or_else(|| Box::new(EofReader)),
            n => {
                let mid = lo + n / 2;
                let left = self.build(arena, lo, mid);
                let right = self.build(arena, mid, hi);
                let pair = MergePair::new(left, right, self.less.clone());
                match self.trace {
                    Some(trace) => Box::new(pair.with_trace(trace.clone())),
                    None => Box::new(pair),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use lmerge_reader::{ArrayReader, AsyncLineReader, IoSource};
    use lmerge_types::{LineReader, LineReaderExt, MemorySink, MergeError, Result};
    use proptest::prelude::*;

    use crate::order::{lexicographic, numeric};

    fn bytes(data: &[u8]) -> BoxedReader {
        let source = IoSource::new(Cursor::new(data.to_vec()));
        AsyncLineReader::spawn(Some(source), None).unwrap().boxed()
    }

    fn arrays(inputs: &[Vec<String>]) -> Vec<BoxedReader> {
        inputs
            .iter()
            .map(|lines| ArrayReader::from(lines.clone()).boxed())
            .collect()
    }

    fn collect(reader: BoxedReader) -> Vec<String> {
        reader.lines().map(|l| l.unwrap()).collect()
    }

    #[test]
    fn zero_readers_is_empty() {
        let mut root = merge_all(lexicographic(), Vec::new());
        assert!(root.read_line().unwrap().is_none());
        assert!(root.read_line().unwrap().is_none());
    }

    #[test]
    fn single_reader_passes_through() {
        let root = merge_all(lexicographic(), vec![ArrayReader::new(["b", "a"]).boxed()]);
        // Not wrapped in a merger, so even unsorted input comes back untouched.
        assert_eq!(collect(root), vec!["b", "a"]);
    }

    #[test]
    fn three_byte_sources_merge_lexicographically() {
        let root = merge_all(
            lexicographic(),
            vec![bytes(b"67\n8\n99"), bytes(b"7\n9"), bytes(b"77\n88")],
        );
        let mut lines = root.lines();
        let merged: Vec<String> = lines.by_ref().map(|l| l.unwrap()).collect();
        assert_eq!(merged, vec!["67", "7", "77", "8", "88", "9", "99"]);
        let mut root = lines.into_inner();
        assert!(root.read_line().unwrap().is_none());
        root.close().unwrap();
    }

    #[test]
    fn leading_empty_line_sorts_first() {
        let root = merge_all(lexicographic(), vec![bytes(b"\n67\n8\n99\n"), bytes(b"7\n9\n")]);
        assert_eq!(collect(root), vec!["", "67", "7", "8", "9", "99"]);
    }

    #[test]
    fn merge_with_empty_source() {
        let root = merge_all(lexicographic(), vec![bytes(b"\n8\n67\n99\n"), bytes(b"")]);
        assert_eq!(collect(root), vec!["", "8", "67", "99"]);
    }

    #[test]
    fn numeric_order_across_many_leaves() {
        let inputs: Vec<Vec<String>> = (0..7)
            .map(|i| (0..5).map(|j| (j * 7 + i).to_string()).collect())
            .collect();
        let merged = collect(merge_all(numeric(), arrays(&inputs)));
        let expected: Vec<String> = (0..35).map(|n: i32| n.to_string()).collect();
        assert_eq!(merged, expected);
    }

    #[test]
    fn depth_is_ceil_log2() {
        assert_eq!(tree_depth(0), 0);
        assert_eq!(tree_depth(1), 0);
        assert_eq!(tree_depth(2), 1);
        assert_eq!(tree_depth(3), 2);
        assert_eq!(tree_depth(4), 2);
        assert_eq!(tree_depth(5), 3);
        assert_eq!(tree_depth(1024), 10);
        assert_eq!(tree_depth(1025), 11);
    }

    /// Number of merge nodes between the root and leaf `k` of an `n`-leaf
    /// tree, measured by how many nodes emit while the smallest line, held
    /// only by leaf `k`, travels up to the root.
    fn leaf_depth(n: usize, k: usize) -> usize {
        let leaves: Vec<BoxedReader> = (0..n)
            .map(|i| {
                if i == k {
                    ArrayReader::new(["0", "9"]).boxed()
                } else {
                    ArrayReader::from(vec![format!("5{i:02}"), format!("6{i:02}")]).boxed()
                }
            })
            .collect();
        let sink = MemorySink::new();
        let mut root = merge_all_traced(lexicographic(), leaves, Some(sink.clone()));
        let before = sink.len();
        assert_eq!(root.read_line().unwrap().as_deref(), Some("0"));
        sink.messages()[before..]
            .iter()
            .filter(|m| m.starts_with("merge emit"))
            .count()
    }

    #[test]
    fn tree_is_balanced() {
        for n in [2, 3, 4, 5, 6, 7, 8, 13, 16] {
            let depths: Vec<usize> = (0..n).map(|k| leaf_depth(n, k)).collect();
            let deepest = *depths.iter().max().unwrap();
            let shallowest = *depths.iter().min().unwrap();
            assert_eq!(deepest, tree_depth(n) as usize, "n={n} depths={depths:?}");
            assert!(deepest - shallowest <= 1, "n={n} depths={depths:?}");
        }
    }

    #[test]
    fn odd_split_puts_extra_leaf_on_the_right() {
        let depths: Vec<usize> = (0..5).map(|k| leaf_depth(5, k)).collect();
        assert_eq!(depths, vec![2, 2, 2, 3, 3]);
    }

    #[test]
    fn ties_follow_tree_shape() {
        // Leaves [A, B, C] split as [A] | [B, C]; equal keys come out
        // A, then B, then C because every node prefers its left side.
        let by_first: LessThan = Arc::new(|a: &str, b: &str| a.as_bytes()[0] < b.as_bytes()[0]);
        let root = merge_all(
            by_first,
            vec![
                ArrayReader::new(["kA"]).boxed(),
                ArrayReader::new(["kB"]).boxed(),
                ArrayReader::new(["kC"]).boxed(),
            ],
        );
        assert_eq!(collect(root), vec!["kA", "kB", "kC"]);
    }

    /// Fails after `ok` lines and counts closes.
    struct Faulty {
        ok: Vec<String>,
        closes: Arc<AtomicUsize>,
    }

    impl LineReader for Faulty {
        fn read_line(&mut self) -> Result<Option<String>> {
            if self.ok.is_empty() {
                return Err(MergeError::transport(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "leaf failed",
                )));
            }
            Ok(Some(self.ok.remove(0)))
        }

        fn close(&mut self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn leaf_error_reaches_root() {
        let closes = Arc::new(AtomicUsize::new(0));
        let faulty = Faulty {
            ok: vec!["m".into()],
            closes: closes.clone(),
        };
        let mut root = merge_all(
            lexicographic(),
            vec![
                ArrayReader::new(["a", "z"]).boxed(),
                ArrayReader::new(["b"]).boxed(),
                faulty.boxed(),
                ArrayReader::new(["c"]).boxed(),
            ],
        );
        assert_eq!(root.read_line().unwrap().as_deref(), Some("a"));
        assert_eq!(root.read_line().unwrap().as_deref(), Some("b"));
        assert_eq!(root.read_line().unwrap().as_deref(), Some("c"));
        assert_eq!(root.read_line().unwrap().as_deref(), Some("m"));
        let err = root.read_line().unwrap_err();
        assert!(err.to_string().contains("leaf failed"));

        root.close().unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn close_reaches_every_leaf() {
        let closes = Arc::new(AtomicUsize::new(0));
        let leaves: Vec<BoxedReader> = (0..5)
            .map(|i| {
                Box::new(Faulty {
                    ok: vec![format!("{i}")],
                    closes: closes.clone(),
                }) as BoxedReader
            })
            .collect();
        let mut root = merge_all(lexicographic(), leaves);
        root.close().unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn traced_tree_records_merges() {
        let sink = MemorySink::new();
        let root = merge_all_traced(
            lexicographic(),
            arrays(&[vec!["a".to_string()], vec!["b".to_string()], vec!["c".to_string()]]),
            Some(sink.clone()),
        );
        assert_eq!(collect(root), vec!["a", "b", "c"]);
        assert!(!sink.is_empty());
    }

    fn sorted_inputs() -> impl Strategy<Value = Vec<Vec<String>>> {
        prop::collection::vec(
            prop::collection::vec("[0-9]{0,3}", 0..12).prop_map(|mut v| {
                v.sort();
                v
            }),
            0..9,
        )
    }

    /// Left-deep chain: ((r0 + r1) + r2) + ...
    fn chain(less: LessThan, readers: Vec<BoxedReader>) -> BoxedReader {
        let mut iter = readers.into_iter();
        let Some(mut acc) = iter.next() else {
            return Box::new(EofReader);
        };
        for next in iter {
            acc = Box::new(MergePair::new(acc, next, less.clone()));
        }
        acc
    }

    proptest! {
        #[test]
        fn merge_all_is_sorted_union(inputs in sorted_inputs()) {
            let merged = collect(merge_all(lexicographic(), arrays(&inputs)));
            let mut expected: Vec<String> = inputs.into_iter().flatten().collect();
            expected.sort();
            prop_assert_eq!(merged, expected);
        }

        #[test]
        fn tree_shape_does_not_change_result(inputs in sorted_inputs()) {
            let balanced = collect(merge_all(lexicographic(), arrays(&inputs)));
            let chained = collect(chain(lexicographic(), arrays(&inputs)));
            prop_assert_eq!(balanced, chained);
        }

        #[test]
        fn end_of_stream_repeats(inputs in sorted_inputs(), extra in 1usize..6) {
            let mut root = merge_all(lexicographic(), arrays(&inputs));
            while root.read_line().unwrap().is_some() {}
            for _ in 0..extra {
                prop_assert!(root.read_line().unwrap().is_none());
            }
        }
    }
}
