//! Book tree: a prefix tree over the move sequences of an opening family.
//!
//! ## Building
//!
//! [`BookTree::build`] walks every selected variation from the root, creating a
//! child only where a token is new at that node, so lines sharing their first
//! `k` moves share the same first `k` nodes. The node reached by the last token
//! is marked terminal and receives the variation's name and explanation.
//!
//! When two variations end on the same node, the first one in catalog order
//! keeps the metadata. Zero-length variations are skipped.
//!
//! ## Querying
//!
//! All queries take a move history (the tokens played from the start) and are
//! total: a history that leaves the tree yields no moves and no metadata. A
//! built tree is never mutated and can be shared between sessions behind an
//! `Arc`.

use std::collections::BTreeMap;

use log::{debug, warn};
use rand::Rng;

use crate::opening_engine::{
    error::{Error, Result},
    models::{same_move, MoveToken, OpeningFamily},
    rules::RulesEngine,
};

/// One position reached by a specific sequence of moves from the start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrieNode {
    children: BTreeMap<MoveToken, TrieNode>,
    position_id: Option<String>,
    is_terminal: bool,
    variation_name: Option<String>,
    explanation: Option<String>,
}

impl TrieNode {
    pub fn children(&self) -> impl Iterator<Item = (&str, &TrieNode)> {
        self.children.iter().map(|(mv, node)| (mv.as_str(), node))
    }

    pub fn child(&self, token: &str) -> Option<&TrieNode> {
        self.children.get(token)
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Cached position identifier, present when built with a rules engine.
    pub fn position_id(&self) -> Option<&str> {
        self.position_id.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.is_terminal
    }

    pub fn variation_name(&self) -> Option<&str> {
        self.variation_name.as_deref()
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    fn depth(&self) -> usize {
        self.children.values().map(|c| 1 + c.depth()).max().unwrap_or(0)
    }

    fn count(&self, pred: &dyn Fn(&TrieNode) -> bool) -> usize {
        let own = usize::from(pred(self));
        own + self.children.values().map(|c| c.count(pred)).sum::<usize>()
    }
}

/// Terminal metadata of a node, as returned by [`BookTree::position_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionInfo<'a> {
    pub variation_name: Option<&'a str>,
    pub explanation: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookTree {
    family: String,
    variation_index: Option<usize>,
    root: TrieNode,
}

// ---------------------------------------------------------------------------
// Move Trie Builder
// ---------------------------------------------------------------------------

impl BookTree {
    /// Compile `family` into a tree. With `variation_index`, only that line is
    /// included; otherwise every variation is merged.
    pub fn build(family: &OpeningFamily, variation_index: Option<usize>) -> Result<BookTree> {
        compile(family, variation_index, None)
    }

    /// Like [`BookTree::build`], additionally caching each node's position id
    /// by replaying the moves through `engine`. The engine is reset before
    /// every variation and left at the end of the last one.
    pub fn build_with_positions<E: RulesEngine>(
        family: &OpeningFamily,
        variation_index: Option<usize>,
        engine: &mut E,
    ) -> Result<BookTree> {
        compile(family, variation_index, Some(engine as &mut dyn RulesEngine))
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn variation_index(&self) -> Option<usize> {
        self.variation_index
    }

    pub fn root(&self) -> &TrieNode {
        &self.root
    }
}

fn compile(
    family: &OpeningFamily,
    variation_index: Option<usize>,
    mut engine: Option<&mut dyn RulesEngine>,
) -> Result<BookTree> {
    let selected = match variation_index {
        Some(index) => {
            let variation = family.variations.get(index).ok_or_else(|| {
                Error::VariationIndexOutOfRange {
                    family: family.name.clone(),
                    index,
                    len: family.variations.len(),
                }
            })?;
            std::slice::from_ref(variation)
        }
        None => family.variations.as_slice(),
    };

    let mut root = TrieNode::default();
    if let Some(engine) = engine.as_deref_mut() {
        engine.reset();
        root.position_id = Some(engine.position_id());
    }

    for variation in selected {
        if variation.move_sequence.is_empty() {
            warn!(
                "skipping variation '{}' of '{}': it has no moves",
                variation.name, family.name
            );
            continue;
        }

        // Position ids stop being cached for the rest of a line once the
        // engine refuses one of its moves.
        let mut replaying = match engine.as_deref_mut() {
            Some(engine) => {
                engine.reset();
                true
            }
            None => false,
        };

        let mut node = &mut root;
        for (ply, token) in variation.move_sequence.iter().enumerate() {
            let mut position_id = None;
            if replaying {
                if let Some(engine) = engine.as_deref_mut() {
                    match engine.apply_san(token) {
                        Ok(applied) => position_id = Some(applied.position_id),
                        Err(err) => {
                            warn!(
                                "variation '{}' of '{}': ply {} ({}) not replayable: {}",
                                variation.name, family.name, ply, token, err
                            );
                            replaying = false;
                        }
                    }
                }
            }

            node = node.children.entry(token.clone()).or_default();
            if node.position_id.is_none() {
                node.position_id = position_id;
            }
        }

        if node.is_terminal {
            debug!(
                "variation '{}' ends on the same node as '{}'; keeping the first",
                variation.name,
                node.variation_name.as_deref().unwrap_or("?")
            );
        } else {
            node.is_terminal = true;
            node.variation_name = Some(variation.name.clone());
            node.explanation = variation.explanation.clone();
        }
    }

    Ok(BookTree {
        family: family.name.clone(),
        variation_index,
        root,
    })
}

// ---------------------------------------------------------------------------
// Book Query Layer
// ---------------------------------------------------------------------------

impl BookTree {
    /// Node reached by following `history` from the root, or `None` if the
    /// history leaves the tree.
    pub fn node_at<S: AsRef<str>>(&self, history: &[S]) -> Option<&TrieNode> {
        history
            .iter()
            .try_fold(&self.root, |node, token| node.children.get(token.as_ref()))
    }

    /// Book continuations after `history`, in sorted order. Empty when the
    /// line has ended or the history diverged from the book.
    pub fn valid_moves<S: AsRef<str>>(&self, history: &[S]) -> Vec<&str> {
        self.node_at(history)
            .map(|node| node.children.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// The book token matching `candidate` after `history`, ignoring `+` / `#`.
    pub fn book_move_for<S: AsRef<str>>(&self, history: &[S], candidate: &str) -> Option<&str> {
        self.valid_moves(history)
            .into_iter()
            .find(|mv| same_move(mv, candidate))
    }

    pub fn is_valid_move<S: AsRef<str>>(&self, history: &[S], candidate: &str) -> bool {
        self.book_move_for(history, candidate).is_some()
    }

    /// Uniformly pick one of [`BookTree::valid_moves`] using `rng`.
    pub fn pick_random_move<S, R>(&self, history: &[S], rng: &mut R) -> Option<&str>
    where
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        let moves = self.valid_moves(history);
        if moves.is_empty() {
            return None;
        }
        Some(moves[rng.gen_range(0..moves.len())])
    }

    pub fn is_end_of_line<S: AsRef<str>>(&self, history: &[S]) -> bool {
        self.valid_moves(history).is_empty()
    }

    /// Terminal metadata of the node reached by `history`.
    pub fn position_info<S: AsRef<str>>(&self, history: &[S]) -> Option<PositionInfo<'_>> {
        let node = self.node_at(history)?;
        if node.variation_name.is_none() && node.explanation.is_none() {
            return None;
        }
        Some(PositionInfo {
            variation_name: node.variation_name.as_deref(),
            explanation: node.explanation.as_deref(),
        })
    }

    /// Length of the longest book continuation after `history`.
    pub fn max_depth_from<S: AsRef<str>>(&self, history: &[S]) -> Option<usize> {
        self.node_at(history).map(TrieNode::depth)
    }

    /// Number of distinct named line endings.
    pub fn line_count(&self) -> usize {
        self.root.count(&|n| n.is_terminal)
    }

    /// Number of positions in the tree, root included.
    pub fn node_count(&self) -> usize {
        self.root.count(&|_| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opening_engine::models::{Side, Variation};
    use crate::opening_engine::rules::ShakmatyEngine;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const EMPTY: [&str; 0] = [];

    fn family(variations: Vec<Variation>) -> OpeningFamily {
        OpeningFamily {
            name: "Test Family".to_string(),
            eco_code: "C50".to_string(),
            description: String::new(),
            default_color: Side::White,
            variations,
        }
    }

    fn open_games() -> OpeningFamily {
        family(vec![
            Variation::new("Ruy Lopez", &["e4", "e5", "Nf3", "Nc6", "Bb5"])
                .with_explanation("Pressure on the e5 defender."),
            Variation::new("Italian Game", &["e4", "e5", "Nf3", "Nc6", "Bc4"]),
            Variation::new("Sicilian", &["e4", "c5"]),
        ])
    }

    #[test]
    fn shared_prefixes_share_nodes() {
        let tree = BookTree::build(&open_games(), None).unwrap();
        assert_eq!(tree.valid_moves(&EMPTY), vec!["e4"]);
        assert_eq!(tree.valid_moves(&["e4"]), vec!["c5", "e5"]);
        assert_eq!(tree.valid_moves(&["e4", "e5", "Nf3", "Nc6"]), vec!["Bb5", "Bc4"]);
        // root + e4 + c5 + e5 + Nf3 + Nc6 + Bb5 + Bc4
        assert_eq!(tree.node_count(), 8);
        assert_eq!(tree.line_count(), 3);
    }

    #[test]
    fn terminal_nodes_carry_variation_metadata() {
        let tree = BookTree::build(&open_games(), None).unwrap();
        let info = tree.position_info(&["e4", "e5", "Nf3", "Nc6", "Bb5"]).unwrap();
        assert_eq!(info.variation_name, Some("Ruy Lopez"));
        assert_eq!(info.explanation, Some("Pressure on the e5 defender."));

        let info = tree.position_info(&["e4", "e5", "Nf3", "Nc6", "Bc4"]).unwrap();
        assert_eq!(info.variation_name, Some("Italian Game"));
        assert_eq!(info.explanation, None);

        assert!(tree.position_info(&["e4", "e5"]).is_none());
    }

    #[test]
    fn node_can_be_terminal_and_have_children() {
        let fam = family(vec![
            Variation::new("King's Pawn", &["e4", "e5"]),
            Variation::new("King's Knight", &["e4", "e5", "Nf3"]),
        ]);
        let tree = BookTree::build(&fam, None).unwrap();
        let node = tree.node_at(&["e4", "e5"]).unwrap();
        assert!(node.is_terminal());
        assert!(node.has_children());
        assert!(!tree.is_end_of_line(&["e4", "e5"]));
    }

    #[test]
    fn first_variation_wins_a_shared_ending() {
        let fam = family(vec![
            Variation::new("First", &["d4", "d5"]).with_explanation("one"),
            Variation::new("Second", &["d4", "d5"]).with_explanation("two"),
        ]);
        let tree = BookTree::build(&fam, None).unwrap();
        let info = tree.position_info(&["d4", "d5"]).unwrap();
        assert_eq!(info.variation_name, Some("First"));
        assert_eq!(info.explanation, Some("one"));
        assert_eq!(tree.line_count(), 1);
    }

    #[test]
    fn empty_variations_are_skipped() {
        let fam = family(vec![
            Variation::new("Nothing", &[]),
            Variation::new("English", &["c4"]),
        ]);
        let tree = BookTree::build(&fam, None).unwrap();
        assert!(!tree.root().is_terminal());
        assert_eq!(tree.valid_moves(&EMPTY), vec!["c4"]);
    }

    #[test]
    fn single_variation_mode_compiles_one_line() {
        let tree = BookTree::build(&open_games(), Some(2)).unwrap();
        assert_eq!(tree.variation_index(), Some(2));
        assert_eq!(tree.valid_moves(&["e4"]), vec!["c5"]);
        assert_eq!(tree.line_count(), 1);

        let err = BookTree::build(&open_games(), Some(3)).unwrap_err();
        assert!(matches!(err, Error::VariationIndexOutOfRange { index: 3, len: 3, .. }));
    }

    #[test]
    fn diverged_history_has_no_moves_and_no_info() {
        let tree = BookTree::build(&open_games(), None).unwrap();
        assert!(tree.node_at(&["d4"]).is_none());
        assert!(tree.valid_moves(&["d4", "d5"]).is_empty());
        assert!(tree.is_end_of_line(&["d4"]));
        assert!(tree.position_info(&["d4"]).is_none());
        assert!(tree.pick_random_move(&["d4"], &mut StdRng::seed_from_u64(1)).is_none());
    }

    #[test]
    fn validity_ignores_check_annotations() {
        let fam = family(vec![Variation::new(
            "Check",
            &["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5", "c3", "Nf6", "d4", "exd4", "cxd4", "Bb4+"],
        )]);
        let tree = BookTree::build(&fam, None).unwrap();
        let history = &fam.variations[0].move_sequence[..11];
        assert!(tree.is_valid_move(history, "Bb4+"));
        assert!(tree.is_valid_move(history, "Bb4"));
        assert!(tree.is_valid_move(history, "Bb4#"));
        assert_eq!(tree.book_move_for(history, "Bb4"), Some("Bb4+"));
        assert!(!tree.is_valid_move(history, "Bd6"));
    }

    #[test]
    fn random_pick_follows_the_injected_source() {
        let tree = BookTree::build(&open_games(), None).unwrap();
        let history = ["e4", "e5", "Nf3", "Nc6"];
        // StepRng(0, 0) always yields zero, which maps to the first move.
        let mut low = StepRng::new(0, 0);
        assert_eq!(tree.pick_random_move(&history, &mut low), Some("Bb5"));
        assert_eq!(tree.pick_random_move(&["e4", "e5", "Nf3"], &mut low), Some("Nc6"));
    }

    #[test]
    fn random_pick_is_roughly_uniform() {
        let tree = BookTree::build(&open_games(), None).unwrap();
        let history = ["e4", "e5", "Nf3", "Nc6"];
        let mut rng = StdRng::seed_from_u64(42);
        let mut bb5 = 0usize;
        let trials = 4000;
        for _ in 0..trials {
            match tree.pick_random_move(&history, &mut rng) {
                Some("Bb5") => bb5 += 1,
                Some("Bc4") => {}
                other => panic!("pick outside the book: {other:?}"),
            }
        }
        let share = bb5 as f64 / trials as f64;
        assert!((0.45..0.55).contains(&share), "Bb5 share {share} is not near 1/2");
    }

    #[test]
    fn max_depth_measures_the_longest_continuation() {
        let tree = BookTree::build(&open_games(), None).unwrap();
        assert_eq!(tree.max_depth_from(&EMPTY), Some(5));
        assert_eq!(tree.max_depth_from(&["e4", "c5"]), Some(0));
        assert_eq!(tree.max_depth_from(&["a3"]), None);
    }

    #[test]
    fn building_with_engine_caches_positions() {
        let mut engine = ShakmatyEngine::new();
        let tree = BookTree::build_with_positions(&open_games(), None, &mut engine).unwrap();
        assert_eq!(
            tree.root().position_id(),
            Some("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
        );
        let after_e4 = tree.node_at(&["e4"]).unwrap().position_id().unwrap();
        assert!(after_e4.starts_with("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b"));
        assert!(tree.node_at(&["e4", "c5"]).unwrap().position_id().is_some());
    }

    #[test]
    fn unsound_lines_still_build_without_positions() {
        let fam = family(vec![Variation::new("Nonsense", &["e4", "e4", "Nf3"])]);
        let mut engine = ShakmatyEngine::new();
        let tree = BookTree::build_with_positions(&fam, None, &mut engine).unwrap();
        assert!(tree.node_at(&["e4"]).unwrap().position_id().is_some());
        assert!(tree.node_at(&["e4", "e4"]).unwrap().position_id().is_none());
        assert!(tree.node_at(&["e4", "e4", "Nf3"]).unwrap().is_terminal());
    }

    #[test]
    fn rebuilding_yields_an_identical_tree() {
        let a = BookTree::build(&open_games(), None).unwrap();
        let b = BookTree::build(&open_games(), None).unwrap();
        assert_eq!(a, b);
    }
}
