//! Applies a layer's [`GraphOptions`] to its raw snapped edges.
//!
//! The edges are sorted twice (by outgoing and by reversed edge) and merge
//! joined, so that every distinct edge is visited once together with all of
//! its copies and all copies of its reverse.

use super::graph::{DegenerateEdges, DuplicateEdges, EdgeType, GraphOptions, SiblingPairs};
use super::ids::{reverse, Edge, VertexId};
use super::lexicon::{IdSetId, IdSetLexicon};
use crate::budget::MemoryBudget;
use crate::error::BuildError;

struct EdgeProcessor<'a> {
    options: GraphOptions,
    edges: &'a [Edge],
    input_ids: &'a [IdSetId],
    lexicon: &'a mut IdSetLexicon,
    budget: &'a mut MemoryBudget,
    out_edges: Vec<usize>,
    in_edges: Vec<usize>,
    new_edges: Vec<Edge>,
    new_input_ids: Vec<IdSetId>,
}

impl EdgeProcessor<'_> {
    fn add_edges(&mut self, count: usize, edge: Edge, ids: IdSetId) -> Result<(), BuildError> {
        for _ in 0..count {
            self.budget.push(&mut self.new_edges, edge)?;
            self.budget.push(&mut self.new_input_ids, ids)?;
        }
        Ok(())
    }

    fn copy_edges(&mut self, out_begin: usize, out_end: usize) -> Result<(), BuildError> {
        for i in out_begin..out_end {
            let e = self.out_edges[i];
            self.budget.push(&mut self.new_edges, self.edges[e])?;
            self.budget.push(&mut self.new_input_ids, self.input_ids[e])?;
        }
        Ok(())
    }

    fn merge_input_ids(&mut self, out_begin: usize, out_end: usize) -> IdSetId {
        if out_end - out_begin == 1 {
            return self.input_ids[self.out_edges[out_begin]];
        }
        let mut ids = Vec::new();
        for &e in &self.out_edges[out_begin..out_end] {
            ids.extend(self.lexicon.id_set(self.input_ids[e]));
        }
        self.lexicon.add(ids)
    }

    fn out_at(&self, i: usize, sentinel: Edge) -> Edge {
        self.out_edges.get(i).map_or(sentinel, |&e| self.edges[e])
    }

    fn in_at(&self, i: usize, sentinel: Edge) -> Edge {
        self.in_edges
            .get(i)
            .map_or(sentinel, |&e| reverse(self.edges[e]))
    }

    fn run(&mut self) -> Result<(), BuildError> {
        let n = self.edges.len();
        let opts = self.options;
        let sentinel = (VertexId(u32::MAX), VertexId(u32::MAX));
        let mut missing_siblings = false;
        let (mut out, mut inn) = (0usize, 0usize);
        loop {
            let edge = self.out_at(out, sentinel).min(self.in_at(inn, sentinel));
            if edge == sentinel {
                break;
            }
            let (out_begin, in_begin) = (out, inn);
            while self.out_at(out, sentinel) == edge {
                out += 1;
            }
            while self.in_at(inn, sentinel) == edge {
                inn += 1;
            }
            let n_out = out - out_begin;
            let n_in = inn - in_begin;

            if edge.0 == edge.1 {
                debug_assert_eq!(n_out, n_in);
                if opts.degenerate_edges == DegenerateEdges::Discard {
                    continue;
                }
                if opts.degenerate_edges == DegenerateEdges::DiscardExcess {
                    let v = edge.0;
                    let touches = (out_begin > 0 && self.edges[self.out_edges[out_begin - 1]].0 == v)
                        || (out < n && self.edges[self.out_edges[out]].0 == v)
                        || (in_begin > 0 && self.edges[self.in_edges[in_begin - 1]].1 == v)
                        || (inn < n && self.edges[self.in_edges[inn]].1 == v);
                    if touches {
                        continue;
                    }
                }
                let merge = opts.duplicate_edges == DuplicateEdges::Merge
                    || opts.degenerate_edges == DegenerateEdges::DiscardExcess;
                if opts.edge_type == EdgeType::Undirected
                    && matches!(opts.sibling_pairs, SiblingPairs::Require | SiblingPairs::Create)
                {
                    // Undirected edges with guaranteed siblings are halved.
                    let ids = self.merge_input_ids(out_begin, out);
                    self.add_edges(if merge { 1 } else { n_out / 2 }, edge, ids)?;
                } else if merge {
                    let ids = self.merge_input_ids(out_begin, out);
                    let count = if opts.edge_type == EdgeType::Undirected { 2 } else { 1 };
                    self.add_edges(count, edge, ids)?;
                } else if matches!(
                    opts.sibling_pairs,
                    SiblingPairs::Discard | SiblingPairs::DiscardExcess
                ) {
                    // Options that discard edges merge the ids of duplicates.
                    let ids = self.merge_input_ids(out_begin, out);
                    self.add_edges(n_out, edge, ids)?;
                } else {
                    self.copy_edges(out_begin, out)?;
                }
                continue;
            }

            match opts.sibling_pairs {
                SiblingPairs::Keep => {
                    if n_out > 1 && opts.duplicate_edges == DuplicateEdges::Merge {
                        let ids = self.merge_input_ids(out_begin, out);
                        self.add_edges(1, edge, ids)?;
                    } else {
                        self.copy_edges(out_begin, out)?;
                    }
                }
                SiblingPairs::Discard => {
                    if opts.edge_type == EdgeType::Directed {
                        // Only the excess of AB over BA survives.
                        if n_out <= n_in {
                            continue;
                        }
                        let ids = self.merge_input_ids(out_begin, out);
                        let count = if opts.duplicate_edges == DuplicateEdges::Merge {
                            1
                        } else {
                            n_out - n_in
                        };
                        self.add_edges(count, edge, ids)?;
                    } else {
                        if n_out % 2 == 0 {
                            continue;
                        }
                        let ids = self.merge_input_ids(out_begin, out);
                        self.add_edges(1, edge, ids)?;
                    }
                }
                SiblingPairs::DiscardExcess => {
                    if opts.edge_type == EdgeType::Directed {
                        // As above, but one balanced pair is kept.
                        if n_out < n_in {
                            continue;
                        }
                        let ids = self.merge_input_ids(out_begin, out);
                        let count = if opts.duplicate_edges == DuplicateEdges::Merge {
                            1
                        } else {
                            (n_out - n_in).max(1)
                        };
                        self.add_edges(count, edge, ids)?;
                    } else {
                        let ids = self.merge_input_ids(out_begin, out);
                        self.add_edges(if n_out % 2 == 1 { 1 } else { 2 }, edge, ids)?;
                    }
                }
                SiblingPairs::Require | SiblingPairs::Create => {
                    let unpaired = match opts.edge_type {
                        EdgeType::Directed => n_out != n_in,
                        EdgeType::Undirected => n_out % 2 != 0,
                    };
                    if opts.sibling_pairs == SiblingPairs::Require && unpaired {
                        missing_siblings = true;
                    }
                    if opts.duplicate_edges == DuplicateEdges::Merge {
                        let ids = self.merge_input_ids(out_begin, out);
                        self.add_edges(1, edge, ids)?;
                    } else if opts.edge_type == EdgeType::Undirected {
                        // The graph becomes directed: one edge per pair.
                        let ids = self.merge_input_ids(out_begin, out);
                        self.add_edges((n_out + 1) / 2, edge, ids)?;
                    } else {
                        self.copy_edges(out_begin, out)?;
                        if n_in > n_out {
                            // Created edges carry no input ids.
                            self.add_edges(n_in - n_out, edge, IdSetId::EMPTY)?;
                        }
                    }
                }
            }
        }
        if missing_siblings {
            return Err(BuildError::MissingExpectedSiblingEdges);
        }
        Ok(())
    }
}

/// Replace `edges` and `input_ids` with their processed versions.
///
/// The sort orders and the new vectors are charged to `budget`, and the old
/// vectors are released from it, so callers charge them to the same budget.
pub(crate) fn run(
    options: GraphOptions,
    edges: &mut Vec<Edge>,
    input_ids: &mut Vec<IdSetId>,
    lexicon: &mut IdSetLexicon,
    budget: &mut MemoryBudget,
) -> Result<(), BuildError> {
    if edges.is_empty() {
        return Ok(());
    }
    let n = edges.len();
    // Stable sorts keep identical undirected input edges paired with their
    // own reverses.
    let mut out_edges: Vec<usize> = Vec::new();
    budget.reserve(&mut out_edges, n)?;
    out_edges.extend(0..n);
    out_edges.sort_by_key(|&e| (edges[e], e));
    let mut in_edges: Vec<usize> = Vec::new();
    budget.reserve(&mut in_edges, n)?;
    in_edges.extend(0..n);
    in_edges.sort_by_key(|&e| (reverse(edges[e]), e));

    let mut new_edges = Vec::new();
    budget.reserve(&mut new_edges, n)?;
    let mut new_input_ids = Vec::new();
    budget.reserve(&mut new_input_ids, n)?;

    let mut processor = EdgeProcessor {
        options,
        edges: edges.as_slice(),
        input_ids: input_ids.as_slice(),
        lexicon,
        budget: &mut *budget,
        out_edges,
        in_edges,
        new_edges,
        new_input_ids,
    };
    let result = processor.run();
    let EdgeProcessor {
        mut out_edges,
        mut in_edges,
        new_edges,
        new_input_ids,
        ..
    } = processor;
    budget.release(&mut out_edges);
    budget.release(&mut in_edges);
    budget.release(edges);
    budget.release(input_ids);
    *edges = new_edges;
    *input_ids = new_input_ids;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::graph::Graph;

    fn v(i: u32) -> VertexId {
        VertexId(i)
    }

    fn process(options: GraphOptions, input: &[(u32, u32)]) -> (Vec<(u32, u32)>, Vec<Vec<u32>>) {
        let mut edges: Vec<Edge> = input.iter().map(|&(a, b)| (v(a), v(b))).collect();
        let mut ids: Vec<IdSetId> = (0..input.len() as u32).map(IdSetId::singleton).collect();
        let mut lexicon = IdSetLexicon::new();
        let mut options = options;
        let mut budget = MemoryBudget::unlimited();
        let _ = Graph::process_edges(&mut options, &mut edges, &mut ids, &mut lexicon, &mut budget);
        (
            edges.iter().map(|e| (e.0 .0, e.1 .0)).collect(),
            ids.iter().map(|&id| lexicon.id_set(id).to_vec()).collect(),
        )
    }

    fn opts(d: DegenerateEdges, dup: DuplicateEdges, s: SiblingPairs) -> GraphOptions {
        GraphOptions::new(EdgeType::Directed, d, dup, s)
    }

    #[test]
    fn test_sorts_and_keeps_by_default() {
        let (edges, ids) = process(GraphOptions::default(), &[(1, 0), (0, 1), (0, 1)]);
        assert_eq!(edges, vec![(0, 1), (0, 1), (1, 0)]);
        assert_eq!(ids, vec![vec![1], vec![2], vec![0]]);
    }

    #[test]
    fn test_merge_duplicates_unions_input_ids() {
        let o = opts(DegenerateEdges::Keep, DuplicateEdges::Merge, SiblingPairs::Keep);
        let (edges, ids) = process(o, &[(0, 1), (0, 1), (1, 2)]);
        assert_eq!(edges, vec![(0, 1), (1, 2)]);
        assert_eq!(ids[0], vec![0, 1]);
    }

    #[test]
    fn test_sibling_discard_keeps_excess() {
        let o = opts(DegenerateEdges::Keep, DuplicateEdges::Keep, SiblingPairs::Discard);
        let (edges, _) = process(o, &[(0, 1), (1, 0), (0, 1), (2, 3), (3, 2)]);
        assert_eq!(edges, vec![(0, 1)]);
        let o = opts(DegenerateEdges::Keep, DuplicateEdges::Keep, SiblingPairs::DiscardExcess);
        let (edges, _) = process(o, &[(2, 3), (3, 2)]);
        assert_eq!(edges, vec![(2, 3), (3, 2)]);
    }

    #[test]
    fn test_degenerate_discard_excess() {
        let o = opts(DegenerateEdges::DiscardExcess, DuplicateEdges::Keep, SiblingPairs::Keep);
        let (edges, ids) = process(o, &[(0, 0), (0, 1), (2, 2), (2, 2)]);
        assert_eq!(edges, vec![(0, 1), (2, 2)]);
        assert_eq!(ids[1], vec![2, 3]);
    }

    #[test]
    fn test_require_reports_missing_siblings() {
        let mut edges = vec![(v(0), v(1))];
        let mut ids = vec![IdSetId::singleton(0)];
        let mut lexicon = IdSetLexicon::new();
        let o = opts(DegenerateEdges::Keep, DuplicateEdges::Keep, SiblingPairs::Require);
        assert_eq!(
            run(o, &mut edges, &mut ids, &mut lexicon, &mut MemoryBudget::unlimited()),
            Err(BuildError::MissingExpectedSiblingEdges)
        );
        // The missing sibling is still added.
        assert_eq!(edges, vec![(v(0), v(1)), (v(1), v(0))]);
        assert!(lexicon.id_set(ids[1]).is_empty());
    }

    #[test]
    fn test_budget_limits_edge_processing() {
        let mut edges: Vec<Edge> = (0..8).map(|i| (v(i), v(i + 1))).collect();
        let mut ids: Vec<IdSetId> = (0..8).map(IdSetId::singleton).collect();
        let mut lexicon = IdSetLexicon::new();
        let o = GraphOptions::default();
        // Room for one sort order but not the second.
        let mut budget = MemoryBudget::with_limit(Some(8 * std::mem::size_of::<usize>()));
        assert!(matches!(
            run(o, &mut edges, &mut ids, &mut lexicon, &mut budget),
            Err(BuildError::ResourceExhausted { .. })
        ));
        assert_eq!(edges.len(), 8);

        let mut budget = MemoryBudget::unlimited();
        run(o, &mut edges, &mut ids, &mut lexicon, &mut budget).unwrap();
        assert_eq!(edges, (0..8).map(|i| (v(i), v(i + 1))).collect::<Vec<_>>());
        assert!(budget.max_usage() >= 2 * 8 * std::mem::size_of::<usize>());
    }

    #[test]
    fn test_create_adds_reverse_edges() {
        let o = opts(DegenerateEdges::Keep, DuplicateEdges::Keep, SiblingPairs::Create);
        let (edges, ids) = process(o, &[(0, 1)]);
        assert_eq!(edges, vec![(0, 1), (1, 0)]);
        assert!(ids[1].is_empty());
    }

    #[test]
    fn test_undirected_require_halves_edges() {
        let o = GraphOptions::new(
            EdgeType::Undirected,
            DegenerateEdges::Keep,
            DuplicateEdges::Keep,
            SiblingPairs::Require,
        );
        let mut options = o;
        // Two undirected edges AB and BA, each stored with its reverse.
        let mut edges = vec![(v(0), v(1)), (v(1), v(0)), (v(1), v(0)), (v(0), v(1))];
        let mut ids = vec![
            IdSetId::singleton(0),
            IdSetId::singleton(1),
            IdSetId::EMPTY,
            IdSetId::EMPTY,
        ];
        let mut lexicon = IdSetLexicon::new();
        Graph::process_edges(
            &mut options,
            &mut edges,
            &mut ids,
            &mut lexicon,
            &mut MemoryBudget::unlimited(),
        )
        .unwrap();
        assert_eq!(options.edge_type, EdgeType::Directed);
        assert_eq!(edges, vec![(v(0), v(1)), (v(1), v(0))]);
    }
}
