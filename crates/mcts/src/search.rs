//! PUCT tree search.
//!
//! Each call to [`Mcts::search`] runs a fixed number of simulations
//! from a root position. A simulation descends the tree by maximizing
//! the PUCT score, expands the first unexpanded node it reaches via
//! the evaluator, and propagates the leaf value back to the root with
//! the sign flipped at every ply.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alphazero_chess::{codec, ChessMove, Color, Position};
use alphazero_core::{AlphaZeroError, Result};
use rand::Rng;
use rand_distr::{Dirichlet, Distribution};

use crate::config::MctsConfig;
use crate::evaluator::{Evaluation, Evaluator};
use crate::tree::{Node, NodeId, Tree};

/// Visit count for a single root move after search.
#[derive(Clone, Debug)]
pub struct MoveVisits {
    pub mv: ChessMove,
    pub visits: u32,
}

/// Search result: the root visit distribution plus the searched
/// position, ready to be turned into a training target.
#[derive(Clone, Debug)]
pub struct MctsDist {
    /// FEN of the searched position.
    pub fen: String,
    /// Player to move at the root.
    pub side_to_move: Color,
    /// Mean backed-up value at the root, from the root mover's
    /// perspective.
    pub root_value: f32,
    /// Root moves that received at least one visit, in policy index
    /// order.
    pub moves: Vec<MoveVisits>,
}

/// Monte Carlo tree search driven by an [`Evaluator`].
pub struct Mcts<E: Evaluator, R: Rng> {
    config: MctsConfig,
    evaluator: E,
    rng: R,
    tree: Tree,
    stop: Option<Arc<AtomicBool>>,
}

impl<E: Evaluator, R: Rng> Mcts<E, R> {
    pub fn new(config: MctsConfig, evaluator: E, rng: R) -> Self {
        Self {
            config,
            evaluator,
            rng,
            tree: Tree::new(),
            stop: None,
        }
    }

    /// Search that checks `stop` between simulations and aborts with
    /// [`AlphaZeroError::Aborted`] once it is raised.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// The search tree from the most recent [`Mcts::search`] call.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Run a full search from `root` and return the root visit
    /// distribution. Fails on a terminal root: there is no move to
    /// pick there.
    pub fn search(&mut self, root: &Position) -> Result<MctsDist> {
        self.tree.clear();

        if root.is_terminal() {
            return Err(AlphaZeroError::TerminalRoot);
        }

        let eval = self.checked_evaluate(root)?;
        self.expand(NodeId::ROOT, root, &eval)?;
        {
            // The root's first visit books the evaluation that expanded
            // it, so child visit sums stay one short of the parent's
            // count at every node.
            let node = self.tree.get_mut(NodeId::ROOT);
            node.visits = 1;
            node.value_sum = eval.value;
        }

        if self.config.exploration_fraction > 0.0 {
            self.add_root_noise();
        }

        for _ in 0..self.config.num_simulations {
            if let Some(stop) = &self.stop {
                if stop.load(Ordering::Relaxed) {
                    return Err(AlphaZeroError::Aborted);
                }
            }
            self.simulate(root)?;
        }

        Ok(self.snapshot(root))
    }

    /// One simulation: descend, expand or hit a terminal, back up.
    fn simulate(&mut self, root: &Position) -> Result<()> {
        let mut pos = root.clone();
        let mut node_id = NodeId::ROOT;
        let mut path: Vec<(NodeId, usize)> = Vec::new();

        let leaf_value = loop {
            if let Some(v) = self.tree.get(node_id).terminal_value {
                break v;
            }

            if !self.tree.get(node_id).expanded {
                if let Some(v) = pos.terminal_value_for_mover() {
                    self.tree.get_mut(node_id).terminal_value = Some(v);
                    break v;
                }
                let eval = self.checked_evaluate(&pos)?;
                self.expand(node_id, &pos, &eval)?;
                break eval.value;
            }

            let edge_idx = self.select_edge(node_id);
            let (mv, existing_child) = {
                let edge = &self.tree.get(node_id).edges[edge_idx];
                (edge.mv, edge.child)
            };
            pos = pos.apply(mv);
            path.push((node_id, edge_idx));

            node_id = match existing_child {
                Some(child) => child,
                None => {
                    let child = self.tree.add(Node::default());
                    self.tree.get_mut(node_id).edges[edge_idx].child = Some(child);
                    child
                }
            };
        };

        self.backpropagate(node_id, &path, leaf_value);
        Ok(())
    }

    /// Pick the edge maximizing Q + U. Edge statistics live in the
    /// parent mover's perspective, so Q is used unnegated. Ties go to
    /// the lowest policy index; edge order makes that the first
    /// maximum.
    fn select_edge(&self, node_id: NodeId) -> usize {
        let node = self.tree.get(node_id);
        let parent_visits = node.visits as f32;
        let pb_c = ((parent_visits + self.config.pb_c_base + 1.0) / self.config.pb_c_base).ln()
            + self.config.pb_c_init;

        let mut best_idx = 0;
        let mut best_score = f32::NEG_INFINITY;
        for (idx, edge) in node.edges.iter().enumerate() {
            let u = pb_c * edge.prior * parent_visits.sqrt() / (1.0 + edge.visits as f32);
            let score = edge.mean_value() + u;
            if score > best_score {
                best_score = score;
                best_idx = idx;
            }
        }
        best_idx
    }

    /// Attach one edge per legal move, in policy index order, with
    /// priors masked to the legal moves and renormalized. An evaluator
    /// that puts no mass on any legal move falls back to uniform.
    fn expand(&mut self, node_id: NodeId, pos: &Position, eval: &Evaluation) -> Result<()> {
        let mut indexed: Vec<(usize, ChessMove)> = pos
            .legal_moves()
            .into_iter()
            .map(|mv| Ok((codec::encode(mv)?, mv)))
            .collect::<Result<_>>()?;
        indexed.sort_unstable_by_key(|&(idx, _)| idx);

        let legal_mass: f32 = indexed.iter().map(|&(idx, _)| eval.priors[idx]).sum();
        let uniform = 1.0 / indexed.len() as f32;

        let node = self.tree.get_mut(node_id);
        node.edges = indexed
            .into_iter()
            .map(|(idx, mv)| {
                let prior = if legal_mass > 0.0 {
                    eval.priors[idx] / legal_mass
                } else {
                    uniform
                };
                crate::tree::Edge::new(mv, prior)
            })
            .collect();
        node.expanded = true;
        Ok(())
    }

    /// Mix Dirichlet noise into the root priors.
    fn add_root_noise(&mut self) {
        let n = self.tree.root().edges.len();
        if n < 2 {
            return;
        }
        let alpha = vec![self.config.dirichlet_alpha; n];
        let Ok(dirichlet) = Dirichlet::new(&alpha) else {
            return;
        };
        let noise: Vec<f32> = dirichlet.sample(&mut self.rng);

        let frac = self.config.exploration_fraction;
        let root = self.tree.get_mut(NodeId::ROOT);
        for (edge, eta) in root.edges.iter_mut().zip(noise) {
            edge.prior = edge.prior * (1.0 - frac) + eta * frac;
        }
    }

    /// Credit the leaf with its own visit, then walk the path root-ward
    /// flipping the sign at every step so each node accumulates value
    /// from its own mover's perspective.
    fn backpropagate(&mut self, leaf: NodeId, path: &[(NodeId, usize)], leaf_value: f32) {
        let node = self.tree.get_mut(leaf);
        node.visits += 1;
        node.value_sum += leaf_value;

        let mut value = leaf_value;
        for &(node_id, edge_idx) in path.iter().rev() {
            value = -value;
            let node = self.tree.get_mut(node_id);
            node.visits += 1;
            node.value_sum += value;
            let edge = &mut node.edges[edge_idx];
            edge.visits += 1;
            edge.value_sum += value;
        }
    }

    fn snapshot(&self, root: &Position) -> MctsDist {
        let root_node = self.tree.root();
        MctsDist {
            fen: root.fen(),
            side_to_move: root.side_to_move(),
            root_value: root_node.mean_value(),
            moves: root_node
                .edges
                .iter()
                .filter(|edge| edge.visits > 0)
                .map(|edge| MoveVisits {
                    mv: edge.mv,
                    visits: edge.visits,
                })
                .collect(),
        }
    }

    /// Validate the evaluator's output before trusting it. A model
    /// handing back NaNs or a mis-sized head is a bug to surface, not
    /// to clamp over.
    fn checked_evaluate(&self, pos: &Position) -> Result<Evaluation> {
        let eval = self.evaluator.evaluate(pos)?;
        if eval.priors.len() != codec::POLICY_SIZE {
            return Err(AlphaZeroError::EvaluatorFault(format!(
                "priors length {} != {}",
                eval.priors.len(),
                codec::POLICY_SIZE
            )));
        }
        if eval.priors.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(AlphaZeroError::EvaluatorFault(
                "priors contain negative or non-finite entries".into(),
            ));
        }
        if !eval.value.is_finite() || !(-1.0..=1.0).contains(&eval.value) {
            return Err(AlphaZeroError::EvaluatorFault(format!(
                "value {} outside [-1, 1]",
                eval.value
            )));
        }
        Ok(eval)
    }
}
