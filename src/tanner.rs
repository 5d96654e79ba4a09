//! Tanner graph of a low-density parity-check (LDPC) code

use std::ops::Range;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{Bit, Error};

/// Edge-list description of a parity-check matrix
///
/// This is the serialized form of a [`TannerGraph`]: `checks[c]` lists the variable nodes (columns)
/// having a `1` in row `c` of the parity-check matrix.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct EdgeList {
    /// Number of variable nodes `N`
    pub num_vars: usize,
    /// Variable nodes connected to each of the `M` check nodes
    pub checks: Vec<Vec<usize>>,
}

/// Tanner graph with `N` variable nodes and `M` check nodes
///
/// Edges are numbered check node by check node; the edges of check node `c` form a contiguous
/// range. Every node has at least one edge, and no edge is repeated.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "EdgeList", into = "EdgeList")]
pub struct TannerGraph {
    /// Number of variable nodes
    num_vars: usize,
    /// Start of the edges of each check node (plus one past the last edge)
    check_offsets: Vec<usize>,
    /// Variable node of each edge
    edge_vars: Vec<usize>,
    /// Start of the edge indices of each variable node in `var_edges` (plus one past the end)
    var_offsets: Vec<usize>,
    /// Edge indices grouped by variable node
    var_edges: Vec<usize>,
}

impl TannerGraph {
    /// Returns Tanner graph with given number of variable nodes and given check node connections.
    ///
    /// # Parameters
    ///
    /// - `num_vars`: Number of variable nodes `N`.
    ///
    /// - `checks`: For each check node, the variable nodes connected to it.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no variable or check nodes, if a variable node index is not
    /// less than `num_vars`, if a check node lists a variable node more than once, or if some
    /// variable or check node has no edges.
    ///
    /// # Examples
    ///
    /// ```
    /// use softdec::tanner::TannerGraph;
    ///
    /// // (7,4) Hamming code
    /// let graph = TannerGraph::new(7, &[vec![0, 2, 4, 6], vec![1, 2, 5, 6], vec![3, 4, 5, 6]])?;
    /// assert_eq!(graph.num_edges(), 12);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new<T: AsRef<[usize]>>(num_vars: usize, checks: &[T]) -> Result<Self, Error> {
        if num_vars == 0 || checks.is_empty() {
            return Err(Error::InvalidInput(
                "Tanner graph must have at least one variable node and one check node".to_string(),
            ));
        }
        let mut check_offsets = Vec::with_capacity(checks.len() + 1);
        let mut edge_vars = Vec::new();
        check_offsets.push(0);
        for (c, vars) in checks.iter().map(AsRef::as_ref).enumerate() {
            if vars.is_empty() {
                return Err(Error::InvalidInput(format!("Check node {c} has no edges")));
            }
            if let Some(&v) = vars.iter().find(|&&v| v >= num_vars) {
                return Err(Error::InvalidInput(format!(
                    "Check node {c} connects to variable node {v}, expected index below {num_vars}"
                )));
            }
            if let Some(v) = vars.iter().duplicates().next() {
                return Err(Error::InvalidInput(format!(
                    "Check node {c} connects to variable node {v} more than once"
                )));
            }
            edge_vars.extend_from_slice(vars);
            check_offsets.push(edge_vars.len());
        }
        // Edge indices grouped by variable node, in increasing order within each group
        let mut var_edges: Vec<usize> = (0 .. edge_vars.len()).collect();
        var_edges.sort_by_key(|&e| edge_vars[e]);
        let mut var_offsets = vec![0; num_vars + 1];
        for &v in &edge_vars {
            var_offsets[v + 1] += 1;
        }
        if let Some(v) = (0 .. num_vars).find(|&v| var_offsets[v + 1] == 0) {
            return Err(Error::InvalidInput(format!(
                "Variable node {v} has no edges"
            )));
        }
        for v in 0 .. num_vars {
            var_offsets[v + 1] += var_offsets[v];
        }
        log::debug!(
            "Built Tanner graph with {num_vars} variable nodes, {} check nodes, {} edges",
            checks.len(),
            edge_vars.len()
        );
        Ok(Self {
            num_vars,
            check_offsets,
            edge_vars,
            var_offsets,
            var_edges,
        })
    }

    /// Returns Tanner graph of a parity-check matrix given in dense, row-major form.
    ///
    /// # Errors
    ///
    /// Returns an error if `matrix.len()` is not `num_checks * num_vars`, if an entry is neither
    /// `0` nor `1`, or under the conditions listed for [`Self::new`].
    pub fn from_dense(num_checks: usize, num_vars: usize, matrix: &[u8]) -> Result<Self, Error> {
        if matrix.len() != num_checks * num_vars {
            return Err(Error::InvalidInput(format!(
                "Expected {} entries for a {num_checks}x{num_vars} matrix (found {})",
                num_checks * num_vars,
                matrix.len()
            )));
        }
        if matrix.iter().any(|&x| x > 1) {
            return Err(Error::InvalidInput(
                "Parity-check matrix entries must be 0 or 1".to_string(),
            ));
        }
        let checks: Vec<Vec<usize>> = matrix
            .chunks_exact(num_vars.max(1))
            .map(|row| row.iter().positions(|&x| x == 1).collect())
            .collect();
        Self::new(num_vars, &checks)
    }

    /// Returns number of variable nodes `N`.
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Returns number of check nodes `M`.
    #[must_use]
    pub fn num_checks(&self) -> usize {
        self.check_offsets.len() - 1
    }

    /// Returns number of edges.
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.edge_vars.len()
    }

    /// Returns range of edge indices of given check node.
    #[must_use]
    pub fn check_edges(&self, check: usize) -> Range<usize> {
        self.check_offsets[check] .. self.check_offsets[check + 1]
    }

    /// Returns variable nodes connected to given check node.
    #[must_use]
    pub fn check_vars(&self, check: usize) -> &[usize] {
        &self.edge_vars[self.check_edges(check)]
    }

    /// Returns indices of the edges of given variable node.
    #[must_use]
    pub fn var_edges(&self, var: usize) -> &[usize] {
        &self.var_edges[self.var_offsets[var] .. self.var_offsets[var + 1]]
    }

    /// Returns variable node of given edge.
    #[must_use]
    pub fn edge_var(&self, edge: usize) -> usize {
        self.edge_vars[edge]
    }

    /// Returns largest check node degree.
    #[must_use]
    pub fn max_check_degree(&self) -> usize {
        (0 .. self.num_checks())
            .map(|c| self.check_edges(c).len())
            .max()
            .unwrap_or_default()
    }

    /// Returns whether given bits satisfy all parity checks.
    ///
    /// # Panics
    ///
    /// Panics if `bits.len()` differs from the number of variable nodes.
    #[must_use]
    pub fn is_codeword(&self, bits: &[Bit]) -> bool {
        assert_eq!(bits.len(), self.num_vars, "Wrong number of bits");
        (0 .. self.num_checks()).all(|c| self.check_parity(c, bits) == Bit::Zero)
    }

    /// Returns syndrome (parity of each check node) for given bits.
    ///
    /// # Panics
    ///
    /// Panics if `bits.len()` differs from the number of variable nodes.
    #[must_use]
    pub fn syndrome(&self, bits: &[Bit]) -> Vec<Bit> {
        assert_eq!(bits.len(), self.num_vars, "Wrong number of bits");
        (0 .. self.num_checks())
            .map(|c| self.check_parity(c, bits))
            .collect()
    }

    /// Returns parity of the bits connected to given check node.
    fn check_parity(&self, check: usize, bits: &[Bit]) -> Bit {
        self.check_vars(check)
            .iter()
            .fold(Bit::Zero, |acc, &v| acc ^ bits[v])
    }
}

impl TryFrom<EdgeList> for TannerGraph {
    type Error = Error;

    fn try_from(edge_list: EdgeList) -> Result<Self, Self::Error> {
        Self::new(edge_list.num_vars, &edge_list.checks)
    }
}

impl From<TannerGraph> for EdgeList {
    fn from(graph: TannerGraph) -> Self {
        Self {
            num_vars: graph.num_vars,
            checks: (0 .. graph.num_checks())
                .map(|c| graph.check_vars(c).to_vec())
                .collect(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use Bit::{One, Zero};

    /// Returns Tanner graph of the (7,4) Hamming code.
    pub(crate) fn hamming_graph() -> TannerGraph {
        TannerGraph::from_dense(
            3,
            7,
            &[
                1, 0, 1, 0, 1, 0, 1, //
                0, 1, 1, 0, 0, 1, 1, //
                0, 0, 0, 1, 1, 1, 1,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_new() {
        // Invalid inputs
        assert!(TannerGraph::new(0, &[vec![0]]).is_err());
        assert!(TannerGraph::new::<Vec<usize>>(3, &[]).is_err());
        assert!(TannerGraph::new(3, &[vec![0, 1], vec![]]).is_err());
        assert!(TannerGraph::new(3, &[vec![0, 1], vec![1, 3]]).is_err());
        assert!(TannerGraph::new(3, &[vec![0, 1, 0], vec![1, 2]]).is_err());
        assert!(TannerGraph::new(4, &[vec![0, 1], vec![1, 2]]).is_err());
        // Valid input
        let graph = TannerGraph::new(4, &[vec![0, 1, 3], vec![1, 2]]).unwrap();
        assert_eq!(graph.num_vars(), 4);
        assert_eq!(graph.num_checks(), 2);
        assert_eq!(graph.num_edges(), 5);
        assert_eq!(graph.check_edges(1), 3 .. 5);
        assert_eq!(graph.check_vars(0), [0, 1, 3]);
        assert_eq!(graph.var_edges(1), [1, 3]);
        assert_eq!(graph.var_edges(3), [2]);
        assert_eq!(graph.edge_var(4), 2);
        assert_eq!(graph.max_check_degree(), 3);
    }

    #[test]
    fn test_from_dense() {
        assert!(TannerGraph::from_dense(2, 3, &[1, 0, 1, 0, 1]).is_err());
        assert!(TannerGraph::from_dense(1, 3, &[1, 2, 1]).is_err());
        let graph = hamming_graph();
        assert_eq!(graph.num_vars(), 7);
        assert_eq!(graph.num_checks(), 3);
        assert_eq!(graph.check_vars(1), [1, 2, 5, 6]);
        assert_eq!(graph.var_edges(6), [3, 7, 11]);
    }

    #[test]
    fn test_syndrome() {
        let graph = hamming_graph();
        assert!(graph.is_codeword(&[Zero; 7]));
        assert!(graph.is_codeword(&[One; 7]));
        assert_eq!(graph.syndrome(&[Zero; 7]), [Zero, Zero, Zero]);
        let bits = [Zero, Zero, Zero, Zero, One, Zero, Zero];
        assert!(!graph.is_codeword(&bits));
        assert_eq!(graph.syndrome(&bits), [One, Zero, One]);
    }

    #[test]
    fn test_serde() {
        let graph = hamming_graph();
        let json = serde_json::to_string(&graph).unwrap();
        assert_eq!(
            json,
            r#"{"num_vars":7,"checks":[[0,2,4,6],[1,2,5,6],[3,4,5,6]]}"#
        );
        let graph_back: TannerGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(graph_back, graph);
        assert!(serde_json::from_str::<TannerGraph>(r#"{"num_vars":2,"checks":[[0]]}"#).is_err());
    }
}
