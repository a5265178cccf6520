//! Dependency layering for the DAG view.
//!
//! Nodes are peeled off in waves: every node whose dependencies were all
//! placed in earlier waves forms the next layer. When a wave comes up empty
//! the leftovers (cycles, or nodes waiting on ids that do not exist) are
//! collected into a single terminal layer, so the loop runs at most once per
//! node.

use std::collections::{HashMap, HashSet};

use log::warn;

/// Anything that can be layered by its dependencies.
pub trait Layered {
	fn id(&self) -> &str;
	fn dependencies(&self) -> &[String];
}

/// Ordered partition of node ids into layers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerAssignment {
	layers: Vec<Vec<String>>,
	index: HashMap<String, usize>,
	fallback: bool,
}

impl LayerAssignment {
	pub fn compute<N: Layered>(nodes: &[N]) -> Self {
		let (layers, fallback) = partition(nodes);
		let index = layers
			.iter()
			.enumerate()
			.flat_map(|(i, layer)| layer.iter().map(move |id| (id.clone(), i)))
			.collect();
		Self {
			layers,
			index,
			fallback,
		}
	}

	pub fn layers(&self) -> &[Vec<String>] {
		&self.layers
	}

	pub fn layer_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	pub fn len(&self) -> usize {
		self.layers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.layers.is_empty()
	}

	/// True when the last layer holds nodes that never became eligible.
	pub fn has_fallback(&self) -> bool {
		self.fallback
	}
}

/// Groups node ids into dependency-ordered layers.
pub fn layers<N: Layered>(nodes: &[N]) -> Vec<Vec<String>> {
	partition(nodes).0
}

fn partition<N: Layered>(nodes: &[N]) -> (Vec<Vec<String>>, bool) {
	let mut placed: HashSet<&str> = HashSet::with_capacity(nodes.len());
	let mut remaining: Vec<&N> = nodes.iter().collect();
	let mut layers = Vec::new();

	while !remaining.is_empty() {
		let (eligible, blocked): (Vec<&N>, Vec<&N>) = remaining
			.into_iter()
			.partition(|n| n.dependencies().iter().all(|d| placed.contains(d.as_str())));

		if eligible.is_empty() {
			let stuck: Vec<String> = blocked.iter().map(|n| n.id().to_string()).collect();
			warn!(
				"layering stalled; {} node(s) moved to terminal layer: {:?}",
				stuck.len(),
				stuck
			);
			layers.push(stuck);
			return (layers, true);
		}

		placed.extend(eligible.iter().map(|n| n.id()));
		layers.push(eligible.iter().map(|n| n.id().to_string()).collect());
		remaining = blocked;
	}

	(layers, false)
}

// proptest is a native-only dev-dependency.
#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[derive(Debug)]
	struct N(String, Vec<String>);

	impl Layered for N {
		fn id(&self) -> &str {
			&self.0
		}

		fn dependencies(&self) -> &[String] {
			&self.1
		}
	}

	fn node(id: &str, deps: &[&str]) -> N {
		N(id.into(), deps.iter().map(|d| d.to_string()).collect())
	}

	#[test]
	fn chain_is_layered_in_order() {
		let nodes = vec![node("A", &[]), node("B", &["A"]), node("C", &["A", "B"])];
		assert_eq!(layers(&nodes), vec![vec!["A"], vec!["B"], vec!["C"]]);
	}

	#[test]
	fn two_node_cycle_shares_terminal_layer() {
		let nodes = vec![node("X", &["Y"]), node("Y", &["X"])];
		let assignment = LayerAssignment::compute(&nodes);
		assert_eq!(assignment.layers(), &[vec!["X".to_string(), "Y".to_string()]]);
		assert!(assignment.has_fallback());
	}

	#[test]
	fn downstream_of_cycle_joins_terminal_layer() {
		let nodes = vec![
			node("root", &[]),
			node("X", &["root", "Y"]),
			node("Y", &["X"]),
			node("Z", &["Y"]),
		];
		assert_eq!(layers(&nodes), vec![vec!["root"], vec!["X", "Y", "Z"]]);
	}

	#[test]
	fn empty_input_yields_no_layers() {
		let nodes: Vec<N> = Vec::new();
		let assignment = LayerAssignment::compute(&nodes);
		assert!(assignment.is_empty());
		assert!(!assignment.has_fallback());
	}

	#[test]
	fn isolated_nodes_land_in_first_layer() {
		let nodes = vec![node("a", &[]), node("b", &["a"]), node("c", &[])];
		assert_eq!(layers(&nodes), vec![vec!["a", "c"], vec!["b"]]);
	}

	#[test]
	fn unknown_dependency_is_never_satisfied() {
		let nodes = vec![node("a", &[]), node("b", &["ghost"]), node("c", &["a"])];
		let assignment = LayerAssignment::compute(&nodes);
		assert_eq!(
			assignment.layers(),
			&[vec!["a".to_string(), "c".to_string()], vec!["b".to_string()]]
		);
		assert_eq!(assignment.layer_of("b"), Some(1));
		assert!(assignment.has_fallback());
	}

	#[test]
	fn same_layer_dependency_is_not_satisfied_within_the_wave() {
		// b becomes eligible only after a's layer is closed.
		let nodes = vec![node("b", &["a"]), node("a", &[])];
		assert_eq!(layers(&nodes), vec![vec!["a"], vec!["b"]]);
	}

	/// Random DAGs: node i may only depend on nodes with a smaller index.
	fn arb_dag() -> impl Strategy<Value = Vec<N>> {
		(1usize..24).prop_flat_map(|n| {
			proptest::collection::vec(proptest::collection::vec(any::<prop::sample::Index>(), 0..4), n)
				.prop_map(move |picks| {
					picks
						.into_iter()
						.enumerate()
						.map(|(i, deps)| {
							let deps = if i == 0 {
								Vec::new()
							} else {
								deps.iter().map(|d| format!("n{}", d.index(i))).collect()
							};
							N(format!("n{i}"), deps)
						})
						.rev()
						.collect()
				})
		})
	}

	proptest! {
		#[test]
		fn dependencies_sit_in_strictly_earlier_layers(nodes in arb_dag()) {
			let assignment = LayerAssignment::compute(&nodes);
			prop_assert!(!assignment.has_fallback());
			prop_assert!(assignment.len() <= nodes.len());
			for n in &nodes {
				let own = assignment.layer_of(n.id()).unwrap();
				for d in n.dependencies() {
					prop_assert!(own > assignment.layer_of(d).unwrap());
				}
			}
		}

		#[test]
		fn layering_is_deterministic(nodes in arb_dag()) {
			prop_assert_eq!(layers(&nodes), layers(&nodes));
		}
	}
}
