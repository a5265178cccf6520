//! The owned graph model: topology fixed at construction, geometry and live
//! data mutated only through the named operations below.

use std::collections::HashMap;

use log::{debug, warn};

use super::config::ViewConfig;
use super::error::SpecError;
use super::layering::{LayerAssignment, Layered};
use super::types::{
	Access, ArrowStyle, ArrowType, ConnectionSpec, DagSpec, GraphSpec, Metrics, Point, Rect,
	Size, TopologySpec,
};

/// Which specification form the model was built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewKind {
	Dag,
	Topology,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: String,
	pub name: String,
	pub dependencies: Vec<String>,
	position: Point,
	size: Size,
	metrics: Metrics,
	variants: Vec<String>,
	selected_variant: Option<usize>,
}

impl Node {
	pub fn position(&self) -> Point {
		self.position
	}

	pub fn size(&self) -> Size {
		self.size
	}

	pub fn rect(&self) -> Rect {
		Rect {
			origin: self.position,
			size: self.size,
		}
	}

	pub fn metrics(&self) -> &Metrics {
		&self.metrics
	}

	pub fn variants(&self) -> &[String] {
		&self.variants
	}

	pub fn selected_variant(&self) -> Option<usize> {
		self.selected_variant
	}

	/// Name of the microservice currently shown for a composite node.
	pub fn selected_variant_name(&self) -> Option<&str> {
		self.selected_variant
			.and_then(|i| self.variants.get(i))
			.map(String::as_str)
	}
}

impl Layered for Node {
	fn id(&self) -> &str {
		&self.id
	}

	fn dependencies(&self) -> &[String] {
		&self.dependencies
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	pub from: String,
	pub to: String,
	pub arrow_type: ArrowType,
	pub arrow_style: ArrowStyle,
	pub access: Access,
	pub label: Option<String>,
	active: bool,
}

impl Edge {
	pub fn is_active(&self) -> bool {
		self.active
	}
}

/// Result of a clamping setter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Update<T> {
	/// The value actually stored.
	pub value: T,
	/// Whether the stored value differs from what was there before.
	pub changed: bool,
}

#[derive(Clone, Debug)]
pub struct GraphModel {
	kind: ViewKind,
	nodes: Vec<Node>,
	index: HashMap<String, usize>,
	edges: Vec<Edge>,
	entrypoint: Option<String>,
	layers: Option<LayerAssignment>,
	min_size: Size,
}

impl GraphModel {
	pub fn from_spec(spec: &GraphSpec, config: &ViewConfig) -> Result<Self, SpecError> {
		match spec {
			GraphSpec::Dag(dag) => Self::from_dag(dag, config),
			GraphSpec::Topology(topo) => Self::from_topology(topo, config),
		}
	}

	fn empty(kind: ViewKind, config: &ViewConfig) -> Self {
		Self {
			kind,
			nodes: Vec::new(),
			index: HashMap::new(),
			edges: Vec::new(),
			entrypoint: None,
			layers: None,
			min_size: config.min_size,
		}
	}

	fn push_node(&mut self, node: Node) -> Result<(), SpecError> {
		if self.index.contains_key(&node.id) {
			return Err(SpecError::DuplicateNode(node.id));
		}
		self.index.insert(node.id.clone(), self.nodes.len());
		self.nodes.push(node);
		Ok(())
	}

	fn from_dag(dag: &DagSpec, config: &ViewConfig) -> Result<Self, SpecError> {
		let mut model = Self::empty(ViewKind::Dag, config);
		let size = config.initial_size();

		for spec in &dag.nodes {
			model.push_node(Node {
				id: spec.id.clone(),
				name: spec.name.clone().unwrap_or_else(|| spec.id.clone()),
				dependencies: spec.dependencies.clone(),
				position: Point::default(),
				size,
				metrics: Metrics::new(),
				variants: Vec::new(),
				selected_variant: None,
			})?;
		}

		// One edge per dependency, pointing from the dependency to its dependent.
		let connections: Vec<ConnectionSpec> = dag
			.nodes
			.iter()
			.flat_map(|n| {
				n.dependencies.iter().map(|d| ConnectionSpec {
					from: d.clone(),
					to: n.id.clone(),
					arrow_type: ArrowType::OneWay,
					arrow_style: ArrowStyle::Solid,
					access: Access::ReadOnly,
					label: None,
				})
			})
			.collect();
		model.add_edges(&connections);

		if model.index.contains_key(&dag.entrypoint) {
			model.entrypoint = Some(dag.entrypoint.clone());
		} else {
			warn!("entrypoint `{}` is not a node; ignoring", dag.entrypoint);
		}

		let layers = LayerAssignment::compute(&model.nodes);
		let step_x = size.width + config.layer_gap;
		let step_y = size.height + config.row_gap;
		for (col, layer) in layers.layers().iter().enumerate() {
			for (row, id) in layer.iter().enumerate() {
				if let Some(&i) = model.index.get(id) {
					model.nodes[i].position = clamp_position(
						config.margin + col as f64 * step_x,
						config.margin + row as f64 * step_y,
					);
				}
			}
		}
		debug!(
			"built DAG model: {} nodes, {} edges, {} layers",
			model.nodes.len(),
			model.edges.len(),
			layers.len()
		);
		model.layers = Some(layers);
		Ok(model)
	}

	fn from_topology(topo: &TopologySpec, config: &ViewConfig) -> Result<Self, SpecError> {
		let mut model = Self::empty(ViewKind::Topology, config);
		let size = config.initial_size();
		let columns = (topo.services.len() as f64).sqrt().ceil().max(1.0) as usize;

		for (i, spec) in topo.services.iter().enumerate() {
			let fallback = Point::new(
				config.margin + (i % columns) as f64 * (size.width + config.layer_gap),
				config.margin + (i / columns) as f64 * (size.height + config.row_gap),
			);
			let position = spec.position.unwrap_or(fallback);
			model.push_node(Node {
				id: spec.id.clone(),
				name: spec.name.clone().unwrap_or_else(|| spec.id.clone()),
				dependencies: Vec::new(),
				position: clamp_position(position.x, position.y),
				size,
				metrics: spec.metrics.clone(),
				selected_variant: (!spec.microservices.is_empty()).then_some(0),
				variants: spec.microservices.clone(),
			})?;
		}

		model.add_edges(&topo.connections);
		debug!(
			"built topology model: {} services, {} connections",
			model.nodes.len(),
			model.edges.len()
		);
		Ok(model)
	}

	fn add_edges(&mut self, connections: &[ConnectionSpec]) {
		for c in connections {
			if !self.index.contains_key(&c.from) || !self.index.contains_key(&c.to) {
				warn!("dropping edge {} -> {}: unknown endpoint", c.from, c.to);
				continue;
			}
			self.edges.push(Edge {
				from: c.from.clone(),
				to: c.to.clone(),
				arrow_type: c.arrow_type,
				arrow_style: c.arrow_style,
				access: c.access,
				label: c.label.clone(),
				active: false,
			});
		}
	}

	pub fn kind(&self) -> ViewKind {
		self.kind
	}

	pub fn node(&self, id: &str) -> Option<&Node> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Renderable edges; connections with a missing endpoint never get here.
	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	pub fn entrypoint(&self) -> Option<&str> {
		self.entrypoint.as_deref()
	}

	/// Layer assignment computed at construction (DAG form only).
	pub fn layers(&self) -> Option<&LayerAssignment> {
		self.layers.as_ref()
	}

	/// Moves a node, clamping to the non-negative quadrant.
	pub fn set_position(&mut self, id: &str, x: f64, y: f64) -> Option<Update<Point>> {
		let node = self.node_mut(id)?;
		let value = clamp_position(x, y);
		let changed = node.position != value;
		node.position = value;
		Some(Update { value, changed })
	}

	/// Resizes a node, never below the configured floor.
	pub fn set_size(&mut self, id: &str, width: f64, height: f64) -> Option<Update<Size>> {
		let min = self.min_size;
		let node = self.node_mut(id)?;
		let value = Size::new(floor(width, min.width), floor(height, min.height));
		let changed = node.size != value;
		node.size = value;
		Some(Update { value, changed })
	}

	/// Swaps in a whole new metric snapshot; returns false for unknown ids.
	pub fn replace_metrics(&mut self, id: &str, metrics: Metrics) -> bool {
		match self.node_mut(id) {
			Some(node) => {
				node.metrics = metrics;
				true
			}
			None => false,
		}
	}

	/// Returns whether the flag actually flipped.
	pub fn set_edge_active(&mut self, index: usize, active: bool) -> bool {
		match self.edges.get_mut(index) {
			Some(edge) if edge.active != active => {
				edge.active = active;
				true
			}
			_ => false,
		}
	}

	/// Picks the microservice shown by a composite node, clamped to its variants.
	pub fn select_microservice(&mut self, id: &str, index: usize) -> Option<usize> {
		let node = self.node_mut(id)?;
		let last = node.variants.len().checked_sub(1)?;
		let chosen = index.min(last);
		node.selected_variant = Some(chosen);
		Some(chosen)
	}

	/// Advances to the next microservice, wrapping around.
	pub fn cycle_microservice(&mut self, id: &str) -> Option<usize> {
		let node = self.node(id)?;
		let count = node.variants.len();
		if count == 0 {
			return None;
		}
		let next = node.selected_variant.map_or(0, |i| (i + 1) % count);
		self.select_microservice(id, next)
	}

	/// Union bounding box of every node widget, anchored at the origin.
	pub fn bounds(&self) -> Size {
		self.nodes.iter().fold(Size::default(), |acc, n| {
			let r = n.rect();
			Size::new(acc.width.max(r.right()), acc.height.max(r.bottom()))
		})
	}

	fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
		let i = *self.index.get(id)?;
		self.nodes.get_mut(i)
	}
}

/// Non-finite input collapses to the floor.
fn floor(value: f64, min: f64) -> f64 {
	if value.is_finite() { value.max(min) } else { min }
}

fn clamp_position(x: f64, y: f64) -> Point {
	Point::new(floor(x, 0.0), floor(y, 0.0))
}

// proptest is a native-only dev-dependency.
#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
	use super::*;
	use crate::components::topology::testing::topology;
	use crate::components::topology::types::DagNodeSpec;
	use proptest::prelude::*;

	fn dag(nodes: &[(&str, &[&str])], entrypoint: &str) -> GraphSpec {
		GraphSpec::Dag(DagSpec {
			nodes: nodes
				.iter()
				.map(|(id, deps)| DagNodeSpec {
					id: id.to_string(),
					name: None,
					dependencies: deps.iter().map(|d| d.to_string()).collect(),
				})
				.collect(),
			entrypoint: entrypoint.to_string(),
		})
	}

	fn model(spec: &GraphSpec) -> GraphModel {
		GraphModel::from_spec(spec, &ViewConfig::default()).unwrap()
	}

	#[test]
	fn drag_past_origin_clamps_to_zero() {
		let mut m = model(&topology(&["a"], &[]));
		m.set_position("a", 100.0, 100.0);
		let update = m.set_position("a", 100.0 - 250.0, 100.0 - 250.0).unwrap();
		assert_eq!(update.value, Point::new(0.0, 0.0));
		assert!(update.changed);
		assert_eq!(m.node("a").unwrap().position(), Point::new(0.0, 0.0));
	}

	#[test]
	fn resize_below_floor_clamps_to_minimum() {
		let mut m = model(&topology(&["a"], &[]));
		m.set_size("a", 420.0, 400.0);
		let update = m.set_size("a", 420.0 - 500.0, 400.0 - 500.0).unwrap();
		assert_eq!(update.value, Size::new(200.0, 150.0));
		assert_eq!(m.node("a").unwrap().size(), Size::new(200.0, 150.0));
	}

	#[test]
	fn unchanged_setter_reports_no_change() {
		let mut m = model(&topology(&["a"], &[]));
		m.set_position("a", 5.0, 5.0);
		assert!(!m.set_position("a", 5.0, 5.0).unwrap().changed);
		assert!(m.set_position("a", 5.0, -3.0).unwrap().changed);
		assert!(!m.set_position("a", 5.0, -3.0).unwrap().changed);
	}

	#[test]
	fn setters_ignore_unknown_ids() {
		let mut m = model(&topology(&["a"], &[]));
		assert_eq!(m.set_position("zz", 1.0, 1.0), None);
		assert_eq!(m.set_size("zz", 1.0, 1.0), None);
		assert!(!m.replace_metrics("zz", Metrics::new()));
	}

	#[test]
	fn non_finite_input_clamps_to_floor() {
		let mut m = model(&topology(&["a"], &[]));
		let p = m.set_position("a", f64::NAN, f64::NEG_INFINITY).unwrap().value;
		assert_eq!(p, Point::new(0.0, 0.0));
		let s = m.set_size("a", f64::NAN, f64::INFINITY).unwrap().value;
		assert_eq!(s, Size::new(200.0, 150.0));
	}

	#[test]
	fn dangling_edges_are_dropped() {
		let m = model(&topology(&["a", "b"], &[("a", "b"), ("a", "ghost"), ("ghost", "b")]));
		assert_eq!(m.edges().len(), 1);
		assert_eq!((m.edges()[0].from.as_str(), m.edges()[0].to.as_str()), ("a", "b"));
	}

	#[test]
	fn duplicate_ids_are_rejected() {
		let err = GraphModel::from_spec(&topology(&["a", "a"], &[]), &ViewConfig::default())
			.unwrap_err();
		assert_eq!(err, SpecError::DuplicateNode("a".into()));
	}

	#[test]
	fn dag_nodes_are_placed_by_layer() {
		let m = model(&dag(&[("A", &[]), ("B", &["A"]), ("C", &["A", "B"])], "C"));
		let cfg = ViewConfig::default();
		let step = cfg.initial_size().width + cfg.layer_gap;

		let xs: Vec<f64> = ["A", "B", "C"]
			.iter()
			.map(|id| m.node(id).unwrap().position().x)
			.collect();
		assert_eq!(xs, vec![cfg.margin, cfg.margin + step, cfg.margin + 2.0 * step]);
		assert_eq!(m.edges().len(), 3);
		assert!(m.edges().iter().all(|e| e.access == Access::ReadOnly));
		assert_eq!(m.entrypoint(), Some("C"));
		assert_eq!(m.layers().unwrap().len(), 3);
	}

	#[test]
	fn initial_placement_stays_non_negative_with_negative_margin() {
		let config = ViewConfig {
			margin: -30.0,
			..ViewConfig::default()
		};
		let spec = dag(&[("A", &[]), ("B", &["A"])], "A");
		let m = GraphModel::from_spec(&spec, &config).unwrap();
		assert_eq!(m.node("A").unwrap().position(), Point::new(0.0, 0.0));
		assert!(m.nodes().iter().all(|n| n.position().x >= 0.0 && n.position().y >= 0.0));

		let placed = GraphModel::from_spec(&topology(&["a", "b", "c"], &[]), &config).unwrap();
		assert!(placed.nodes().iter().all(|n| n.position().x >= 0.0 && n.position().y >= 0.0));
	}

	#[test]
	fn dangling_dependency_has_no_edge_and_unknown_entrypoint_is_ignored() {
		let m = model(&dag(&[("A", &["ghost"])], "nope"));
		assert!(m.edges().is_empty());
		assert_eq!(m.entrypoint(), None);
		assert!(m.layers().unwrap().has_fallback());
	}

	#[test]
	fn microservice_selection_is_clamped_and_cycles() {
		let mut spec = topology(&["svc"], &[]);
		if let GraphSpec::Topology(t) = &mut spec {
			t.services[0].microservices = vec!["v1".into(), "v2".into(), "v3".into()];
		}
		let mut m = model(&spec);
		assert_eq!(m.node("svc").unwrap().selected_variant(), Some(0));
		assert_eq!(m.select_microservice("svc", 9), Some(2));
		assert_eq!(m.cycle_microservice("svc"), Some(0));
		assert_eq!(m.node("svc").unwrap().selected_variant_name(), Some("v1"));
	}

	#[test]
	fn plain_nodes_have_no_microservices() {
		let mut m = model(&topology(&["svc"], &[]));
		assert_eq!(m.select_microservice("svc", 0), None);
		assert_eq!(m.cycle_microservice("svc"), None);
	}

	#[test]
	fn edge_activation_reports_flips() {
		let mut m = model(&topology(&["a", "b"], &[("a", "b")]));
		assert!(m.set_edge_active(0, true));
		assert!(!m.set_edge_active(0, true));
		assert!(m.edges()[0].is_active());
		assert!(!m.set_edge_active(7, true));
	}

	#[test]
	fn bounds_cover_every_widget() {
		let mut m = model(&topology(&["a", "b"], &[]));
		m.set_position("a", 0.0, 0.0);
		m.set_position("b", 500.0, 40.0);
		m.set_size("b", 300.0, 200.0);
		assert_eq!(m.bounds(), Size::new(800.0, 240.0));
	}

	proptest! {
		#[test]
		fn positions_never_go_negative(x in -1.0e6f64..1.0e6, y in -1.0e6f64..1.0e6) {
			let mut m = model(&topology(&["a"], &[]));
			let p = m.set_position("a", x, y).unwrap().value;
			prop_assert!(p.x >= 0.0 && p.y >= 0.0);
		}

		#[test]
		fn sizes_never_drop_below_floor(w in -1.0e6f64..1.0e6, h in -1.0e6f64..1.0e6) {
			let mut m = model(&topology(&["a"], &[]));
			let s = m.set_size("a", w, h).unwrap().value;
			prop_assert!(s.width >= 200.0 && s.height >= 150.0);
		}
	}
}
