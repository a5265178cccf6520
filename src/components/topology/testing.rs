//! Small builders shared by the unit tests.

use std::cell::Cell;
use std::rc::Rc;

use super::config::ViewConfig;
use super::controller::PointerCapture;
use super::model::GraphModel;
use super::types::{
	Access, ArrowStyle, ArrowType, ConnectionSpec, GraphSpec, Metrics, Point, ServiceSpec, Size,
	TopologySpec,
};

pub(crate) fn service(id: &str, position: Option<Point>) -> ServiceSpec {
	ServiceSpec {
		id: id.to_string(),
		name: None,
		position,
		microservices: Vec::new(),
		metrics: Metrics::new(),
	}
}

pub(crate) fn connection(from: &str, to: &str) -> ConnectionSpec {
	ConnectionSpec {
		from: from.to_string(),
		to: to.to_string(),
		arrow_type: ArrowType::OneWay,
		arrow_style: ArrowStyle::Solid,
		access: Access::ReadWrite,
		label: None,
	}
}

/// Unpositioned services joined by plain one-way connections.
pub(crate) fn topology(services: &[&str], connections: &[(&str, &str)]) -> GraphSpec {
	GraphSpec::Topology(TopologySpec {
		services: services.iter().map(|id| service(id, None)).collect(),
		connections: connections
			.iter()
			.map(|(from, to)| connection(from, to))
			.collect(),
	})
}

/// Builds a model and then forces exact geometry onto each listed node.
pub(crate) fn placed(
	nodes: &[(&str, (f64, f64), (f64, f64))],
	connections: Vec<ConnectionSpec>,
	config: &ViewConfig,
) -> GraphModel {
	let spec = GraphSpec::Topology(TopologySpec {
		services: nodes.iter().map(|(id, _, _)| service(id, None)).collect(),
		connections,
	});
	let mut model = GraphModel::from_spec(&spec, config).unwrap();
	for (id, (x, y), (w, h)) in nodes {
		model.set_position(id, *x, *y);
		model.set_size(id, *w, *h);
	}
	model
}

/// A config whose size floor is low enough for small geometric fixtures.
pub(crate) fn loose_config() -> ViewConfig {
	ViewConfig {
		min_size: Size::new(10.0, 10.0),
		..ViewConfig::default()
	}
}

/// Pointer capture that only counts live subscriptions.
#[derive(Default, Clone)]
pub(crate) struct CountingCapture(pub(crate) Rc<Cell<i32>>);

pub(crate) struct Subscription(Rc<Cell<i32>>);

impl Drop for Subscription {
	fn drop(&mut self) {
		self.0.set(self.0.get() - 1);
	}
}

impl PointerCapture for CountingCapture {
	type Guard = Subscription;

	fn capture(&self) -> Subscription {
		self.0.set(self.0.get() + 1);
		Subscription(self.0.clone())
	}
}
