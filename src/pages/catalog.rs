//! Static demo catalog and a deterministic traffic simulator.

use crate::components::topology::model::GraphModel;
use crate::components::topology::{FeedUpdate, GraphSpec, Metrics, MetricsSource, SpecError};

/// One selectable diagram on the home page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
	pub key: &'static str,
	pub title: &'static str,
	pub description: &'static str,
	json: &'static str,
}

impl CatalogEntry {
	pub fn spec(&self) -> Result<GraphSpec, SpecError> {
		GraphSpec::from_json(self.json)
	}
}

const BUILD_PIPELINE: &str = r#"{
	"entrypoint": "checkout",
	"nodes": [
		{ "id": "checkout", "name": "Checkout", "dependencies": [] },
		{ "id": "fmt", "name": "Format", "dependencies": ["checkout"] },
		{ "id": "lint", "name": "Lint", "dependencies": ["checkout"] },
		{ "id": "build", "name": "Build", "dependencies": ["checkout"] },
		{ "id": "unit", "name": "Unit tests", "dependencies": ["build"] },
		{ "id": "integration", "name": "Integration tests", "dependencies": ["build", "lint"] },
		{ "id": "package", "name": "Package", "dependencies": ["unit", "integration", "fmt"] },
		{ "id": "deploy", "name": "Deploy", "dependencies": ["package"] }
	]
}"#;

const STOREFRONT: &str = r#"{
	"services": [
		{ "id": "web", "name": "Web", "position": { "x": 40, "y": 60 },
		  "metrics": { "rps": "0" } },
		{ "id": "gateway", "name": "API gateway", "position": { "x": 340, "y": 60 },
		  "microservices": ["router", "rate-limiter", "auth-filter"] },
		{ "id": "orders", "name": "Orders", "position": { "x": 640, "y": 20 },
		  "microservices": ["intake", "fulfilment"] },
		{ "id": "catalog", "name": "Catalog", "position": { "x": 640, "y": 240 } },
		{ "id": "db", "name": "Postgres", "position": { "x": 940, "y": 120 } },
		{ "id": "cache", "name": "Redis", "position": { "x": 940, "y": 340 } }
	],
	"connections": [
		{ "from": "web", "to": "gateway", "label": "HTTPS" },
		{ "from": "gateway", "to": "orders", "arrowType": "two-way" },
		{ "from": "gateway", "to": "catalog", "access": "read-only" },
		{ "from": "orders", "to": "db", "access": "write-only" },
		{ "from": "catalog", "to": "db", "access": "read-only" },
		{ "from": "catalog", "to": "cache", "arrowStyle": "dashed", "arrowType": "two-way" }
	]
}"#;

const CYCLIC: &str = r#"{
	"entrypoint": "config",
	"nodes": [
		{ "id": "config", "name": "Config", "dependencies": [] },
		{ "id": "scheduler", "name": "Scheduler", "dependencies": ["config", "worker"] },
		{ "id": "worker", "name": "Worker", "dependencies": ["scheduler"] },
		{ "id": "reporter", "name": "Reporter", "dependencies": ["worker"] }
	]
}"#;

pub const ENTRIES: &[CatalogEntry] = &[
	CatalogEntry {
		key: "pipeline",
		title: "Build pipeline",
		description: "A CI dependency DAG laid out by layer.",
		json: BUILD_PIPELINE,
	},
	CatalogEntry {
		key: "storefront",
		title: "Storefront services",
		description: "Service architecture with live traffic. Click a composite service to cycle its microservices.",
		json: STOREFRONT,
	},
	CatalogEntry {
		key: "cyclic",
		title: "Cyclic dependencies",
		description: "Nodes caught in a cycle land in the final layer.",
		json: CYCLIC,
	},
];

pub fn entry(key: &str) -> Option<&'static CatalogEntry> {
	ENTRIES.iter().find(|e| e.key == key)
}

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: u64) -> f64 {
	let x = seed
		.wrapping_add(1)
		.wrapping_mul(9301)
		.wrapping_add(49297)
		% 233280;
	(x as f64) / 233280.0
}

/// Fake per-service load and link activity, reproducible for a given seed.
#[derive(Clone, Debug)]
pub struct SimulatedTraffic {
	seed: u64,
	tick: u64,
}

impl SimulatedTraffic {
	pub fn new(seed: u64) -> Self {
		Self { seed, tick: 0 }
	}

	fn sample(&self, salt: u64) -> f64 {
		rand_simple(
			self.seed
				.wrapping_add(self.tick.wrapping_mul(7919))
				.wrapping_add(salt.wrapping_mul(104_729)),
		)
	}
}

impl MetricsSource for SimulatedTraffic {
	fn next_update(&mut self, model: &GraphModel) -> FeedUpdate {
		self.tick = self.tick.wrapping_add(1);

		let metrics = model
			.nodes()
			.iter()
			.enumerate()
			.map(|(i, node)| {
				let salt = 3 * i as u64;
				let rps = 20.0 + self.sample(salt) * 480.0;
				let p99 = 4.0 + self.sample(salt + 1) * 180.0;
				let errors = self.sample(salt + 2) * 2.5;
				let snapshot = Metrics::from([
					("rps".to_string(), format!("{rps:.0}")),
					("p99".to_string(), format!("{p99:.0} ms")),
					("errors".to_string(), format!("{errors:.1}%")),
				]);
				(node.id.clone(), snapshot)
			})
			.collect();

		let offset = 3 * model.nodes().len() as u64;
		let activations = (0..model.edges().len())
			.map(|i| (i, self.sample(offset + i as u64) > 0.55))
			.collect();

		FeedUpdate {
			metrics,
			activations,
		}
	}
}
