use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::SpecError;

/// Opaque metric snapshot, ordered so it always renders the same way.
pub type Metrics = BTreeMap<String, String>;

/// A coordinate in model (canvas) space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn offset(self, dx: f64, dy: f64) -> Self {
		Self::new(self.x + dx, self.y + dy)
	}

	pub fn minus(self, other: Point) -> Self {
		Self::new(self.x - other.x, self.y - other.y)
	}

	pub fn distance(self, other: Point) -> f64 {
		let (dx, dy) = (other.x - self.x, other.y - self.y);
		(dx * dx + dy * dy).sqrt()
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
	pub width: f64,
	pub height: f64,
}

impl Size {
	pub const fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}
}

/// Axis-aligned rectangle, `origin` is the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
	pub origin: Point,
	pub size: Size,
}

impl Rect {
	pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
		Self {
			origin: Point::new(x, y),
			size: Size::new(width, height),
		}
	}

	pub fn center(&self) -> Point {
		self.origin
			.offset(self.size.width / 2.0, self.size.height / 2.0)
	}

	pub fn right(&self) -> f64 {
		self.origin.x + self.size.width
	}

	pub fn bottom(&self) -> f64 {
		self.origin.y + self.size.height
	}

	pub fn contains(&self, p: Point) -> bool {
		p.x >= self.origin.x && p.x <= self.right() && p.y >= self.origin.y && p.y <= self.bottom()
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArrowType {
	#[default]
	OneWay,
	TwoWay,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArrowStyle {
	#[default]
	Solid,
	Dashed,
}

/// Data-flow direction of a connection; drives its color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Access {
	ReadOnly,
	WriteOnly,
	#[default]
	ReadWrite,
}

impl Access {
	pub fn label(self) -> &'static str {
		match self {
			Access::ReadOnly => "read-only",
			Access::WriteOnly => "write-only",
			Access::ReadWrite => "read-write",
		}
	}
}

/// One node of a dependency DAG.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DagNodeSpec {
	pub id: String,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub dependencies: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DagSpec {
	pub nodes: Vec<DagNodeSpec>,
	pub entrypoint: String,
}

/// One service box of an architecture graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
	pub id: String,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub position: Option<Point>,
	/// Internal variants of a composite service.
	#[serde(default)]
	pub microservices: Vec<String>,
	#[serde(default)]
	pub metrics: Metrics,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSpec {
	pub from: String,
	pub to: String,
	#[serde(default)]
	pub arrow_type: ArrowType,
	#[serde(default)]
	pub arrow_style: ArrowStyle,
	#[serde(default)]
	pub access: Access,
	#[serde(default)]
	pub label: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopologySpec {
	pub services: Vec<ServiceSpec>,
	#[serde(default)]
	pub connections: Vec<ConnectionSpec>,
}

/// Input accepted by the canvas: either a dependency DAG or a service topology.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphSpec {
	Dag(DagSpec),
	Topology(TopologySpec),
}

impl GraphSpec {
	pub fn from_json(json: &str) -> Result<Self, SpecError> {
		Ok(serde_json::from_str(json)?)
	}
}
