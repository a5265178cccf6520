//! Live metrics: the interface a traffic source implements and the
//! scheduled task that polls it.

use std::time::Duration;

use leptos::leptos_dom::helpers::{IntervalHandle, set_interval_with_handle};
use log::{debug, warn};

use super::error::FeedError;
use super::model::GraphModel;
use super::types::Metrics;

/// One tick worth of changes produced by a metrics source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeedUpdate {
	/// Full replacement snapshots, keyed by node id.
	pub metrics: Vec<(String, Metrics)>,
	/// `(edge index, active)` pairs.
	pub activations: Vec<(usize, bool)>,
}

/// Something that produces metric snapshots and edge activity.
pub trait MetricsSource {
	fn next_update(&mut self, model: &GraphModel) -> FeedUpdate;
}

/// Applies an update, honouring at most `max_flips` activation changes.
/// Returns how many nodes and edges actually changed.
pub fn apply(model: &mut GraphModel, update: FeedUpdate, max_flips: usize) -> usize {
	let mut changed = 0;
	for (id, metrics) in update.metrics {
		if model.replace_metrics(&id, metrics) {
			changed += 1;
		} else {
			debug!("feed sent metrics for unknown node `{id}`");
		}
	}

	let mut flips = 0;
	for (index, active) in update.activations {
		if flips == max_flips {
			debug!("feed exceeded {max_flips} activation flips; rest ignored");
			break;
		}
		if model.set_edge_active(index, active) {
			flips += 1;
		}
	}
	changed + flips
}

/// A running `setInterval` that stops when dropped.
pub struct FeedTask {
	handle: Option<IntervalHandle>,
}

impl FeedTask {
	pub fn start(interval: Duration, tick: impl Fn() + 'static) -> Result<Self, FeedError> {
		let handle = set_interval_with_handle(tick, interval)
			.map_err(|e| FeedError::Schedule(format!("{e:?}")))?;
		debug!("metrics feed started every {interval:?}");
		Ok(Self {
			handle: Some(handle),
		})
	}

	pub fn is_running(&self) -> bool {
		self.handle.is_some()
	}

	pub fn stop(&mut self) {
		if let Some(handle) = self.handle.take() {
			handle.clear();
			debug!("metrics feed stopped");
		}
	}
}

impl Drop for FeedTask {
	fn drop(&mut self) {
		if self.is_running() {
			warn!("metrics feed dropped while running; stopping it");
		}
		self.stop();
	}
}


#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
	use std::cell::Cell;
	use std::rc::Rc;

	use wasm_bindgen_futures::JsFuture;
	use wasm_bindgen_test::*;

	use super::*;

	async fn sleep(ms: i32) {
		let promise = js_sys::Promise::new(&mut |resolve, _reject| {
			if let Some(window) = web_sys::window() {
				let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
			}
		});
		let _ = JsFuture::from(promise).await;
	}

	fn counting_task() -> (FeedTask, Rc<Cell<u32>>) {
		let ticks = Rc::new(Cell::new(0));
		let counted = ticks.clone();
		let task = FeedTask::start(Duration::from_millis(10), move || {
			counted.set(counted.get() + 1)
		})
		.unwrap();
		(task, ticks)
	}

	#[wasm_bindgen_test]
	async fn stop_clears_the_interval() {
		let (mut task, ticks) = counting_task();
		assert!(task.is_running());
		sleep(80).await;
		assert!(ticks.get() > 0);

		task.stop();
		assert!(!task.is_running());
		let seen = ticks.get();
		sleep(80).await;
		assert_eq!(ticks.get(), seen);

		// A second stop is a no-op.
		task.stop();
		assert!(!task.is_running());
	}

	#[wasm_bindgen_test]
	async fn dropping_a_running_task_stops_it() {
		let (task, ticks) = counting_task();
		sleep(40).await;
		drop(task);
		let seen = ticks.get();
		sleep(80).await;
		assert_eq!(ticks.get(), seen);
	}
}
