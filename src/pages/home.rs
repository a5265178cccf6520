use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use leptos_router::hooks::use_query_map;
use log::info;

use crate::components::topology::{SharedSource, SpecError, TopologyCanvas, ViewConfig};
use crate::pages::catalog::{CatalogEntry, ENTRIES, SimulatedTraffic, entry};

/// Seed for the demo traffic; fixed so every reload shows the same run.
const TRAFFIC_SEED: u64 = 42;

/// Catalog browser: pick a diagram, drag headers, resize from the corner grip.
#[component]
pub fn Home() -> impl IntoView {
	let query = use_query_map();
	let selected = Memo::new(move |_| {
		query
			.read()
			.get("entry")
			.and_then(|key| entry(&key))
			.unwrap_or(&ENTRIES[0])
			.key
	});

	let tabs = ENTRIES
		.iter()
		.map(|e| {
			let key = e.key;
			view! {
				<a
					class="catalog-tab"
					class:active=move || selected.get() == key
					href=format!("/?entry={key}")
					on:click=move |_| info!("showing catalog entry `{key}`")
				>
					{e.title}
				</a>
			}
		})
		.collect_view();

	let description = move || entry(selected.get()).map(|e| e.description);

	let canvas = move || -> Result<_, SpecError> {
		let Some(spec) = entry(selected.get()).map(CatalogEntry::spec).transpose()? else {
			return Ok(None);
		};
		let source: SharedSource = Rc::new(RefCell::new(SimulatedTraffic::new(TRAFFIC_SEED)));
		let spec = Signal::derive(move || spec.clone());
		Ok(Some(view! {
			<TopologyCanvas spec=spec config=ViewConfig::default() source=source />
		}))
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			<div class="topology-page">
				<header class="topology-header">
					<h1>"Topology Canvas"</h1>
					<nav class="catalog-tabs">{tabs}</nav>
					<p class="subtitle">{description}</p>
				</header>
				<div class="topology-frame">{canvas}</div>
			</div>
		</ErrorBoundary>
	}
}
