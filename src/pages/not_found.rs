use leptos::prelude::*;
use log::warn;

/// 404 page for any route other than the catalog.
#[component]
pub fn NotFound() -> impl IntoView {
	warn!("no route matched the current location");

	view! {
		<div class="not-found">
			<h1>"Page not found"</h1>
			<p>
				<a href="/">"Back to the topology catalog"</a>
			</p>
		</div>
	}
}
