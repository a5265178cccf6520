use std::cell::RefCell;
use std::rc::{Rc, Weak};

use leptos::prelude::*;
use log::{error, warn};
use web_sys::{Element, HtmlCanvasElement, MouseEvent};

use super::config::ViewConfig;
use super::error::TopologyError;
use super::feed::{FeedTask, MetricsSource};
use super::listeners::{DocumentCapture, ListenerGuard};
use super::render::CanvasSurface;
use super::scene::Viewport;
use super::state::TopologyState;
use super::types::{GraphSpec, Point};

type SharedState = Rc<RefCell<Option<TopologyState<DocumentCapture>>>>;

/// A metrics source shared between the page and the canvas' feed task.
pub type SharedSource = Rc<RefCell<dyn MetricsSource>>;

fn with_state(shared: &SharedState, f: impl FnOnce(&mut TopologyState<DocumentCapture>)) {
	match shared.try_borrow_mut() {
		Ok(mut guard) => {
			if let Some(state) = guard.as_mut() {
				f(state);
			}
		}
		Err(_) => warn!("topology state busy; event dropped"),
	}
}

fn with_weak(
	weak: &Weak<RefCell<Option<TopologyState<DocumentCapture>>>>,
	f: impl FnOnce(&mut TopologyState<DocumentCapture>),
) {
	if let Some(shared) = weak.upgrade() {
		with_state(&shared, f);
	}
}

fn viewport_of(container: &Element) -> Viewport {
	Viewport {
		scroll: Point::new(container.scroll_left() as f64, container.scroll_top() as f64),
		width: container.client_width() as f64,
		height: container.client_height() as f64,
	}
}

/// Pointer position relative to the visible area of the scroll container.
fn pointer_in(container: &Element, ev: &MouseEvent) -> Point {
	let rect = container.get_bounding_client_rect();
	Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

#[component]
pub fn TopologyCanvas(
	#[prop(into)] spec: Signal<GraphSpec>,
	#[prop(default = ViewConfig::default())] config: ViewConfig,
	#[prop(optional)] source: Option<SharedSource>,
) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let fatal = RwSignal::new(None::<TopologyError>);
	let state: SharedState = Rc::new(RefCell::new(None));

	let state_init = state.clone();
	Effect::new(move |_| {
		let (Some(container), Some(canvas)) = (container_ref.get(), canvas_ref.get()) else {
			return;
		};
		let container: Element = container.into();
		let canvas: HtmlCanvasElement = canvas.into();
		let spec = spec.get();

		if let Some(mut old) = state_init.borrow_mut().take() {
			old.teardown();
		}

		let weak = Rc::downgrade(&state_init);
		let (weak_move, container_move) = (weak.clone(), container.clone());
		let (weak_up, container_up) = (weak.clone(), container.clone());
		let capture = DocumentCapture::new(
			move |ev: MouseEvent| {
				with_weak(&weak_move, |s| {
					s.set_viewport(viewport_of(&container_move));
					s.pointer_move(pointer_in(&container_move, &ev));
				})
			},
			move |_: MouseEvent| {
				with_weak(&weak_up, |s| {
					s.set_viewport(viewport_of(&container_up));
					s.pointer_up();
				})
			},
		);

		let mut next = match TopologyState::new(&spec, config.clone(), capture) {
			Ok(next) => next,
			Err(e) => {
				error!("rejected graph specification: {e}");
				fatal.set(Some(e.into()));
				return;
			}
		};

		match CanvasSurface::new(canvas) {
			Ok(surface) => next.attach_surface(surface),
			Err(e) => {
				error!("cannot render topology: {e}");
				fatal.set(Some(e.into()));
				return;
			}
		}
		next.set_viewport(viewport_of(&container));

		if let Some(window) = web_sys::window() {
			let (weak_resize, container_resize) = (weak.clone(), container.clone());
			let guard = ListenerGuard::new(window.into()).listen("resize", move |_| {
				with_weak(&weak_resize, |s| {
					s.set_viewport(viewport_of(&container_resize));
					s.request_render();
				})
			});
			next.attach_resize_listener(guard);
		}

		if let Some(source) = source.clone().filter(|_| config.live_metrics) {
			let weak_feed = weak.clone();
			let tick = move || {
				with_weak(&weak_feed, |s| {
					let update = source.borrow_mut().next_update(&s.model);
					s.apply_feed(update);
				})
			};
			match FeedTask::start(config.feed_interval, tick) {
				Ok(task) => next.attach_feed(task),
				Err(e) => warn!("{e}; showing static metrics"),
			}
		}

		next.request_render();
		fatal.set(None);
		*state_init.borrow_mut() = Some(next);
	});

	let teardown = StoredValue::new_local(state.clone());
	on_cleanup(move || {
		let _ = teardown.try_with_value(|shared| with_state(shared, |s| s.teardown()));
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(container) = container_ref.get() else {
			return;
		};
		let container: Element = container.into();
		ev.prevent_default();
		with_state(&state_md, |s| {
			s.set_viewport(viewport_of(&container));
			s.pointer_down(pointer_in(&container, &ev));
		});
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(container) = container_ref.get() else {
			return;
		};
		let container: Element = container.into();
		with_state(&state_mm, |s| {
			s.set_viewport(viewport_of(&container));
			s.hover(Some(pointer_in(&container, &ev)));
		});
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		with_state(&state_ml, |s| s.hover(None));
	};

	view! {
		<div
			node_ref=container_ref
			class="topology-viewport"
			style="position: relative; overflow: auto; width: 100%; height: 100%;"
		>
			<canvas
				node_ref=canvas_ref
				class="topology-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseleave=on_mouseleave
				style="display: block;"
			/>
			{move || fatal.get().map_or(Ok(()), Err)}
		</div>
	}
}
