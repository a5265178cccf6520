use log::{error, trace};
use wasm_bindgen::prelude::*;
use web_sys::{Event, EventTarget, MouseEvent};

use super::controller::PointerCapture;

/// Event listeners attached to one target, removed again on drop.
///
/// Callbacks added with [`ListenerGuard::listen`] are owned by the guard and
/// freed after their listeners are removed. Callbacks added with
/// [`ListenerGuard::attach`] belong to someone else and must outlive it.
pub struct ListenerGuard {
	target: EventTarget,
	entries: Vec<(&'static str, js_sys::Function)>,
	owned: Vec<Closure<dyn FnMut(Event)>>,
}

impl ListenerGuard {
	pub fn new(target: EventTarget) -> Self {
		Self {
			target,
			entries: Vec::new(),
			owned: Vec::new(),
		}
	}

	/// Registers an existing JS function for `event`.
	pub fn attach(mut self, event: &'static str, function: &js_sys::Function) -> Self {
		match self
			.target
			.add_event_listener_with_callback(event, function)
		{
			Ok(()) => self.entries.push((event, function.clone())),
			Err(e) => error!("failed to add `{event}` listener: {e:?}"),
		}
		self
	}

	/// Adds a listener whose callback lives exactly as long as the guard.
	pub fn listen(self, event: &'static str, handler: impl Fn(Event) + 'static) -> Self {
		let closure = Closure::<dyn FnMut(Event)>::new(handler);
		let mut guard = self.attach(event, closure.as_ref().unchecked_ref());
		guard.owned.push(closure);
		guard
	}
}

impl Drop for ListenerGuard {
	fn drop(&mut self) {
		for (event, function) in self.entries.drain(..) {
			let _ = self
				.target
				.remove_event_listener_with_callback(event, &function);
			trace!("removed `{event}` listener");
		}
	}
}

/// Subscribes `mousemove`/`mouseup` on the document while a gesture runs.
///
/// Both callbacks are created once and re-registered on every capture, so a
/// gesture ending inside its own `mouseup` only unregisters, never frees.
/// Guards handed out by [`PointerCapture::capture`] must be dropped before
/// the capture itself.
pub struct DocumentCapture {
	on_move: Closure<dyn FnMut(MouseEvent)>,
	on_up: Closure<dyn FnMut(MouseEvent)>,
}

impl DocumentCapture {
	pub fn new(
		on_move: impl Fn(MouseEvent) + 'static,
		on_up: impl Fn(MouseEvent) + 'static,
	) -> Self {
		Self {
			on_move: Closure::new(on_move),
			on_up: Closure::new(on_up),
		}
	}
}

impl PointerCapture for DocumentCapture {
	type Guard = Option<ListenerGuard>;

	fn capture(&self) -> Self::Guard {
		let Some(document) = web_sys::window().and_then(|w| w.document()) else {
			error!("no document; pointer gesture will not track movement");
			return None;
		};
		Some(
			ListenerGuard::new(document.into())
				.attach("mousemove", self.on_move.as_ref().unchecked_ref())
				.attach("mouseup", self.on_up.as_ref().unchecked_ref()),
		)
	}
}

#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
	use std::cell::Cell;
	use std::rc::Rc;

	use wasm_bindgen_test::*;
	use web_sys::Document;

	use super::*;

	fn document() -> Document {
		web_sys::window().and_then(|w| w.document()).unwrap()
	}

	fn fire(target: &EventTarget, event: &Event) {
		target.dispatch_event(event).unwrap();
	}

	#[wasm_bindgen_test]
	fn dropped_guard_no_longer_runs_its_handler() {
		let target = EventTarget::new().unwrap();
		let hits = Rc::new(Cell::new(0));
		let seen = hits.clone();
		let guard =
			ListenerGuard::new(target.clone()).listen("ping", move |_| seen.set(seen.get() + 1));

		fire(&target, &Event::new("ping").unwrap());
		fire(&target, &Event::new("ping").unwrap());
		assert_eq!(hits.get(), 2);

		drop(guard);
		fire(&target, &Event::new("ping").unwrap());
		assert_eq!(hits.get(), 2);
	}

	#[wasm_bindgen_test]
	fn attached_function_survives_its_guard() {
		let target = EventTarget::new().unwrap();
		let hits = Rc::new(Cell::new(0));
		let seen = hits.clone();
		let callback = Closure::<dyn FnMut(Event)>::new(move |_: Event| seen.set(seen.get() + 1));
		let function: &js_sys::Function = callback.as_ref().unchecked_ref();

		for round in 1..=3 {
			let guard = ListenerGuard::new(target.clone()).attach("ping", function);
			fire(&target, &Event::new("ping").unwrap());
			drop(guard);
			fire(&target, &Event::new("ping").unwrap());
			assert_eq!(hits.get(), round);
		}
	}

	#[wasm_bindgen_test]
	fn document_capture_listens_only_while_held() {
		let moves = Rc::new(Cell::new(0));
		let ups = Rc::new(Cell::new(0));
		let (m, u) = (moves.clone(), ups.clone());
		let capture = DocumentCapture::new(
			move |_| m.set(m.get() + 1),
			move |_| u.set(u.get() + 1),
		);
		let document: EventTarget = document().into();
		let mouse = |kind: &str| -> Event { MouseEvent::new(kind).unwrap().into() };

		fire(&document, &mouse("mousemove"));
		assert_eq!(moves.get(), 0);

		for round in 1..=3 {
			let guard = capture.capture();
			assert!(guard.is_some());
			fire(&document, &mouse("mousemove"));
			fire(&document, &mouse("mouseup"));
			assert_eq!((moves.get(), ups.get()), (round, round));

			drop(guard);
			fire(&document, &mouse("mousemove"));
			fire(&document, &mouse("mouseup"));
			assert_eq!((moves.get(), ups.get()), (round, round));
		}
	}
}
