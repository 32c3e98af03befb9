use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, TouchEvent, WheelEvent, Window};

use super::render;
use super::state::ForceGraphState;
use crate::word_tree::WordGraph;

const FRAME_DT: f64 = 0.016;
const MAX_DT: f64 = 0.1;

/// Everything the animation-frame loop keeps alive, shared with the handlers.
#[derive(Clone, Default)]
struct FrameLoop {
	state: Rc<RefCell<Option<ForceGraphState>>>,
	callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>,
	handle: Rc<Cell<Option<i32>>>,
	resize: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
}

impl FrameLoop {
	fn start(&self, window: &Window, canvas: HtmlCanvasElement, ctx: CanvasRenderingContext2d, fullscreen: bool) {
		if fullscreen {
			let (state, canvas) = (self.state.clone(), canvas.clone());
			let on_resize = Closure::<dyn FnMut()>::new(move || {
				let Some((w, h)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas.set_width(w as u32);
				canvas.set_height(h as u32);
				if let Some(ref mut s) = *state.borrow_mut() {
					s.resize(w, h);
				}
			});
			let _ = window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref());
			*self.resize.borrow_mut() = Some(on_resize);
		}

		let (state, callback, handle) = (self.state.clone(), self.callback.clone(), self.handle.clone());
		let last_frame = Cell::new(None::<f64>);
		*self.callback.borrow_mut() = Some(Closure::new(move |now: f64| {
			let dt = last_frame
				.replace(Some(now))
				.map_or(FRAME_DT, |prev| ((now - prev) / 1000.0).clamp(0.0, MAX_DT));
			if let Some(ref mut s) = *state.borrow_mut() {
				s.tick(dt);
				render::render(s, &ctx);
			}
			if let (Some(win), Some(cb)) = (web_sys::window(), callback.borrow().as_ref()) {
				handle.set(win.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
			}
		}));
		if let Some(ref cb) = *self.callback.borrow() {
			self.handle.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}
		log::info!("Force graph frame loop started");
	}

	/// Cancels the pending frame, stops the simulation and drops the closures.
	fn teardown(&self) {
		let window = web_sys::window();
		if let (Some(win), Some(handle)) = (&window, self.handle.take()) {
			let _ = win.cancel_animation_frame(handle);
		}
		if let Some(ref mut s) = *self.state.borrow_mut() {
			s.stop();
		}
		if let (Some(win), Some(cb)) = (&window, self.resize.borrow_mut().take()) {
			let _ = win.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
		self.callback.borrow_mut().take();
		self.state.borrow_mut().take();
		log::info!("Force graph torn down");
	}
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((window.inner_width().ok()?.as_f64()?, window.inner_height().ok()?.as_f64()?))
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok()??.dyn_into().ok()
}

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, client_x: i32, client_y: i32) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?;
	let rect = canvas.get_bounding_client_rect();
	Some((client_x as f64 - rect.left(), client_y as f64 - rect.top()))
}

/// Local points of the first two touches, if the event carries them.
fn touch_points(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &TouchEvent) -> Vec<(f64, f64)> {
	let touches = ev.touches();
	(0..touches.length().min(2))
		.filter_map(|i| touches.get(i))
		.filter_map(|t| local_point(canvas_ref, t.client_x(), t.client_y()))
		.collect()
}

fn pinch_geometry(a: (f64, f64), b: (f64, f64)) -> ((f64, f64), f64) {
	let center = ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
	(center, (a.0 - b.0).hypot(a.1 - b.1))
}

/// Force-directed view of a word graph.
///
/// A new `data` value discards the running simulation and starts a fresh one.
/// Bumping `reset` animates the view back to the identity transform.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<WordGraph>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(optional, into)] reset: Option<Signal<u32>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let frames = FrameLoop::default();

	let frames_init = frames.clone();
	Effect::new(move |_| {
		let graph = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			let parent = canvas.parent_element();
			(
				width.unwrap_or_else(|| parent.as_ref().map(|p| p.client_width() as f64).unwrap_or(800.0)),
				height.unwrap_or_else(|| parent.as_ref().map(|p| p.client_height() as f64).unwrap_or(600.0)),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		if let Some(ref mut old) = *frames_init.state.borrow_mut() {
			old.stop();
		}
		*frames_init.state.borrow_mut() = Some(ForceGraphState::new(&graph, w, h));

		if frames_init.callback.borrow().is_none() {
			let Some(ctx) = context_2d(&canvas) else {
				log::warn!("Canvas 2d context unavailable");
				return;
			};
			frames_init.start(&window, canvas, ctx, fullscreen);
		}
	});

	if let Some(reset) = reset {
		let state_reset = frames.state.clone();
		Effect::new(move |prev: Option<u32>| {
			let count = reset.get();
			if prev.is_some_and(|p| p != count) {
				if let Some(ref mut s) = *state_reset.borrow_mut() {
					s.reset();
				}
			}
			count
		});
	}

	let teardown = StoredValue::new_local(frames.clone());
	on_cleanup(move || {
		let _ = teardown.try_with_value(FrameLoop::teardown);
	});

	let state_md = frames.state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pointer_down(x, y);
		}
	};

	let state_mm = frames.state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(x, y);
		}
	};

	let state_mu = frames.state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.pointer_up();
		}
	};

	let state_ml = frames.state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_leave();
		}
	};

	let state_wh = frames.state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.wheel(x, y, ev.delta_y());
		}
	};

	// Finger distance of an ongoing two-finger pinch.
	let pinch_distance = Rc::new(Cell::new(None::<f64>));

	let (state_ts, pinch_ts) = (frames.state.clone(), pinch_distance.clone());
	let on_touchstart = move |ev: TouchEvent| {
		ev.prevent_default();
		let points = touch_points(canvas_ref, &ev);
		let mut guard = state_ts.borrow_mut();
		let Some(s) = guard.as_mut() else {
			return;
		};
		match points.as_slice() {
			[(x, y)] => {
				pinch_ts.set(None);
				s.pointer_down(*x, *y);
			}
			[a, b] => {
				s.pointer_up();
				pinch_ts.set(Some(pinch_geometry(*a, *b).1));
			}
			_ => {}
		}
	};

	let (state_tm, pinch_tm) = (frames.state.clone(), pinch_distance.clone());
	let on_touchmove = move |ev: TouchEvent| {
		ev.prevent_default();
		let points = touch_points(canvas_ref, &ev);
		let mut guard = state_tm.borrow_mut();
		let Some(s) = guard.as_mut() else {
			return;
		};
		match points.as_slice() {
			[(x, y)] if pinch_tm.get().is_none() => s.pointer_move(*x, *y),
			[a, b] => {
				let (center, distance) = pinch_geometry(*a, *b);
				if let Some(prev) = pinch_tm.replace(Some(distance)).filter(|d| *d > 0.0) {
					s.pinch(center, distance / prev);
				}
			}
			_ => {}
		}
	};

	let (state_te, pinch_te) = (frames.state.clone(), pinch_distance);
	let on_touchend = move |ev: TouchEvent| {
		if ev.touches().length() > 0 {
			return;
		}
		pinch_te.set(None);
		if let Some(ref mut s) = *state_te.borrow_mut() {
			s.pointer_leave();
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			on:touchstart=on_touchstart
			on:touchmove=on_touchmove
			on:touchend=on_touchend.clone()
			on:touchcancel=on_touchend
			style="display: block; cursor: grab; border-radius: 12px; touch-action: none;"
		/>
	}
}
