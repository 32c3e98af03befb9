use leptos::prelude::*;
use web_sys::MouseEvent;

use crate::components::force_graph::{ScaleConfig, WeightScale, lineage_color};
use crate::word_tree::{HierarchyConfig, HierarchyLayout, Lineage, WordGraph, layout_hierarchy};

const PADDING: f64 = 120.0;
const FONT_FAMILY: &str = "Inter,Roboto,Arial,Helvetica,sans-serif";

fn view_box(layout: &HierarchyLayout) -> String {
	let (x0, y0, x1, y1) = layout.bounds();
	format!(
		"{} {} {} {}",
		x0 - PADDING,
		y0 - PADDING,
		x1 - x0 + 2.0 * PADDING,
		y1 - y0 + 2.0 * PADDING
	)
}

/// Left context reads into the keyword, right context away from it.
fn text_anchor(lineage: Lineage) -> &'static str {
	match lineage {
		Lineage::Root => "middle",
		Lineage::Left => "end",
		Lineage::Right => "start",
	}
}

fn tree_scale(graph: &WordGraph) -> WeightScale {
	WeightScale::from_graph(
		graph,
		ScaleConfig {
			min_font: 14.0,
			max_font: 32.0,
			..ScaleConfig::default()
		},
	)
}

#[derive(Clone, Debug, PartialEq)]
struct HoverTip {
	text: String,
	x: i32,
	y: i32,
}

/// Hierarchical word tree: the keyword in the middle, context on either side.
#[component]
pub fn WordTreeView(
	#[prop(into)] data: Signal<WordGraph>,
	#[prop(default = 800.0)] height: f64,
) -> impl IntoView {
	let layout = Signal::derive(move || layout_hierarchy(&data.get(), &HierarchyConfig::default()));
	let scale = Signal::derive(move || tree_scale(&data.get()));
	let (tooltip, set_tooltip) = signal(None::<HoverTip>);

	let links = move || {
		layout
			.get()
			.links
			.iter()
			.map(|link| view! { <path d=link.diagonal_path() /> })
			.collect_view()
	};

	let nodes = move || {
		let scale = scale.get();
		layout
			.get()
			.nodes
			.into_iter()
			.map(|node| {
				let font = if node.lineage == Lineage::Root {
					scale.config().max_font
				} else {
					scale.font_for(node.weight)
				};
				let dx = match node.lineage {
					Lineage::Root => 0.0,
					Lineage::Left => -8.0,
					Lineage::Right => 8.0,
				};
				let tip = format!("{} ({})", node.label, node.weight);
				let on_enter = move |ev: MouseEvent| {
					set_tooltip.set(Some(HoverTip {
						text: tip.clone(),
						x: ev.client_x(),
						y: ev.client_y(),
					}))
				};
				let count = (node.lineage != Lineage::Root).then(|| {
					view! {
						<text
							x=(node.x + dx).to_string()
							y=(node.y + 18.0).to_string()
							text-anchor=text_anchor(node.lineage)
							font-size="12"
							fill="#888"
						>
							{format!("({})", node.weight)}
						</text>
					}
				});
				view! {
					<g
						style="cursor: pointer;"
						on:mouseenter=on_enter
						on:mouseleave=move |_| set_tooltip.set(None)
					>
						<circle cx=node.x.to_string() cy=node.y.to_string() r="4" fill=lineage_color(node.lineage) />
						<text
							x=(node.x + dx).to_string()
							y=node.y.to_string()
							text-anchor=text_anchor(node.lineage)
							dominant-baseline="middle"
							font-weight="300"
							font-size=format!("{font:.1}")
							fill="#222"
						>
							{node.label.clone()}
						</text>
						{count}
					</g>
				}
			})
			.collect_view()
	};

	view! {
		<div class="word-tree-view" style="position: relative; width: 100%;">
			<svg
				viewBox=move || view_box(&layout.get())
				style=format!("width: 100%; height: {height}px; font-family: {FONT_FAMILY};")
			>
				<g fill="none" stroke="#aaa" stroke-width="1.5">{links}</g>
				<g>{nodes}</g>
			</svg>
			{move || {
				tooltip
					.get()
					.map(|tip| {
						view! {
							<div
								class="word-tree-tooltip"
								style=format!(
									"position: fixed; left: {}px; top: {}px; background: rgba(0,0,0,0.8); color: #fff; padding: 4px 10px; border-radius: 4px; pointer-events: none; font-size: 14px; z-index: 10;",
									tip.x + 12,
									tip.y + 12,
								)
							>
								{tip.text}
							</div>
						}
					})
			}}
		</div>
	}
}
