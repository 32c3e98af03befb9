use leptos::prelude::*;

use crate::components::force_graph::ForceGraphCanvas;
use crate::components::word_tree::WordTreeView;
use crate::word_tree::{AssociationTree, WordGraph, build};

/// Shape of a word-tree response from the analysis service.
const SAMPLE_TREE: &str = r#"{
  "word": "bank",
  "left": {
    "river": { "count": 3, "the": { "count": 2 }, "muddy": { "count": 1 } },
    "central": { "count": 4, "the": { "count": 4, "of": { "count": 1 } } },
    "savings": { "count": 1 }
  },
  "right": {
    "account": { "count": 5, "number": { "count": 2 }, "holder": { "count": 1 } },
    "holiday": { "count": 2 },
    "loan": { "count": 3, "rates": { "count": 3, "rose": { "count": 1 } } }
  }
}"#;

fn sample_graph() -> WordGraph {
	match AssociationTree::from_json(SAMPLE_TREE) {
		Ok(tree) => build(&tree),
		Err(err) => {
			log::warn!("Sample tree rejected: {err}");
			WordGraph::default()
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ViewMode {
	Force,
	Tree,
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let graph = RwSignal::new(sample_graph());
	let (input, set_input) = signal(SAMPLE_TREE.to_string());
	let (error, set_error) = signal(None::<String>);
	let reset = RwSignal::new(0u32);
	let mode = RwSignal::new(ViewMode::Force);

	let on_render = move |_| match AssociationTree::from_json(&input.get()) {
		Ok(tree) => {
			set_error.set(None);
			graph.set(build(&tree));
		}
		Err(err) => {
			log::warn!("Rejected association tree: {err}");
			set_error.set(Some(err.to_string()));
		}
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

			<div class="word-tree-page">
				<h1>"Word Tree"</h1>
				<p class="subtitle">
					"Paste a word-tree response, then drag nodes to pin them. Scroll to zoom. Drag background to pan."
				</p>

				<textarea
					rows="8"
					class="word-tree-input"
					prop:value=input
					on:input=move |ev| set_input.set(event_target_value(&ev))
				/>
				{move || error.get().map(|e| view! { <p class="error">{e}</p> })}

				<div class="toolbar">
					<button on:click=on_render>"Render"</button>
					<button on:click=move |_| mode.set(ViewMode::Force)>"Force graph"</button>
					<button on:click=move |_| mode.set(ViewMode::Tree)>"Word tree"</button>
					<button on:click=move |_| reset.update(|n| *n += 1)>"Reset view"</button>
				</div>

				<Show
					when=move || mode.get() == ViewMode::Force
					fallback=move || view! { <WordTreeView data=graph /> }
				>
					<ForceGraphCanvas data=graph width=Some(900.0) height=Some(700.0) reset=reset />
				</Show>
			</div>
		</ErrorBoundary>
	}
}
