use sapling_dom::{el, EventHandler, HostNode, Node, Props, Renderer};
use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn counter() -> Rc<Cell<usize>> {
	Rc::new(Cell::new(0))
}

fn counting(count: &Rc<Cell<usize>>) -> EventHandler {
	let count = Rc::clone(count);
	EventHandler::new(move |_| {
		count.set(count.get() + 1);
		Ok(())
	})
}

#[test]
fn click_reaches_the_target_handler() {
	init_tracing();
	let container = HostNode::new_element("body");
	let mut renderer = Renderer::new();
	let clicks = counter();

	let clicks_in = Rc::clone(&clicks);
	renderer
		.render(
			el(
				"div",
				Props::new(),
				vec![el(
					"button",
					Props::new().on("onClick", move |_| {
						clicks_in.set(clicks_in.get() + 1);
						Ok(())
					}),
					["go"],
				)],
			),
			&container,
		)
		.unwrap();

	let button = container.child(0).unwrap().child(0).unwrap();
	assert_eq!(clicks.get(), 0);
	button.emit("click");
	assert_eq!(clicks.get(), 1);
}

#[test]
fn delegation_resolves_at_the_nearest_handling_ancestor() {
	init_tracing();
	let container = HostNode::new_element("body");
	let mut renderer = Renderer::new();
	let outer = counter();
	let inner = counter();

	renderer
		.render(
			el(
				"div",
				Props::new().with("onClick", counting(&outer)),
				vec![el("button", Props::new().with("onClick", counting(&inner)), ["go"])],
			),
			&container,
		)
		.unwrap();

	let div = container.child(0).unwrap();
	let button = div.child(0).unwrap();

	// The target handles it; the ancestor is not also delivered to.
	button.emit("click");
	assert_eq!((inner.get(), outer.get()), (1, 0));

	// Without a handler on the target's path below it, the ancestor handles it.
	div.emit("click");
	assert_eq!((inner.get(), outer.get()), (1, 1));
}

#[test]
fn events_bubble_past_handlerless_targets() {
	init_tracing();
	let container = HostNode::new_element("body");
	let mut renderer = Renderer::new();
	let clicks = counter();

	renderer
		.render(
			el("div", Props::new().with("onClick", counting(&clicks)), vec![el("span", Props::new(), ["leaf"])]),
			&container,
		)
		.unwrap();

	let span = container.child(0).unwrap().child(0).unwrap();
	span.emit("click");
	assert_eq!(clicks.get(), 1);
}

#[test]
fn the_root_itself_is_outside_delegation() {
	init_tracing();
	let container = HostNode::new_element("body");
	let mut renderer = Renderer::new();
	let clicks = counter();

	renderer.render(el("div", Props::new(), ["leaf"]), &container).unwrap();
	// Registered against the root: the ancestry walk stops short of it.
	renderer.registry().register(&container, "click", counting(&clicks));

	container.child(0).unwrap().emit("click");
	assert_eq!(clicks.get(), 0);
}

#[test]
fn failing_handler_does_not_suppress_siblings() {
	init_tracing();
	let container = HostNode::new_element("body");
	let mut renderer = Renderer::new();
	let survivors = counter();

	renderer
		.render(
			el("button", Props::new().on("onClick", |_| Err("handler exploded".into())), ["go"]),
			&container,
		)
		.unwrap();
	let button = container.child(0).unwrap();
	renderer.registry().register(&button, "click", counting(&survivors));

	// The first handler fails; the second still runs, and dispatch returns normally.
	button.emit("click");
	assert_eq!(survivors.get(), 1);
}

#[test]
fn handlers_run_in_insertion_order() {
	init_tracing();
	let container = HostNode::new_element("body");
	let mut renderer = Renderer::new();
	let order = Rc::new(RefCell::new(Vec::new()));

	let first = Rc::clone(&order);
	renderer
		.render(
			el(
				"button",
				Props::new().on("onClick", move |_| {
					first.borrow_mut().push(1);
					Ok(())
				}),
				["go"],
			),
			&container,
		)
		.unwrap();
	let button = container.child(0).unwrap();
	let second = Rc::clone(&order);
	renderer.registry().register(
		&button,
		"click",
		EventHandler::new(move |_| {
			second.borrow_mut().push(2);
			Ok(())
		}),
	);

	button.emit("click");
	assert_eq!(*order.borrow(), vec![1, 2]);
}

#[test]
fn replaced_handler_does_not_double_fire() {
	init_tracing();
	let container = HostNode::new_element("body");
	let mut renderer = Renderer::new();
	let old_clicks = counter();
	let new_clicks = counter();

	renderer.render(el("button", Props::new().with("onClick", counting(&old_clicks)), ["go"]), &container).unwrap();
	renderer.render(el("button", Props::new().with("onClick", counting(&new_clicks)), ["go"]), &container).unwrap();

	container.child(0).unwrap().emit("click");
	assert_eq!((old_clicks.get(), new_clicks.get()), (0, 1));
	assert_eq!(renderer.registry().handler_count(), 1);
}

#[test]
fn reregistering_the_same_handler_is_a_noop() {
	init_tracing();
	let container = HostNode::new_element("body");
	let renderer = Renderer::new();
	let clicks = counter();
	let handler = counting(&clicks);

	renderer.registry().install_delegated_listeners(&container);
	let button = HostNode::new_element("button");
	container.append_child(&button);
	renderer.registry().register(&button, "click", handler.clone());
	renderer.registry().register(&button, "click", handler);

	button.emit("click");
	assert_eq!(clicks.get(), 1);
	assert_eq!(renderer.registry().handler_count(), 1);
}

#[test]
fn handled_events_do_not_reach_enclosing_roots() {
	init_tracing();
	let outer = HostNode::new_element("body");
	let mut renderer = Renderer::new();
	let clicks = counter();

	// The inner container is itself rendered content of the outer one, so both
	// roots carry delegated listeners for the same bubble path.
	renderer.render(el("div", Props::new(), Vec::<Node>::new()), &outer).unwrap();
	let inner = outer.child(0).unwrap();
	renderer.render(el("button", Props::new().with("onClick", counting(&clicks)), ["go"]), &inner).unwrap();

	// One originating event, one delivery: resolution at the inner root stops the
	// bubble before the outer root's listener can re-run the ancestry walk.
	inner.child(0).unwrap().emit("click");
	assert_eq!(clicks.get(), 1);
}

#[test]
fn registrations_die_with_their_nodes() {
	init_tracing();
	let registry = sapling_dom::EventRegistry::new();
	let clicks = counter();

	let node = HostNode::new_element("button");
	registry.register(&node, "click", counting(&clicks));
	assert_eq!((registry.handler_count(), registry.node_count()), (1, 1));

	// Entries keyed by a dropped node must be invisible, whatever later
	// allocation reuses its address.
	drop(node);
	assert_eq!((registry.handler_count(), registry.node_count()), (0, 0));

	let reborn = HostNode::new_element("button");
	registry.register(&reborn, "click", counting(&clicks));
	assert_eq!((registry.handler_count(), registry.node_count()), (1, 1));
}

#[test]
fn unregister_prunes_empty_entries() {
	init_tracing();
	let registry = sapling_dom::EventRegistry::new();
	let node = HostNode::new_element("button");
	let clicks = counter();
	let handler = counting(&clicks);

	registry.register(&node, "click", handler.clone());
	assert_eq!((registry.handler_count(), registry.node_count()), (1, 1));

	registry.unregister(&node, "click", &handler);
	assert_eq!((registry.handler_count(), registry.node_count()), (0, 0));
}

#[test]
fn removed_subtrees_leave_no_registry_residue() {
	init_tracing();
	let container = HostNode::new_element("body");
	let mut renderer = Renderer::new();
	let clicks = counter();

	renderer
		.render(
			el("div", Props::new(), vec![el("button", Props::new().with("onClick", counting(&clicks)), ["go"])]),
			&container,
		)
		.unwrap();
	assert_eq!(renderer.registry().node_count(), 1);

	renderer.render(el("div", Props::new(), Vec::<Node>::new()), &container).unwrap();
	assert_eq!(renderer.registry().node_count(), 0);
	assert_eq!(renderer.registry().handler_count(), 0);
}

#[test]
fn delegated_listeners_install_once_per_root() {
	init_tracing();
	let container = HostNode::new_element("body");
	let mut renderer = Renderer::new();
	let clicks = counter();

	// Several passes over the same root must not stack listeners; a doubled listener
	// would dispatch twice per event.
	renderer.render(el("button", Props::new().with("onClick", counting(&clicks)), ["go"]), &container).unwrap();
	renderer.render(el("button", Props::new().with("onClick", counting(&clicks)), ["go"]), &container).unwrap();
	renderer.render(el("button", Props::new().with("onClick", counting(&clicks)), ["go"]), &container).unwrap();

	container.child(0).unwrap().emit("click");
	assert_eq!(clicks.get(), 1);
}
