//! The attribute/event application policy, shared by materialization (apply-only) and
//! diffing (diff-then-apply).
//!
//! Dispatch is over the closed [`Value`] set decided at the construction boundary:
//! handlers route through the [`EventRegistry`], `class` is a single-string attribute,
//! style maps merge into the live style map (omitted entries are deliberately NOT
//! cleared), flags follow the reflected-property rules, and everything else is a plain
//! markup attribute.

use crate::{
	events::EventRegistry,
	host::HostNode,
	vdom::{Props, Value},
};
use tracing::trace;

/// Lower-cased event category derived from a handler key: `onClick` → `click`.
fn category_of(key: &str) -> String {
	let stripped = match key.get(..2) {
		Some(prefix) if prefix.eq_ignore_ascii_case("on") => &key[2..],
		_ => key,
	};
	stripped.to_ascii_lowercase()
}

/// Apply-only variant, used on freshly created elements. `Null` values are skipped
/// entirely rather than set-then-removed.
pub fn apply(registry: &EventRegistry, element: &HostNode, props: &Props) {
	for (key, value) in props.iter() {
		if matches!(value, Value::Null) {
			continue;
		}
		set(registry, element, key, value, None);
	}
}

/// Diff variant: removes keys present only in `old` (dispatching on the old value's
/// type), then applies keys from `new` whose value actually changed. Unchanged values
/// produce zero host writes.
pub fn patch(registry: &EventRegistry, element: &HostNode, new: &Props, old: &Props) {
	for (key, old_value) in old.iter() {
		if !new.contains(key) {
			remove(registry, element, key, old_value);
		}
	}
	for (key, new_value) in new.iter() {
		let old_value = old.get(key);
		if old_value == Some(new_value) {
			trace!(key, "Unchanged value; skipping host write.");
			continue;
		}
		set(registry, element, key, new_value, old_value);
	}
}

fn set(registry: &EventRegistry, element: &HostNode, key: &str, value: &Value, old: Option<&Value>) {
	match value {
		Value::Handler(handler) => {
			let category = category_of(key);
			// Deregister the superseded handler for this exact category first, so a
			// replaced handler cannot double-fire.
			if let Some(Value::Handler(old)) = old {
				registry.unregister(element, &category, old);
			}
			registry.register(element, &category, handler.clone());
		}
		Value::Text(value) if key == "class" => {
			if value.is_empty() {
				element.remove_attribute("class");
			} else {
				element.set_attribute("class", value);
			}
		}
		Value::Style(entries) => {
			// Merge only: entries omitted from the new mapping stay applied.
			for (name, value) in entries {
				element.set_style(name, value);
			}
		}
		Value::Flag(value) => set_flag(element, key, *value),
		Value::Text(value) => element.set_attribute(key, value),
		Value::Null => element.remove_attribute(key),
	}
}

fn set_flag(element: &HostNode, key: &str, value: bool) {
	match key {
		// Reflected-property-only toggles: the intrinsic control state tracks the value
		// exactly, in both directions, without ever touching the markup attribute.
		"checked" | "selected" => element.set_flag(key, value),
		// Attribute and reflected property move together, symmetrically.
		"readonly" => {
			if value {
				element.set_attribute("readonly", "");
			} else {
				element.remove_attribute("readonly");
			}
			element.set_flag("readonly", value);
		}
		_ => {
			if value {
				element.set_attribute(key, "");
			} else {
				element.remove_attribute(key);
			}
			if element.reflects_flag(key) {
				element.set_flag(key, value);
			}
		}
	}
}

/// Removal policy for keys present only in the old mapping.
fn remove(registry: &EventRegistry, element: &HostNode, key: &str, old: &Value) {
	match old {
		Value::Handler(handler) => registry.unregister(element, &category_of(key), handler),
		Value::Flag(_) => {
			element.remove_attribute(key);
			if element.reflects_flag(key) {
				element.set_flag(key, false);
			}
		}
		// Covers plain attributes, `class`, and `style` (whose attribute removal also
		// clears the live style map).
		_ => element.remove_attribute(key),
	}
}
