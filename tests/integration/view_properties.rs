use norns_edit::views::build_forest;
use norns_edit::{Category, EditState, ResourceNode, ViewBuilder};
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Shape {
    Leaf,
    Dir(Vec<Shape>),
}

fn shape() -> impl Strategy<Value = Shape> {
    Just(Shape::Leaf).prop_recursive(3, 32, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(Shape::Dir)
    })
}

fn build(shapes: &[Shape], dir: &str) -> Vec<ResourceNode> {
    shapes
        .iter()
        .enumerate()
        .map(|(i, shape)| {
            let label = format!("n{}", i);
            let key = format!("{}/{}", dir, label);
            match shape {
                Shape::Leaf => ResourceNode::leaf(key, label),
                Shape::Dir(children) => {
                    let children = build(children, &key);
                    ResourceNode::directory(key, label, children)
                }
            }
        })
        .collect()
}

/// (pick, kind): kind 0 edits a buffer, 1 loads a clean one, 2 expands, 3 selects
type Intent = (usize, u8);

fn state_for(shapes: &[Shape], intents: &[Intent]) -> EditState {
    let mut state = EditState::new();
    state
        .tree
        .load(Category::Scripts, build(shapes, "/scripts"))
        .unwrap();
    let keys = state.tree.keys();
    if keys.is_empty() {
        return state;
    }
    for (pick, kind) in intents {
        let key = &keys[pick % keys.len()];
        match kind % 4 {
            0 => state.buffers.change(key, "edited".to_string()),
            1 => {
                state.buffers.install_loaded(key, "loaded".to_string());
            }
            2 => state.explorer.toggle(key, true),
            _ => state.explorer.set_active(key),
        }
    }
    state
}

proptest! {
    #[test]
    fn view_preserves_structure(
        shapes in prop::collection::vec(shape(), 0..5),
        intents in prop::collection::vec((any::<usize>(), any::<u8>()), 0..12),
    ) {
        let state = state_for(&shapes, &intents);
        let view = build_forest(&state);

        prop_assert_eq!(view.node_count(), state.tree.node_count());
        let mut view_keys = view.keys();
        let mut tree_keys = state.tree.keys();
        view_keys.sort();
        tree_keys.sort();
        prop_assert_eq!(&view_keys, &tree_keys);

        for key in &tree_keys {
            let node = view.find(key).unwrap();
            let buffer = state.buffers.get(key);
            prop_assert_eq!(node.active, state.explorer.is_active(key));
            prop_assert_eq!(node.toggled, state.explorer.is_expanded(key));
            prop_assert_eq!(node.loaded, buffer.is_some());
            prop_assert_eq!(node.modified, buffer.map(|b| b.modified).unwrap_or(false));
        }
    }

    #[test]
    fn memoized_view_is_stable(
        shapes in prop::collection::vec(shape(), 0..5),
        intents in prop::collection::vec((any::<usize>(), any::<u8>()), 0..12),
    ) {
        let state = state_for(&shapes, &intents);
        let views = ViewBuilder::new();
        let first = views.annotated_forest(&state);
        let second = views.annotated_forest(&state);
        prop_assert!(Arc::ptr_eq(&first, &second));
        prop_assert_eq!(first.as_ref(), &build_forest(&state));
    }
}
