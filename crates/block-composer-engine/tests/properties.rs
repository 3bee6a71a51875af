//! Property-based tests for the compile pipeline invariants.

mod common;

use block_composer_engine::attributes::cast_value;
use block_composer_engine::compiler::coalesce::coalesce;
use block_composer_engine::compiler::inject::inject;
use block_composer_engine::{
    BlockRegistry, CompilerOptions, Definition, Manifest, ManifestCompiler, Node, ViolationKind,
    count_nodes, parse_blocks, serialize_blocks,
};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

/// Typed values whose canonical string form casts back to themselves.
fn castable_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        (-10_000_000i64..10_000_000).prop_map(|hundredths| json!(hundredths as f64 / 100.0)),
    ]
}

fn block_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "core/[a-z][a-z0-9-]{0,8}",
        "[a-z]{1,6}/[a-z][a-z0-9_-]{0,8}",
    ]
}

fn attributes_strategy() -> impl Strategy<Value = Map<String, Value>> {
    let value = prop_oneof![
        "[ -~]{0,12}".prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ];
    prop::collection::vec(("[a-zA-Z]{1,8}", value), 0..4)
        .prop_map(|pairs| pairs.into_iter().collect())
}

fn node_strategy() -> impl Strategy<Value = Node> {
    let leaf = (block_name_strategy(), attributes_strategy())
        .prop_map(|(name, attributes)| Node::new(name).with_attributes(attributes));
    leaf.prop_recursive(4, 32, 4, |inner| {
        (
            block_name_strategy(),
            attributes_strategy(),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(name, attributes, children)| {
                Node::new(name)
                    .with_attributes(attributes)
                    .with_children(children)
            })
    })
}

/// Slot-free trees built from a handful of names, some of them containers.
fn pattern_node_strategy() -> impl Strategy<Value = Node> {
    let name = prop::sample::select(vec!["core/group", "core/heading", "core/cover", "core/image"]);
    let leaf = name.clone().prop_map(|name| Node::new(name));
    leaf.prop_recursive(3, 16, 3, move |inner| {
        (name.clone(), prop::collection::vec(inner, 0..3))
            .prop_map(|(name, children)| Node::new(name).with_children(children))
    })
}

fn definition_strategy() -> impl Strategy<Value = Definition> {
    let paragraph = Just(Definition::block("core/paragraph", json!([]), vec![]));
    let section = prop::sample::select(vec!["ai-composer/section", "theme/hero-section"])
        .prop_map(|slug| Definition::pattern(slug, vec![]));
    let pattern = Just(Definition::pattern("theme/hero", vec![]));
    let invalid = Just(Definition::from_value(&json!({"attributes": []})));
    let leaf = prop_oneof![4 => paragraph, 2 => section, 1 => pattern, 1 => invalid];

    leaf.prop_recursive(3, 32, 4, |inner| {
        let block_parent = prop::sample::select(vec!["core/group", "core/columns", "core/cover"]);
        let pattern_parent =
            prop::sample::select(vec!["ai-composer/section", "theme/hero", "theme/footer"]);
        prop_oneof![
            (block_parent, prop::collection::vec(inner.clone(), 0..4))
                .prop_map(|(name, children)| Definition::block(name, json!([]), children)),
            (pattern_parent, prop::collection::vec(inner, 0..4))
                .prop_map(|(slug, children)| Definition::pattern(slug, children)),
        ]
    })
}

/// Whether any list in the tree has a section followed by a non-pattern
/// sibling.
fn has_orphan_after_section(definitions: &[Definition], options: &CompilerOptions) -> bool {
    definitions.windows(2).any(|pair| {
        matches!(&pair[0], Definition::Pattern(p) if options.is_section_pattern(&p.slug))
            && !pair[1].is_pattern_reference()
    }) || definitions
        .iter()
        .any(|d| has_orphan_after_section(d.inner_blocks(), options))
}

proptest! {
    #[test]
    fn cast_is_stable_on_canonical_strings(value in castable_value_strategy()) {
        let cast = cast_value(&Value::String(value.to_string()));
        prop_assert_eq!(&cast, &value);
        prop_assert_eq!(cast_value(&Value::String(cast.to_string())), value);
    }

    #[test]
    fn unknown_blocks_are_named_in_violations(name in "[a-z]{3,8}/[a-z]{3,8}") {
        let site = common::site();
        prop_assume!(!site.blocks.block_exists(&name));
        let compiler = ManifestCompiler::new(&site.blocks, &site.patterns, &site.settings);

        let manifest = Manifest::new(vec![Definition::block(name.clone(), json!([]), vec![])], "");
        let err = compiler.validate(&manifest).unwrap_err();

        prop_assert_eq!(err.violations().len(), 1);
        prop_assert_eq!(&err.violations()[0].kind, &ViolationKind::UnknownBlock { name });
    }

    #[test]
    fn empty_allow_list_allows_every_registered_block(index in 0usize..64) {
        let site = common::site();
        let compiler = ManifestCompiler::new(&site.blocks, &site.patterns, &site.settings);
        let names: Vec<String> = site.blocks.block_types().iter().map(|b| b.name.clone()).collect();

        let name = &names[index % names.len()];
        prop_assert!(compiler.is_block_allowed(name));
    }

    #[test]
    fn coalescing_preserves_definition_count(
        definitions in prop::collection::vec(definition_strategy(), 0..8)
    ) {
        let before: usize = definitions.iter().map(Definition::count).sum();
        let after: usize = coalesce(definitions, &CompilerOptions::default())
            .iter()
            .map(Definition::count)
            .sum();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn coalescing_leaves_no_orphans_at_any_depth(
        definitions in prop::collection::vec(definition_strategy(), 0..8)
    ) {
        let options = CompilerOptions::default();
        let out = coalesce(definitions, &options);
        prop_assert!(!has_orphan_after_section(&out, &options));
    }

    #[test]
    fn inject_never_loses_nodes(
        pattern in prop::collection::vec(pattern_node_strategy(), 0..3),
        content in prop::collection::vec(node_strategy(), 0..3),
    ) {
        let expected = count_nodes(&pattern) + count_nodes(&content);
        let out = inject(pattern, content, "ai-composer-slot", |name| {
            name == "core/group" || name == "core/cover"
        });
        prop_assert!(count_nodes(&out) >= expected);
    }

    #[test]
    fn serialized_trees_parse_back(tree in prop::collection::vec(node_strategy(), 0..4)) {
        let markup = serialize_blocks(&tree);
        prop_assert_eq!(parse_blocks(&markup).unwrap(), tree);
    }
}
