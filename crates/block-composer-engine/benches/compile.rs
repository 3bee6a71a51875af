use block_composer_engine::{
    BlockCatalog, BlockType, Manifest, ManifestCompiler, PatternLibrary, StaticSettings,
    parse_blocks,
};
use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};

fn section(paragraphs: usize) -> Vec<Value> {
    let mut entries = vec![json!({
        "blockType": "pattern",
        "attributes": [],
        "patternSlug": "ai-composer/section",
        "innerBlocks": []
    })];
    entries.extend((0..paragraphs).map(|i| {
        json!({
            "blockType": "core/paragraph",
            "attributes": [{"name": "content", "value": format!("Paragraph {i} with <em>markup</em>")}],
            "patternSlug": null,
            "innerBlocks": []
        })
    }));
    entries
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    group.sample_size(10);

    let blocks = BlockCatalog::new([
        BlockType::new("core/paragraph"),
        BlockType::container("core/group"),
    ]);
    let patterns = PatternLibrary::with_builtins([], &blocks);
    let settings = StaticSettings::default();

    let entries: Vec<Value> = (0..50).flat_map(|_| section(10)).collect();
    let manifest = Manifest::from_value(&json!({"blocks": entries, "summary": ""})).unwrap();

    group.bench_function("compile_all", |b| {
        b.iter(|| {
            let compiler = ManifestCompiler::new(&blocks, &patterns, &settings);
            std::hint::black_box(compiler.compile_all(std::hint::black_box(&manifest)).unwrap());
        });
    });

    let markup = ManifestCompiler::new(&blocks, &patterns, &settings)
        .compile(&manifest)
        .unwrap();
    group.bench_function("parse_blocks", |b| {
        b.iter(|| std::hint::black_box(parse_blocks(std::hint::black_box(&markup)).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_compile);
criterion_main!(benches);
