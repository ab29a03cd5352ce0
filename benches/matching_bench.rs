use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use citation_holdings_matching::common::{Document, ReferencePair};
use citation_holdings_matching::extract::retained_references;
use citation_holdings_matching::normalize::{normalize_issn, normalize_title};

fn sample_documents() -> Vec<Document> {
    let titles = [
        "Annals of Applied Probability",
        "Science & Justice",
        "NATURE",
        "American Review of Respiratory Disease",
        "Health",
    ];

    (0..100i64)
        .map(|i| Document {
            venue_id: Some(i),
            venue_title: Some(titles[i as usize % titles.len()].to_string()),
            references: titles
                .iter()
                .map(|title| ReferencePair {
                    source_title: Some(title.to_string()),
                    title: Some(format!("Cited work {}", i)),
                })
                .collect(),
        })
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    let samples = [
        "Annals of Applied Probability",
        "Science & Justice",
        "NATURE",
        "The  Lancet",
    ];

    let mut group = c.benchmark_group("normalize");
    group.throughput(Throughput::Elements(samples.len() as u64));

    group.bench_function("normalize_title", |b| {
        b.iter(|| {
            for sample in &samples {
                black_box(normalize_title(Some(sample)));
            }
        })
    });

    group.bench_function("normalize_issn", |b| {
        b.iter(|| {
            black_box(normalize_issn(Some("10505164")));
            black_box(normalize_issn(Some("2168-873x")));
            black_box(normalize_issn(Some("not-an-issn")));
        })
    });

    group.finish();
}

fn bench_reference_filtering(c: &mut Criterion) {
    let documents = sample_documents();

    let mut group = c.benchmark_group("reference_filtering");
    group.throughput(Throughput::Elements(
        documents.iter().map(|d| d.references.len() as u64).sum(),
    ));

    group.bench_function("retained_references", |b| {
        b.iter(|| {
            for doc in &documents {
                black_box(retained_references(doc).count());
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_reference_filtering);
criterion_main!(benches);
