//! Search-result extraction throughput
//!
//! A results page is parsed once per fetched page during a locate, so the
//! extractor sits on the hot path of every scan.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rank_tracker::domain::name_from_url;
use rank_tracker::infrastructure::parsing::ResultExtractor;

fn listing_page(cards: u64) -> String {
    let body: String = (0..cards)
        .map(|n| {
            let id = 9_200_000_000_000_000 + n;
            format!(
                r#"<li data-testid="product-card"><a href="/nl/nl/p/product-{n}/{id}/"><h2>Wasverzachter variant {n}</h2></a>
                   <a href="/nl/nl/p/product-{n}/{id}/">Meer verkopers</a>
                   <div data-product-id="{}"><span>Gesponsord artikel {n}</span></div></li>"#,
                id + 1_000_000
            )
        })
        .collect();
    format!("<html><body><ul>{body}</ul></body></html>")
}

fn extraction(c: &mut Criterion) {
    let extractor = ResultExtractor::new().unwrap();
    let mut group = c.benchmark_group("extract");
    for cards in [24_u64, 60] {
        let markup = listing_page(cards);
        group.bench_with_input(BenchmarkId::from_parameter(cards), &markup, |b, markup| {
            b.iter(|| black_box(extractor.extract(black_box(markup))));
        });
    }
    group.finish();

    c.bench_function("name_from_url", |b| {
        b.iter(|| {
            black_box(name_from_url(black_box(
                "https://www.bol.com/nl/nl/p/lenor-geurbooster-voor-je-was-orchidee-en-amber/9300000170626119/?cid=1",
            )))
        });
    });
}

criterion_group!(benches, extraction);
criterion_main!(benches);
