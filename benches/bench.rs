// Criterion benchmarks for the VKinder dialogue core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vkinder::core::{normalize, validate, Browser, Mode};
use vkinder::models::Candidate;

fn create_candidates(count: usize) -> Vec<Candidate> {
    (0..count)
        .map(|i| Candidate {
            id: i as i64,
            first_name: format!("Имя{}", i),
            last_name: "Тестова".to_string(),
            age: Some(20 + (i % 30) as u8),
            city: Some("москва".to_string()),
        })
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for (name, input) in [
        ("exact", "поиск"),
        ("button", "❤️ В избранное"),
        ("stripped_glyph", "❤ В избранное"),
        ("unknown", "как дела? что нового?"),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, input| {
            b.iter(|| normalize(black_box(input)));
        });
    }

    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");

    for (name, mode, input) in [
        ("age", Mode::WaitingAge, "25"),
        ("age_out_of_range", Mode::WaitingAge, "81"),
        ("city", Mode::WaitingCity, " Набережные Челны "),
        ("city_unknown", Mode::WaitingCity, "Moscow"),
        ("sex", Mode::WaitingSex, "2 - Мужской"),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, input| {
            b.iter(|| validate(black_box(mode), black_box(input)));
        });
    }

    group.finish();
}

fn bench_browse(c: &mut Criterion) {
    let mut group = c.benchmark_group("browse");

    for size in [10, 50, 200].iter() {
        let candidates = create_candidates(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let Some(mut browser) = Browser::new(black_box(candidates.clone())) else {
                    return;
                };
                while browser.cursor() < browser.len() {
                    browser.mark_shown();
                    browser.advance();
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_validate, bench_browse);
criterion_main!(benches);
