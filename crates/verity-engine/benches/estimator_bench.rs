//! Estimator benchmarks
//!
//! Runs every estimator on one deterministic synthetic crowd.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use verity_core::config::InferenceConfig;
use verity_core::Answer;
use verity_engine::{run_algorithm, Algorithm, AnswerIndex};

/// `questions` questions with four choices, `participants` participants of
/// varying accuracy. A small linear congruential generator keeps the data
/// identical across runs.
fn synthetic_crowd(questions: usize, participants: usize) -> AnswerIndex {
    let choices = ["a", "b", "c", "d"];
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        (state >> 33) as usize
    };

    let mut answers = Vec::with_capacity(questions * participants);
    for q in 0..questions {
        let truth = q % choices.len();
        for p in 0..participants {
            // Accuracy from 95% down to 35% across participants.
            let accuracy = 95 - (p * 60 / participants.max(1));
            let choice = if next() % 100 < accuracy {
                truth
            } else {
                next() % choices.len()
            };
            answers.push(Answer::new(
                format!("p{p:03}"),
                format!("q{q:04}"),
                choices[choice],
            ));
        }
    }
    AnswerIndex::new(answers)
}

fn bench_index_build(c: &mut Criterion) {
    let answers: Vec<Answer> = synthetic_crowd(500, 20).answers().to_vec();

    c.bench_function("answer_index_build", |b| {
        b.iter(|| AnswerIndex::new(black_box(answers.clone())))
    });
}

fn bench_estimators(c: &mut Criterion) {
    let index = synthetic_crowd(500, 20);
    let config = InferenceConfig::default();

    let mut group = c.benchmark_group("estimators");
    group.sample_size(20);
    for algorithm in Algorithm::ALL {
        group.bench_with_input(
            BenchmarkId::from_parameter(algorithm),
            &index,
            |b, index| b.iter(|| run_algorithm(algorithm, black_box(index), &config)),
        );
    }
    group.finish();
}

fn bench_sequential_vs_parallel(c: &mut Criterion) {
    let index = synthetic_crowd(2000, 30);

    let mut group = c.benchmark_group("dawid_skene_parallelism");
    group.sample_size(10);
    for parallel in [false, true] {
        let config = InferenceConfig {
            parallel: Some(parallel),
            ..Default::default()
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(if parallel { "parallel" } else { "sequential" }),
            &index,
            |b, index| b.iter(|| run_algorithm(Algorithm::DawidSkene, black_box(index), &config)),
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_index_build,
    bench_estimators,
    bench_sequential_vs_parallel,
);

criterion_main!(benches);
