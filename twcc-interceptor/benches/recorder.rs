use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use twcc_interceptor::Recorder;

fn benchmark_recorder(c: &mut Criterion) {
    c.bench_function("Recorder Record", |b| {
        let recorder = Recorder::new(1);
        let mut seq = 0u16;
        b.iter(|| {
            recorder.record(0xA, black_box(seq), seq as i64 * 250);
            seq = seq.wrapping_add(1);
            if seq == 0 {
                let _ = recorder.build_feedback();
            }
        })
    });

    c.bench_function("Recorder Record Reordered", |b| {
        b.iter_batched(
            || Recorder::new(1),
            |recorder| {
                for i in 0..500u16 {
                    // pairs swapped
                    let seq = i ^ 1;
                    recorder.record(0xA, seq, seq as i64 * 1_000);
                }
                recorder
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("Recorder BuildFeedback", |b| {
        b.iter_batched(
            || {
                let recorder = Recorder::new(1);
                for i in 0..1_000u16 {
                    // one in ten lost, irregular spacing
                    if i % 10 != 3 {
                        recorder.record(0xA, i, i as i64 * 2_000 + (i % 7) as i64 * 300);
                    }
                }
                recorder
            },
            |recorder| black_box(recorder.build_feedback()),
            BatchSize::SmallInput,
        )
    });

    c.bench_function("Recorder BuildFeedback Split", |b| {
        b.iter_batched(
            || {
                let recorder = Recorder::with_max_feedback_size(1, 200);
                for i in 0..1_000u16 {
                    recorder.record(0xA, i * 2, i as i64 * 1_000);
                }
                recorder
            },
            |recorder| black_box(recorder.build_feedback()),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, benchmark_recorder);
criterion_main!(benches);
