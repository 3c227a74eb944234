use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tamarin_core::{static_exchange_eval, Evaluator, Move, MoveKind, Position, Square};

fn bench_evaluation(c: &mut Criterion) {
    let evaluator = Evaluator::default();
    let positions: Vec<Position> = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w",
        "r1bqk2r/pppp1ppp/2n2n2/2b1p3/2B1P3/2N2N2/PPPP1PPP/R1BQK2R w",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w",
        "4k3/8/8/8/8/8/4P3/4K3 w",
    ]
    .iter()
    .map(|fen| Position::from_fen(fen).unwrap())
    .collect();

    c.bench_function("evaluate_full_window", |b| {
        b.iter(|| {
            for pos in &positions {
                black_box(evaluator.score(black_box(pos), i32::MIN, i32::MAX, 0));
            }
        })
    });

    c.bench_function("evaluate_cold_cache", |b| {
        b.iter_with_setup(Evaluator::default, |evaluator| {
            for pos in &positions {
                black_box(evaluator.score(black_box(pos), i32::MIN, i32::MAX, 0));
            }
        })
    });

    let see_pos = Position::from_fen("4k3/8/2p5/3p4/4P3/8/8/4K3 w").unwrap();
    let mv = Move::new(
        Square::E4,
        Square::D5,
        see_pos.piece_at(Square::E4).unwrap(),
        see_pos.piece_at(Square::D5),
        MoveKind::Capture,
    );
    c.bench_function("static_exchange_eval", |b| {
        b.iter(|| black_box(static_exchange_eval(black_box(&see_pos), black_box(mv))))
    });
}

criterion_group!(benches, bench_evaluation);
criterion_main!(benches);
