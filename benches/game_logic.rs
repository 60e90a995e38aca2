use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tetris_ng::core::{Game, Grid};
use tetris_ng::net::{decode, encode, Message, SeedPair};
use tetris_ng::types::{InputRecord, PieceKind};

fn bench_tick(c: &mut Criterion) {
    let mut game = Game::new(12345);

    c.bench_function("game_tick", |b| {
        b.iter(|| {
            if game.is_game_over() {
                game.reset(None);
            }
            black_box(game.tick());
        })
    });
}

fn bench_line_clear(c: &mut Criterion) {
    c.bench_function("clear_4_lines", |b| {
        b.iter(|| {
            let mut grid = Grid::new();
            for y in 16..20 {
                for x in 0..10 {
                    grid.set(x, y, Some(PieceKind::I));
                }
            }
            black_box(grid.clear_full_rows());
        })
    });
}

fn bench_apply_input(c: &mut Criterion) {
    let mut game = Game::new(12345);
    let input = InputRecord {
        move_left: true,
        rotate: true,
        ..InputRecord::default()
    };

    c.bench_function("apply_input", |b| {
        b.iter(|| {
            game.apply_input(black_box(input));
        })
    });
}

fn bench_state_hash(c: &mut Criterion) {
    let game = Game::new(12345);

    c.bench_function("state_hash", |b| b.iter(|| black_box(game.state_hash())));
}

fn bench_codec(c: &mut Criterion) {
    let messages = [
        Message::Input(InputRecord {
            soft_drop: true,
            score: 1234,
            ..InputRecord::default()
        }),
        Message::Seed(SeedPair::independent(42, 9999)),
        Message::GravityTick,
    ];

    c.bench_function("encode_decode", |b| {
        b.iter(|| {
            for msg in &messages {
                let frame = encode(black_box(msg));
                black_box(decode(&frame).ok());
            }
        })
    });
}

criterion_group!(
    benches,
    bench_tick,
    bench_line_clear,
    bench_apply_input,
    bench_state_hash,
    bench_codec
);
criterion_main!(benches);
