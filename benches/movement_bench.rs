use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use sable::buffer::{Direction, TextBuffer};
use sable::locate::{self, CursorState};

fn movement_horizontal(c: &mut Criterion) {
    let mut group = c.benchmark_group("movement_horizontal");

    let line = "word ".repeat(200);
    let buffer = TextBuffer::from_string(line);

    group.bench_function("char_in_line_forward", |b| {
        b.iter(|| {
            let mut cursor = CursorState::at(0);
            for _ in 0..500 {
                cursor = locate::char_in_line(&buffer, cursor, Direction::Forward, 1, false);
            }
            black_box(cursor)
        })
    });

    group.bench_function("next_word_start", |b| {
        b.iter(|| {
            let mut cursor = CursorState::at(0);
            for _ in 0..100 {
                cursor = locate::next_word_start(&buffer, cursor, 1);
            }
            black_box(cursor)
        })
    });

    group.finish();
}

fn movement_vertical(c: &mut Criterion) {
    let mut group = c.benchmark_group("movement_vertical");

    // Varying line lengths stress the logical-offset restore logic.
    let mut text = String::new();
    for i in 0..10_000 {
        let len = (i % 80) + 10;
        text.push_str(&"a".repeat(len));
        text.push('\n');
    }
    let buffer = TextBuffer::from_string(text);

    group.bench_function("relative_line_down", |b| {
        b.iter(|| {
            let mut cursor = locate::char_in_line(
                &buffer,
                CursorState::at(0),
                Direction::Forward,
                40,
                false,
            );
            for _ in 0..1_000 {
                cursor = locate::relative_line(&buffer, cursor, Direction::Forward, 1);
            }
            black_box(cursor)
        })
    });

    group.finish();
}

criterion_group!(benches, movement_horizontal, movement_vertical);
criterion_main!(benches);
