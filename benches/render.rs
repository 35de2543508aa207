// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use tinysynth::{Engine, EngineConfig, MemoryStorage, Note, Sequence, WaveformKind};

const BUFFER_FRAMES: usize = 1156;

fn generate_wav(duration_seconds: f32, sample_rate: u32, channels: u16) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let frames = (duration_seconds * sample_rate as f32) as usize;
        for i in 0..frames {
            let t = i as f32 / sample_rate as f32;
            let sample = 0.5 * (2.0 * std::f32::consts::PI * 440.0 * t).sin();
            for _ in 0..channels {
                writer.write_sample((sample * i16::MAX as f32) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn long_sequence() -> Sequence {
    Sequence::new(
        vec![
            Note::new(261.63, 500, 50),
            Note::new(329.63, 500, 50),
            Note::new(392.00, 500, 50),
        ],
        true,
    )
}

fn benchmark_sequencer(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequencer");

    for waveform in [
        WaveformKind::Sine,
        WaveformKind::Square,
        WaveformKind::Piano,
    ] {
        let config = EngineConfig {
            waveform,
            ..Default::default()
        };
        let mut engine = Engine::with_storage(config, MemoryStorage::new()).unwrap();
        engine.play_sequence(long_sequence()).unwrap();
        let mut buffer = vec![0i16; BUFFER_FRAMES * 2];

        group.bench_with_input(
            BenchmarkId::new("fill", waveform.as_str()),
            &waveform,
            |b, _| {
                b.iter(|| {
                    engine.fill(black_box(&mut buffer));
                    black_box(buffer[0])
                })
            },
        );
    }

    group.finish();
}

fn benchmark_decoder(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoder");
    group.measurement_time(Duration::from_secs(5));

    let cases = vec![("mono_44.1kHz", 1, 44100), ("stereo_44.1kHz", 2, 44100)];

    for (name, channels, sample_rate) in cases {
        let mut storage = MemoryStorage::new();
        storage.insert("bench.wav", generate_wav(10.0, sample_rate, channels));
        let mut engine = Engine::with_storage(EngineConfig::default(), storage).unwrap();
        let path = Path::new("bench.wav");
        engine.play_file(path).unwrap();
        let mut buffer = vec![0i16; BUFFER_FRAMES * 2];

        group.bench_function(name, |b| {
            b.iter(|| {
                if engine.is_finished() {
                    engine.play_file(path).unwrap();
                }
                engine.fill(black_box(&mut buffer));
                black_box(buffer[0])
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_sequencer, benchmark_decoder);
criterion_main!(benches);
