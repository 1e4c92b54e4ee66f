use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use bench_input::TestInput;
use newt_msg::{Message, TryFromBytes};

fn message_from_bytes(c: &mut Criterion) {
  let mut group = c.benchmark_group("msg/from_bytes");
  group.measurement_time(std::time::Duration::from_secs(5));

  for inp in TestInput::all() {
    let bytes = inp.get_bytes();

    group.bench_with_input(BenchmarkId::new("newt_msg/size", bytes.len()),
                           &bytes,
                           |b, bytes| b.iter(|| Message::try_from_bytes(bytes).unwrap()));

    group.bench_with_input(BenchmarkId::new("coap_lite/size", bytes.len()),
                           &bytes,
                           |b, bytes| b.iter(|| coap_lite::Packet::from_bytes(bytes).unwrap()));
  }
  group.finish();
}

criterion_group!(benches, message_from_bytes);
criterion_main!(benches);
