use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use brkalloc::{Allocator, ArenaHeap};

fn alloc_sizes(c: &mut Criterion) {
  let mut group = c.benchmark_group("alloc sizes");

  for size in [1, 2, 4, 8, 16, 32, 64, 128].iter() {
    group.throughput(Throughput::Bytes(*size as u64));
    group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
      let allocator = Allocator::new(ArenaHeap::with_capacity(1 << 20).unwrap());

      // trailing free: each iteration grows and shrinks the heap
      b.iter(|| unsafe { allocator.free(black_box(allocator.allocate(size))) });
    });
  }

  group.finish();
}

fn first_fit_walk(c: &mut Criterion) {
  let mut group = c.benchmark_group("first fit walk");

  for blocks in [16, 256, 4096].iter() {
    group.bench_with_input(BenchmarkId::from_parameter(blocks), blocks, |b, &blocks| {
      let allocator = Allocator::new(ArenaHeap::with_capacity(1 << 24).unwrap());

      for _ in 0..blocks {
        allocator.allocate(16);
      }

      // only the newest interior block is free, so every reuse walks the list
      let last = allocator.allocate(32);
      let _guard = allocator.allocate(16);
      unsafe { allocator.free(last) };

      b.iter(|| unsafe {
        let p = allocator.allocate(black_box(32));
        allocator.free(p);
      });
    });
  }

  group.finish();
}

criterion_group!(benches, alloc_sizes, first_fit_walk);
criterion_main!(benches);
