use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use structmem::{
    layout::LayoutBuilder, struct_view, CheckMode, Element, MemoryConfig, MemoryManager, StackAllocator,
    Struct,
};
use std::sync::Arc;

struct_view! {
    pub struct Particle => LayoutBuilder::structure()
        .field::<f32>()
        .field::<f32>()
        .field::<f32>()
        .field::<u32>()
        .build();
}

impl Particle {
    fn id(&self) -> u32 {
        self.read(Self::offsetof(3))
    }

    fn set_id(&self, id: u32) {
        self.write(Self::offsetof(3), id)
    }
}

fn manager(mode: CheckMode) -> MemoryManager {
    MemoryManager::with_config(MemoryConfig::default().with_check_mode(mode)).unwrap()
}

fn benchmark_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("Traversal");

    for mode in [CheckMode::Unchecked, CheckMode::Checked] {
        let memory = manager(mode);
        let buf = memory.calloc_buffer::<Particle>(4096).unwrap();
        for (i, p) in buf.iter().enumerate() {
            p.set_id(i as u32);
        }

        group.throughput(Throughput::Elements(buf.capacity() as u64));
        group.bench_function(BenchmarkId::new("iter", mode.name()), |b| {
            b.iter(|| black_box(buf.iter().map(|p| p.id() as u64).sum::<u64>()));
        });
        group.bench_function(BenchmarkId::new("get_at", mode.name()), |b| {
            b.iter(|| {
                let mut sum = 0u64;
                for i in 0..buf.capacity() {
                    sum += buf.get_at(i).unwrap().id() as u64;
                }
                black_box(sum)
            });
        });

        unsafe { memory.free(buf) }.unwrap();
    }

    group.finish();
}

fn benchmark_bulk_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("BulkPut");
    let memory = manager(CheckMode::Checked);

    for count in [64usize, 1024, 16384].iter() {
        let src = memory.calloc_buffer::<Particle>(*count).unwrap();
        let mut dst = memory.calloc_buffer::<Particle>(*count).unwrap();

        group.throughput(Throughput::Bytes((count * Particle::sizeof()) as u64));
        group.bench_with_input(BenchmarkId::new("put_buffer", count), count, |b, _| {
            b.iter(|| {
                dst.clear();
                dst.put_buffer(&src).unwrap();
            });
        });

        unsafe { memory.free(src) }.unwrap();
        unsafe { memory.free(dst) }.unwrap();
    }

    group.finish();
}

fn benchmark_scratch_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("ScratchAllocation");
    let stack = Arc::new(StackAllocator::new(1024 * 1024).unwrap());
    let memory = MemoryManager::with_allocator(stack.clone(), MemoryConfig::default()).unwrap();

    group.bench_function("stack_frame", |b| {
        b.iter(|| {
            let _frame = stack.frame();
            for _ in 0..100 {
                black_box(memory.calloc::<Particle>().unwrap());
            }
        });
    });

    group.finish();
}

fn benchmark_layout(c: &mut Criterion) {
    c.bench_function("layout_nested", |b| {
        b.iter(|| {
            let inner = LayoutBuilder::structure().field::<u16>().field::<u64>().build();
            black_box(
                LayoutBuilder::structure()
                    .pack_alignment(black_box(4))
                    .field::<u8>()
                    .nested(inner)
                    .array_of::<u32>(4)
                    .build(),
            )
        });
    });
}

criterion_group!(
    benches,
    benchmark_traversal,
    benchmark_bulk_put,
    benchmark_scratch_allocation,
    benchmark_layout
);
criterion_main!(benches);
