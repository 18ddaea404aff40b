//! Basic usage of structmem: declare a struct kind, fill a buffer, read it back

use structmem::{layout::LayoutBuilder, struct_view, MemoryManager, Result, Struct};

struct_view! {
    /// `struct point { int32_t x, y; float weight; }`
    pub struct Point => LayoutBuilder::structure()
        .field::<i32>()
        .field::<i32>()
        .field::<f32>()
        .build();
}

impl Point {
    pub fn x(&self) -> i32 {
        self.read(Self::offsetof(0))
    }

    pub fn y(&self) -> i32 {
        self.read(Self::offsetof(1))
    }

    pub fn weight(&self) -> f32 {
        self.read(Self::offsetof(2))
    }

    pub fn set(&self, x: i32, y: i32, weight: f32) -> &Self {
        self.write(Self::offsetof(0), x);
        self.write(Self::offsetof(1), y);
        self.write(Self::offsetof(2), weight);
        self
    }
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    println!("structmem Example");
    println!("=================");

    let memory = MemoryManager::new();
    println!("Check mode: {}", memory.check_mode().name());
    println!("Point layout: {}", Point::layout());

    // A scratch struct used as the source of relative puts
    let scratch: Point = memory.calloc()?;

    let mut points = memory.calloc_buffer::<Point>(8)?;
    for i in 0..5 {
        scratch.set(i, i * i, 1.0 / (i + 1) as f32);
        points.put(&scratch)?;
    }
    points.flip();
    println!("\nFilled {}", points);

    // Relative reads consume the window
    while points.has_remaining() {
        let p = points.get()?;
        println!("  ({:>2}, {:>2}) weight {:.3}  at {}", p.x(), p.y(), p.weight(), p);
    }

    // Drop the first two points and keep the rest at the front
    points.set_position(2)?;
    points.compact();
    points.flip();
    let kept: Vec<i32> = points.iter().map(|p| p.x()).collect();
    println!("\nAfter compaction: {:?}", kept);

    // Slices alias the parent's memory
    let tail = points.slice_range(1, 2)?;
    tail.get_at(0)?.set(-1, -1, 0.0);
    println!("Through parent after slice write: x = {}", points.get_at(1)?.x());

    unsafe { memory.free(scratch) }?;
    unsafe { memory.free(points) }?;

    println!("\nExample completed successfully!");
    Ok(())
}
