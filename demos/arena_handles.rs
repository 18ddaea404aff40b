//! Generation-checked handles: freed blocks cannot be reached through stale copies

use structmem::{layout::LayoutBuilder, struct_view, Arena, CheckMode, Result, Struct};

struct_view! {
    /// `struct slot { uint64_t key; uint64_t value; }`
    pub struct Entry => LayoutBuilder::structure().field::<u64>().field::<u64>().build();
}

impl Entry {
    pub fn key(&self) -> u64 {
        self.read(Self::offsetof(0))
    }

    pub fn value(&self) -> u64 {
        self.read(Self::offsetof(1))
    }

    pub fn set(&self, key: u64, value: u64) {
        self.write(Self::offsetof(0), key);
        self.write(Self::offsetof(1), value);
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut arena = Arena::with_heap(CheckMode::process_default());

    let table = arena.alloc_elements::<Entry>(4, Entry::alignof())?;
    arena.with_buffer::<Entry, _>(table, |buf| {
        for (i, entry) in buf.iter().enumerate() {
            entry.set(i as u64, (i * 100) as u64);
        }
    })?;

    let total = arena.with_buffer::<Entry, _>(table, |buf| buf.iter().map(|e| e.value()).sum::<u64>())?;
    println!("Table {:?} holds values summing to {}", table, total);

    let third = arena.with_view::<Entry, _>(table, 2, |e| (e.key(), e.value()))?;
    println!("Entry 2: {:?}", third);

    let stale = table;
    arena.free(table)?;
    match arena.resolve(stale) {
        Ok(address) => println!("Unexpectedly resolved to {:#x}", address),
        Err(e) => println!("Stale handle rejected: {}", e),
    }

    let replacement = arena.alloc_elements::<Entry>(1, Entry::alignof())?;
    println!(
        "Slot {} reused at generation {} (stale copy had {})",
        replacement.index(),
        replacement.generation(),
        stale.generation()
    );
    println!("Live blocks: {}", arena.live());

    Ok(())
}
