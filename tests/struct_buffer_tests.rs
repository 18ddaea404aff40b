//! Integration tests for struct buffers, traversal and containers

use std::sync::Arc;

use structmem::{
    layout::LayoutBuilder, struct_view, Allocator, CheckMode, Element, MemoryConfig, MemoryManager, Pointer,
    StackAllocator, Struct, StructMemError,
};

struct_view! {
    /// `struct { float x, y, z; uint32_t id; }`
    pub struct Vertex => LayoutBuilder::structure()
        .field::<f32>()
        .field::<f32>()
        .field::<f32>()
        .field::<u32>()
        .build();
}

impl Vertex {
    pub fn x(&self) -> f32 {
        self.read(Self::offsetof(0))
    }

    pub fn id(&self) -> u32 {
        self.read(Self::offsetof(3))
    }

    pub fn set(&self, x: f32, y: f32, z: f32, id: u32) {
        self.write(Self::offsetof(0), x);
        self.write(Self::offsetof(1), y);
        self.write(Self::offsetof(2), z);
        self.write(Self::offsetof(3), id);
    }
}

struct_view! {
    /// Singly linked node: `struct { node *next; uint64_t payload; }`
    pub struct Node => LayoutBuilder::structure().pointer().field::<u64>().build();
}

fn manager(mode: CheckMode) -> MemoryManager {
    MemoryManager::with_config(MemoryConfig::default().with_check_mode(mode)).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_traversal_across_threads() {
        let memory = manager(CheckMode::Checked);
        let buf = memory.calloc_buffer::<Vertex>(101).unwrap();
        for (i, v) in buf.iter().enumerate() {
            v.set(i as f32, 0.0, 0.0, i as u32);
        }

        let (lo, hi) = buf.iter().split_at_midpoint();
        assert_eq!(lo.len() + hi.len(), 101);

        let (lo_sum, hi_sum) = std::thread::scope(|s| {
            let lo = s.spawn(move || lo.map(|v| v.id() as u64).sum::<u64>());
            let hi = s.spawn(move || hi.map(|v| v.id() as u64).sum::<u64>());
            (lo.join().unwrap(), hi.join().unwrap())
        });
        assert_eq!(lo_sum + hi_sum, (0..101u64).sum());

        unsafe { memory.free(buf) }.unwrap();
    }

    #[test]
    fn test_recursive_split_covers_range_once() {
        let memory = manager(CheckMode::Checked);
        let buf = memory.calloc_buffer::<Vertex>(37).unwrap();

        let mut pending = vec![buf.iter()];
        let mut leaves = Vec::new();
        while let Some(mut part) = pending.pop() {
            match part.try_split() {
                Some(prefix) if part.len() > 4 => {
                    pending.push(prefix);
                    pending.push(part);
                }
                Some(prefix) => {
                    leaves.push(prefix.range());
                    leaves.push(part.range());
                }
                None => leaves.push(part.range()),
            }
        }

        let mut covered: Vec<usize> = leaves.into_iter().flatten().collect();
        covered.sort_unstable();
        assert_eq!(covered, (0..37).collect::<Vec<_>>());

        unsafe { memory.free(buf) }.unwrap();
    }

    #[test]
    fn test_views_alias_buffer_memory() {
        let memory = manager(CheckMode::Checked);
        let mut buf = memory.calloc_buffer::<Vertex>(3).unwrap();

        let v = buf.get().unwrap();
        v.set(1.5, 2.5, 3.5, 9);
        assert_eq!(buf.get_at(0).unwrap(), v);
        assert_eq!(buf.get_at(0).unwrap().x(), 1.5);

        let copy = memory.calloc::<Vertex>().unwrap();
        buf.get_at_into(0, &copy).unwrap();
        copy.set(0.0, 0.0, 0.0, 1);
        assert_eq!(v.id(), 9);

        unsafe { memory.free(copy) }.unwrap();
        buf.rewind();
        unsafe { memory.free(buf) }.unwrap();
    }

    #[test]
    fn test_iteration_is_restartable() {
        let memory = manager(CheckMode::Checked);
        let buf = memory.calloc_buffer::<Vertex>(4).unwrap();
        let first: Vec<usize> = buf.iter().map(|v| v.address()).collect();
        let second: Vec<usize> = (&buf).into_iter().map(|v| v.address()).collect();
        assert_eq!(first, second);
        assert_eq!(first[1] - first[0], Vertex::sizeof());
        unsafe { memory.free(buf) }.unwrap();
    }

    #[test]
    fn test_is_null_on_linked_nodes() {
        let memory = manager(CheckMode::Strict);
        let buf = memory.calloc_buffer::<Node>(2).unwrap();
        let head = buf.get_at(0).unwrap();
        let tail = buf.get_at(1).unwrap();

        head.write_address(0, tail.address()).unwrap();
        assert!(!head.is_null(0).unwrap());
        assert!(tail.is_null(0).unwrap());
        assert!(matches!(head.is_null(12), Err(StructMemError::InvalidArgument { .. })));

        head.clear();
        assert!(head.is_null(0).unwrap());
        unsafe { memory.free(buf) }.unwrap();
    }

    #[test]
    fn test_pointer_buffer_of_views() {
        let memory = manager(CheckMode::Checked);
        let nodes = memory.calloc_buffer::<Node>(3).unwrap();
        let mut pointers = memory.pointer_buffer(3).unwrap();

        for node in nodes.iter() {
            pointers.put_pointer(&node).unwrap();
        }
        pointers.flip();
        let expected: Vec<usize> = nodes.iter().map(|n| n.address()).collect();
        assert_eq!(pointers.to_vec(), expected);

        pointers.rewind();
        unsafe { memory.free(pointers) }.unwrap();
        unsafe { memory.free(nodes) }.unwrap();
    }

    #[test]
    fn test_container_keeps_slices_alive() {
        let memory = manager(CheckMode::Checked);
        let mut buf = memory.owned_buffer::<Vertex>(4).unwrap();
        buf.set_position(2).unwrap();
        let slice = buf.slice();
        drop(buf);

        slice.get_at(1).unwrap().set(0.0, 0.0, 0.0, 44);
        assert_eq!(slice.get_at(1).unwrap().id(), 44);
        assert!(memory.allocator().used_size() > 0);

        drop(slice);
        assert_eq!(memory.allocator().used_size(), 0);
    }

    #[test]
    fn test_stack_allocated_scratch() {
        let stack = Arc::new(StackAllocator::new(1024).unwrap());
        let memory = MemoryManager::with_allocator(stack.clone(), MemoryConfig::default()).unwrap();

        let before = stack.pointer();
        {
            let _frame = stack.frame();
            let v: Vertex = memory.calloc().unwrap();
            v.set(1.0, 1.0, 1.0, 1);
            let mut buf = memory.calloc_buffer::<Vertex>(4).unwrap();
            buf.put_at(2, &v).unwrap();
            assert_eq!(buf.get_at(2).unwrap().id(), 1);
            assert!(stack.pointer() > before);
        }
        assert_eq!(stack.pointer(), before);
    }

    #[test]
    fn test_display_formats() {
        let memory = manager(CheckMode::Checked);
        let v: Vertex = memory.calloc().unwrap();
        assert_eq!(v.to_string(), format!("Vertex pointer [0x{:X}]", v.address()));

        let buf = memory.calloc_buffer::<Vertex>(2).unwrap();
        assert_eq!(
            buf.to_string(),
            format!("VertexBuffer[address=0x{:X}, pos=0, lim=2, cap=2]", buf.address())
        );

        unsafe { memory.free(v) }.unwrap();
        unsafe { memory.free(buf) }.unwrap();
    }
}
