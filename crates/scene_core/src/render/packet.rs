//! # Render Packets
//!
//! A packet is everything the GPU stage needs for one draw: resource ids,
//! uniform bytes and the sort key. Packets live in a [`PacketPool`] per pass
//! and are reused frame after frame, so steady-state assembly does not
//! allocate.

use super::bucket::{Bucket, DrawType};
use crate::ecs::EntityHandle;
use std::collections::HashMap;

/// Instanced draw parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceData {
    /// GPU buffer holding per-instance data
    pub buffer_id: u32,
    /// Number of instances to draw
    pub count: u32,
}

/// One draw submission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderPacket {
    /// Entity this packet draws
    pub tag: EntityHandle,
    /// GPU shader program id
    pub shader_id: u16,
    /// GPU mesh id
    pub mesh_id: u32,
    /// GPU texture ids, in sampler order
    pub texture_ids: Vec<u32>,
    /// Instanced draw parameters, if instanced
    pub instance: Option<InstanceData>,
    /// Uniform bytes by shader uniform name
    pub uniforms: HashMap<String, Vec<u8>>,
    /// How the packet blends
    pub draw_type: DrawType,
    /// Sort key
    pub bucket: Bucket,
}

impl RenderPacket {
    /// Clear the packet for reuse, keeping allocations
    pub fn reset(&mut self) {
        self.tag = EntityHandle::INVALID;
        self.shader_id = 0;
        self.mesh_id = 0;
        self.texture_ids.clear();
        self.instance = None;
        for bytes in self.uniforms.values_mut() {
            bytes.clear();
        }
        self.draw_type = DrawType::default();
        self.bucket = Bucket::default();
    }

    /// Store a uniform as raw bytes
    pub fn set_uniform<T: bytemuck::Pod>(&mut self, name: &str, values: &[T]) {
        let bytes: &[u8] = bytemuck::cast_slice(values);
        match self.uniforms.get_mut(name) {
            Some(stored) => {
                stored.clear();
                stored.extend_from_slice(bytes);
            }
            None => {
                self.uniforms.insert(name.to_string(), bytes.to_vec());
            }
        }
    }

    /// Uniform bytes by name. Uniforms left over from an earlier use of this
    /// packet read as absent.
    pub fn uniform(&self, name: &str) -> Option<&[u8]> {
        self.uniforms
            .get(name)
            .map(Vec::as_slice)
            .filter(|bytes| !bytes.is_empty())
    }
}

/// Reusable packet storage for one pass
#[derive(Debug, Default)]
pub struct PacketPool {
    packets: Vec<RenderPacket>,
    len: usize,
}

impl PacketPool {
    /// Create a pool with `capacity` packets preallocated
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            packets: vec![RenderPacket::default(); capacity],
            len: 0,
        }
    }

    /// Hand out a cleared packet, reusing one from an earlier frame if possible
    pub fn acquire(&mut self) -> &mut RenderPacket {
        if self.len == self.packets.len() {
            self.packets.push(RenderPacket::default());
        }
        let packet = &mut self.packets[self.len];
        packet.reset();
        self.len += 1;
        packet
    }

    /// Return the most recently acquired packet to the pool
    pub fn discard_last(&mut self) {
        self.len = self.len.saturating_sub(1);
    }

    /// Release every packet for the next frame
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Packets in use
    pub fn as_slice(&self) -> &[RenderPacket] {
        &self.packets[..self.len]
    }

    /// Number of packets in use
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no packets are in use
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Order packets by bucket, largest first. Equal buckets keep the order
    /// they were acquired in.
    pub fn sort(&mut self) {
        self.packets[..self.len].sort_by(|a, b| b.bucket.cmp(&a.bucket));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderPass;

    #[test]
    fn test_pool_reuses_packets() {
        let mut pool = PacketPool::with_capacity(1);
        pool.acquire().mesh_id = 7;
        pool.acquire().mesh_id = 8;
        assert_eq!(pool.len(), 2);

        pool.clear();
        let reused = pool.acquire();
        assert_eq!(reused.mesh_id, 0);
        assert_eq!(pool.as_slice().len(), 1);
    }

    #[test]
    fn test_discard_last() {
        let mut pool = PacketPool::default();
        pool.acquire();
        pool.discard_last();
        assert!(pool.is_empty());
        pool.discard_last();
        assert!(pool.is_empty());
    }

    #[test]
    fn test_sort_is_stable_and_descending() {
        let mut pool = PacketPool::default();
        let low = Bucket::new(RenderPass::TwoD);
        let high = Bucket::new(RenderPass::ThreeD);
        for (mesh_id, bucket) in [(1, low), (2, high), (3, low), (4, high)] {
            let packet = pool.acquire();
            packet.mesh_id = mesh_id;
            packet.bucket = bucket;
        }

        pool.sort();

        let order: Vec<u32> = pool.as_slice().iter().map(|p| p.mesh_id).collect();
        assert_eq!(order, vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_uniform_bytes() {
        let mut packet = RenderPacket::default();
        packet.set_uniform("alpha", &[0.5f32]);
        assert_eq!(packet.uniform("alpha"), Some(&0.5f32.to_ne_bytes()[..]));

        packet.reset();
        assert_eq!(packet.uniform("alpha"), None);
    }
}
